//! Owned XML element tree for WordprocessingML parts.
//!
//! Element and attribute names are kept fully qualified (`w:tbl`, `w:val`) exactly
//! as they appear in the part, so a tree can be written back without namespace
//! bookkeeping.

use crate::error::RustyReportError;
use crate::helpers::xml::XmlAttributeHelper;
use crate::helpers::xml::XmlError;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
use crate::helpers::xml::XmlTextContextHelper;
use crate::match_xml_events;
use quick_xml::events::BytesDecl;
use quick_xml::events::BytesEnd;
use quick_xml::events::BytesStart;
use quick_xml::events::BytesText;
use quick_xml::events::Event;
use quick_xml::Writer;
use std::io::BufRead;

/// A child of an element
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An XML element with its attributes and ordered children
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, key: &str, value: &str) -> Self {
        self.set_attribute(key, value);
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.push(child);
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.push_text(text);
        self
    }

    /// Returns true if the element has the given qualified name
    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    /// Sets an attribute, replacing an existing value in place
    pub fn set_attribute(&mut self, key: &str, value: &str) {
        match self.attributes.iter_mut().find(|(name, _)| name == key) {
            Some((_, existing)) => *existing = value.to_owned(),
            None => self.attributes.push((key.to_owned(), value.to_owned())),
        }
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// Appends text, merging with a trailing text node so entity-split runs stay whole
    pub fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.children.last_mut() {
            Some(Node::Text(existing)) => existing.push_str(text),
            _ => self.children.push(Node::Text(text.to_owned())),
        }
    }

    /// Iterates over child elements, skipping text nodes
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements().filter(move |element| element.is(name))
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|element| element.is(name))
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.children.iter_mut().find_map(|node| match node {
            Node::Element(element) if element.is(name) => Some(element),
            _ => None,
        })
    }

    /// Concatenated text nodes directly under this element
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(text) => Some(text.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }
}

/// Parses an XML part into an element tree.
///
/// `part` is only used to name the part in errors. Comments, processing
/// instructions and the declaration are dropped.
pub(crate) fn read_tree<R: BufRead>(reader: &mut XmlReader<R>, part: &str) -> Result<Element, RustyReportError> {
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    match_xml_events!(reader => {
        Event::Start(event) => {
            let mut element = Element::new(event.get_name()?);
            for attribute in event.attributes() {
                let attribute = attribute?;
                element.attributes.push((attribute.get_key()?.to_owned(), attribute.get_value()?.into_owned()));
            }
            stack.push(element);
        }
        Event::End(_) => {
            if let Some(element) = stack.pop() {
                match stack.last_mut() {
                    Some(parent) => parent.push(element),
                    None => {
                        root = Some(element);
                        break;
                    }
                }
            }
        }
        Event::Text(event) => {
            if let Some(parent) = stack.last_mut() {
                parent.push_text(&event.xml_content()?);
            }
        }
        Event::CData(event) => {
            if let Some(parent) = stack.last_mut() {
                parent.push_text(&event.xml_content()?);
            }
        }
        Event::GeneralRef(event) => {
            if let Some(parent) = stack.last_mut() {
                let mut text = String::new();
                text.push_bytes_ref(&event)?;
                parent.push_text(&text);
            }
        }
    });
    root.ok_or_else(|| XmlError::MissingRootElement(part.to_owned()).into())
}

/// Serializes an element tree as a standalone XML part
pub(crate) fn write_tree(root: &Element) -> Result<Vec<u8>, RustyReportError> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    writer.get_mut().extend_from_slice(b"\r\n");
    write_element(&mut writer, root)?;
    Ok(writer.into_inner())
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<(), RustyReportError> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    if element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for child in &element.children {
        match child {
            Node::Element(child) => write_element(writer, child)?,
            Node::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
        }
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    Ok(())
}
