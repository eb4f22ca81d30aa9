//! Event-level access to the XML parts of a `.docx` package.
//!
//! Run text in `w:t` is significant down to the last space, so nothing here
//! trims or normalizes what the parts contain.

use crate::error::RustyReportError;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::BytesRef;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::borrow::Cow;
use std::io::BufRead;
use thiserror::Error;

/// Failures while turning part XML into elements and text
#[derive(Error, Debug)]
pub enum XmlError {
    #[error("Parse entity '{0}' failed")]
    ParseEntityError(String),

    #[error("XML part '{0}' has no root element")]
    MissingRootElement(String),
}

/// Pull reader over one package part
pub(crate) struct XmlReader<R: BufRead> {
    reader: Reader<R>,
    buffer: Vec<u8>,
}

impl<R: BufRead> XmlReader<R> {
    /// `<w:tab/>` and friends come back as a start followed by an end, so the tree
    /// builder only has to handle one element shape
    pub(crate) fn new(buf_reader: R) -> XmlReader<R> {
        let mut reader = Reader::from_reader(buf_reader);
        let config = reader.config_mut();
        config.check_comments = false;
        config.check_end_names = false;
        config.expand_empty_elements = true;
        config.trim_text(false);

        let buffer = Vec::with_capacity(1024);
        XmlReader { reader, buffer }
    }

    /// `None` once the part is exhausted
    pub(crate) fn next(&'_ mut self) -> Result<Option<Event<'_>>, RustyReportError> {
        self.buffer.clear();
        match self.reader.read_event_into(&mut self.buffer) {
            Ok(Event::Eof) => Ok(None),
            Ok(event) => Ok(Some(event)),
            Err(error) => Err(RustyReportError::XmlError(error)),
        }
    }
}

/// Attribute access by qualified name, e.g. `w:val`
pub(crate) trait XmlAttributeHelper<'a> {
    fn get_key(&self) -> Result<&str, RustyReportError>;

    /// Value with `&amp;` and character references resolved
    fn get_value(&self) -> Result<Cow<'a, str>, RustyReportError>;
}

impl<'a> XmlAttributeHelper<'a> for Attribute<'a> {
    fn get_key(&self) -> Result<&str, RustyReportError> {
        Ok(std::str::from_utf8(self.key.as_ref())?)
    }

    fn get_value(&self) -> Result<Cow<'a, str>, RustyReportError> {
        Ok(self.unescape_value()?)
    }
}

/// Name and attribute lookup on an opening tag such as `<w:pStyle w:val="Heading1">`
pub(crate) trait XmlNodeHelper<'a> {
    fn get_name(&self) -> Result<&str, RustyReportError>;

    fn get_attribute_value(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, RustyReportError>;
}

impl<'a> XmlNodeHelper<'a> for BytesStart<'a> {
    fn get_name(&self) -> Result<&str, RustyReportError> {
        Ok(std::str::from_utf8(self.name().into_inner())?)
    }

    fn get_attribute_value(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, RustyReportError> {
        self.try_get_attribute(name)?
            .map(|attribute| attribute.get_value())
            .transpose()
    }
}

/// Appends entity and character references found between run text events
pub(crate) trait XmlTextContextHelper {
    fn push_bytes_ref(&mut self, bytes: &BytesRef) -> Result<(), RustyReportError>;
}

impl XmlTextContextHelper for String {
    fn push_bytes_ref(&mut self, bytes: &BytesRef) -> Result<(), RustyReportError> {
        let raw = bytes.xml_content()?;
        if let Some(number) = raw.strip_prefix('#') {
            let code = if let Some(hex) = number.strip_prefix('x') {
                u32::from_str_radix(hex, 16)?
            } else {
                u32::from_str_radix(number, 10)?
            };
            if let Some(character) = std::char::from_u32(code) {
                self.push_str(character.encode_utf8(&mut [0u8; 4]));
            }
        } else if let Some(entity) = resolve_xml_entity(&raw) {
            self.push_str(entity);
        } else {
            Err(XmlError::ParseEntityError(raw.to_string()))?;
        }

        Ok(())
    }
}

/// Loops over the remaining events of `$reader`, ignoring anything the arms do not name
#[macro_export]
macro_rules! match_xml_events {
    ($reader:expr => { $($arms:tt)* }) => {
        while let Some(result) = $reader.next()? {
            match result {
                Event::Eof => break,
                $($arms)*
                _ => (),
            }
        }
    };
}
