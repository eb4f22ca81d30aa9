use crate::document::element::Element;
use crate::document::styles::StyleSheet;

pub(crate) const TAG_PARAGRAPH: &str = "w:p";
const TAG_PARAGRAPH_PROPERTIES: &str = "w:pPr";
const TAG_PARAGRAPH_STYLE: &str = "w:pStyle";
const TAG_RUN_PROPERTIES: &str = "w:rPr";
const TAG_TEXT: &str = "w:t";
const TAG_TAB: &str = "w:tab";
const TAG_BREAK: &str = "w:br";
const TAG_CARRIAGE_RETURN: &str = "w:cr";
const ATTR_VALUE: &str = "w:val";

/// A paragraph block together with its resolved style.
pub struct Paragraph<'a> {
    element: &'a Element,
    style_id: Option<&'a str>,
    style_name: Option<&'a str>,
}

impl<'a> Paragraph<'a> {
    pub fn new(element: &'a Element, styles: &'a StyleSheet) -> Self {
        let style_id = element
            .child(TAG_PARAGRAPH_PROPERTIES)
            .and_then(|properties| properties.child(TAG_PARAGRAPH_STYLE))
            .and_then(|style| style.attribute(ATTR_VALUE));
        let style_name = style_id.and_then(|id| styles.name(id));
        Self {
            element,
            style_id,
            style_name,
        }
    }

    /// Style identifier referenced by `w:pStyle`, e.g. `Heading1`
    pub fn style_id(&self) -> Option<&'a str> {
        self.style_id
    }

    /// Display name of the style from the style sheet, e.g. `heading 1`
    pub fn style_name(&self) -> Option<&'a str> {
        self.style_name
    }

    pub fn text(&self) -> String {
        let mut text = String::new();
        collect_text(self.element, &mut text);
        text
    }
}

/// Appends the visible text of `element`'s runs, descending through hyperlinks,
/// smart tags and similar wrappers. Deleted text (`w:delText`) is not collected.
pub(crate) fn collect_text(element: &Element, text: &mut String) {
    for child in element.elements() {
        match child.name.as_str() {
            TAG_TEXT => text.push_str(&child.text()),
            TAG_TAB => text.push('\t'),
            TAG_BREAK | TAG_CARRIAGE_RETURN => text.push('\n'),
            TAG_PARAGRAPH_PROPERTIES | TAG_RUN_PROPERTIES => (),
            _ => collect_text(child, text),
        }
    }
}

/// Builds a paragraph holding `text` in a single run, line breaks included
pub(crate) fn text_paragraph(text: &str) -> Element {
    let mut paragraph = Element::new(TAG_PARAGRAPH);
    if text.is_empty() {
        return paragraph;
    }

    let mut run = Element::new("w:r");
    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            run.push(Element::new(TAG_BREAK));
        }
        if line.is_empty() {
            continue;
        }
        let mut node = Element::new(TAG_TEXT);
        if line.starts_with(char::is_whitespace) || line.ends_with(char::is_whitespace) {
            node.set_attribute("xml:space", "preserve");
        }
        run.push(node.with_text(line));
    }
    paragraph.push(run);
    paragraph
}
