//! Style sheet lookup and heading detection.

use crate::document::element::Element;
use crate::document::paragraph::Paragraph;
use regex::Regex;
use std::collections::HashMap;

const TAG_STYLE: &str = "w:style";
const TAG_STYLE_NAME: &str = "w:name";
const ATTR_STYLE_ID: &str = "w:styleId";
const ATTR_VALUE: &str = "w:val";

/// Maps style identifiers to their display names, as declared in `word/styles.xml`
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StyleSheet {
    names: HashMap<String, String>,
}

impl StyleSheet {
    /// Builds the style sheet from a parsed `w:styles` element
    pub fn from_element(root: &Element) -> Self {
        let names = root
            .children_named(TAG_STYLE)
            .filter_map(|style| {
                let id = style.attribute(ATTR_STYLE_ID)?;
                let name = style.child(TAG_STYLE_NAME)?.attribute(ATTR_VALUE)?;
                Some((id.to_owned(), name.to_owned()))
            })
            .collect();
        Self { names }
    }

    pub fn insert(&mut self, id: &str, name: &str) {
        self.names.insert(id.to_owned(), name.to_owned());
    }

    pub fn name(&self, id: &str) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Decides whether a paragraph opens a new section.
pub trait HeadingDetector {
    fn is_heading(&self, paragraph: &Paragraph<'_>) -> bool;
}

/// Treats a paragraph as a heading when its style name, or its style id when
/// the style sheet has no entry, matches a regular expression.
#[derive(Clone, Debug)]
pub struct StylePatternDetector {
    pattern: Regex,
}

impl StylePatternDetector {
    pub const DEFAULT_PATTERN: &'static str = "(?i)^heading";

    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }
}

impl Default for StylePatternDetector {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PATTERN).expect("Hardcoded heading pattern")
    }
}

impl HeadingDetector for StylePatternDetector {
    fn is_heading(&self, paragraph: &Paragraph<'_>) -> bool {
        paragraph
            .style_name()
            .or(paragraph.style_id())
            .map(|style| self.pattern.is_match(style))
            .unwrap_or(false)
    }
}
