//! # Structure Module
//!
//! Groups the tables of a document body under the heading that precedes them.
//! The resulting sections are the only view of the document the resolver sees,
//! and a [`TableRef`] is what the replacer uses to find its table again.
use crate::document::element::Node;
use crate::document::paragraph::Paragraph;
use crate::document::paragraph::TAG_PARAGRAPH;
use crate::document::styles::HeadingDetector;
use crate::document::table::TableView;
use crate::document::table::TAG_TABLE;
use crate::document::Document;
use crate::document::DocumentError;
use thiserror::Error;
use tracing::debug;

mod description;

pub use description::describe;
pub(crate) use description::single_line;

/// Header of the section that collects tables placed before any heading
pub const NO_HEADER: &str = "NO_HEADER";

/// Reasons a table's header row cannot be read
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructureReadError {
    #[error("Table has no rows")]
    NoRows,
}

/// Handle to a table block of the document body.
///
/// Dimensions and header cells are captured when the document is indexed, so a
/// reference can be checked against the document before it is acted upon.
#[derive(Clone, Debug, PartialEq)]
pub struct TableRef {
    position: usize,
    rows: usize,
    columns: usize,
    header_cells: Result<Vec<String>, StructureReadError>,
}

impl TableRef {
    fn read(position: usize, view: TableView<'_>) -> Self {
        Self {
            position,
            rows: view.row_count(),
            columns: view.column_count(),
            header_cells: view.header_cells(),
        }
    }

    /// Index of the table among the body's children
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Trimmed texts of the row-0 cells, if the header row could be read
    pub fn header_cells(&self) -> Result<&[String], &StructureReadError> {
        self.header_cells.as_deref()
    }

    /// Returns true if `view` still looks like the table this reference was taken from
    pub fn matches(&self, view: &TableView<'_>) -> bool {
        self.rows == view.row_count() && self.columns == view.column_count() && self.header_cells == view.header_cells()
    }
}

/// A heading together with the tables that follow it up to the next heading
#[derive(Clone, Debug, PartialEq)]
pub struct Section {
    pub header: String,
    pub tables: Vec<TableRef>,
}

impl Section {
    fn new(header: &str) -> Self {
        Self {
            header: header.to_owned(),
            tables: Vec::new(),
        }
    }
}

/// Indexes the document body into sections, in document order.
///
/// Every heading opens a section, even when no table follows it. Tables found
/// before the first heading share a single [`NO_HEADER`] section.
pub fn index(document: &Document, detector: &dyn HeadingDetector) -> Result<Vec<Section>, DocumentError> {
    let body = document.body()?;
    let mut sections: Vec<Section> = Vec::new();
    for (position, node) in body.children.iter().enumerate() {
        let element = match node {
            Node::Element(element) => element,
            Node::Text(_) => continue,
        };

        if element.is(TAG_PARAGRAPH) {
            let paragraph = Paragraph::new(element, document.styles());
            if detector.is_heading(&paragraph) {
                sections.push(Section::new(paragraph.text().trim()));
            }
        } else if element.is(TAG_TABLE) {
            if sections.is_empty() {
                sections.push(Section::new(NO_HEADER));
            }
            let table = TableRef::read(position, TableView::new(element));
            if let Some(section) = sections.last_mut() {
                section.tables.push(table);
            }
        }
    }

    debug!(
        sections = sections.len(),
        tables = sections.iter().map(|section| section.tables.len()).sum::<usize>(),
        "Indexed document structure"
    );
    Ok(sections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::element::Element;
    use crate::document::fixtures;
    use crate::document::styles::StylePatternDetector;
    use pretty_assertions::assert_eq;

    fn headers(sections: &[Section]) -> Vec<&str> {
        sections.iter().map(|section| section.header.as_str()).collect()
    }

    fn table_counts(sections: &[Section]) -> Vec<usize> {
        sections.iter().map(|section| section.tables.len()).collect()
    }

    #[test]
    fn groups_tables_under_preceding_heading() {
        let document = fixtures::document(vec![
            fixtures::heading("  Loss Summary "),
            fixtures::paragraph("Figures in thousands"),
            fixtures::table(&[&["Year", "Incurred"], &["2020", "10"]]),
            fixtures::table(&[&["Year", "IBNR"], &["2020", "3"]]),
            fixtures::heading("Profiles"),
            fixtures::heading("Appendix"),
            fixtures::table(&[&["Profile"]]),
        ]);

        let sections = index(&document, &StylePatternDetector::default()).unwrap();
        assert_eq!(headers(&sections), vec!["Loss Summary", "Profiles", "Appendix"]);
        assert_eq!(table_counts(&sections), vec![2, 0, 1]);

        let first = &sections[0].tables[0];
        assert_eq!(first.position(), 2);
        assert_eq!(first.rows(), 2);
        assert_eq!(first.columns(), 2);
        assert_eq!(first.header_cells().unwrap(), &["Year".to_owned(), "Incurred".to_owned()]);
        assert_eq!(sections[2].tables[0].position(), 6);
    }

    #[test]
    fn leading_tables_share_one_no_header_section() {
        let document = fixtures::document(vec![
            fixtures::table(&[&["A"]]),
            fixtures::paragraph("between"),
            fixtures::table(&[&["B"]]),
            fixtures::heading("Results"),
            fixtures::table(&[&["C"]]),
        ]);

        let sections = index(&document, &StylePatternDetector::default()).unwrap();
        assert_eq!(headers(&sections), vec![NO_HEADER, "Results"]);
        assert_eq!(table_counts(&sections), vec![2, 1]);
    }

    #[test]
    fn document_without_tables_or_headings_is_empty() {
        let document = fixtures::document(vec![fixtures::paragraph("Just prose")]);
        assert!(index(&document, &StylePatternDetector::default()).unwrap().is_empty());
    }

    #[test]
    fn tables_without_rows_are_kept_as_unreadable() {
        let document = fixtures::document(vec![fixtures::heading("Empty"), Element::new(TAG_TABLE)]);

        let sections = index(&document, &StylePatternDetector::default()).unwrap();
        let table = &sections[0].tables[0];
        assert_eq!(table.rows(), 0);
        assert_eq!(table.header_cells(), Err(&StructureReadError::NoRows));
    }

    #[test]
    fn reindexing_unchanged_document_is_stable() {
        let document = fixtures::document(vec![
            fixtures::table(&[&["A", "B"], &["1", "2"]]),
            fixtures::heading("Summary"),
            fixtures::table(&[&["C"], &["3"], &["4"]]),
        ]);
        let detector = StylePatternDetector::default();

        assert_eq!(index(&document, &detector).unwrap(), index(&document, &detector).unwrap());
    }

    #[test]
    fn detector_decides_what_counts_as_heading() {
        let document = fixtures::document(vec![
            fixtures::styled_paragraph("Title", "Annual report"),
            fixtures::heading("Summary"),
            fixtures::table(&[&["A"]]),
        ]);

        let detector = StylePatternDetector::new("^Title$").unwrap();
        let sections = index(&document, &detector).unwrap();
        assert_eq!(headers(&sections), vec!["Annual report"]);
        assert_eq!(table_counts(&sections), vec![1]);
    }

    #[test]
    fn reference_matches_only_its_own_table() {
        let element = fixtures::table(&[&["Year", "Incurred"], &["2020", "10"]]);
        let reference = TableRef::read(0, TableView::new(&element));

        assert!(reference.matches(&TableView::new(&element)));
        let longer = fixtures::table(&[&["Year", "Incurred"], &["2020", "10"], &["2021", "11"]]);
        assert!(!reference.matches(&TableView::new(&longer)));
        let renamed = fixtures::table(&[&["Year", "Paid"], &["2020", "10"]]);
        assert!(!reference.matches(&TableView::new(&renamed)));
    }
}
