//! # Replace Module
//!
//! Swaps a table of the document for a new one built from a dataset. The new
//! table keeps the old table's properties, header row properties and column
//! widths, and takes exactly the old table's slot in the body.
use crate::document::element::Element;
use crate::document::element::Node;
use crate::document::table::text_cell;
use crate::document::table::TableView;
use crate::document::table::TAG_GRID_COLUMN;
use crate::document::table::TAG_ROW;
use crate::document::table::TAG_TABLE;
use crate::document::table::TAG_TABLE_GRID;
use crate::document::table::TAG_TABLE_PROPERTIES;
use crate::document::Document;
use crate::document::DocumentError;
use crate::query::Dataset;
use crate::structure::TableRef;
use thiserror::Error;
use tracing::info;

/// Errors raised while replacing a table
#[derive(Error, Debug)]
pub enum ReplacementError {
    #[error("{0}")]
    DocumentError(#[from] DocumentError),

    #[error("Dataset has no columns")]
    NoColumns,

    #[error("Body element at position {0} is not a table")]
    NotATable(usize),

    #[error("Table at position {0} changed since the document was indexed")]
    StaleReference(usize),
}

/// Replaces the table referenced by `table` with the contents of `dataset`.
///
/// The replacement is built completely before the old table is touched, so on
/// error the document is left as it was.
pub fn replace_table(document: &mut Document, table: &TableRef, dataset: &Dataset) -> Result<(), ReplacementError> {
    if dataset.column_count() == 0 {
        Err(ReplacementError::NoColumns)?
    }

    let position = table.position();
    let replacement = match document.body()?.children.get(position) {
        Some(Node::Element(element)) if element.is(TAG_TABLE) => {
            let view = TableView::new(element);
            if !table.matches(&view) {
                Err(ReplacementError::StaleReference(position))?
            }
            build_table(&view, dataset)
        }
        _ => Err(ReplacementError::NotATable(position))?,
    };

    let slot = document
        .body_mut()?
        .children
        .get_mut(position)
        .ok_or(ReplacementError::NotATable(position))?;
    *slot = Node::Element(replacement);
    info!(
        position = position,
        old_rows = table.rows(),
        old_columns = table.columns(),
        rows = dataset.row_count() + 1,
        columns = dataset.column_count(),
        "Replaced table"
    );
    Ok(())
}

/// Builds a table holding `dataset` (a header row followed by one row per record),
/// formatted like `old`.
pub fn build_table(old: &TableView<'_>, dataset: &Dataset) -> Element {
    let widths = old.column_widths();
    let width = |column: usize| widths.get(column).and_then(Option::as_ref);

    let properties = old.properties().cloned().unwrap_or_else(default_properties);
    let old_grid = old.grid_columns();
    let mut grid = Element::new(TAG_TABLE_GRID);
    for column in 0..dataset.column_count() {
        let grid_column = match (old_grid.get(column), width(column)) {
            (Some(existing), _) => (*existing).clone(),
            (None, Some(width)) if width.is_absolute() => Element::new(TAG_GRID_COLUMN).with_attribute("w:w", &width.value),
            (None, _) => Element::new(TAG_GRID_COLUMN),
        };
        grid.push(grid_column);
    }

    let mut table = Element::new(TAG_TABLE).with_child(properties).with_child(grid);

    let mut header = Element::new(TAG_ROW);
    if let Some(row_properties) = old.header_row_properties() {
        header.push(row_properties.clone());
    }
    for (column, name) in dataset.columns().iter().enumerate() {
        header.push(text_cell(name, width(column)));
    }
    table.push(header);

    for record in dataset.rows() {
        let mut row = Element::new(TAG_ROW);
        for (column, value) in record.iter().enumerate() {
            row.push(text_cell(value, width(column)));
        }
        table.push(row);
    }
    table
}

/// Table properties of a table created without a template
fn default_properties() -> Element {
    Element::new(TAG_TABLE_PROPERTIES).with_child(Element::new("w:tblW").with_attribute("w:w", "0").with_attribute("w:type", "auto"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::fixtures;
    use crate::document::styles::StylePatternDetector;
    use crate::document::table::CellWidth;
    use crate::document::table::TAG_CELL;
    use crate::document::table::TAG_ROW_PROPERTIES;
    use crate::structure::index;
    use pretty_assertions::assert_eq;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn dataset() -> Dataset {
        Dataset::new(
            strings(&["ExposureYear", "Incurred", "IBNR"]),
            vec![strings(&["2020", "10.5", "2"]), strings(&["2021", "7.25", ""])],
        )
        .unwrap()
    }

    fn report() -> Document {
        fixtures::document(vec![
            fixtures::heading("Loss Summary"),
            fixtures::paragraph("Figures in thousands"),
            fixtures::table(&[&["Year", "Incurred"], &["2019", "3"]]),
            fixtures::paragraph("Source: claims system"),
        ])
    }

    fn first_table(document: &Document) -> TableRef {
        index(document, &StylePatternDetector::default()).unwrap()[0].tables[0].clone()
    }

    fn body_names(document: &Document) -> Vec<String> {
        document.body().unwrap().elements().map(|element| element.name.to_owned()).collect()
    }

    #[test]
    fn new_table_takes_the_old_slot() {
        let mut document = report();
        let before = body_names(&document);
        assert_eq!(before.len(), 5);
        let table = first_table(&document);
        assert_eq!(table.position(), 2);

        replace_table(&mut document, &table, &dataset()).unwrap();

        assert_eq!(body_names(&document), before);
        let replaced = first_table(&document);
        assert_eq!(replaced.position(), 2);
        assert_eq!(replaced.rows(), 3);
        assert_eq!(replaced.columns(), 3);
        assert_eq!(replaced.header_cells().unwrap(), strings(&["ExposureYear", "Incurred", "IBNR"]).as_slice());
    }

    #[test]
    fn keeps_style_header_row_properties_and_widths() {
        let old = fixtures::table(&[&["Year", "Incurred"], &["2019", "3"]]);
        let view = TableView::new(&old);

        let table = build_table(&view, &dataset());
        assert_eq!(table.child(TAG_TABLE_PROPERTIES), old.child(TAG_TABLE_PROPERTIES));

        let grid: Vec<Option<&str>> = TableView::new(&table)
            .grid_columns()
            .iter()
            .map(|column| column.attribute("w:w"))
            .collect();
        assert_eq!(grid, vec![Some("1000"), Some("2000"), None]);

        let rows: Vec<&Element> = TableView::new(&table).rows().collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].child(TAG_ROW_PROPERTIES), view.header_row_properties());
        assert!(rows[1].child(TAG_ROW_PROPERTIES).is_none());
        for row in rows {
            let widths: Vec<Option<CellWidth>> = TableView::new(&Element::new(TAG_TABLE).with_child(row.clone())).column_widths();
            assert_eq!(widths.len(), 3);
            assert_eq!(widths[0].as_ref().map(|width| width.value.as_str()), Some("1000"));
            assert_eq!(widths[1].as_ref().map(|width| width.value.as_str()), Some("2000"));
            assert_eq!(widths[2], None);
            assert_eq!(row.children_named(TAG_CELL).count(), 3);
        }
    }

    #[test]
    fn writes_values_as_text() {
        let old = fixtures::table(&[&["Year"]]);
        let table = build_table(&TableView::new(&old), &dataset());

        let document = fixtures::document(vec![table]);
        let sections = index(&document, &StylePatternDetector::default()).unwrap();
        assert_eq!(sections[0].tables[0].header_cells().unwrap(), strings(&["ExposureYear", "Incurred", "IBNR"]).as_slice());

        let body = document.body().unwrap();
        let texts: Vec<String> = TableView::new(body.child(TAG_TABLE).unwrap())
            .rows()
            .nth(2)
            .unwrap()
            .children_named(TAG_CELL)
            .map(|cell| {
                let mut text = String::new();
                crate::document::paragraph::collect_text(cell, &mut text);
                text
            })
            .collect();
        assert_eq!(texts, strings(&["2021", "7.25", ""]));
    }

    #[test]
    fn unformatted_old_table_gets_default_properties() {
        let old = Element::new(TAG_TABLE).with_child(Element::new(TAG_ROW).with_child(text_cell("A", None)));

        let table = build_table(&TableView::new(&old), &dataset());
        assert_eq!(table.child(TAG_TABLE_PROPERTIES), Some(&default_properties()));
        assert_eq!(TableView::new(&table).grid_columns().len(), 3);
        assert!(TableView::new(&table).column_widths().iter().all(Option::is_none));
    }

    #[test]
    fn changed_table_is_rejected_and_left_alone() {
        let mut document = report();
        let table = first_table(&document);
        if let Some(Node::Element(element)) = document.body_mut().unwrap().children.get_mut(2) {
            element.push(Element::new(TAG_ROW).with_child(text_cell("2020", None)));
        }
        let before = document.root().clone();

        let error = replace_table(&mut document, &table, &dataset()).unwrap_err();
        assert!(matches!(error, ReplacementError::StaleReference(2)));
        assert_eq!(document.root(), &before);
    }

    #[test]
    fn shifted_reference_is_not_a_table() {
        let mut document = report();
        let table = first_table(&document);
        document.body_mut().unwrap().children.insert(0, Node::Element(fixtures::paragraph("Preface")));

        let error = replace_table(&mut document, &table, &dataset()).unwrap_err();
        assert!(matches!(error, ReplacementError::NotATable(2)));
    }

    #[test]
    fn dataset_without_columns_is_rejected() {
        let mut document = report();
        let table = first_table(&document);

        let error = replace_table(&mut document, &table, &Dataset::default()).unwrap_err();
        assert!(matches!(error, ReplacementError::NoColumns));
    }
}
