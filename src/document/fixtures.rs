//! Element builders shared by the unit tests.

use crate::document::element::Element;
use crate::document::paragraph::text_paragraph;
use crate::document::styles::StyleSheet;
use crate::document::table::text_cell;
use crate::document::table::CellWidth;
use crate::document::Document;

pub(crate) const NAMESPACE: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

pub(crate) fn styles() -> StyleSheet {
    let mut styles = StyleSheet::default();
    styles.insert("Heading1", "heading 1");
    styles.insert("Heading2", "heading 2");
    styles.insert("Normal", "Normal");
    styles
}

pub(crate) fn styled_paragraph(style: &str, text: &str) -> Element {
    let mut paragraph = text_paragraph(text);
    let properties = Element::new("w:pPr").with_child(Element::new("w:pStyle").with_attribute("w:val", style));
    paragraph.children.insert(0, crate::document::element::Node::Element(properties));
    paragraph
}

pub(crate) fn heading(text: &str) -> Element {
    styled_paragraph("Heading1", text)
}

pub(crate) fn paragraph(text: &str) -> Element {
    styled_paragraph("Normal", text)
}

/// Table whose column `i` is `1000 * (i + 1)` twips wide
pub(crate) fn table(rows: &[&[&str]]) -> Element {
    let columns = rows.first().map(|row| row.len()).unwrap_or(0);
    let widths: Vec<Option<u32>> = (0..columns).map(|column| Some(1000 * (column as u32 + 1))).collect();
    table_with_widths(rows, &widths)
}

pub(crate) fn table_with_widths(rows: &[&[&str]], widths: &[Option<u32>]) -> Element {
    let mut properties = Element::new("w:tblPr")
        .with_child(Element::new("w:tblStyle").with_attribute("w:val", "GridTable4"))
        .with_child(Element::new("w:tblW").with_attribute("w:w", "0").with_attribute("w:type", "auto"));
    properties.push(Element::new("w:tblLook").with_attribute("w:val", "04A0"));

    let mut grid = Element::new("w:tblGrid");
    for width in widths {
        let column = Element::new("w:gridCol");
        grid.push(match width {
            Some(width) => column.with_attribute("w:w", &width.to_string()),
            None => column,
        });
    }

    let mut table = Element::new("w:tbl").with_child(properties).with_child(grid);
    for (index, values) in rows.iter().enumerate() {
        let mut row = Element::new("w:tr");
        if index == 0 {
            row.push(Element::new("w:trPr").with_child(Element::new("w:tblHeader")));
        }
        for (column, value) in values.iter().enumerate() {
            let width = widths.get(column).copied().flatten().map(|width| CellWidth {
                value: width.to_string(),
                kind: Some("dxa".to_owned()),
            });
            row.push(text_cell(value, width.as_ref()));
        }
        table.push(row);
    }
    table
}

/// In-memory document whose body holds `blocks` followed by section properties
pub(crate) fn document(blocks: Vec<Element>) -> Document {
    let mut body = Element::new("w:body");
    for block in blocks {
        body.push(block);
    }
    body.push(Element::new("w:sectPr"));
    let root = Element::new("w:document").with_attribute("xmlns:w", NAMESPACE).with_child(body);
    Document::from_parts(root, styles())
}
