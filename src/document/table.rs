use crate::document::element::Element;
use crate::document::paragraph::collect_text;
use crate::document::paragraph::text_paragraph;
use crate::document::paragraph::TAG_PARAGRAPH;
use crate::structure::StructureReadError;

pub(crate) const TAG_TABLE: &str = "w:tbl";
pub(crate) const TAG_TABLE_PROPERTIES: &str = "w:tblPr";
pub(crate) const TAG_TABLE_GRID: &str = "w:tblGrid";
pub(crate) const TAG_GRID_COLUMN: &str = "w:gridCol";
pub(crate) const TAG_ROW: &str = "w:tr";
pub(crate) const TAG_ROW_PROPERTIES: &str = "w:trPr";
pub(crate) const TAG_CELL: &str = "w:tc";
const TAG_CELL_PROPERTIES: &str = "w:tcPr";
const TAG_CELL_WIDTH: &str = "w:tcW";
const ATTR_WIDTH: &str = "w:w";
const ATTR_WIDTH_TYPE: &str = "w:type";

/// Width of a table cell as declared by `w:tcW`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellWidth {
    /// Raw `w:w` value (twentieths of a point for `dxa`, fiftieths of a percent for `pct`)
    pub value: String,
    /// Raw `w:type` value; absent means `dxa`
    pub kind: Option<String>,
}

impl CellWidth {
    fn read(cell: &Element) -> Option<Self> {
        let width = cell.child(TAG_CELL_PROPERTIES)?.child(TAG_CELL_WIDTH)?;
        Some(Self {
            value: width.attribute(ATTR_WIDTH)?.to_owned(),
            kind: width.attribute(ATTR_WIDTH_TYPE).map(str::to_owned),
        })
    }

    /// Absolute widths can also size a grid column
    pub fn is_absolute(&self) -> bool {
        matches!(self.kind.as_deref(), None | Some("dxa"))
    }

    pub(crate) fn to_element(&self) -> Element {
        let element = Element::new(TAG_CELL_WIDTH).with_attribute(ATTR_WIDTH, &self.value);
        match &self.kind {
            Some(kind) => element.with_attribute(ATTR_WIDTH_TYPE, kind),
            None => element,
        }
    }
}

/// Read-only view over a `w:tbl` element
#[derive(Clone, Copy)]
pub struct TableView<'a> {
    element: &'a Element,
}

impl<'a> TableView<'a> {
    pub fn new(element: &'a Element) -> Self {
        Self { element }
    }

    pub fn rows(&self) -> impl Iterator<Item = &'a Element> {
        self.element.children_named(TAG_ROW)
    }

    pub fn row_count(&self) -> usize {
        self.rows().count()
    }

    /// Number of grid columns, or the widest row when the grid is missing
    pub fn column_count(&self) -> usize {
        let grid = self.grid_columns().len();
        if grid > 0 {
            grid
        } else {
            self.rows()
                .map(|row| row.children_named(TAG_CELL).count())
                .max()
                .unwrap_or(0)
        }
    }

    pub fn properties(&self) -> Option<&'a Element> {
        self.element.child(TAG_TABLE_PROPERTIES)
    }

    pub fn grid_columns(&self) -> Vec<&'a Element> {
        self.element
            .child(TAG_TABLE_GRID)
            .map(|grid| grid.children_named(TAG_GRID_COLUMN).collect())
            .unwrap_or_default()
    }

    /// Row properties of the header row (repeat-as-header flag, height, ...)
    pub fn header_row_properties(&self) -> Option<&'a Element> {
        self.rows().next()?.child(TAG_ROW_PROPERTIES)
    }

    /// Trimmed text of every cell in row 0
    pub fn header_cells(&self) -> Result<Vec<String>, StructureReadError> {
        let row = self.rows().next().ok_or(StructureReadError::NoRows)?;
        Ok(row.children_named(TAG_CELL).map(cell_text).collect())
    }

    /// Width of the row-0 cell in each column; `None` where the cell or its width is missing
    pub fn column_widths(&self) -> Vec<Option<CellWidth>> {
        let cells: Vec<&Element> = self
            .rows()
            .next()
            .map(|row| row.children_named(TAG_CELL).collect())
            .unwrap_or_default();
        (0..self.column_count())
            .map(|column| cells.get(column).and_then(|cell| CellWidth::read(cell)))
            .collect()
    }
}

/// Cell text with paragraphs joined by newlines, trimmed
fn cell_text(cell: &Element) -> String {
    let paragraphs: Vec<String> = cell
        .children_named(TAG_PARAGRAPH)
        .map(|paragraph| {
            let mut text = String::new();
            collect_text(paragraph, &mut text);
            text
        })
        .collect();
    paragraphs.join("\n").trim().to_owned()
}

/// Builds a `w:tc` holding `text`, sized by `width` when given
pub(crate) fn text_cell(text: &str, width: Option<&CellWidth>) -> Element {
    let mut cell = Element::new(TAG_CELL);
    if let Some(width) = width {
        cell.push(Element::new(TAG_CELL_PROPERTIES).with_child(width.to_element()));
    }
    cell.push(text_paragraph(text));
    cell
}
