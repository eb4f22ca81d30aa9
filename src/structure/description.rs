use crate::structure::Section;
use crate::structure::TableRef;
use std::fmt::Write;

/// Renders the sections as plain, line-oriented text for the resolver prompt.
///
/// ```text
/// [Section 0] Header: "Loss Summary"
///   - Table 0: 3 rows x 2 cols | Columns: ["Year", "Incurred"]
/// ```
pub fn describe(sections: &[Section]) -> String {
    let mut description = String::new();
    for (section_index, section) in sections.iter().enumerate() {
        if section_index > 0 {
            description.push('\n');
        }
        // Writing into a String cannot fail
        let _ = writeln!(description, "[Section {}] Header: \"{}\"", section_index, single_line(&section.header));
        for (table_index, table) in section.tables.iter().enumerate() {
            let _ = writeln!(description, "  - Table {}: {}", table_index, describe_table(table));
        }
    }
    description
}

fn describe_table(table: &TableRef) -> String {
    match table.header_cells() {
        Ok(cells) => {
            let columns: Vec<String> = cells.iter().map(|cell| format!("\"{}\"", single_line(cell))).collect();
            format!(
                "{} rows x {} cols | Columns: [{}]",
                table.rows(),
                table.columns(),
                columns.join(", ")
            )
        }
        Err(error) => format!("Could not extract columns ({})", error),
    }
}

/// Collapses whitespace runs, line breaks included, and swaps double quotes so
/// every value stays on one line inside its quotes. Headers are compared in this
/// form, since it is the only form a resolver ever sees.
pub(crate) fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ").replace('"', "'")
}
