/// Builds the resolver prompt around the structure description.
pub(crate) fn build_prompt(instruction: &str, description: &str) -> String {
    format!(
        r#"You are helping identify the correct table to update in a Word document.

The document contains several sections. Each section has a header and a list of tables.
Each table is listed with:
- its index, counted from 0 within its section,
- its number of rows and columns,
- the texts of its header row, which may vary slightly between documents.

Document structure:
{description}
The user's instruction is:
"""{instruction}"""

Notes:
- The header text in the instruction may differ slightly from the header in the document.
- The number and order of columns of the correct table match the schema the instruction describes.
- Choose the table under the best matching header with the most similar column order and count.

Answer strictly with JSON in this format:
{{"header_text": "Exact header from the document", "table_index_under_header": 0}}
"#,
        description = description,
        instruction = instruction.trim(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embeds_instruction_and_structure() {
        let prompt = build_prompt("  update the loss table ", "[Section 0] Header: \"Losses\"\n");

        assert!(prompt.contains("[Section 0] Header: \"Losses\"\n"));
        assert!(prompt.contains("\"\"\"update the loss table\"\"\""));
        assert!(prompt.contains(r#"{"header_text": "Exact header from the document", "table_index_under_header": 0}"#));
    }
}
