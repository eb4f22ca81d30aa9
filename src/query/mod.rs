//! # Query Module
//!
//! Produces the dataset that replaces a table. A [`QueryService`] turns a prompt
//! into a query and runs it; the result is a rectangular [`Dataset`] of texts.
use crate::error::RustyReportError;
use std::fmt;
use thiserror::Error;

mod database;

pub use database::DuckDbQueryService;
pub use database::SqlSource;

/// Errors raised while building a dataset
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DatasetError {
    #[error("Row {row} has {found} values but the dataset has {expected} columns")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Errors raised by a query service before any query runs
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Query prompt is empty")]
    EmptyPrompt,

    #[error("SQL generator returned no statement for prompt '{0}'")]
    EmptyStatement(String),
}

/// Rectangular result set: ordered column names and ordered rows, every value as text
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, DatasetError> {
        if let Some((row, values)) = rows.iter().enumerate().find(|(_, values)| values.len() != columns.len()) {
            Err(DatasetError::RaggedRow {
                row,
                expected: columns.len(),
                found: values.len(),
            })?
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Renders at most `max_rows` rows as an aligned text grid
    pub fn preview(&self, max_rows: usize) -> String {
        let shown = &self.rows[..self.rows.len().min(max_rows)];
        let mut widths: Vec<usize> = self.columns.iter().map(|column| column.chars().count()).collect();
        for row in shown {
            for (width, value) in widths.iter_mut().zip(row) {
                *width = (*width).max(value.chars().count());
            }
        }

        let mut lines = vec![grid_line(&self.columns, &widths)];
        lines.push(
            widths
                .iter()
                .map(|width| "-".repeat(*width))
                .collect::<Vec<_>>()
                .join("-+-"),
        );
        lines.extend(shown.iter().map(|row| grid_line(row, &widths)));
        if shown.len() < self.rows.len() {
            lines.push(format!("... {} more row(s)", self.rows.len() - shown.len()));
        }
        lines.join("\n")
    }
}

fn grid_line(values: &[String], widths: &[usize]) -> String {
    values
        .iter()
        .zip(widths)
        .map(|(value, width)| format!("{:<width$}", value, width = width))
        .collect::<Vec<_>>()
        .join(" | ")
        .trim_end()
        .to_owned()
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.preview(usize::MAX))
    }
}

/// The query text that was run together with its result
#[derive(Clone, Debug, PartialEq)]
pub struct QueryResult {
    pub query: String,
    pub dataset: Dataset,
}

/// Turns a natural-language or SQL prompt into a dataset
pub trait QueryService {
    fn fetch(&self, prompt: &str) -> Result<QueryResult, RustyReportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn rejects_ragged_rows() {
        let error = Dataset::new(strings(&["Year", "Incurred"]), vec![strings(&["2020", "10"]), strings(&["2021"])]).unwrap_err();
        assert_eq!(
            error,
            DatasetError::RaggedRow {
                row: 1,
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn displays_aligned_grid() {
        let dataset = Dataset::new(
            strings(&["ExposureYear", "IBNR"]),
            vec![strings(&["2020", "1250.5"]), strings(&["2021", ""])],
        )
        .unwrap();

        let expected = concat!(
            "ExposureYear | IBNR\n",
            "-------------+-------\n",
            "2020         | 1250.5\n",
            "2021         |",
        );
        assert_eq!(dataset.to_string(), expected);
        assert_eq!(dataset.row_count(), 2);
        assert_eq!(dataset.column_count(), 2);
    }

    #[test]
    fn preview_reports_hidden_rows() {
        let rows = (0..5).map(|index| vec![index.to_string()]).collect();
        let dataset = Dataset::new(strings(&["n"]), rows).unwrap();

        assert_eq!(dataset.preview(2), "n\n-\n0\n1\n... 3 more row(s)");
    }
}
