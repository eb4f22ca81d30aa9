//! # Resolver Module
//!
//! Turns a free-form instruction into one table of the indexed structure.
//!
//! The external semantic resolver proposes a `(header, table index)` pair. The
//! proposal is trusted only after it has been checked against the sections; when
//! it names a header without tables, a deterministic search picks the first table
//! whose header row shares more than half of the dataset's columns.
use crate::helpers::process::ProcessError;
use crate::resolver::prompt::build_prompt;
use crate::resolver::response::extract_candidate;
use crate::structure::describe;
use crate::structure::single_line;
use crate::structure::Section;
use crate::structure::TableRef;
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;
use tracing::info;
use tracing::warn;

mod command;
mod ollama;
mod prompt;
mod response;

pub use command::CommandResolver;
pub use ollama::OllamaResolver;

/// A table qualifies in the fallback search only when its overlap ratio exceeds this value
pub const FALLBACK_THRESHOLD: f64 = 0.5;

/// Errors raised by a semantic resolver backend
#[derive(Error, Debug)]
pub enum ResolverError {
    #[error("{0}")]
    ProcessError(#[from] ProcessError),

    #[error("Request to '{url}' failed: {message}")]
    HttpError { url: String, message: String },

    #[error("Invalid response from '{url}': {message}")]
    ResponseError { url: String, message: String },
}

/// An external oracle answering a natural-language prompt with raw text
pub trait SemanticResolver {
    fn complete(&self, prompt: &str) -> Result<String, ResolverError>;
}

impl<F> SemanticResolver for F
where
    F: Fn(&str) -> Result<String, ResolverError>,
{
    fn complete(&self, prompt: &str) -> Result<String, ResolverError> {
        self(prompt)
    }
}

/// Terminal failures of a resolution attempt
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolutionError {
    /// The resolver failed or its output held no usable JSON answer
    #[error("Semantic resolver unavailable: {0}")]
    ResolverUnavailable(String),

    /// Neither the proposed target nor the fallback search found a table
    #[error("No table found for header '{header}': {reason}")]
    NoMatch { header: String, reason: String },
}

/// Identifies the `table_index`-th table under the section headed `header_text`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolutionTarget {
    pub header_text: String,
    pub table_index: usize,
}

/// How a target was reached
#[derive(Clone, Debug, PartialEq)]
pub enum ResolutionPath {
    /// The resolver's proposal named a section with tables
    Direct,
    /// The proposal named a header without tables; the column overlap picked the table
    Fallback { requested_header: String, ratio: f64 },
}

/// A validated target together with the section it was found in
#[derive(Clone, Debug, PartialEq)]
pub struct Resolution {
    pub target: ResolutionTarget,
    pub section_index: usize,
    pub path: ResolutionPath,
}

impl Resolution {
    /// The referenced table within the sections this resolution was made against
    pub fn table<'a>(&self, sections: &'a [Section]) -> Option<&'a TableRef> {
        sections.get(self.section_index)?.tables.get(self.target.table_index)
    }
}

/// Resolves `instruction` to one table of `sections`.
///
/// `dataset_columns` are the columns of the data about to replace the table and
/// only matter to the fallback search.
pub fn resolve(
    instruction: &str,
    sections: &[Section],
    dataset_columns: &[String],
    resolver: &dyn SemanticResolver,
) -> Result<Resolution, ResolutionError> {
    let prompt = build_prompt(instruction, &describe(sections));
    debug!(prompt_length = prompt.len(), "Calling semantic resolver");
    let output = resolver
        .complete(&prompt)
        .map_err(|error| ResolutionError::ResolverUnavailable(error.to_string()))?;
    debug!(output = %output, "Semantic resolver answered");

    let candidate = extract_candidate(&output).ok_or_else(|| {
        ResolutionError::ResolverUnavailable(String::from(
            "no JSON object with 'header_text' and 'table_index_under_header' in resolver output",
        ))
    })?;
    let header = candidate.header_text.trim();
    let table_index = candidate.table_index_under_header;
    info!(header = header, table_index = table_index, "Resolver proposed target");

    let described = single_line(header);
    let matched = sections
        .iter()
        .enumerate()
        .find(|(_, section)| single_line(&section.header) == described);
    if let Some((section_index, section)) = matched {
        if !section.tables.is_empty() {
            if table_index >= section.tables.len() {
                Err(ResolutionError::NoMatch {
                    header: header.to_owned(),
                    reason: format!(
                        "table index {} is out of range, the section has {} table(s)",
                        table_index,
                        section.tables.len()
                    ),
                })?
            }
            return Ok(Resolution {
                target: ResolutionTarget {
                    header_text: section.header.to_owned(),
                    table_index,
                },
                section_index,
                path: ResolutionPath::Direct,
            });
        }
    }

    warn!(
        header = header,
        found = matched.is_some(),
        "Proposed header has no tables, searching by column overlap"
    );
    match fallback_search(sections, dataset_columns) {
        Some((section_index, table_index, ratio)) => {
            let section = &sections[section_index];
            info!(header = %section.header, table_index = table_index, ratio = ratio, "Fallback selected table");
            Ok(Resolution {
                target: ResolutionTarget {
                    header_text: section.header.to_owned(),
                    table_index,
                },
                section_index,
                path: ResolutionPath::Fallback {
                    requested_header: header.to_owned(),
                    ratio,
                },
            })
        }
        None => {
            let reason = match matched {
                Some(_) => "the section has no tables",
                None => "no section has this header",
            };
            Err(ResolutionError::NoMatch {
                header: header.to_owned(),
                reason: format!(
                    "{} and no table shares more than {} of the dataset columns",
                    reason, FALLBACK_THRESHOLD
                ),
            })
        }
    }
}

/// Share of the distinct dataset columns that also appear in the table's header row.
pub fn overlap_ratio(table_headers: &[String], dataset_columns: &[String]) -> f64 {
    let headers: HashSet<&str> = table_headers.iter().map(String::as_str).collect();
    let columns: HashSet<&str> = dataset_columns.iter().map(String::as_str).collect();
    let shared = headers.intersection(&columns).count();
    shared as f64 / columns.len().max(1) as f64
}

/// Returns `(section index, table index, ratio)` of the first table in document order
/// whose overlap ratio exceeds [`FALLBACK_THRESHOLD`]. Unreadable tables never qualify.
pub fn fallback_search(sections: &[Section], dataset_columns: &[String]) -> Option<(usize, usize, f64)> {
    sections.iter().enumerate().find_map(|(section_index, section)| {
        section.tables.iter().enumerate().find_map(|(table_index, table)| {
            let headers = table.header_cells().ok()?;
            let ratio = overlap_ratio(headers, dataset_columns);
            (ratio > FALLBACK_THRESHOLD).then_some((section_index, table_index, ratio))
        })
    })
}
