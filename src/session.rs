//! # Session Module
//!
//! One update cycle: index the document, resolve the instruction against the
//! fresh index and replace the resolved table. The session owns its document,
//! so sections are never reused across cycles.
use crate::document::styles::HeadingDetector;
use crate::document::Document;
use crate::document::DocumentError;
use crate::error::RustyReportError;
use crate::query::Dataset;
use crate::replace::replace_table;
use crate::replace::ReplacementError;
use crate::resolver::resolve;
use crate::resolver::ResolutionError;
use crate::resolver::ResolutionPath;
use crate::resolver::ResolutionTarget;
use crate::resolver::SemanticResolver;
use crate::structure::describe;
use crate::structure::index;
use crate::structure::Section;
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Failure of an update cycle, tagged with the stage it happened in
#[derive(Error, Debug)]
pub enum UpdateError {
    #[error("Index document structure failed: {0}")]
    StructureError(#[from] DocumentError),

    #[error("Resolve instruction failed: {0}")]
    ResolutionError(#[from] ResolutionError),

    #[error("Replace table {table_index} under '{header}' failed: {source}")]
    ReplacementError {
        header: String,
        table_index: usize,
        #[source]
        source: ReplacementError,
    },
}

/// What an update cycle changed
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateReport {
    pub target: ResolutionTarget,
    pub path: ResolutionPath,
    /// Position of the table among the body's children
    pub position: usize,
    pub old_rows: usize,
    pub old_columns: usize,
    pub new_rows: usize,
    pub new_columns: usize,
}

impl fmt::Display for UpdateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Replaced table {} under '{}' ({} rows x {} cols -> {} rows x {} cols)",
            self.target.table_index, self.target.header_text, self.old_rows, self.old_columns, self.new_rows, self.new_columns
        )?;
        if let ResolutionPath::Fallback { requested_header, ratio } = &self.path {
            write!(f, ", chosen by column overlap {:.2} instead of '{}'", ratio, requested_header)?;
        }
        Ok(())
    }
}

/// A document being updated, with the collaborators each cycle needs
pub struct UpdateSession<'a> {
    document: Document,
    detector: &'a dyn HeadingDetector,
    resolver: &'a dyn SemanticResolver,
}

impl<'a> UpdateSession<'a> {
    pub fn new(document: Document, detector: &'a dyn HeadingDetector, resolver: &'a dyn SemanticResolver) -> Self {
        Self {
            document,
            detector,
            resolver,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    /// Indexes the current state of the document
    pub fn sections(&self) -> Result<Vec<Section>, DocumentError> {
        index(&self.document, self.detector)
    }

    pub fn describe(&self) -> Result<String, DocumentError> {
        Ok(describe(&self.sections()?))
    }

    /// Runs one cycle: replaces the table `instruction` refers to with `dataset`.
    ///
    /// Nothing is retried; on error the caller decides whether to try another instruction.
    pub fn apply(&mut self, instruction: &str, dataset: &Dataset) -> Result<UpdateReport, UpdateError> {
        let sections = self.sections()?;
        let resolution = resolve(instruction, &sections, dataset.columns(), self.resolver)?;
        let table = resolution.table(&sections).ok_or_else(|| ResolutionError::NoMatch {
            header: resolution.target.header_text.to_owned(),
            reason: format!("table index {} is out of range", resolution.target.table_index),
        })?;

        replace_table(&mut self.document, table, dataset).map_err(|source| UpdateError::ReplacementError {
            header: resolution.target.header_text.to_owned(),
            table_index: resolution.target.table_index,
            source,
        })?;

        let report = UpdateReport {
            target: resolution.target.clone(),
            path: resolution.path.clone(),
            position: table.position(),
            old_rows: table.rows(),
            old_columns: table.columns(),
            new_rows: dataset.row_count() + 1,
            new_columns: dataset.column_count(),
        };
        info!(report = %report, "Update cycle finished");
        Ok(report)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RustyReportError> {
        self.document.save(path)
    }
}
