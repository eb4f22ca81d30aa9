//! # Document Module
//!
//! Loads a WordprocessingML (`.docx`) package into an owned element tree, exposes
//! the body's block sequence to the structure indexer and writes the package back.
//! Every part other than the main document part is carried through verbatim.
use crate::document::element::read_tree;
use crate::document::element::write_tree;
use crate::document::element::Element;
use crate::document::package::load_relationships;
use crate::document::package::read_entries;
use crate::document::package::relationships_path;
use crate::document::package::resolve_target;
use crate::document::package::write_entries;
use crate::document::package::PackageEntry;
use crate::document::styles::StyleSheet;
use crate::error::ResultMessage;
use crate::error::RustyReportError;
use crate::helpers::zip::ZipHelper;
use std::fs;
use std::fs::File;
use std::io::BufReader;
use std::io::Cursor;
use std::io::Read;
use std::io::Seek;
use std::path::Path;
use thiserror::Error;
use tracing::debug;
use tracing::info;
use zip::ZipArchive;

pub mod element;
#[cfg(test)]
pub(crate) mod fixtures;
mod package;
pub mod paragraph;
pub mod styles;
pub mod table;

const TAG_DOCUMENT: &str = "w:document";
pub(crate) const TAG_BODY: &str = "w:body";
const DEFAULT_MAIN_PART: &str = "word/document.xml";
const DEFAULT_STYLES_PART: &str = "word/styles.xml";
const PACKAGE_RELATIONSHIPS: &str = "_rels/.rels";
const RELATIONSHIP_OFFICE_DOCUMENT: &str = "/officeDocument";
const RELATIONSHIP_STYLES: &str = "/styles";

/// Custom error types for document structure problems.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// A required package part is absent
    #[error("Missing package part '{0}'")]
    MissingPart(String),

    /// The main part is not a WordprocessingML document
    #[error("Unexpected root element '{0}' in main document part")]
    UnexpectedRoot(String),

    /// The document element has no body
    #[error("Document has no body element")]
    MissingBody,
}

/// An open `.docx` document.
///
/// The main part is held as a mutable element tree; the body's children are the
/// document's blocks in order.
pub struct Document {
    name: String,
    main_part: String,
    entries: Vec<PackageEntry>,
    root: Element,
    styles: StyleSheet,
}

impl Document {
    /// Opens a `.docx` file from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RustyReportError> {
        let path = path.as_ref();
        let name = path.display().to_string();
        File::open(path)
            .map_err(RustyReportError::from)
            .and_then(|file| Self::from_reader(&name, BufReader::new(file)))
            .with_prefix(&format!("Open document '{}'", name))
    }

    /// Reads a `.docx` package from memory; `name` labels it in messages and output.
    pub fn from_bytes(name: &str, bytes: Vec<u8>) -> Result<Self, RustyReportError> {
        Self::from_reader(name, Cursor::new(bytes))
    }

    fn from_reader<RS: Read + Seek>(name: &str, reader: RS) -> Result<Self, RustyReportError> {
        let mut zip = ZipArchive::new(reader)?;

        let main_part = load_relationships(&mut zip, PACKAGE_RELATIONSHIPS)?
            .into_iter()
            .find(|relationship| relationship.kind.ends_with(RELATIONSHIP_OFFICE_DOCUMENT))
            .map(|relationship| resolve_target("", &relationship.target))
            .unwrap_or_else(|| DEFAULT_MAIN_PART.to_owned());
        let root = match zip.xml_reader(&main_part)? {
            Some(mut reader) => read_tree(&mut reader, &main_part)?,
            None => Err(DocumentError::MissingPart(main_part.to_owned()))?,
        };
        if !root.is(TAG_DOCUMENT) {
            Err(DocumentError::UnexpectedRoot(root.name.to_owned()))?
        }

        let styles_part = load_relationships(&mut zip, &relationships_path(&main_part))?
            .into_iter()
            .find(|relationship| relationship.kind.ends_with(RELATIONSHIP_STYLES))
            .map(|relationship| resolve_target(&main_part, &relationship.target))
            .unwrap_or_else(|| DEFAULT_STYLES_PART.to_owned());
        let styles = match zip.xml_reader(&styles_part)? {
            Some(mut reader) => StyleSheet::from_element(&read_tree(&mut reader, &styles_part)?),
            None => StyleSheet::default(),
        };

        let entries = read_entries(&mut zip)?;
        debug!(document = name, main_part = %main_part, entries = entries.len(), styles = styles.len(), "Loaded document package");
        Ok(Self {
            name: name.to_owned(),
            main_part,
            entries,
            root,
            styles,
        })
    }

    /// Creates a document that exists only in memory, without any other package parts.
    pub fn from_parts(root: Element, styles: StyleSheet) -> Self {
        Self {
            name: String::from("untitled.docx"),
            main_part: DEFAULT_MAIN_PART.to_owned(),
            entries: Vec::new(),
            root,
            styles,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn styles(&self) -> &StyleSheet {
        &self.styles
    }

    /// The `w:document` element of the main part
    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn body(&self) -> Result<&Element, DocumentError> {
        self.root.child(TAG_BODY).ok_or(DocumentError::MissingBody)
    }

    pub fn body_mut(&mut self) -> Result<&mut Element, DocumentError> {
        self.root.child_mut(TAG_BODY).ok_or(DocumentError::MissingBody)
    }

    /// Serializes the whole package.
    pub fn to_bytes(&self) -> Result<Vec<u8>, RustyReportError> {
        let main_data = write_tree(&self.root)?;
        let cursor = write_entries(Cursor::new(Vec::new()), &self.entries, &self.main_part, &main_data)?;
        Ok(cursor.into_inner())
    }

    /// Saves the package to `path`, going through a temporary sibling file so an
    /// interrupted save never truncates an existing document.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RustyReportError> {
        let path = path.as_ref();
        let result = self.to_bytes().and_then(|bytes| {
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| String::from("document.docx"));
            let temporary = path.with_file_name(format!(".{}.tmp", file_name));
            fs::write(&temporary, &bytes)?;
            fs::rename(&temporary, path)?;
            info!(document = %path.display(), bytes = bytes.len(), "Saved document");
            Ok(())
        });
        result.with_prefix(&format!("Save document '{}'", path.display()))
    }
}
