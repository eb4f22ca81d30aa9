//! Open Packaging Convention helpers: part entries and relationships

use crate::error::RustyReportError;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use quick_xml::events::Event;
use std::io::Read;
use std::io::Seek;
use std::io::Write;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;
use zip::ZipArchive;
use zip::ZipWriter;

/// XML tag name for relationship elements in package relationship parts
const TAG_RELATIONSHIP: &[u8] = b"Relationship";

/// A raw package entry kept verbatim between load and save
#[derive(Clone, Debug)]
pub(crate) struct PackageEntry {
    pub(crate) name: String,
    pub(crate) data: Vec<u8>,
    pub(crate) compression: CompressionMethod,
    pub(crate) is_dir: bool,
}

/// A single `Relationship` of a `.rels` part
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Relationship {
    pub(crate) kind: String,
    pub(crate) target: String,
}

/// Reads every entry of the archive into memory, in archive order
pub(crate) fn read_entries<RS: Read + Seek>(zip: &mut ZipArchive<RS>) -> Result<Vec<PackageEntry>, RustyReportError> {
    let mut entries = Vec::with_capacity(zip.len());
    for index in 0..zip.len() {
        let mut file = zip.by_index(index)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        entries.push(PackageEntry {
            name: file.name().to_owned(),
            data,
            compression: file.compression(),
            is_dir: file.is_dir(),
        });
    }
    Ok(entries)
}

/// Writes `entries` back in order, substituting `main_data` for the main part.
///
/// The main part is appended when the package did not contain it yet.
pub(crate) fn write_entries<W: Write + Seek>(
    writer: W,
    entries: &[PackageEntry],
    main_part: &str,
    main_data: &[u8],
) -> Result<W, RustyReportError> {
    let mut zip = ZipWriter::new(writer);
    let mut main_written = false;
    for entry in entries {
        // Only stored and deflated entries can be written back; everything else is re-deflated
        let method = match entry.compression {
            CompressionMethod::Stored => CompressionMethod::Stored,
            _ => CompressionMethod::Deflated,
        };
        let options = SimpleFileOptions::default().compression_method(method);
        if entry.is_dir {
            zip.add_directory(entry.name.as_str(), options)?;
            continue;
        }

        zip.start_file(entry.name.as_str(), options)?;
        if entry.name.trim_start_matches('/').eq_ignore_ascii_case(main_part) {
            zip.write_all(main_data)?;
            main_written = true;
        } else {
            zip.write_all(&entry.data)?;
        }
    }

    if !main_written {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        zip.start_file(main_part, options)?;
        zip.write_all(main_data)?;
    }
    Ok(zip.finish()?)
}

/// Loads the relationships declared in a `.rels` part; a missing part yields none
pub(crate) fn load_relationships<RS: Read + Seek>(zip: &mut ZipArchive<RS>, path: &str) -> Result<Vec<Relationship>, RustyReportError> {
    let mut reader = match zip.xml_reader(path)? {
        Some(reader) => reader,
        None => return Ok(Vec::new()),
    };
    let mut relationships = Vec::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let kind = event.get_attribute_value("Type")?;
            let target = event.get_attribute_value("Target")?;
            if let Some((kind, target)) = kind.zip(target) {
                relationships.push(Relationship {
                    kind: kind.into_owned(),
                    target: target.into_owned(),
                });
            }
        }
    });
    Ok(relationships)
}

/// Path of the relationship part belonging to `part`, e.g. `word/_rels/document.xml.rels`
pub(crate) fn relationships_path(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((directory, file)) => format!("{}/_rels/{}.rels", directory, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolves a relationship target against the part that declares it.
/// `source_part` is empty for package-level relationships.
pub(crate) fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_owned();
    }
    let directory = source_part.rsplit_once('/').map(|(directory, _)| directory).unwrap_or("");
    let mut segments: Vec<&str> = directory.split('/').filter(|segment| !segment.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => (),
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }
    segments.join("/")
}
