//! Part lookup inside the zip container of a `.docx` package.
//!
//! Relationship targets do not always agree with the stored entry names on case
//! or on a leading slash, so parts are found by a forgiving comparison.

use crate::error::RustyReportError;
use crate::helpers::xml::XmlReader;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use zip::read::ZipFile;
use zip::result::ZipError;
use zip::ZipArchive;

/// Opens package parts by their part name
pub(crate) trait ZipHelper<RS: Read + Seek> {
    /// `None` when the package has no such part
    fn file(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, RustyReportError>;

    /// Same lookup as [`ZipHelper::file`], wrapped for event parsing
    fn xml_reader(
        &'_ mut self,
        name: &str,
    ) -> Result<Option<XmlReader<BufReader<ZipFile<'_, RS>>>>, RustyReportError>;
}

impl<RS: Read + Seek> ZipHelper<RS> for ZipArchive<RS> {
    fn file(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, RustyReportError> {
        let wanted = name.replace('\\', "/");
        let wanted = wanted.trim_start_matches('/');
        let Some(entry) = self
            .file_names()
            .find(|entry| wanted.eq_ignore_ascii_case(entry.trim_start_matches('/')))
            .map(str::to_owned)
        else {
            return Ok(None);
        };
        match self.by_name(&entry) {
            Ok(part) => Ok(Some(part)),
            Err(ZipError::FileNotFound) => Ok(None),
            Err(error) => Err(error)?,
        }
    }

    fn xml_reader(
        &'_ mut self,
        name: &str,
    ) -> Result<Option<XmlReader<BufReader<ZipFile<'_, RS>>>>, RustyReportError> {
        let reader = self
            .file(name)?
            .map(|file| XmlReader::new(BufReader::new(file)));
        Ok(reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn package(entries: &[(&str, &str)]) -> ZipArchive<Cursor<Vec<u8>>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(data.as_bytes()).unwrap();
        }
        let bytes = writer.finish().unwrap().into_inner();
        ZipArchive::new(Cursor::new(bytes)).unwrap()
    }

    #[test]
    fn finds_parts_regardless_of_case_and_leading_slash() {
        let mut archive = package(&[("word/Document.xml", "<w:document/>")]);

        let mut part = archive.file("/WORD\\document.xml").unwrap().unwrap();
        let mut content = String::new();
        part.read_to_string(&mut content).unwrap();
        assert_eq!(content, "<w:document/>");
    }

    #[test]
    fn missing_part_is_none() {
        let mut archive = package(&[("word/document.xml", "<w:document/>")]);
        assert!(archive.file("word/styles.xml").unwrap().is_none());
        assert!(archive.xml_reader("word/styles.xml").unwrap().is_none());
    }
}
