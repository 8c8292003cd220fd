//! Input validation: the file must exist, be named `*.pdf` and start with a
//! PDF header.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// PDF header information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfFormat {
    /// PDF version (e.g., "1.7", "2.0")
    pub version: String,
}

impl std::fmt::Display for PdfFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PDF {}", self.version)
    }
}

/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8] = b"%PDF-";
const PDF_MAGIC_LEN: usize = 5;
const VERSION_LEN: usize = 3; // e.g., "1.7"

/// Validate an input path before any extraction begins.
///
/// Fails with [`Error::FileNotFound`] when the path does not exist,
/// [`Error::NotPdf`] when the extension is not `.pdf` (case-insensitive),
/// and [`Error::UnknownFormat`] when the header is not a PDF header.
///
/// # Example
/// ```no_run
/// use pdfstruct::detect::validate_pdf_path;
///
/// let format = validate_pdf_path("report.pdf").unwrap();
/// println!("{}", format);
/// ```
pub fn validate_pdf_path<P: AsRef<Path>>(path: P) -> Result<PdfFormat> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let has_pdf_extension = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);
    if !has_pdf_extension {
        return Err(Error::NotPdf(path.to_path_buf()));
    }

    detect_format_from_path(path)
}

/// Read the first bytes of a file and check the PDF header.
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<PdfFormat> {
    let mut file = File::open(path)?;
    let mut header = Vec::with_capacity(16);
    file.by_ref().take(16).read_to_end(&mut header)?;
    detect_format_from_bytes(&header)
}

/// Check a PDF header in a byte slice.
pub fn detect_format_from_bytes(data: &[u8]) -> Result<PdfFormat> {
    if data.len() < PDF_MAGIC_LEN + VERSION_LEN || !data.starts_with(PDF_MAGIC) {
        return Err(Error::UnknownFormat);
    }

    let version_bytes = &data[PDF_MAGIC_LEN..PDF_MAGIC_LEN + VERSION_LEN];
    let version = String::from_utf8_lossy(version_bytes).to_string();

    if !is_valid_version(&version) {
        return Err(Error::UnsupportedVersion(version));
    }

    Ok(PdfFormat { version })
}

fn is_valid_version(version: &str) -> bool {
    let bytes = version.as_bytes();
    bytes.len() == 3 && bytes[0].is_ascii_digit() && bytes[1] == b'.' && bytes[2].is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_detect_valid_pdf() {
        let format = detect_format_from_bytes(b"%PDF-1.7\n%\xe2\xe3\xcf\xd3").unwrap();
        assert_eq!(format.version, "1.7");
    }

    #[test]
    fn test_detect_invalid_format() {
        let result = detect_format_from_bytes(b"<!DOCTYPE html>");
        assert!(matches!(result, Err(Error::UnknownFormat)));

        let result = detect_format_from_bytes(b"%PDF");
        assert!(matches!(result, Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_detect_bad_version() {
        let result = detect_format_from_bytes(b"%PDF-x.y\n");
        assert!(matches!(result, Err(Error::UnsupportedVersion(_))));
    }

    #[test]
    fn test_validate_missing_file() {
        let result = validate_pdf_path("/definitely/not/here.pdf");
        assert!(matches!(result, Err(Error::FileNotFound(_))));
    }

    #[test]
    fn test_validate_wrong_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"%PDF-1.4\n").unwrap();

        let result = validate_pdf_path(&path);
        assert!(matches!(result, Err(Error::NotPdf(_))));
    }

    #[test]
    fn test_validate_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.PDF");
        let mut file = File::create(&path).unwrap();
        file.write_all(b"hello world, not a pdf").unwrap();

        let result = validate_pdf_path(&path);
        assert!(matches!(result, Err(Error::UnknownFormat)));
    }
}
