//! Résumé text extraction for PDF, DOCX and plain-text uploads.
//!
//! Pure functions over the uploaded bytes. Callers run `extract_text` on the
//! blocking pool since PDF parsing is CPU-bound.

use std::io::{Cursor, Read};
use std::panic::{self, AssertUnwindSafe};

use bytes::Bytes;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Serialize;
use thiserror::Error;

pub const PDF_MIME: &str = "application/pdf";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const TEXT_MIME: &str = "text/plain";

const DOCX_BODY: &str = "word/document.xml";

/// Some clients label a `.docx` upload with the generic zip type.
const ZIP_MIMES: &[&str] = &["application/zip", "application/x-zip-compressed"];

#[derive(Debug, Error, PartialEq)]
pub enum ExtractError {
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("could not extract text: {0}")]
    Extraction(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Text,
}

/// An uploaded document as received from the client.
#[derive(Debug, Clone)]
pub struct ResumeFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl ResumeFile {
    /// Resolves the format from the declared MIME type, falling back to the
    /// file extension when the type is missing or `application/octet-stream`.
    /// A zip MIME type is accepted only for a `.docx` file name.
    pub fn format(&self) -> Result<DocumentFormat, ExtractError> {
        let mime = self
            .content_type
            .as_deref()
            .map(|m| m.split(';').next().unwrap_or(m).trim().to_lowercase())
            .filter(|m| !m.is_empty() && m != "application/octet-stream");

        if let Some(mime) = mime {
            return match mime.as_str() {
                PDF_MIME => Ok(DocumentFormat::Pdf),
                DOCX_MIME => Ok(DocumentFormat::Docx),
                TEXT_MIME => Ok(DocumentFormat::Text),
                zip if ZIP_MIMES.contains(&zip) => match self.extension().as_deref() {
                    Some("docx") => Ok(DocumentFormat::Docx),
                    _ => Err(ExtractError::UnsupportedFormat(zip.to_string())),
                },
                other => Err(ExtractError::UnsupportedFormat(other.to_string())),
            };
        }

        match self.extension().as_deref() {
            Some("pdf") => Ok(DocumentFormat::Pdf),
            Some("docx") => Ok(DocumentFormat::Docx),
            Some("txt") => Ok(DocumentFormat::Text),
            Some(ext) => Err(ExtractError::UnsupportedFormat(format!(".{ext}"))),
            None => Err(ExtractError::UnsupportedFormat(
                "unknown file type".to_string(),
            )),
        }
    }

    fn extension(&self) -> Option<String> {
        self.file_name
            .as_deref()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_lowercase())
    }
}

/// Extracts trimmed plain text. Empty output counts as a failed extraction.
pub fn extract_text(file: &ResumeFile) -> Result<(DocumentFormat, String), ExtractError> {
    let format = file.format()?;
    let text = match format {
        DocumentFormat::Pdf => extract_pdf(&file.bytes)?,
        DocumentFormat::Docx => extract_docx(&file.bytes)?,
        DocumentFormat::Text => std::str::from_utf8(&file.bytes)
            .map_err(|e| ExtractError::Extraction(format!("text file is not valid UTF-8: {e}")))?
            .to_string(),
    };

    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(ExtractError::Extraction(
            "document contains no extractable text".to_string(),
        ));
    }
    Ok((format, text))
}

/// pdf-extract panics on some malformed inputs; a panic becomes an `Extraction` error.
fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes)));
    match outcome {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(ExtractError::Extraction(format!("invalid PDF: {e}"))),
        Err(_) => Err(ExtractError::Extraction(
            "PDF parser failed on this document".to_string(),
        )),
    }
}

/// Reads the `w:t` runs of `word/document.xml`; paragraphs and breaks become newlines.
fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractError::Extraction(format!("invalid DOCX container: {e}")))?;

    let mut xml = String::new();
    archive
        .by_name(DOCX_BODY)
        .map_err(|e| ExtractError::Extraction(format!("missing {DOCX_BODY}: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractError::Extraction(format!("unreadable {DOCX_BODY}: {e}")))?;

    docx_xml_to_text(&xml)
}

fn docx_xml_to_text(xml: &str) -> Result<String, ExtractError> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    let mut in_run_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"w:t" => in_run_text = true,
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_run_text = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" => text.push('\t'),
                b"w:br" | b"w:cr" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_run_text => {
                let chunk = t
                    .unescape()
                    .map_err(|e| ExtractError::Extraction(format!("bad DOCX text: {e}")))?;
                text.push_str(&chunk);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(ExtractError::Extraction(format!(
                    "malformed DOCX XML at byte {}: {e}",
                    reader.buffer_position()
                )))
            }
        }
    }

    Ok(text)
}
