// src/services/document_text.rs
//! Document-to-text extraction for uploaded CVs and cover letters.
//!
//! Supported inputs are PDF and the Word XML document format (DOCX). The
//! caller is expected to have sniffed the MIME type already; anything else
//! fails with UnsupportedFormat.

use thiserror::Error;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Error)]
pub enum DocumentTextError {
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to parse document: {0}")]
    Parse(String),
}

/// Extract plain text from raw document bytes.
pub fn extract_text(bytes: &[u8], mime_type: &str) -> Result<String, DocumentTextError> {
    match mime_type {
        MIME_PDF => extract_pdf_text(bytes),
        MIME_DOCX => extract_docx_text(bytes),
        other => Err(DocumentTextError::UnsupportedFormat(other.to_string())),
    }
}

fn extract_pdf_text(bytes: &[u8]) -> Result<String, DocumentTextError> {
    pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| DocumentTextError::Parse(format!("PDF extraction error: {}", e)))
}

fn extract_docx_text(bytes: &[u8]) -> Result<String, DocumentTextError> {
    let doc = docx_rs::read_docx(bytes)
        .map_err(|e| DocumentTextError::Parse(format!("DOCX extraction error: {}", e)))?;

    let mut content = String::new();

    for child in doc.document.children {
        if let docx_rs::DocumentChild::Paragraph(paragraph) = child {
            for child in paragraph.children {
                if let docx_rs::ParagraphChild::Run(run) = child {
                    for child in run.children {
                        if let docx_rs::RunChild::Text(text) = child {
                            content.push_str(&text.text);
                        }
                    }
                }
            }
            content.push('\n');
        }
    }

    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_mime_is_unsupported() {
        let result = extract_text(b"anything", "image/png");
        assert!(matches!(
            result,
            Err(DocumentTextError::UnsupportedFormat(m)) if m == "image/png"
        ));
    }

    #[test]
    fn test_garbage_pdf_bytes_fail_with_parse_error() {
        let result = extract_text(b"definitely not a pdf", MIME_PDF);
        assert!(matches!(result, Err(DocumentTextError::Parse(_))));
    }

    #[test]
    fn test_garbage_docx_bytes_fail_with_parse_error() {
        let result = extract_text(b"definitely not a docx", MIME_DOCX);
        assert!(matches!(result, Err(DocumentTextError::Parse(_))));
    }
}
