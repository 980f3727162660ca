use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfEditError {
    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("Page {page} is out of range (1-{page_count})")]
    InvalidPage { page: u32, page_count: u32 },

    #[error("Invalid rectangle: {0}")]
    InvalidRect(String),

    #[error("Invalid segments: {0}")]
    InvalidSegments(String),

    #[error("Operation {0} not found")]
    OperationNotFound(u64),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Cannot export: Document is signed. Editing would invalidate the signature.")]
    SignedDocument,

    #[error("Export is not available: no exporter configured")]
    ExportUnavailable,

    #[error("Export error: {0}")]
    ExportFailed(String),
}

impl From<serde_json::Error> for PdfEditError {
    fn from(e: serde_json::Error) -> Self {
        PdfEditError::SerializationError(e.to_string())
    }
}
