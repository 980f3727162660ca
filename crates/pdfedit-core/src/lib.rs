//! Authoritative edit log for PDF annotation editing
//!
//! This crate holds the operation log that every editor front end writes
//! to: primitive operations (white/black rectangles, text, styled text,
//! text replacement), grouped into undoable actions.
//!
//! - `operations`: data model and `OperationLog` with action-based undo/redo
//! - `session`: `LogSession`, one document plus its log
//! - `fonts`: font name classification shared with the editor

pub mod error;
pub mod fonts;
pub mod operations;
pub mod session;

pub use error::PdfEditError;
pub use operations::{
    ActionDelta, ActionKind, EditOperation, OpId, OperationLog, PdfRect, StyledTextSegment,
    TextStyle,
};
pub use session::{has_signatures, Exporter, LogSession};

/// Parse PDF bytes and return page count
pub fn get_page_count(bytes: &[u8]) -> Result<u32, PdfEditError> {
    let doc =
        lopdf::Document::load_mem(bytes).map_err(|e| PdfEditError::ParseError(e.to_string()))?;
    Ok(doc.get_pages().len() as u32)
}
