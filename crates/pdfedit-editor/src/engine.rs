//! Boundary to the authoritative operation-log engine
//!
//! The editor never owns operation data. It issues calls through
//! [`EditEngine`] and reads operations back as JSON when it needs to
//! rebuild the overlay.

use pdfedit_core::{LogSession, PdfEditError};
use thiserror::Error;

pub use pdfedit_core::{
    ActionDelta, EditOperation, OpId, PdfRect, StyledTextSegment, TextStyle,
};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Engine rejected call: {0}")]
    Rejected(String),

    #[error("Operation {0} not found")]
    NotFound(OpId),

    #[error("Invalid operation JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<PdfEditError> for EngineError {
    fn from(e: PdfEditError) -> Self {
        match e {
            PdfEditError::OperationNotFound(id) => EngineError::NotFound(id),
            other => EngineError::Rejected(other.to_string()),
        }
    }
}

/// Narrow call interface of the operation-log engine.
pub trait EditEngine {
    fn add_white_rect(&mut self, page: u32, rect: PdfRect, color: &str)
        -> Result<OpId, EngineError>;

    fn add_text(
        &mut self,
        page: u32,
        rect: PdfRect,
        text: &str,
        style: &TextStyle,
    ) -> Result<OpId, EngineError>;

    /// `segments_json` is a JSON array of [`StyledTextSegment`].
    fn add_styled_text(
        &mut self,
        page: u32,
        rect: PdfRect,
        segments_json: &str,
        style: &TextStyle,
    ) -> Result<OpId, EngineError>;

    #[allow(clippy::too_many_arguments)]
    fn replace_text(
        &mut self,
        page: u32,
        cover_rect: PdfRect,
        new_rect: PdfRect,
        old_text: &str,
        new_text: &str,
        style: &TextStyle,
    ) -> Result<OpId, EngineError>;

    fn remove_operation(&mut self, id: OpId) -> Result<(), EngineError>;

    fn begin_action(&mut self, label: &str);

    fn commit_action(&mut self);

    /// Drop the open action and revert what it recorded.
    fn abort_action(&mut self);

    fn undo(&mut self) -> Option<ActionDelta>;

    fn redo(&mut self) -> Option<ActionDelta>;

    fn can_undo(&self) -> bool;

    fn can_redo(&self) -> bool;

    fn operation_json(&self, id: OpId) -> Option<String>;

    /// Live operation ids in insertion order.
    fn operation_ids(&self) -> Vec<OpId>;

    fn has_changes(&self) -> bool;

    fn export(&mut self) -> Result<Vec<u8>, EngineError>;
}

/// Fetch one operation from the engine and decode it.
pub fn load_operation<E: EditEngine + ?Sized>(
    engine: &E,
    id: OpId,
) -> Result<EditOperation, EngineError> {
    let json = engine.operation_json(id).ok_or(EngineError::NotFound(id))?;
    Ok(serde_json::from_str(&json)?)
}

/// Re-issue an operation's content at a new rect. Returns the new id.
/// For text replacement only the replacement rect moves; the cover stays
/// over the original text.
pub fn add_operation_at<E: EditEngine + ?Sized>(
    engine: &mut E,
    op: &EditOperation,
    rect: PdfRect,
) -> Result<OpId, EngineError> {
    match op {
        EditOperation::AddWhiteRect { page, color, .. } => engine.add_white_rect(*page, rect, color),
        EditOperation::AddText {
            page, text, style, ..
        } => engine.add_text(*page, rect, text, style),
        EditOperation::AddStyledText {
            page,
            segments,
            style,
            ..
        } => {
            let json = serde_json::to_string(segments)?;
            engine.add_styled_text(*page, rect, &json, style)
        }
        EditOperation::ReplaceText {
            page,
            original_rect,
            original_text,
            new_text,
            style,
            ..
        } => engine.replace_text(*page, *original_rect, rect, original_text, new_text, style),
    }
}

impl EditEngine for LogSession {
    fn add_white_rect(
        &mut self,
        page: u32,
        rect: PdfRect,
        color: &str,
    ) -> Result<OpId, EngineError> {
        Ok(LogSession::add_white_rect(self, page, rect, color)?)
    }

    fn add_text(
        &mut self,
        page: u32,
        rect: PdfRect,
        text: &str,
        style: &TextStyle,
    ) -> Result<OpId, EngineError> {
        Ok(LogSession::add_text(self, page, rect, text, style.clone())?)
    }

    fn add_styled_text(
        &mut self,
        page: u32,
        rect: PdfRect,
        segments_json: &str,
        style: &TextStyle,
    ) -> Result<OpId, EngineError> {
        Ok(LogSession::add_styled_text(
            self,
            page,
            rect,
            segments_json,
            style.clone(),
        )?)
    }

    fn replace_text(
        &mut self,
        page: u32,
        cover_rect: PdfRect,
        new_rect: PdfRect,
        old_text: &str,
        new_text: &str,
        style: &TextStyle,
    ) -> Result<OpId, EngineError> {
        Ok(LogSession::replace_text(
            self,
            page,
            cover_rect,
            new_rect,
            old_text,
            new_text,
            style.clone(),
        )?)
    }

    fn remove_operation(&mut self, id: OpId) -> Result<(), EngineError> {
        Ok(LogSession::remove_operation(self, id)?)
    }

    fn begin_action(&mut self, label: &str) {
        LogSession::begin_action(self, label)
    }

    fn commit_action(&mut self) {
        LogSession::commit_action(self);
    }

    fn abort_action(&mut self) {
        LogSession::abort_action(self)
    }

    fn undo(&mut self) -> Option<ActionDelta> {
        LogSession::undo(self)
    }

    fn redo(&mut self) -> Option<ActionDelta> {
        LogSession::redo(self)
    }

    fn can_undo(&self) -> bool {
        LogSession::can_undo(self)
    }

    fn can_redo(&self) -> bool {
        LogSession::can_redo(self)
    }

    fn operation_json(&self, id: OpId) -> Option<String> {
        self.get_operation_json(id)
    }

    fn operation_ids(&self) -> Vec<OpId> {
        LogSession::operation_ids(self)
    }

    fn has_changes(&self) -> bool {
        LogSession::has_changes(self)
    }

    fn export(&mut self) -> Result<Vec<u8>, EngineError> {
        Ok(LogSession::export(self)?)
    }
}
