use crate::engine::EngineError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Rotation must be a multiple of 90 degrees, got {0}")]
    InvalidRotation(i32),

    #[error("Page {0} has not been rendered yet")]
    PageNotReady(u32),

    #[error("No active text input")]
    NoActiveInput,

    #[error("A {0} gesture is already in progress")]
    GestureInProgress(&'static str),

    #[error("Failed to load page {page}: {message}")]
    PageLoad { page: u32, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Engine(#[from] EngineError),
}
