//! Annotation editing synchronization engine
//!
//! Keeps an editable overlay of text boxes, whiteout/blackout rectangles
//! and in-place text replacements consistent with an undoable operation
//! log it does not own, translating between PDF space and on-screen pixels
//! under zoom and rotation.
//!
//! - `coords` / `viewport`: PDF ⇄ DOM conversion through the page viewport
//! - `gesture`: the single active gesture and its pointer listeners
//! - `tools`: tool state machine mapping gestures to engine calls
//! - `overlay`: projected elements, selection, z-order, hit testing
//! - `undo`: history steps and projection from the log
//! - `text_style` / `markup` / `text_input`: the active text input
//! - `session`: [`EditorSession`], the entry point for host events

pub mod config;
pub mod coords;
pub mod engine;
pub mod error;
pub mod events;
pub mod geometry;
pub mod gesture;
pub mod loader;
pub mod markup;
pub mod notification;
pub mod overlay;
pub mod pages;
pub mod session;
pub mod text_input;
pub mod text_items;
pub mod text_style;
pub mod tools;
pub mod undo;
pub mod viewport;

pub use config::EditorConfig;
pub use engine::{EditEngine, EngineError};
pub use error::EditorError;
pub use events::EditorEvent;
pub use geometry::{DomPoint, DomRect, DomSize};
pub use gesture::{ActiveGesture, DrawTool, ResizeHandle, TextInputKind, TextTarget};
pub use loader::{load_pages, PageSource, RenderedPage};
pub use notification::{Notification, NotificationLevel};
pub use overlay::{ElementId, OverlayElement, OverlayKind, OverlayLayer, OverlaySnapshot};
pub use session::{EditorSession, Key};
pub use text_items::{TextContent, TextItem};
pub use tools::Tool;
pub use viewport::{PageViewport, Viewport};
