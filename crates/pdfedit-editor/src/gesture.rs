//! Active gesture tracking
//!
//! At most one gesture is active at a time. Pointer gestures own the
//! document-level pointer listeners: they are attached when the gesture
//! begins and detached when it ends, inside the same transition.

use crate::error::EditorError;
use crate::events::EditorEvent;
use crate::geometry::{DomPoint, DomRect, DomSize};
use crate::overlay::ElementId;
use pdfedit_core::PdfRect;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DrawTool {
    Whiteout,
    Blackout,
    TextBox,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResizeHandle {
    N,
    S,
    E,
    W,
    NE,
    NW,
    SE,
    SW,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::NW,
        ResizeHandle::N,
        ResizeHandle::NE,
        ResizeHandle::E,
        ResizeHandle::SE,
        ResizeHandle::S,
        ResizeHandle::SW,
        ResizeHandle::W,
    ];

    fn moves_west(self) -> bool {
        matches!(self, ResizeHandle::W | ResizeHandle::NW | ResizeHandle::SW)
    }

    fn moves_east(self) -> bool {
        matches!(self, ResizeHandle::E | ResizeHandle::NE | ResizeHandle::SE)
    }

    fn moves_north(self) -> bool {
        matches!(self, ResizeHandle::N | ResizeHandle::NE | ResizeHandle::NW)
    }

    fn moves_south(self) -> bool {
        matches!(self, ResizeHandle::S | ResizeHandle::SE | ResizeHandle::SW)
    }

    /// Center of this handle on `rect`.
    pub fn anchor(self, rect: &DomRect) -> DomPoint {
        let x = if self.moves_west() {
            rect.x
        } else if self.moves_east() {
            rect.right()
        } else {
            rect.x + rect.width / 2.0
        };
        let y = if self.moves_north() {
            rect.y
        } else if self.moves_south() {
            rect.bottom()
        } else {
            rect.y + rect.height / 2.0
        };
        DomPoint::new(x, y)
    }

    /// Square hit area of side `size` centered on the handle.
    pub fn hit_rect(self, rect: &DomRect, size: f64) -> DomRect {
        let center = self.anchor(rect);
        DomRect::new(center.x - size / 2.0, center.y - size / 2.0, size, size)
    }

    /// Resize `start` by a pointer displacement, keeping the opposite
    /// edges fixed and never going below `min`.
    pub fn apply(self, start: &DomRect, dx: f64, dy: f64, min: DomSize) -> DomRect {
        let mut left = start.x;
        let mut right = start.right();
        let mut top = start.y;
        let mut bottom = start.bottom();

        if self.moves_west() {
            left = (left + dx).min(right - min.width);
        }
        if self.moves_east() {
            right = (right + dx).max(left + min.width);
        }
        if self.moves_north() {
            top = (top + dy).min(bottom - min.height);
        }
        if self.moves_south() {
            bottom = (bottom + dy).max(top + min.height);
        }

        DomRect::new(left, top, right - left, bottom - top)
    }
}

/// Which kind of text input is open, for the host's editor chrome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TextInputKind {
    FreeText,
    TextBox,
    WhiteoutText,
    ExistingText,
    Replace,
}

/// What an open text input will commit to.
#[derive(Debug, Clone, PartialEq)]
pub enum TextTarget {
    /// New free text anchored at a click point
    FreeText { page: u32, anchor: DomPoint },
    /// Uncommitted text box element
    TextBox { element: ElementId },
    /// Text inside a whiteout, new or existing
    WhiteoutText { element: ElementId },
    /// Committed text annotation being re-edited (hidden while open)
    ExistingText { element: ElementId },
    /// Replacement of an original text run. `element` is set when an
    /// existing replacement is being re-edited.
    Replace {
        page: u32,
        element: Option<ElementId>,
        cover: PdfRect,
        original_text: String,
    },
}

impl TextTarget {
    pub fn kind(&self) -> TextInputKind {
        match self {
            TextTarget::FreeText { .. } => TextInputKind::FreeText,
            TextTarget::TextBox { .. } => TextInputKind::TextBox,
            TextTarget::WhiteoutText { .. } => TextInputKind::WhiteoutText,
            TextTarget::ExistingText { .. } => TextInputKind::ExistingText,
            TextTarget::Replace { .. } => TextInputKind::Replace,
        }
    }

    /// Single-line inputs commit on Enter; multi-line ones only on blur.
    pub fn commits_on_enter(&self) -> bool {
        matches!(self, TextTarget::FreeText { .. } | TextTarget::Replace { .. })
    }

    /// Overlay element the input is attached to, if any.
    pub fn element(&self) -> Option<ElementId> {
        match self {
            TextTarget::FreeText { .. } => None,
            TextTarget::TextBox { element }
            | TextTarget::WhiteoutText { element }
            | TextTarget::ExistingText { element } => Some(*element),
            TextTarget::Replace { element, .. } => *element,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ActiveGesture {
    #[default]
    None,
    Drawing {
        tool: DrawTool,
        page: u32,
        start: DomPoint,
        preview: DomRect,
        /// Original text run under the pointer-down, if any
        text_item: Option<usize>,
    },
    Resizing {
        target: ElementId,
        handle: ResizeHandle,
        start_point: DomPoint,
        start_rect: DomRect,
    },
    Moving {
        target: ElementId,
        start_point: DomPoint,
        start_rect: DomRect,
    },
    TextEditing {
        target: TextTarget,
    },
}

impl ActiveGesture {
    pub fn name(&self) -> &'static str {
        match self {
            ActiveGesture::None => "none",
            ActiveGesture::Drawing { .. } => "drawing",
            ActiveGesture::Resizing { .. } => "resizing",
            ActiveGesture::Moving { .. } => "moving",
            ActiveGesture::TextEditing { .. } => "text-editing",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, ActiveGesture::None)
    }

    /// Gestures driven by document-level pointer move/up listeners.
    pub fn is_pointer_gesture(&self) -> bool {
        matches!(
            self,
            ActiveGesture::Drawing { .. }
                | ActiveGesture::Resizing { .. }
                | ActiveGesture::Moving { .. }
        )
    }
}

/// Owner of the single [`ActiveGesture`] and its listener registration.
#[derive(Debug, Default)]
pub struct GestureTracker {
    active: ActiveGesture,
    listeners_attached: bool,
}

impl GestureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> &ActiveGesture {
        &self.active
    }

    pub(crate) fn active_mut(&mut self) -> &mut ActiveGesture {
        &mut self.active
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none()
    }

    pub fn listeners_attached(&self) -> bool {
        self.listeners_attached
    }

    /// Start a gesture. Fails if another gesture is active.
    pub fn begin(
        &mut self,
        gesture: ActiveGesture,
        events: &mut Vec<EditorEvent>,
    ) -> Result<(), EditorError> {
        if !self.active.is_none() {
            return Err(EditorError::GestureInProgress(self.active.name()));
        }
        if gesture.is_pointer_gesture() {
            self.listeners_attached = true;
            events.push(EditorEvent::ListenersAttached {
                gesture: gesture.name(),
            });
        }
        tracing::debug!(gesture = gesture.name(), "gesture started");
        self.active = gesture;
        Ok(())
    }

    /// End the active gesture: reset to `None`, detach listeners, and hand
    /// back the finished state so the caller can commit it.
    pub fn finish(&mut self, events: &mut Vec<EditorEvent>) -> ActiveGesture {
        let finished = std::mem::take(&mut self.active);
        if self.listeners_attached {
            self.listeners_attached = false;
            events.push(EditorEvent::ListenersDetached {
                gesture: finished.name(),
            });
        }
        if !finished.is_none() {
            tracing::debug!(gesture = finished.name(), "gesture ended");
        }
        finished
    }
}
