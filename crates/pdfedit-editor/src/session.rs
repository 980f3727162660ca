//! Editor session
//!
//! One [`EditorSession`] owns all mutable editor state: current tool,
//! active gesture, overlay and selection, the open text input and the page
//! cache. Every host event is routed through it. Pointer handling lives in
//! `tools`, text inputs in `text_input`, history in `undo`.

use crate::config::EditorConfig;
use crate::engine::EditEngine;
use crate::error::EditorError;
use crate::events::EditorEvent;
use crate::gesture::{ActiveGesture, GestureTracker};
use crate::notification::{Notification, NotificationCenter, NotificationLevel};
use crate::overlay::{ElementId, OpBinding, OverlayElement, OverlayKind, OverlayLayer};
use crate::pages::{CachedPageInfo, PageCache};
use crate::text_items::{extract_text_items, TextContent, TextLayer};
use crate::text_style::{ActiveInput, TextStyleController};
use crate::tools::Tool;
use crate::viewport::Viewport;
use std::rc::Rc;

/// Keys the editor reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Enter,
    Delete,
    Backspace,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value.
    pub fn from_dom_key(key: &str) -> Option<Self> {
        match key {
            "Escape" | "Esc" => Some(Key::Escape),
            "Enter" => Some(Key::Enter),
            "Delete" | "Del" => Some(Key::Delete),
            "Backspace" => Some(Key::Backspace),
            _ => None,
        }
    }
}

pub struct EditorSession<E: EditEngine> {
    pub(crate) engine: E,
    pub(crate) config: EditorConfig,
    pub(crate) pages: PageCache,
    pub(crate) tool: Tool,
    pub(crate) gesture: GestureTracker,
    pub(crate) overlay: OverlayLayer,
    pub(crate) text: TextStyleController,
    pub(crate) notifications: NotificationCenter,
    pub(crate) events: Vec<EditorEvent>,
}

impl<E: EditEngine> EditorSession<E> {
    pub fn new(engine: E, config: EditorConfig) -> Self {
        let notifications = NotificationCenter::new(config.notification_ms);
        Self {
            engine,
            config,
            pages: PageCache::new(),
            tool: Tool::default(),
            gesture: GestureTracker::new(),
            overlay: OverlayLayer::new(),
            text: TextStyleController::new(),
            notifications,
            events: Vec::new(),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn overlay(&self) -> &OverlayLayer {
        &self.overlay
    }

    pub fn active_gesture(&self) -> &ActiveGesture {
        self.gesture.active()
    }

    pub fn listeners_attached(&self) -> bool {
        self.gesture.listeners_attached()
    }

    pub fn active_input(&self) -> Option<&ActiveInput> {
        self.text.input()
    }

    pub fn page_info(&self, page: u32) -> Option<&CachedPageInfo> {
        self.pages.get(page)
    }

    /// Take all events queued since the last call.
    pub fn drain_events(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.events)
    }

    // ---- pages ----

    /// Cache a freshly rendered page and re-project its overlay with the
    /// new viewport. An input open on the page is committed first, since
    /// the re-render destroys it.
    pub fn register_page(&mut self, page: u32, viewport: Rc<dyn Viewport>, content: &TextContent) {
        if self.text.input().is_some_and(|input| input.page == page) {
            self.blur_text_input();
        }
        if self.gesture.active().is_pointer_gesture() {
            self.cancel_pointer_gesture();
        }

        let items = extract_text_items(content, viewport.as_ref());
        tracing::debug!(page, text_items = items.len(), scale = viewport.scale(), "page registered");
        self.pages.insert(page, viewport, TextLayer::new(items));
        self.rebuild_page(page);
    }

    /// Forget a page's render state. Its overlay stays but cannot be
    /// edited until the page is registered again.
    pub fn invalidate_page(&mut self, page: u32) {
        if self.text.input().is_some_and(|input| input.page == page) {
            self.blur_text_input();
        }
        self.pages.invalidate(page);
    }

    pub(crate) fn viewport_or_warn(&self, page: u32) -> Option<Rc<dyn Viewport>> {
        let viewport = self.pages.viewport(page);
        if viewport.is_none() {
            tracing::warn!(page, "page not rendered yet, ignoring");
        }
        viewport
    }

    // ---- tool ----

    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Switch tools. An open text input is committed, any pointer gesture
    /// is dropped and the selection cleared.
    pub fn set_tool(&mut self, tool: Tool) {
        self.blur_text_input();
        if self.gesture.active().is_pointer_gesture() {
            self.cancel_pointer_gesture();
        }
        self.deselect();
        if self.tool != tool {
            tracing::debug!(from = ?self.tool, to = ?tool, "tool changed");
            self.tool = tool;
            self.events.push(EditorEvent::ToolChanged { tool });
        }
    }

    // ---- overlay helpers ----

    pub(crate) fn add_element(&mut self, element: OverlayElement) -> ElementId {
        let id = self.overlay.insert(element);
        self.events.push(EditorEvent::ElementAdded { element: id });
        id
    }

    pub(crate) fn remove_element(&mut self, id: ElementId) -> Option<OverlayElement> {
        let was_selected = self.overlay.selected_id() == Some(id);
        let removed = self.overlay.remove(id)?;
        self.events.push(EditorEvent::ElementRemoved { element: id });
        if was_selected {
            self.selection_changed();
        }
        Some(removed)
    }

    pub(crate) fn element_updated(&mut self, id: ElementId) {
        self.events.push(EditorEvent::ElementUpdated { element: id });
    }

    /// Put an element back at its committed position after an aborted
    /// gesture.
    pub(crate) fn restore_element(&mut self, id: ElementId) {
        let Some(page) = self.overlay.get(id).map(|el| el.page) else {
            return;
        };
        let Some(viewport) = self.pages.viewport(page) else {
            return;
        };
        if let Some(el) = self.overlay.get_mut(id) {
            el.reproject(viewport.as_ref());
            el.hidden = false;
        }
        self.element_updated(id);
    }

    pub(crate) fn selection_changed(&mut self) {
        let element = self.overlay.selected_id();
        let style_target = self.text.is_active()
            || self.overlay.selected().is_some_and(|el| {
                matches!(el.kind, OverlayKind::Text | OverlayKind::Replacement)
                    || matches!(el.binding, OpBinding::Pair { .. })
            });
        self.events.push(EditorEvent::SelectionChanged {
            element,
            style_target,
        });
    }

    /// Select one overlay element, deselecting any other.
    pub fn select(&mut self, id: ElementId) -> bool {
        if self.overlay.selected_id() == Some(id) {
            self.overlay.raise(id);
            return true;
        }
        let previous = self.overlay.selected_id();
        if !self.overlay.select(id) {
            return false;
        }
        if let Some(prev) = previous {
            self.element_updated(prev);
        }
        self.element_updated(id);
        self.selection_changed();
        true
    }

    pub fn deselect(&mut self) {
        if let Some(prev) = self.overlay.deselect() {
            self.element_updated(prev);
            self.selection_changed();
        }
    }

    // ---- delete ----

    /// Remove the selected element and all its operations in one action.
    pub fn delete_selected(&mut self) -> Result<bool, EditorError> {
        let Some(el) = self.overlay.selected().cloned() else {
            return Ok(false);
        };
        if matches!(el.binding, OpBinding::Draft) {
            self.remove_element(el.id);
            return Ok(true);
        }

        self.engine.begin_action("delete");
        for op in el.op_ids() {
            if let Err(e) = self.engine.remove_operation(op) {
                self.engine.abort_action();
                tracing::warn!(element = el.id, op, error = %e, "delete failed");
                return Err(e.into());
            }
        }
        self.engine.commit_action();
        tracing::debug!(element = el.id, ops = ?el.op_ids(), "element deleted");
        self.remove_element(el.id);
        self.history_changed();
        Ok(true)
    }

    // ---- keyboard ----

    /// Handle a key press. Returns true when the key was consumed.
    pub fn key_down(&mut self, key: Key) -> bool {
        match key {
            Key::Escape => {
                if self.text.is_active() {
                    self.cancel_text_input();
                    true
                } else if self.gesture.active().is_pointer_gesture() {
                    self.cancel_pointer_gesture();
                    true
                } else if self.overlay.selected_id().is_some() {
                    self.deselect();
                    true
                } else {
                    false
                }
            }
            Key::Enter => {
                let commits_on_enter = matches!(
                    self.gesture.active(),
                    ActiveGesture::TextEditing { target } if target.commits_on_enter()
                );
                if commits_on_enter {
                    self.blur_text_input();
                }
                commits_on_enter
            }
            Key::Delete | Key::Backspace => {
                if self.text.is_active() || !self.gesture.is_idle() {
                    return false;
                }
                match self.delete_selected() {
                    Ok(deleted) => deleted,
                    Err(e) => {
                        tracing::warn!(error = %e, "delete key ignored");
                        false
                    }
                }
            }
        }
    }

    // ---- document state ----

    /// Whether leaving now would lose work.
    pub fn has_unsaved_changes(&self) -> bool {
        self.engine.has_changes()
            || self
                .text
                .input()
                .is_some_and(|input| !input.is_unchanged() && !input.plain_text().trim().is_empty())
    }

    pub fn can_undo(&self) -> bool {
        self.engine.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.engine.can_redo()
    }

    pub(crate) fn history_changed(&mut self) {
        self.events.push(EditorEvent::HistoryChanged {
            can_undo: self.engine.can_undo(),
            can_redo: self.engine.can_redo(),
        });
    }

    /// Export the edited document. Failures raise an error notification
    /// and leave editor state untouched, so export can be retried.
    pub fn export(&mut self, now_ms: f64) -> Result<Vec<u8>, EditorError> {
        self.blur_text_input();
        match self.engine.export() {
            Ok(bytes) => {
                tracing::info!(bytes = bytes.len(), "export finished");
                Ok(bytes)
            }
            Err(e) => {
                tracing::warn!(error = %e, "export failed");
                self.notify(format!("Export failed: {}", e), NotificationLevel::Error, now_ms);
                Err(e.into())
            }
        }
    }

    // ---- notifications ----

    pub fn notify(&mut self, message: impl Into<String>, level: NotificationLevel, now_ms: f64) -> u64 {
        let n = self.notifications.push(message, level, now_ms);
        let event = EditorEvent::Notified {
            id: n.id,
            message: n.message.clone(),
            level: n.level,
        };
        let id = n.id;
        self.events.push(event);
        id
    }

    pub fn notifications(&self) -> &[Notification] {
        self.notifications.active()
    }

    pub fn update_notifications(&mut self, now_ms: f64) -> Vec<u64> {
        self.notifications.update(now_ms)
    }

    pub fn dismiss_notification(&mut self, id: u64) -> bool {
        self.notifications.dismiss(id)
    }
}
