//! Tool state machine
//!
//! Maps the selected tool plus pointer input to gestures, and finished
//! gestures to engine calls. Pointer coordinates are page-relative DOM
//! pixels.
//!
//! Hit testing order on pointer-down: the selected element's delete
//! affordance, its resize handles, overlay bodies (topmost first), then
//! original text runs. Overlay interactions work under every tool.

use crate::coords::{dom_delta_to_pdf, dom_rect_to_pdf};
use crate::engine::{add_operation_at, load_operation, EditEngine, EngineError};
use crate::geometry::{DomPoint, DomRect};
use crate::gesture::{ActiveGesture, DrawTool};
use crate::overlay::{min_size, ElementId, OpBinding, OverlayElement, OverlayKind};
use crate::session::EditorSession;
use pdfedit_core::{OpId, PdfRect};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Tool {
    #[default]
    Select,
    AddText,
    AddTextBox,
    Whiteout,
    Blackout,
}

impl Tool {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "select" => Some(Tool::Select),
            "addText" | "text" => Some(Tool::AddText),
            "addTextBox" | "textbox" => Some(Tool::AddTextBox),
            "whiteout" => Some(Tool::Whiteout),
            "blackout" => Some(Tool::Blackout),
            _ => None,
        }
    }

    fn draw_tool(self) -> Option<DrawTool> {
        match self {
            Tool::Whiteout => Some(DrawTool::Whiteout),
            Tool::Blackout => Some(DrawTool::Blackout),
            Tool::AddTextBox => Some(DrawTool::TextBox),
            Tool::Select | Tool::AddText => None,
        }
    }
}

/// Re-add each operation at a rect derived from its current one, then
/// remove the original. Returns the new ids in the same order.
fn reissue_ops<E: EditEngine>(
    engine: &mut E,
    ids: &[OpId],
    new_rect: impl Fn(PdfRect) -> PdfRect,
) -> Result<Vec<OpId>, EngineError> {
    let mut new_ids = Vec::with_capacity(ids.len());
    for &id in ids {
        let op = load_operation(&*engine, id)?;
        new_ids.push(add_operation_at(engine, &op, new_rect(op.rect()))?);
        engine.remove_operation(id)?;
    }
    Ok(new_ids)
}

impl<E: EditEngine> EditorSession<E> {
    pub fn pointer_down(&mut self, page: u32, point: DomPoint) {
        if let Some(input) = self.text.input() {
            if input.page == page && input.rect.contains(point) {
                return;
            }
            self.blur_text_input();
        }
        if self.gesture.active().is_pointer_gesture() {
            // A pointer-up got lost; drop the stale gesture
            self.cancel_pointer_gesture();
        }
        if !self.pages.contains(page) {
            tracing::warn!(page, "pointer down on a page that is not rendered");
            return;
        }

        let handle_size = self.config.handle_size;
        if self.overlay.delete_affordance_at(page, point, handle_size) {
            if let Err(e) = self.delete_selected() {
                tracing::warn!(error = %e, "delete failed");
            }
            return;
        }

        if let Some((target, handle)) = self.overlay.handle_at(page, point, handle_size) {
            let start_rect = self.overlay.get(target).map(|el| el.dom_rect).unwrap_or_default();
            self.begin_pointer_gesture(ActiveGesture::Resizing {
                target,
                handle,
                start_point: point,
                start_rect,
            });
            return;
        }

        if let Some(target) = self.overlay.hit_test(page, point) {
            self.select(target);
            let Some(el) = self.overlay.get(target) else {
                return;
            };
            if el.is_movable() {
                let start_rect = el.dom_rect;
                self.begin_pointer_gesture(ActiveGesture::Moving {
                    target,
                    start_point: point,
                    start_rect,
                });
            }
            return;
        }

        self.deselect();

        let text_item = self
            .pages
            .get(page)
            .and_then(|info| info.text_layer.item_at(point))
            .map(|item| item.index);

        match self.tool.draw_tool() {
            Some(tool) => {
                self.begin_pointer_gesture(ActiveGesture::Drawing {
                    tool,
                    page,
                    start: point,
                    preview: DomRect::at(point, Default::default()),
                    text_item,
                });
            }
            None => match text_item {
                Some(index) => self.open_replace_editor(page, index),
                None if self.tool == Tool::AddText => self.open_free_text(page, point),
                None => {}
            },
        }
    }

    pub fn pointer_move(&mut self, point: DomPoint) {
        match self.gesture.active().clone() {
            ActiveGesture::Drawing { start, .. } => {
                if let ActiveGesture::Drawing { preview, .. } = self.gesture.active_mut() {
                    *preview = DomRect::from_corners(start, point);
                }
            }
            ActiveGesture::Resizing {
                target,
                handle,
                start_point,
                start_rect,
            } => {
                let Some(kind) = self.overlay.get(target).map(|el| el.kind) else {
                    return;
                };
                let min = min_size(kind, &self.config);
                let rect = handle.apply(
                    &start_rect,
                    point.x - start_point.x,
                    point.y - start_point.y,
                    min,
                );
                if let Some(el) = self.overlay.get_mut(target) {
                    el.dom_rect = rect;
                }
                self.element_updated(target);
            }
            ActiveGesture::Moving {
                target,
                start_point,
                start_rect,
            } => {
                let rect = start_rect.translated(point.x - start_point.x, point.y - start_point.y);
                if let Some(el) = self.overlay.get_mut(target) {
                    el.dom_rect = rect;
                }
                self.element_updated(target);
            }
            ActiveGesture::None | ActiveGesture::TextEditing { .. } => {}
        }
    }

    pub fn pointer_up(&mut self, point: DomPoint) {
        if !self.gesture.active().is_pointer_gesture() {
            return;
        }
        self.pointer_move(point);

        // Listeners go before any engine call
        let finished = self.gesture.finish(&mut self.events);
        match finished {
            ActiveGesture::Drawing {
                tool,
                page,
                start,
                text_item,
                ..
            } => self.finish_drawing(tool, page, DomRect::from_corners(start, point), text_item),
            ActiveGesture::Resizing {
                target, start_rect, ..
            } => self.finish_resize(target, start_rect),
            ActiveGesture::Moving {
                target,
                start_point,
                ..
            } => self.finish_move(target, start_point, point),
            ActiveGesture::None | ActiveGesture::TextEditing { .. } => {}
        }
    }

    /// Pointer left the page: the gesture in progress is discarded.
    pub fn pointer_leave(&mut self) {
        if self.gesture.active().is_pointer_gesture() {
            self.cancel_pointer_gesture();
        }
    }

    pub fn double_click(&mut self, page: u32, point: DomPoint) {
        if let Some(input) = self.text.input() {
            if input.page == page && input.rect.contains(point) {
                return;
            }
            self.blur_text_input();
        }
        if self.gesture.active().is_pointer_gesture() {
            self.cancel_pointer_gesture();
        }
        let Some(viewport) = self.viewport_or_warn(page) else {
            return;
        };

        if let Some(id) = self.overlay.hit_test(page, point) {
            match self.overlay.get(id).map(|el| el.kind) {
                Some(OverlayKind::Whiteout) => self.open_whiteout_editor(id),
                Some(OverlayKind::Text) => self.open_existing_text_editor(id),
                Some(OverlayKind::Replacement) => self.open_replacement_editor(id),
                _ => {}
            }
            return;
        }

        if self.tool == Tool::AddTextBox {
            let page_width = viewport.width();
            let width = self.config.textbox_default_width.min(page_width);
            let x = point.x.min(page_width - width).max(0.0);
            let rect = DomRect::new(x, point.y, width, self.config.textbox_default_height);
            self.open_text_box(page, rect);
        }
    }

    pub(crate) fn cancel_pointer_gesture(&mut self) {
        match self.gesture.finish(&mut self.events) {
            ActiveGesture::Resizing { target, .. } | ActiveGesture::Moving { target, .. } => {
                self.restore_element(target);
            }
            ActiveGesture::Drawing { .. } => tracing::debug!("draft discarded"),
            ActiveGesture::None | ActiveGesture::TextEditing { .. } => {}
        }
    }

    fn begin_pointer_gesture(&mut self, gesture: ActiveGesture) {
        if let Err(e) = self.gesture.begin(gesture, &mut self.events) {
            tracing::warn!(error = %e, "gesture not started");
        }
    }

    fn finish_drawing(&mut self, tool: DrawTool, page: u32, rect: DomRect, text_item: Option<usize>) {
        let created = match tool {
            DrawTool::Whiteout | DrawTool::Blackout => {
                let min = self.config.whiteout_min_drag;
                if rect.width >= min && rect.height >= min {
                    self.commit_rect(page, rect, tool);
                    true
                } else {
                    false
                }
            }
            DrawTool::TextBox => {
                let min = self.config.textbox_min_drag;
                if rect.width >= min || rect.height >= min {
                    let sized = DomRect::new(
                        rect.x,
                        rect.y,
                        rect.width.max(self.config.textbox_min_width),
                        rect.height.max(self.config.textbox_min_height),
                    );
                    self.open_text_box(page, sized);
                    true
                } else {
                    false
                }
            }
        };

        if !created {
            match text_item {
                Some(index) => self.open_replace_editor(page, index),
                None => tracing::debug!(?tool, width = rect.width, height = rect.height, "drag below threshold"),
            }
        }
    }

    fn commit_rect(&mut self, page: u32, rect: DomRect, tool: DrawTool) {
        let Some(viewport) = self.viewport_or_warn(page) else {
            return;
        };
        let pdf_rect = dom_rect_to_pdf(viewport.as_ref(), &rect);
        let (label, color) = match tool {
            DrawTool::Blackout => ("blackout", self.config.blackout_color.clone()),
            _ => ("whiteout", self.config.whiteout_color.clone()),
        };

        self.engine.begin_action(label);
        match self.engine.add_white_rect(page, pdf_rect, &color) {
            Ok(id) => {
                self.engine.commit_action();
                tracing::debug!(op = id, page, ?pdf_rect, label, "rect added");
                self.project_new_ops(&[id]);
                self.history_changed();
            }
            Err(e) => {
                self.engine.abort_action();
                tracing::warn!(error = %e, page, "rect not added");
            }
        }
    }

    fn finish_move(&mut self, target: ElementId, start: DomPoint, end: DomPoint) {
        let Some(el) = self.overlay.get(target).cloned() else {
            return;
        };
        if start == end {
            return;
        }
        let Some(viewport) = self.viewport_or_warn(el.page) else {
            self.restore_element(target);
            return;
        };
        let (dx, dy) = dom_delta_to_pdf(viewport.as_ref(), start, end);
        if dx == 0.0 && dy == 0.0 {
            self.restore_element(target);
            return;
        }
        self.reissue_element(&el, "move", |rect| rect.translated(dx, dy));
    }

    fn finish_resize(&mut self, target: ElementId, start_rect: DomRect) {
        let Some(el) = self.overlay.get(target).cloned() else {
            return;
        };
        if el.dom_rect == start_rect {
            return;
        }
        let Some(viewport) = self.viewport_or_warn(el.page) else {
            self.restore_element(target);
            return;
        };
        let pdf_rect = dom_rect_to_pdf(viewport.as_ref(), &el.dom_rect);
        self.reissue_element(&el, "resize", |_| pdf_rect);
    }

    /// Replace an element's operations with copies at new rects, as one
    /// action. On failure the action is rolled back and the element put
    /// back where it was.
    fn reissue_element(
        &mut self,
        el: &OverlayElement,
        label: &str,
        new_rect: impl Fn(PdfRect) -> PdfRect,
    ) {
        if matches!(el.binding, OpBinding::Draft) {
            return;
        }
        let was_selected = el.selected;

        self.engine.begin_action(label);
        match reissue_ops(&mut self.engine, &el.op_ids(), new_rect) {
            Ok(new_ids) => {
                self.engine.commit_action();
                tracing::debug!(element = el.id, old = ?el.op_ids(), new = ?new_ids, label, "element reissued");
                self.remove_element(el.id);
                let created = self.project_new_ops(&new_ids);
                if was_selected {
                    if let Some(&first) = created.first() {
                        self.select(first);
                    }
                }
                self.history_changed();
            }
            Err(e) => {
                self.engine.abort_action();
                tracing::warn!(element = el.id, error = %e, label, "engine rejected update");
                self.restore_element(el.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_names() {
        assert_eq!(Tool::from_name("whiteout"), Some(Tool::Whiteout));
        assert_eq!(Tool::from_name("addTextBox"), Some(Tool::AddTextBox));
        assert_eq!(Tool::from_name("textbox"), Some(Tool::AddTextBox));
        assert_eq!(Tool::from_name("lasso"), None);
        assert_eq!(Tool::default(), Tool::Select);
    }

    #[test]
    fn test_only_drawing_tools_draw() {
        assert_eq!(Tool::Blackout.draw_tool(), Some(DrawTool::Blackout));
        assert_eq!(Tool::AddText.draw_tool(), None);
        assert_eq!(Tool::Select.draw_tool(), None);
    }
}
