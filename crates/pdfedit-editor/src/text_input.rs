//! Opening and committing text inputs
//!
//! Every text input maps to a [`TextTarget`]. Commit turns the input's
//! markup into a [`TextPayload`] and writes it through the engine inside a
//! single action, then re-projects whatever the engine now holds.

use crate::coords::{dom_rect_to_pdf, pdf_rect_to_dom};
use crate::engine::{add_operation_at, load_operation, EditEngine, EngineError};
use crate::error::EditorError;
use crate::events::EditorEvent;
use crate::geometry::{DomPoint, DomRect, DomSize};
use crate::gesture::{ActiveGesture, TextTarget};
use crate::markup;
use crate::overlay::{ElementId, OpBinding, OverlayContent, OverlayElement, OverlayText};
use crate::session::EditorSession;
use crate::text_style::{ActiveInput, StyleChange, TextPayload};
use crate::viewport::Viewport;
use pdfedit_core::{OpId, PdfRect, TextStyle};

const CHAR_WIDTH_EM: f64 = 0.6;
const LINE_HEIGHT_EM: f64 = 1.2;

/// Rough rendered size of `text` when the host did not measure it.
pub fn estimate_text_size(text: &str, font_size: f64, scale: f64) -> DomSize {
    let lines: Vec<&str> = text.split('\n').collect();
    let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    DomSize::new(
        longest as f64 * font_size * CHAR_WIDTH_EM * scale,
        lines.len() as f64 * font_size * LINE_HEIGHT_EM * scale,
    )
}

/// Markup and style to seed an editor with existing content.
pub fn content_markup(content: &OverlayContent) -> String {
    match &content.text {
        OverlayText::Plain(text) => markup::escape(text),
        OverlayText::Styled(segments) => {
            markup::render_segments(segments, content.style.is_bold, content.style.is_italic)
        }
    }
}

/// Write a payload as one text operation. Returns `None` for empty text.
fn add_payload<E: EditEngine>(
    engine: &mut E,
    page: u32,
    rect: PdfRect,
    payload: &TextPayload,
    style: &TextStyle,
) -> Result<Option<OpId>, EngineError> {
    match payload {
        TextPayload::Empty => Ok(None),
        TextPayload::Uniform {
            text,
            is_bold,
            is_italic,
        } => {
            let style = TextStyle {
                is_bold: *is_bold,
                is_italic: *is_italic,
                ..style.clone()
            };
            engine.add_text(page, rect, text, &style).map(Some)
        }
        TextPayload::Styled(segments) => {
            let json = serde_json::to_string(segments)?;
            engine.add_styled_text(page, rect, &json, style).map(Some)
        }
    }
}

/// PDF-space size of the content the host measured, if it did.
fn measured_pdf_size(viewport: &dyn Viewport, input: &ActiveInput) -> Option<(f64, f64)> {
    input.measured.map(|size| {
        let rect = dom_rect_to_pdf(viewport, &DomRect::at(input.rect.origin(), size));
        (rect.width, rect.height)
    })
}

/// Engine writes of one commit, and whether anything was written.
struct CommitOutcome {
    /// Element whose operations were replaced
    replaced: Option<ElementId>,
    /// Live ops to project after the commit
    project: Vec<OpId>,
    wrote: bool,
}

impl CommitOutcome {
    fn nothing() -> Self {
        Self {
            replaced: None,
            project: Vec::new(),
            wrote: false,
        }
    }
}

impl<E: EditEngine> EditorSession<E> {
    fn open_text_input(
        &mut self,
        page: u32,
        rect: DomRect,
        markup: String,
        style: TextStyle,
        target: TextTarget,
    ) {
        if self.text.is_active() {
            self.blur_text_input();
        }
        let kind = target.kind();
        let element = target.element();
        if let Err(e) = self
            .gesture
            .begin(ActiveGesture::TextEditing { target }, &mut self.events)
        {
            tracing::warn!(error = %e, "text input not opened");
            return;
        }
        let input = self.text.open(page, rect, markup, style);
        tracing::debug!(page, ?kind, ?element, "text input opened");
        self.events.push(EditorEvent::TextInputOpened {
            kind,
            element,
            page,
            rect: input.rect,
            markup: input.markup.clone(),
            style: input.style.clone(),
        });
        self.selection_changed();
    }

    pub(crate) fn open_free_text(&mut self, page: u32, anchor: DomPoint) {
        let Some(viewport) = self.viewport_or_warn(page) else {
            return;
        };
        let style = self.config.default_text_style();
        let rect = DomRect::at(
            anchor,
            DomSize::new(
                self.config.textbox_min_width,
                style.font_size * LINE_HEIGHT_EM * viewport.scale(),
            ),
        );
        self.open_text_input(page, rect, String::new(), style, TextTarget::FreeText { page, anchor });
    }

    /// Create an uncommitted text box and open its editor.
    pub(crate) fn open_text_box(&mut self, page: u32, rect: DomRect) {
        let Some(viewport) = self.viewport_or_warn(page) else {
            return;
        };
        let pdf_rect = dom_rect_to_pdf(viewport.as_ref(), &rect);
        let element = self.add_element(OverlayElement::draft_text_box(page, rect, pdf_rect));
        self.select(element);
        let style = self.config.default_text_style();
        self.open_text_input(page, rect, String::new(), style, TextTarget::TextBox { element });
    }

    /// Inline editor inside a whiteout. Without existing text the style is
    /// taken from the original text the whiteout covers.
    pub(crate) fn open_whiteout_editor(&mut self, id: ElementId) {
        let Some(el) = self.overlay.get(id).cloned() else {
            return;
        };
        let (markup, style) = match &el.content {
            Some(content) => (content_markup(content), content.style.clone()),
            None => {
                let covered = self
                    .pages
                    .get(el.page)
                    .and_then(|info| info.text_layer.dominant_item_in(&el.pdf_rect))
                    .map(|item| item.style(&self.config.default_text_color));
                if covered.is_some() {
                    tracing::debug!(element = id, "seeding style from covered text");
                }
                (String::new(), covered.unwrap_or_else(|| self.config.default_text_style()))
            }
        };
        self.open_text_input(el.page, el.dom_rect, markup, style, TextTarget::WhiteoutText { element: id });
    }

    pub(crate) fn open_existing_text_editor(&mut self, id: ElementId) {
        let Some(el) = self.overlay.get(id).cloned() else {
            return;
        };
        let Some(content) = &el.content else {
            return;
        };
        self.hide_element(id);
        self.open_text_input(
            el.page,
            el.dom_rect,
            content_markup(content),
            content.style.clone(),
            TextTarget::ExistingText { element: id },
        );
    }

    pub(crate) fn open_replacement_editor(&mut self, id: ElementId) {
        let Some(el) = self.overlay.get(id).cloned() else {
            return;
        };
        let (Some(content), Some(cover)) = (&el.content, el.cover) else {
            return;
        };
        self.hide_element(id);
        self.open_text_input(
            el.page,
            el.dom_rect,
            content_markup(content),
            content.style.clone(),
            TextTarget::Replace {
                page: el.page,
                element: Some(id),
                cover,
                original_text: el.original_text.clone().unwrap_or_default(),
            },
        );
    }

    /// Replace editor over an original text run, seeded with its text and
    /// detected style.
    pub(crate) fn open_replace_editor(&mut self, page: u32, index: usize) {
        let Some(viewport) = self.viewport_or_warn(page) else {
            return;
        };
        let Some(item) = self.pages.get(page).and_then(|info| info.text_layer.get(index)).cloned()
        else {
            tracing::warn!(page, index, "text item not found");
            return;
        };
        let cover = item.pdf_rect().padded(self.config.replace_padding);
        let rect = pdf_rect_to_dom(viewport.as_ref(), &cover);
        let style = item.style(&self.config.default_text_color);
        self.open_text_input(
            page,
            rect,
            markup::escape(&item.text),
            style,
            TextTarget::Replace {
                page,
                element: None,
                cover,
                original_text: item.text,
            },
        );
    }

    fn hide_element(&mut self, id: ElementId) {
        if let Some(el) = self.overlay.get_mut(id) {
            el.hidden = true;
        }
        self.element_updated(id);
    }

    // ---- input updates from the host ----

    fn style_changed(&mut self, change: StyleChange) {
        let event = match change {
            StyleChange::Markup(markup) => EditorEvent::ActiveInputMarkupChanged { markup },
            StyleChange::Style(style) => EditorEvent::ActiveInputStyleChanged { style },
        };
        self.events.push(event);
    }

    /// The host reports the input's current markup after typing.
    pub fn update_input(&mut self, markup: &str) -> Result<(), EditorError> {
        self.text.set_markup(markup)
    }

    pub fn set_input_selection(&mut self, range: Option<(usize, usize)>) -> Result<(), EditorError> {
        self.text.set_selection(range)
    }

    pub fn set_input_measured_size(&mut self, size: DomSize) -> Result<(), EditorError> {
        self.text.set_measured_size(size)
    }

    pub fn toggle_bold(&mut self) -> Result<(), EditorError> {
        let change = self.text.toggle_bold()?;
        self.style_changed(change);
        Ok(())
    }

    pub fn toggle_italic(&mut self) -> Result<(), EditorError> {
        let change = self.text.toggle_italic()?;
        self.style_changed(change);
        Ok(())
    }

    pub fn set_font_size(&mut self, size: f64) -> Result<(), EditorError> {
        let change = self.text.set_font_size(size)?;
        self.style_changed(change);
        Ok(())
    }

    pub fn set_font_family(&mut self, family: &str) -> Result<(), EditorError> {
        let change = self.text.set_font_family(family)?;
        self.style_changed(change);
        Ok(())
    }

    pub fn set_text_color(&mut self, color: &str) -> Result<(), EditorError> {
        let change = self.text.set_color(color)?;
        self.style_changed(change);
        Ok(())
    }

    // ---- close ----

    /// Commit the open input. Returns whether the engine was written to.
    pub fn commit_text_input(&mut self) -> Result<bool, EditorError> {
        if !matches!(self.gesture.active(), ActiveGesture::TextEditing { .. }) {
            return Err(EditorError::NoActiveInput);
        }
        let ActiveGesture::TextEditing { target } = self.gesture.finish(&mut self.events) else {
            return Err(EditorError::NoActiveInput);
        };
        let input = self.text.close().ok_or(EditorError::NoActiveInput)?;

        let untouched_existing = matches!(
            target,
            TextTarget::WhiteoutText { .. }
                | TextTarget::ExistingText { .. }
                | TextTarget::Replace { .. }
        );
        if untouched_existing && input.is_unchanged() {
            tracing::debug!(kind = ?target.kind(), "input unchanged, nothing to commit");
            self.discard_target(&target);
            self.events.push(EditorEvent::TextInputClosed { committed: false });
            self.selection_changed();
            return Ok(false);
        }

        let Some(viewport) = self.viewport_or_warn(input.page) else {
            self.discard_target(&target);
            self.events.push(EditorEvent::TextInputClosed { committed: false });
            return Err(EditorError::PageNotReady(input.page));
        };

        let (label, result) = match &target {
            TextTarget::FreeText { page, anchor } => (
                "addtext",
                self.write_free_text(*page, *anchor, &input, viewport.as_ref()),
            ),
            TextTarget::TextBox { element } => (
                "addtextbox",
                self.write_text_box(*element, &input, viewport.as_ref()),
            ),
            TextTarget::WhiteoutText { element } => (
                "whiteouttext",
                self.write_whiteout_text(*element, &input, viewport.as_ref()),
            ),
            TextTarget::ExistingText { element } => (
                "edittext",
                self.write_existing_text(*element, &input, viewport.as_ref()),
            ),
            TextTarget::Replace {
                page,
                element,
                cover,
                original_text,
            } => (
                "replacetext",
                self.write_replacement(*page, *element, *cover, original_text, &input, viewport.as_ref()),
            ),
        };

        match result {
            Ok(outcome) => {
                if outcome.wrote {
                    self.engine.commit_action();
                }
                tracing::debug!(label, wrote = outcome.wrote, ops = ?outcome.project, "text input committed");
                if let TextTarget::TextBox { element } = &target {
                    self.remove_element(*element);
                }
                match outcome.replaced {
                    Some(old) if outcome.wrote => {
                        self.remove_element(old);
                    }
                    _ => self.discard_target(&target),
                }
                self.project_new_ops(&outcome.project);
                self.events.push(EditorEvent::TextInputClosed {
                    committed: outcome.wrote,
                });
                self.selection_changed();
                if outcome.wrote {
                    self.history_changed();
                }
                Ok(outcome.wrote)
            }
            Err(e) => {
                self.engine.abort_action();
                tracing::warn!(label, error = %e, "text commit rejected");
                self.discard_target(&target);
                self.events.push(EditorEvent::TextInputClosed { committed: false });
                self.selection_changed();
                Err(e.into())
            }
        }
    }

    /// Close the open input without writing anything.
    pub fn cancel_text_input(&mut self) {
        let ActiveGesture::TextEditing { target } = self.gesture.active().clone() else {
            return;
        };
        self.gesture.finish(&mut self.events);
        self.text.close();
        tracing::debug!(kind = ?target.kind(), "text input cancelled");
        self.discard_target(&target);
        self.events.push(EditorEvent::TextInputClosed { committed: false });
        self.selection_changed();
    }

    /// Commit the open input, if any, logging a rejected commit.
    pub(crate) fn blur_text_input(&mut self) {
        if !self.text.is_active() {
            return;
        }
        if let Err(e) = self.commit_text_input() {
            tracing::warn!(error = %e, "text input lost on blur");
        }
    }

    /// Undo the visual side effects of opening an input.
    fn discard_target(&mut self, target: &TextTarget) {
        match target {
            TextTarget::TextBox { element } => {
                self.remove_element(*element);
            }
            TextTarget::ExistingText { element }
            | TextTarget::Replace {
                element: Some(element),
                ..
            } => self.restore_element(*element),
            TextTarget::FreeText { .. }
            | TextTarget::WhiteoutText { .. }
            | TextTarget::Replace { element: None, .. } => {}
        }
    }

    // ---- engine writes, one per target ----
    //
    // Each opens its action only when it is about to write; the caller
    // commits or aborts.

    fn write_free_text(
        &mut self,
        page: u32,
        anchor: DomPoint,
        input: &ActiveInput,
        viewport: &dyn Viewport,
    ) -> Result<CommitOutcome, EngineError> {
        let payload = input.payload();
        if payload.is_empty() {
            return Ok(CommitOutcome::nothing());
        }
        let size = input.measured.unwrap_or_else(|| {
            estimate_text_size(&payload.text(), input.style.font_size, viewport.scale())
        });
        let rect = dom_rect_to_pdf(viewport, &DomRect::at(anchor, size));

        self.engine.begin_action("addtext");
        let id = add_payload(&mut self.engine, page, rect, &payload, &input.style)?;
        Ok(CommitOutcome {
            replaced: None,
            project: id.into_iter().collect(),
            wrote: true,
        })
    }

    fn write_text_box(
        &mut self,
        element: ElementId,
        input: &ActiveInput,
        viewport: &dyn Viewport,
    ) -> Result<CommitOutcome, EngineError> {
        let Some(el) = self.overlay.get(element).cloned() else {
            return Ok(CommitOutcome::nothing());
        };
        let payload = input.payload();
        if payload.is_empty() {
            return Ok(CommitOutcome::nothing());
        }
        let rect = dom_rect_to_pdf(viewport, &el.dom_rect);

        self.engine.begin_action("addtextbox");
        let id = add_payload(&mut self.engine, el.page, rect, &payload, &input.style)?;
        Ok(CommitOutcome {
            replaced: None,
            project: id.into_iter().collect(),
            wrote: true,
        })
    }

    /// Text inside a whiteout takes the whiteout's rect. Content that
    /// outgrew the rect re-adds the rect at the grown size in the same
    /// action.
    fn write_whiteout_text(
        &mut self,
        element: ElementId,
        input: &ActiveInput,
        viewport: &dyn Viewport,
    ) -> Result<CommitOutcome, EngineError> {
        let Some(el) = self.overlay.get(element).cloned() else {
            return Ok(CommitOutcome::nothing());
        };
        let (rect_op, old_text) = match el.binding {
            OpBinding::Single(rect) => (rect, None),
            OpBinding::Pair { rect, text } => (rect, Some(text)),
            OpBinding::Draft => return Ok(CommitOutcome::nothing()),
        };
        let payload = input.payload();
        let grown = input
            .measured
            .filter(|m| m.width > el.dom_rect.width || m.height > el.dom_rect.height)
            .map(|m| dom_rect_to_pdf(viewport, &el.dom_rect.grown_to(m)));
        if payload.is_empty() && old_text.is_none() && grown.is_none() {
            return Ok(CommitOutcome::nothing());
        }

        self.engine.begin_action("whiteouttext");
        if let Some(text) = old_text {
            self.engine.remove_operation(text)?;
        }
        let mut project = Vec::new();
        let rect = match grown {
            Some(grown) => {
                let op = load_operation(&self.engine, rect_op)?;
                project.push(add_operation_at(&mut self.engine, &op, grown)?);
                self.engine.remove_operation(rect_op)?;
                grown
            }
            None => {
                project.push(rect_op);
                el.pdf_rect
            }
        };
        if let Some(id) = add_payload(&mut self.engine, el.page, rect, &payload, &input.style)? {
            project.push(id);
        }
        Ok(CommitOutcome {
            replaced: Some(element),
            project,
            wrote: true,
        })
    }

    /// Re-edit of committed text. Empty text deletes it.
    fn write_existing_text(
        &mut self,
        element: ElementId,
        input: &ActiveInput,
        viewport: &dyn Viewport,
    ) -> Result<CommitOutcome, EngineError> {
        let Some(el) = self.overlay.get(element).cloned() else {
            return Ok(CommitOutcome::nothing());
        };
        let payload = input.payload();
        let rect = match measured_pdf_size(viewport, input) {
            Some((w, h)) => PdfRect::new(
                el.pdf_rect.x,
                el.pdf_rect.top() - h.max(el.pdf_rect.height),
                w.max(el.pdf_rect.width),
                h.max(el.pdf_rect.height),
            ),
            None => el.pdf_rect,
        };

        self.engine.begin_action("edittext");
        for op in el.op_ids() {
            self.engine.remove_operation(op)?;
        }
        let id = add_payload(&mut self.engine, el.page, rect, &payload, &input.style)?;
        Ok(CommitOutcome {
            replaced: Some(element),
            project: id.into_iter().collect(),
            wrote: true,
        })
    }

    /// Replace an original text run. Mixed styling collapses to the
    /// dominant style since replacements carry a single style.
    fn write_replacement(
        &mut self,
        page: u32,
        element: Option<ElementId>,
        cover: PdfRect,
        original_text: &str,
        input: &ActiveInput,
        viewport: &dyn Viewport,
    ) -> Result<CommitOutcome, EngineError> {
        let previous = element.and_then(|id| self.overlay.get(id).cloned());
        let payload = input.payload();
        if payload.is_empty() && previous.is_none() {
            return Ok(CommitOutcome::nothing());
        }

        let mut new_rect = previous.as_ref().map(|el| el.pdf_rect).unwrap_or(cover);
        if let Some((w, _)) = measured_pdf_size(viewport, input) {
            new_rect.width = new_rect.width.max(w);
        }
        let (text, is_bold, is_italic) = payload.collapsed();
        let style = TextStyle {
            is_bold,
            is_italic,
            ..input.style.clone()
        };

        self.engine.begin_action("replacetext");
        if let Some(el) = &previous {
            for op in el.op_ids() {
                self.engine.remove_operation(op)?;
            }
        }
        let mut project = Vec::new();
        if !payload.is_empty() {
            project.push(self.engine.replace_text(page, cover, new_rect, original_text, &text, &style)?);
        }
        Ok(CommitOutcome {
            replaced: element,
            project,
            wrote: true,
        })
    }
}
