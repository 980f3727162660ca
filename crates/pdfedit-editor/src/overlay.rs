//! Overlay elements: the on-screen projection of committed operations
//!
//! An element is derived data. It caches the PDF rect and content of the
//! operation(s) it represents, but it can always be rebuilt from the
//! operation log plus the page viewport. Elements are created only through
//! [`OverlayElement::from_operation`] and [`OverlayElement::from_pair`].

use crate::coords::pdf_rect_to_dom;
use crate::geometry::{DomPoint, DomRect, DomSize};
use crate::gesture::ResizeHandle;
use crate::viewport::Viewport;
use pdfedit_core::{EditOperation, OpId, PdfRect, StyledTextSegment, TextStyle};
use serde::Serialize;

pub type ElementId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OverlayKind {
    Whiteout,
    Blackout,
    /// Committed text annotation (free text or text box)
    Text,
    /// Text box that has not been committed yet
    TextBox,
    Replacement,
}

/// Operation ids an element stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OpBinding {
    Draft,
    Single(OpId),
    /// Whiteout with text written inside it
    Pair { rect: OpId, text: OpId },
}

impl OpBinding {
    pub fn op_ids(&self) -> Vec<OpId> {
        match *self {
            OpBinding::Draft => Vec::new(),
            OpBinding::Single(id) => vec![id],
            OpBinding::Pair { rect, text } => vec![rect, text],
        }
    }

    pub fn contains(&self, id: OpId) -> bool {
        match *self {
            OpBinding::Draft => false,
            OpBinding::Single(own) => own == id,
            OpBinding::Pair { rect, text } => rect == id || text == id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum OverlayText {
    Plain(String),
    Styled(Vec<StyledTextSegment>),
}

impl OverlayText {
    pub fn plain_text(&self) -> String {
        match self {
            OverlayText::Plain(text) => text.clone(),
            OverlayText::Styled(segments) => segments.iter().map(|s| s.text.as_str()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayContent {
    pub text: OverlayText,
    pub style: TextStyle,
}

impl OverlayContent {
    fn from_text_op(op: &EditOperation) -> Option<Self> {
        match op {
            EditOperation::AddText { text, style, .. } => Some(Self {
                text: OverlayText::Plain(text.clone()),
                style: style.clone(),
            }),
            EditOperation::AddStyledText {
                segments, style, ..
            } => Some(Self {
                text: OverlayText::Styled(segments.clone()),
                style: style.clone(),
            }),
            EditOperation::ReplaceText {
                new_text, style, ..
            } => Some(Self {
                text: OverlayText::Plain(new_text.clone()),
                style: style.clone(),
            }),
            EditOperation::AddWhiteRect { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayElement {
    pub id: ElementId,
    pub kind: OverlayKind,
    pub page: u32,
    pub binding: OpBinding,
    pub pdf_rect: PdfRect,
    pub dom_rect: DomRect,
    pub content: Option<OverlayContent>,
    /// Rect covering the original text, for replacements
    pub cover: Option<PdfRect>,
    pub original_text: Option<String>,
    pub z_index: u64,
    pub selected: bool,
    pub hidden: bool,
}

/// Whether a CSS color string denotes black.
pub fn is_black(color: &str) -> bool {
    let normalized: String = color
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    matches!(
        normalized.as_str(),
        "#000" | "#000000" | "#000000ff" | "black" | "rgb(0,0,0)"
    )
}

impl OverlayElement {
    fn base(
        kind: OverlayKind,
        page: u32,
        binding: OpBinding,
        pdf_rect: PdfRect,
        viewport: &dyn Viewport,
    ) -> Self {
        Self {
            id: 0,
            kind,
            page,
            binding,
            pdf_rect,
            dom_rect: pdf_rect_to_dom(viewport, &pdf_rect),
            content: None,
            cover: None,
            original_text: None,
            z_index: 0,
            selected: false,
            hidden: false,
        }
    }

    /// Project one committed operation.
    pub fn from_operation(op: &EditOperation, viewport: &dyn Viewport) -> Self {
        let binding = OpBinding::Single(op.id());
        match op {
            EditOperation::AddWhiteRect {
                page, rect, color, ..
            } => {
                let kind = if is_black(color) {
                    OverlayKind::Blackout
                } else {
                    OverlayKind::Whiteout
                };
                Self::base(kind, *page, binding, *rect, viewport)
            }
            EditOperation::AddText { page, rect, .. }
            | EditOperation::AddStyledText { page, rect, .. } => {
                let mut el = Self::base(OverlayKind::Text, *page, binding, *rect, viewport);
                el.content = OverlayContent::from_text_op(op);
                el
            }
            EditOperation::ReplaceText {
                page,
                original_rect,
                replacement_rect,
                original_text,
                ..
            } => {
                let mut el = Self::base(
                    OverlayKind::Replacement,
                    *page,
                    binding,
                    *replacement_rect,
                    viewport,
                );
                el.content = OverlayContent::from_text_op(op);
                el.cover = Some(*original_rect);
                el.original_text = Some(original_text.clone());
                el
            }
        }
    }

    /// Project a whiteout together with the text written inside it.
    pub fn from_pair(
        rect_op: &EditOperation,
        text_op: &EditOperation,
        viewport: &dyn Viewport,
    ) -> Self {
        let binding = OpBinding::Pair {
            rect: rect_op.id(),
            text: text_op.id(),
        };
        let mut el = Self::base(
            OverlayKind::Whiteout,
            rect_op.page(),
            binding,
            rect_op.rect(),
            viewport,
        );
        el.content = OverlayContent::from_text_op(text_op);
        el
    }

    /// Uncommitted text box occupying `dom_rect`.
    pub fn draft_text_box(page: u32, dom_rect: DomRect, pdf_rect: PdfRect) -> Self {
        Self {
            id: 0,
            kind: OverlayKind::TextBox,
            page,
            binding: OpBinding::Draft,
            pdf_rect,
            dom_rect,
            content: None,
            cover: None,
            original_text: None,
            z_index: 0,
            selected: false,
            hidden: false,
        }
    }

    /// Recompute the on-screen rect from the cached PDF rect.
    pub fn reproject(&mut self, viewport: &dyn Viewport) {
        self.dom_rect = pdf_rect_to_dom(viewport, &self.pdf_rect);
    }

    pub fn is_resizable(&self) -> bool {
        matches!(
            self.kind,
            OverlayKind::Whiteout | OverlayKind::Blackout | OverlayKind::Text
        )
    }

    pub fn is_movable(&self) -> bool {
        !matches!(self.binding, OpBinding::Draft)
    }

    pub fn op_ids(&self) -> Vec<OpId> {
        self.binding.op_ids()
    }

    /// Resize handles with their hit areas. Only shown while selected.
    pub fn handles(&self, handle_size: f64) -> Vec<(ResizeHandle, DomRect)> {
        if !self.selected || !self.is_resizable() {
            return Vec::new();
        }
        ResizeHandle::ALL
            .iter()
            .map(|h| (*h, h.hit_rect(&self.dom_rect, handle_size)))
            .collect()
    }

    /// Delete button placed just outside the top-right corner.
    pub fn delete_affordance(&self, handle_size: f64) -> Option<DomRect> {
        if !self.selected {
            return None;
        }
        let side = handle_size * 2.0;
        Some(DomRect::new(
            self.dom_rect.right() + 4.0,
            self.dom_rect.y - 4.0 - side,
            side,
            side,
        ))
    }
}

/// Visual state of one element, for comparing overlays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlaySnapshot {
    pub kind: OverlayKind,
    pub page: u32,
    pub ops: Vec<OpId>,
    pub pdf_rect: PdfRect,
    pub dom_rect: DomRect,
    pub content: Option<OverlayContent>,
    pub cover: Option<PdfRect>,
}

#[derive(Debug, Default)]
pub struct OverlayLayer {
    elements: Vec<OverlayElement>,
    next_id: ElementId,
    z_counter: u64,
    selected: Option<ElementId>,
}

impl OverlayLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a projected element on top of everything else.
    pub fn insert(&mut self, mut element: OverlayElement) -> ElementId {
        self.next_id += 1;
        element.id = self.next_id;
        element.selected = false;
        self.z_counter += 1;
        element.z_index = self.z_counter;
        let id = element.id;
        self.elements.push(element);
        id
    }

    pub fn get(&self, id: ElementId) -> Option<&OverlayElement> {
        self.elements.iter().find(|el| el.id == id)
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut OverlayElement> {
        self.elements.iter_mut().find(|el| el.id == id)
    }

    pub fn remove(&mut self, id: ElementId) -> Option<OverlayElement> {
        let pos = self.elements.iter().position(|el| el.id == id)?;
        if self.selected == Some(id) {
            self.selected = None;
        }
        Some(self.elements.remove(pos))
    }

    pub fn find_by_op_id(&self, op: OpId) -> Option<ElementId> {
        self.elements
            .iter()
            .find(|el| el.binding.contains(op))
            .map(|el| el.id)
    }

    /// Remove the element carrying `op`. A whiteout/text pair goes as a whole.
    pub fn remove_by_op_id(&mut self, op: OpId) -> Option<OverlayElement> {
        let id = self.find_by_op_id(op)?;
        self.remove(id)
    }

    /// Select one element, deselecting any other. Returns false for an
    /// unknown id.
    pub fn select(&mut self, id: ElementId) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        for el in &mut self.elements {
            el.selected = el.id == id;
        }
        self.selected = Some(id);
        self.raise(id);
        true
    }

    pub fn deselect(&mut self) -> Option<ElementId> {
        for el in &mut self.elements {
            el.selected = false;
        }
        self.selected.take()
    }

    pub fn selected_id(&self) -> Option<ElementId> {
        self.selected
    }

    pub fn selected(&self) -> Option<&OverlayElement> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn raise(&mut self, id: ElementId) {
        self.z_counter += 1;
        let z = self.z_counter;
        if let Some(el) = self.get_mut(id) {
            el.z_index = z;
        }
    }

    /// Topmost visible element on `page` under `point`.
    pub fn hit_test(&self, page: u32, point: DomPoint) -> Option<ElementId> {
        self.elements
            .iter()
            .filter(|el| el.page == page && !el.hidden && el.dom_rect.contains(point))
            .max_by_key(|el| el.z_index)
            .map(|el| el.id)
    }

    /// Resize handle of the selected element under `point`.
    pub fn handle_at(
        &self,
        page: u32,
        point: DomPoint,
        handle_size: f64,
    ) -> Option<(ElementId, ResizeHandle)> {
        let el = self.selected()?;
        if el.page != page || el.hidden {
            return None;
        }
        el.handles(handle_size)
            .into_iter()
            .find(|(_, rect)| rect.contains(point))
            .map(|(handle, _)| (el.id, handle))
    }

    /// Whether `point` hits the selected element's delete affordance.
    pub fn delete_affordance_at(&self, page: u32, point: DomPoint, handle_size: f64) -> bool {
        self.selected()
            .filter(|el| el.page == page && !el.hidden)
            .and_then(|el| el.delete_affordance(handle_size))
            .is_some_and(|rect| rect.contains(point))
    }

    pub fn iter(&self) -> impl Iterator<Item = &OverlayElement> {
        self.elements.iter()
    }

    pub fn elements_on_page(&self, page: u32) -> impl Iterator<Item = &OverlayElement> {
        self.elements.iter().filter(move |el| el.page == page)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Drop every element. Selection goes with them.
    pub fn clear(&mut self) -> Vec<ElementId> {
        self.selected = None;
        self.elements.drain(..).map(|el| el.id).collect()
    }

    /// Committed elements in a canonical order, ignoring ids and z-order.
    pub fn snapshot(&self) -> Vec<OverlaySnapshot> {
        let mut snap: Vec<OverlaySnapshot> = self
            .elements
            .iter()
            .filter(|el| !matches!(el.binding, OpBinding::Draft))
            .map(|el| OverlaySnapshot {
                kind: el.kind,
                page: el.page,
                ops: el.op_ids(),
                pdf_rect: el.pdf_rect,
                dom_rect: el.dom_rect,
                content: el.content.clone(),
                cover: el.cover,
            })
            .collect();
        snap.sort_by_key(|s| (s.page, s.ops.first().copied()));
        snap
    }
}

/// Smallest size an element kind may be resized to.
pub fn min_size(kind: OverlayKind, config: &crate::config::EditorConfig) -> DomSize {
    match kind {
        OverlayKind::Whiteout | OverlayKind::Blackout => {
            DomSize::new(config.whiteout_min_drag, config.whiteout_min_drag)
        }
        OverlayKind::TextBox => DomSize::new(config.textbox_min_width, config.textbox_min_height),
        OverlayKind::Text | OverlayKind::Replacement => {
            DomSize::new(config.free_text_min_size, config.free_text_min_size)
        }
    }
}
