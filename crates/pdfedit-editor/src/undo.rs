//! Undo/redo coordination and overlay projection
//!
//! The operation log is the single source of truth. After every history
//! step the overlay is reconciled against the delta the engine reports:
//! elements carrying removed ids are dropped, restored ids are projected
//! again from their JSON. Nothing is kept around from before the step.

use crate::engine::{load_operation, EditEngine};
use crate::overlay::{is_black, ElementId, OpBinding, OverlayElement, OverlayKind};
use crate::session::EditorSession;
use pdfedit_core::{ActionDelta, EditOperation, OpId};
use std::collections::BTreeSet;

/// One element's worth of operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Single(EditOperation),
    /// White rect and the text written inside it
    Pair(EditOperation, EditOperation),
}

fn is_white_rect(op: &EditOperation) -> bool {
    matches!(op, EditOperation::AddWhiteRect { color, .. } if !is_black(color))
}

fn is_plain_text(op: &EditOperation) -> bool {
    matches!(
        op,
        EditOperation::AddText { .. } | EditOperation::AddStyledText { .. }
    )
}

fn pairs_with(rect: &EditOperation, text: &EditOperation) -> bool {
    is_white_rect(rect)
        && is_plain_text(text)
        && rect.page() == text.page()
        && rect.rect() == text.rect()
}

/// Group operations into elements. A white rect pairs with the first
/// unclaimed text op on the same page with the exact same rect.
pub fn pair_operations(ops: Vec<EditOperation>) -> Vec<Projection> {
    let mut claimed = vec![false; ops.len()];
    let mut partner: Vec<Option<usize>> = vec![None; ops.len()];
    for (i, rect) in ops.iter().enumerate() {
        if !is_white_rect(rect) {
            continue;
        }
        let found = ops
            .iter()
            .enumerate()
            .find(|(j, text)| !claimed[*j] && pairs_with(rect, text))
            .map(|(j, _)| j);
        if let Some(j) = found {
            claimed[j] = true;
            partner[i] = Some(j);
        }
    }

    let mut slots: Vec<Option<EditOperation>> = ops.into_iter().map(Some).collect();
    let mut out = Vec::new();
    for i in 0..slots.len() {
        if claimed[i] {
            continue;
        }
        let Some(op) = slots[i].take() else {
            continue;
        };
        match partner[i].and_then(|j| slots[j].take()) {
            Some(text) => out.push(Projection::Pair(op, text)),
            None => out.push(Projection::Single(op)),
        }
    }
    out
}

impl<E: EditEngine> EditorSession<E> {
    /// Undo the last action. Returns false when there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        self.settle_for_history();
        let Some(delta) = self.engine.undo() else {
            return false;
        };
        tracing::debug!(removed = ?delta.removed, restored = ?delta.restored, "undo");
        self.reconcile(&delta);
        self.history_changed();
        true
    }

    pub fn redo(&mut self) -> bool {
        self.settle_for_history();
        let Some(delta) = self.engine.redo() else {
            return false;
        };
        tracing::debug!(removed = ?delta.removed, restored = ?delta.restored, "redo");
        self.reconcile(&delta);
        self.history_changed();
        true
    }

    /// History steps never run under an open input or gesture.
    fn settle_for_history(&mut self) {
        self.blur_text_input();
        if self.gesture.active().is_pointer_gesture() {
            self.cancel_pointer_gesture();
        }
    }

    fn reconcile(&mut self, delta: &ActionDelta) {
        let removed: BTreeSet<OpId> = delta.removed.iter().copied().collect();
        let mut project: BTreeSet<OpId> = delta.restored.iter().copied().collect();

        for &op in &delta.removed {
            let Some(id) = self.overlay.find_by_op_id(op) else {
                continue;
            };
            if let Some(el) = self.remove_element(id) {
                // The other half of a pair may still be live
                project.extend(el.op_ids().into_iter().filter(|o| !removed.contains(o)));
            }
        }

        // Restored ops may complete a pair with an element already shown
        let restored_ops: Vec<EditOperation> = delta
            .restored
            .iter()
            .filter_map(|&id| self.load_or_warn(id))
            .collect();
        let absorbed: Vec<ElementId> = self
            .overlay
            .iter()
            .filter(|el| matches!(el.binding, OpBinding::Single(_)))
            .filter(|el| matches!(el.kind, OverlayKind::Whiteout | OverlayKind::Text))
            .filter(|el| {
                restored_ops.iter().any(|op| {
                    op.page() == el.page
                        && op.rect() == el.pdf_rect
                        && match el.kind {
                            OverlayKind::Whiteout => is_plain_text(op),
                            _ => is_white_rect(op),
                        }
                })
            })
            .map(|el| el.id)
            .collect();
        for id in absorbed {
            if let Some(el) = self.remove_element(id) {
                project.extend(el.op_ids());
            }
        }

        let project: Vec<OpId> = project.into_iter().collect();
        self.project_new_ops(&project);
    }

    fn load_or_warn(&self, id: OpId) -> Option<EditOperation> {
        match load_operation(&self.engine, id) {
            Ok(op) => Some(op),
            Err(e) => {
                tracing::warn!(op = id, error = %e, "operation not projected");
                None
            }
        }
    }

    /// Project live operations as new overlay elements. Operations on
    /// pages without a cached render are skipped; they appear when the
    /// page is registered.
    pub(crate) fn project_new_ops(&mut self, ids: &[OpId]) -> Vec<ElementId> {
        let ops: Vec<EditOperation> = ids.iter().filter_map(|&id| self.load_or_warn(id)).collect();
        let mut created = Vec::new();
        for projection in pair_operations(ops) {
            let page = match &projection {
                Projection::Single(op) | Projection::Pair(op, _) => op.page(),
            };
            let Some(viewport) = self.pages.viewport(page) else {
                tracing::debug!(page, "page not rendered, projection deferred");
                continue;
            };
            let element = match &projection {
                Projection::Single(op) => OverlayElement::from_operation(op, viewport.as_ref()),
                Projection::Pair(rect, text) => {
                    OverlayElement::from_pair(rect, text, viewport.as_ref())
                }
            };
            created.push(self.add_element(element));
        }
        created
    }

    /// Re-project every committed element of one page from the log, with
    /// the page's current viewport. Selection survives when its operations
    /// do.
    pub(crate) fn rebuild_page(&mut self, page: u32) {
        let selected_op = self
            .overlay
            .selected()
            .filter(|el| el.page == page)
            .and_then(|el| el.op_ids().first().copied());

        let stale: Vec<ElementId> = self
            .overlay
            .elements_on_page(page)
            .filter(|el| !matches!(el.binding, OpBinding::Draft))
            .map(|el| el.id)
            .collect();
        for id in stale {
            self.remove_element(id);
        }

        let live: Vec<OpId> = self
            .engine
            .operation_ids()
            .into_iter()
            .filter(|&id| self.load_or_warn(id).is_some_and(|op| op.page() == page))
            .collect();
        let created = self.project_new_ops(&live);
        tracing::debug!(page, elements = created.len(), "page overlay rebuilt");

        if let Some(op) = selected_op {
            if let Some(id) = self.overlay.find_by_op_id(op) {
                self.select(id);
            }
        }
    }

    /// Discard the whole overlay and rebuild it from the operation log.
    pub fn rebuild_overlay(&mut self) {
        self.settle_for_history();
        let pages: Vec<u32> = self.pages.page_numbers().collect();
        for page in pages {
            self.rebuild_page(page);
        }
    }
}
