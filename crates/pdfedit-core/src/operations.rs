//! Operation log for tracking PDF edit operations
//!
//! The log is the single source of truth for every edit. Operations are
//! grouped into actions; one action is one undo/redo step.

use crate::fonts;
use serde::{Deserialize, Serialize};

pub type OpId = u64;

/// Rectangle in PDF point space (origin bottom-left, y up).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PdfRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PdfRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn top(&self) -> f64 {
        self.y + self.height
    }

    /// Grow the rect by `padding` on every side.
    pub fn padded(&self, padding: f64) -> Self {
        Self {
            x: self.x - padding,
            y: self.y - padding,
            width: self.width + padding * 2.0,
            height: self.height + padding * 2.0,
        }
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Area shared with another rect (0 when disjoint).
    pub fn intersection_area(&self, other: &PdfRect) -> f64 {
        let w = self.right().min(other.right()) - self.x.max(other.x);
        let h = self.top().min(other.top()) - self.y.max(other.y);
        if w <= 0.0 || h <= 0.0 {
            0.0
        } else {
            w * h
        }
    }

    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width >= 0.0
            && self.height >= 0.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextStyle {
    pub font_size: f64,
    pub color: String,
    /// Font name or CSS family. Mapped to PDF standard fonts on export.
    #[serde(default)]
    pub font_name: Option<String>,
    #[serde(default)]
    pub is_italic: bool,
    #[serde(default)]
    pub is_bold: bool,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 12.0,
            color: "#000000".to_string(),
            font_name: None,
            is_italic: false,
            is_bold: false,
        }
    }
}

impl TextStyle {
    /// Standard-14 font name for this style. Names that already carry a
    /// weight or slant keep it; otherwise the flags pick the variant.
    pub fn pdf_font_name(&self) -> &'static str {
        match &self.font_name {
            Some(name) => {
                let lower = name.to_lowercase();
                if lower.contains("italic") || lower.contains("bold") || lower.contains("oblique") {
                    return fonts::map_to_standard_font(name);
                }
                fonts::classify_family(name).standard_font(self.is_bold, self.is_italic)
            }
            None => fonts::FontFamily::SansSerif.standard_font(self.is_bold, self.is_italic),
        }
    }
}

/// One run of uniformly styled text inside an `AddStyledText` operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StyledTextSegment {
    pub text: String,
    #[serde(default)]
    pub is_bold: bool,
    #[serde(default)]
    pub is_italic: bool,
}

impl StyledTextSegment {
    pub fn new(text: impl Into<String>, is_bold: bool, is_italic: bool) -> Self {
        Self {
            text: text.into(),
            is_bold,
            is_italic,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum EditOperation {
    /// Colored rectangle covering content (white for whiteout, black for redaction)
    AddWhiteRect {
        id: OpId,
        page: u32,
        rect: PdfRect,
        color: String,
    },
    AddText {
        id: OpId,
        page: u32,
        rect: PdfRect,
        text: String,
        style: TextStyle,
    },
    /// Text with mixed bold/italic runs. `style` carries the shared size,
    /// color and family; its bold/italic flags are unused.
    AddStyledText {
        id: OpId,
        page: u32,
        rect: PdfRect,
        segments: Vec<StyledTextSegment>,
        style: TextStyle,
    },
    ReplaceText {
        id: OpId,
        page: u32,
        original_rect: PdfRect,
        replacement_rect: PdfRect,
        original_text: String,
        new_text: String,
        style: TextStyle,
    },
}

impl EditOperation {
    pub fn id(&self) -> OpId {
        match self {
            EditOperation::AddWhiteRect { id, .. } => *id,
            EditOperation::AddText { id, .. } => *id,
            EditOperation::AddStyledText { id, .. } => *id,
            EditOperation::ReplaceText { id, .. } => *id,
        }
    }

    pub fn page(&self) -> u32 {
        match self {
            EditOperation::AddWhiteRect { page, .. } => *page,
            EditOperation::AddText { page, .. } => *page,
            EditOperation::AddStyledText { page, .. } => *page,
            EditOperation::ReplaceText { page, .. } => *page,
        }
    }

    /// The rect the operation occupies visually.
    pub fn rect(&self) -> PdfRect {
        match self {
            EditOperation::AddWhiteRect { rect, .. } => *rect,
            EditOperation::AddText { rect, .. } => *rect,
            EditOperation::AddStyledText { rect, .. } => *rect,
            EditOperation::ReplaceText {
                replacement_rect, ..
            } => *replacement_rect,
        }
    }

    fn set_id(&mut self, new_id: OpId) {
        match self {
            EditOperation::AddWhiteRect { id, .. } => *id = new_id,
            EditOperation::AddText { id, .. } => *id = new_id,
            EditOperation::AddStyledText { id, .. } => *id = new_id,
            EditOperation::ReplaceText { id, .. } => *id = new_id,
        }
    }
}

/// What a user-visible step did. Only used for labelling and logging.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ActionKind {
    AddText,
    AddTextBox,
    AddWhiteout,
    AddBlackout,
    WhiteoutText,
    ReplaceText,
    EditText,
    Move,
    Resize,
    Delete,
    Edit,
}

impl ActionKind {
    pub fn from_label(label: &str) -> Self {
        match label.to_lowercase().as_str() {
            "text" | "addtext" => ActionKind::AddText,
            "textbox" => ActionKind::AddTextBox,
            "whiteout" => ActionKind::AddWhiteout,
            "blackout" => ActionKind::AddBlackout,
            "whiteouttext" => ActionKind::WhiteoutText,
            "replacetext" => ActionKind::ReplaceText,
            "edittext" => ActionKind::EditText,
            "move" => ActionKind::Move,
            "resize" => ActionKind::Resize,
            "delete" => ActionKind::Delete,
            _ => ActionKind::Edit,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Action {
    kind: ActionKind,
    added: Vec<EditOperation>,
    removed: Vec<EditOperation>,
}

impl Action {
    fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            added: Vec::new(),
            removed: Vec::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Ids touched by one undo or redo step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDelta {
    /// Operations no longer live after the step
    pub removed: Vec<OpId>,
    /// Operations live again after the step (same ids as before)
    pub restored: Vec<OpId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationLog {
    next_id: OpId,
    operations: Vec<EditOperation>,
    #[serde(default)]
    undo_stack: Vec<Action>,
    #[serde(default)]
    redo_stack: Vec<Action>,
    #[serde(default)]
    current_action: Option<Action>,
}

impl OperationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, mut op: EditOperation) -> OpId {
        let id = self.next_id;
        self.next_id += 1;
        op.set_id(id);

        self.operations.push(op.clone());
        match self.current_action.as_mut() {
            Some(action) => action.added.push(op),
            None => {
                let mut action = Action::new(ActionKind::Edit);
                action.added.push(op);
                self.push_undo(action);
            }
        }
        id
    }

    pub fn remove(&mut self, id: OpId) -> bool {
        let Some(pos) = self.operations.iter().position(|op| op.id() == id) else {
            return false;
        };
        let op = self.operations.remove(pos);

        match self.current_action.as_mut() {
            Some(action) => {
                // Added and removed inside the same action: nothing to record
                if let Some(added_pos) = action.added.iter().position(|a| a.id() == id) {
                    action.added.remove(added_pos);
                } else {
                    action.removed.push(op);
                }
            }
            None => {
                let mut action = Action::new(ActionKind::Delete);
                action.removed.push(op);
                self.push_undo(action);
            }
        }
        true
    }

    pub fn get_operation(&self, id: OpId) -> Option<&EditOperation> {
        self.operations.iter().find(|op| op.id() == id)
    }

    pub fn operations(&self) -> &[EditOperation] {
        &self.operations
    }

    pub fn operation_ids(&self) -> Vec<OpId> {
        self.operations.iter().map(EditOperation::id).collect()
    }

    pub fn operations_for_page(&self, page: u32) -> Vec<&EditOperation> {
        self.operations
            .iter()
            .filter(|op| op.page() == page)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Begin recording an action. An already open action keeps recording.
    pub fn begin_action(&mut self, kind: ActionKind) {
        if let Some(open) = &self.current_action {
            tracing::debug!(open = ?open.kind, requested = ?kind, "action already open");
            return;
        }
        self.current_action = Some(Action::new(kind));
    }

    /// Close the open action. Returns true if a non-empty action was pushed.
    pub fn commit_action(&mut self) -> bool {
        match self.current_action.take() {
            Some(action) if !action.is_empty() => {
                self.push_undo(action);
                true
            }
            _ => false,
        }
    }

    /// Drop the open action, reverting everything it recorded.
    pub fn abort_action(&mut self) {
        if let Some(action) = self.current_action.take() {
            for op in &action.added {
                self.remove_live(op.id());
            }
            for op in action.removed {
                self.insert_live(op);
            }
        }
    }

    pub fn is_action_open(&self) -> bool {
        self.current_action.is_some()
    }

    pub fn undo(&mut self) -> Option<ActionDelta> {
        self.commit_action();
        let action = self.undo_stack.pop()?;

        let mut delta = ActionDelta::default();
        for op in &action.added {
            if self.remove_live(op.id()) {
                delta.removed.push(op.id());
            }
        }
        for op in &action.removed {
            delta.restored.push(op.id());
            self.insert_live(op.clone());
        }
        self.redo_stack.push(action);
        Some(delta)
    }

    pub fn redo(&mut self) -> Option<ActionDelta> {
        self.commit_action();
        let action = self.redo_stack.pop()?;

        let mut delta = ActionDelta::default();
        for op in &action.removed {
            if self.remove_live(op.id()) {
                delta.removed.push(op.id());
            }
        }
        for op in &action.added {
            delta.restored.push(op.id());
            self.insert_live(op.clone());
        }
        self.undo_stack.push(action);
        Some(delta)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
            || self
                .current_action
                .as_ref()
                .is_some_and(|action| !action.is_empty())
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// True when there is anything to save or undo.
    pub fn has_changes(&self) -> bool {
        !self.operations.is_empty() || self.can_undo()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    fn push_undo(&mut self, action: Action) {
        tracing::debug!(kind = ?action.kind, added = action.added.len(), removed = action.removed.len(), "action committed");
        self.undo_stack.push(action);
        self.redo_stack.clear();
    }

    fn remove_live(&mut self, id: OpId) -> bool {
        match self.operations.iter().position(|op| op.id() == id) {
            Some(pos) => {
                self.operations.remove(pos);
                true
            }
            None => false,
        }
    }

    // Live operations stay sorted by id, so restored ops land where they were.
    fn insert_live(&mut self, op: EditOperation) {
        let pos = self.operations.partition_point(|live| live.id() < op.id());
        self.operations.insert(pos, op);
    }
}
