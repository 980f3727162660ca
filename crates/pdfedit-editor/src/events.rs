//! Outbound notifications for the host UI
//!
//! The editor never touches the DOM. It queues events; the host drains
//! them after each call and updates overlay nodes, toolbars and editors.

use crate::geometry::DomRect;
use crate::gesture::TextInputKind;
use crate::notification::NotificationLevel;
use crate::overlay::ElementId;
use crate::tools::Tool;
use pdfedit_core::TextStyle;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EditorEvent {
    /// Document-level pointer listeners must be installed.
    ListenersAttached { gesture: &'static str },
    /// Document-level pointer listeners must be removed.
    ListenersDetached { gesture: &'static str },
    ToolChanged { tool: Tool },
    /// `style_target` is true when style toolbar buttons apply.
    SelectionChanged {
        element: Option<ElementId>,
        style_target: bool,
    },
    TextInputOpened {
        kind: TextInputKind,
        /// Element the input is attached to, if any
        element: Option<ElementId>,
        page: u32,
        rect: DomRect,
        markup: String,
        style: TextStyle,
    },
    TextInputClosed { committed: bool },
    ActiveInputMarkupChanged { markup: String },
    ActiveInputStyleChanged { style: TextStyle },
    ElementAdded { element: ElementId },
    ElementUpdated { element: ElementId },
    ElementRemoved { element: ElementId },
    HistoryChanged { can_undo: bool, can_redo: bool },
    Notified {
        id: u64,
        message: String,
        level: NotificationLevel,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_serialize_with_type_tag() {
        let json = serde_json::to_value(EditorEvent::HistoryChanged {
            can_undo: true,
            can_redo: false,
        })
        .unwrap();
        assert_eq!(json["type"], "historyChanged");
        assert_eq!(json["can_undo"], true);

        let json = serde_json::to_value(EditorEvent::ToolChanged {
            tool: Tool::Whiteout,
        })
        .unwrap();
        assert_eq!(json["tool"], "whiteout");
    }
}
