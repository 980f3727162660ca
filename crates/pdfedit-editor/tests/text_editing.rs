mod common;

use common::{click, double_click, drag, live_ops, session, session_with_text};
use pdfedit_core::{EditOperation, StyledTextSegment};
use pdfedit_editor::overlay::{OpBinding, OverlayText};
use pdfedit_editor::{DomSize, EditorEvent, Key, OverlayKind, Tool};
use pretty_assertions::assert_eq;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_free_text_commit_creates_one_operation() {
    let mut s = session(1);
    s.set_tool(Tool::AddText);
    click(&mut s, 1, (100.0, 500.0));
    assert!(s.active_input().is_some());

    s.update_input("  Hello  ").unwrap();
    assert!(s.has_unsaved_changes());
    assert!(s.commit_text_input().unwrap());

    let ops = live_ops(&s);
    assert_eq!(ops.len(), 1);
    assert!(matches!(&ops[0], EditOperation::AddText { text, .. } if text == "Hello"));
    assert_eq!(s.overlay().iter().next().unwrap().kind, OverlayKind::Text);
}

#[test]
fn test_free_text_uses_measured_size() {
    let mut s = session(1);
    s.set_tool(Tool::AddText);
    click(&mut s, 1, (100.0, 500.0));
    s.update_input("Hello").unwrap();
    s.set_input_measured_size(DomSize::new(40.0, 16.0)).unwrap();
    s.commit_text_input().unwrap();

    let rect = live_ops(&s)[0].rect();
    assert!(close(rect.x, 100.0));
    assert!(close(rect.y, 276.0));
    assert!(close(rect.width, 40.0));
    assert!(close(rect.height, 16.0));
}

#[test]
fn test_escape_and_empty_text_discard_free_text() {
    let mut s = session(1);
    s.set_tool(Tool::AddText);
    click(&mut s, 1, (100.0, 500.0));
    s.update_input("draft").unwrap();
    assert!(s.key_down(Key::Escape));
    assert!(s.active_input().is_none());

    click(&mut s, 1, (100.0, 500.0));
    s.update_input("<br>&nbsp;").unwrap();
    assert!(!s.commit_text_input().unwrap());

    assert!(s.engine().operation_ids().is_empty());
    assert!(!s.can_undo());
}

#[test]
fn test_enter_commits_single_line_inputs_only() {
    let mut s = session(1);
    s.set_tool(Tool::AddText);
    click(&mut s, 1, (100.0, 500.0));
    s.update_input("Hi").unwrap();
    assert!(s.key_down(Key::Enter));
    assert_eq!(s.engine().operation_ids().len(), 1);

    s.set_tool(Tool::AddTextBox);
    drag(&mut s, 1, (300.0, 100.0), (450.0, 160.0));
    s.update_input("line one").unwrap();
    assert!(!s.key_down(Key::Enter));
    assert!(s.active_input().is_some());
}

#[test]
fn test_switching_tools_commits_open_input() {
    let mut s = session(1);
    s.set_tool(Tool::AddText);
    click(&mut s, 1, (100.0, 500.0));
    s.update_input("Hi").unwrap();
    s.set_tool(Tool::Whiteout);
    assert!(s.active_input().is_none());
    assert_eq!(s.engine().operation_ids().len(), 1);
}

#[test]
fn test_clicking_elsewhere_commits_open_input() {
    let mut s = session(1);
    s.set_tool(Tool::AddText);
    click(&mut s, 1, (100.0, 500.0));
    s.update_input("first").unwrap();
    click(&mut s, 1, (300.0, 200.0));
    assert_eq!(s.engine().operation_ids().len(), 1);
    // The second click opened a fresh input
    assert_eq!(s.active_input().unwrap().markup, "");
}

#[test]
fn test_mixed_styling_emits_styled_text() {
    let mut s = session(1);
    s.set_tool(Tool::AddText);
    click(&mut s, 1, (100.0, 500.0));
    s.update_input("Hello <b>World</b>").unwrap();
    s.commit_text_input().unwrap();

    match &live_ops(&s)[0] {
        EditOperation::AddStyledText { segments, style, .. } => {
            assert_eq!(
                segments,
                &vec![
                    StyledTextSegment::new("Hello ", false, false),
                    StyledTextSegment::new("World", true, false),
                ]
            );
            assert!(!style.is_bold);
        }
        other => panic!("expected styled text, got {:?}", other),
    }
}

#[test]
fn test_single_style_markup_falls_back_to_plain_text() {
    let mut s = session(1);
    s.set_tool(Tool::AddText);
    click(&mut s, 1, (100.0, 500.0));
    s.update_input("<b>Hello</b><b> World</b>").unwrap();
    s.commit_text_input().unwrap();

    match &live_ops(&s)[0] {
        EditOperation::AddText { text, style, .. } => {
            assert_eq!(text, "Hello World");
            assert!(style.is_bold);
        }
        other => panic!("expected plain text, got {:?}", other),
    }
}

#[test]
fn test_partial_bold_toggle_wraps_selection() {
    let mut s = session(1);
    s.set_tool(Tool::AddText);
    click(&mut s, 1, (100.0, 500.0));
    s.update_input("Hello World").unwrap();
    s.set_input_selection(Some((6, 11))).unwrap();
    s.drain_events();
    s.toggle_bold().unwrap();

    assert_eq!(s.active_input().unwrap().markup, "Hello <b>World</b>");
    assert!(s.drain_events().contains(&EditorEvent::ActiveInputMarkupChanged {
        markup: "Hello <b>World</b>".to_string()
    }));
    s.commit_text_input().unwrap();
    assert!(matches!(&live_ops(&s)[0], EditOperation::AddStyledText { .. }));
}

#[test]
fn test_whole_element_toggle_without_selection() {
    let mut s = session(1);
    s.set_tool(Tool::AddText);
    click(&mut s, 1, (100.0, 500.0));
    s.update_input("Hello").unwrap();
    s.toggle_italic().unwrap();
    s.set_font_size(20.0).unwrap();
    s.set_font_family("serif").unwrap();
    s.commit_text_input().unwrap();

    match &live_ops(&s)[0] {
        EditOperation::AddText { style, .. } => {
            assert!(style.is_italic);
            assert!(!style.is_bold);
            assert_eq!(style.font_size, 20.0);
            assert_eq!(style.font_name.as_deref(), Some("serif"));
        }
        other => panic!("expected plain text, got {:?}", other),
    }
}

#[test]
fn test_style_calls_without_input_fail() {
    let mut s = session(1);
    assert!(s.toggle_bold().is_err());
    assert!(s.update_input("x").is_err());
    assert!(s.commit_text_input().is_err());
}

#[test]
fn test_whiteout_text_pairs_and_takes_covered_style() {
    let mut s = session_with_text();
    s.set_tool(Tool::Whiteout);
    drag(&mut s, 1, (60.0, 120.0), (200.0, 150.0));
    s.set_tool(Tool::Select);

    double_click(&mut s, 1, (65.0, 125.0));
    let input = s.active_input().unwrap();
    assert_eq!(input.style.font_size, 11.0);
    assert!(input.style.is_bold);
    assert_eq!(input.style.font_name.as_deref(), Some("serif"));

    s.update_input("Paid").unwrap();
    assert!(s.commit_text_input().unwrap());

    let ops = live_ops(&s);
    assert_eq!(ops.len(), 2);
    assert_eq!(ops[0].rect(), ops[1].rect());
    assert_eq!(s.overlay().len(), 1);
    let el = s.overlay().iter().next().unwrap();
    assert_eq!(el.kind, OverlayKind::Whiteout);
    assert!(matches!(el.binding, OpBinding::Pair { .. }));
    assert_eq!(
        el.content.as_ref().map(|c| c.text.clone()),
        Some(OverlayText::Plain("Paid".to_string()))
    );

    // Undo takes the text back out, leaving the plain whiteout
    assert!(s.undo());
    assert_eq!(s.engine().operation_ids().len(), 1);
    let el = s.overlay().iter().next().unwrap();
    assert!(matches!(el.binding, OpBinding::Single(_)));
    assert!(el.content.is_none());

    assert!(s.redo());
    assert!(matches!(
        s.overlay().iter().next().unwrap().binding,
        OpBinding::Pair { .. }
    ));
}

#[test]
fn test_whiteout_grows_with_its_text_in_one_action() {
    let mut s = session(1);
    s.set_tool(Tool::Whiteout);
    drag(&mut s, 1, (60.0, 120.0), (200.0, 150.0));
    s.set_tool(Tool::Select);

    double_click(&mut s, 1, (65.0, 125.0));
    s.update_input("A much longer note").unwrap();
    s.set_input_measured_size(DomSize::new(200.0, 30.0)).unwrap();
    s.commit_text_input().unwrap();

    let ops = live_ops(&s);
    assert_eq!(ops.len(), 2);
    assert!(ops.iter().all(|op| close(op.rect().width, 200.0)));
    let el = s.overlay().iter().next().unwrap();
    assert!(close(el.dom_rect.width, 200.0));

    assert!(s.undo());
    let ops = live_ops(&s);
    assert_eq!(ops.len(), 1);
    assert!(close(ops[0].rect().width, 140.0));
}

#[test]
fn test_blackout_has_no_inline_editor() {
    let mut s = session(1);
    s.set_tool(Tool::Blackout);
    drag(&mut s, 1, (60.0, 120.0), (200.0, 150.0));
    s.set_tool(Tool::Select);
    double_click(&mut s, 1, (65.0, 125.0));
    assert!(s.active_input().is_none());
}

#[test]
fn test_replace_editor_commits_replace_text() {
    let mut s = session_with_text();
    click(&mut s, 1, (100.0, 85.0));
    s.update_input("Receipt").unwrap();
    assert!(s.commit_text_input().unwrap());

    let ops = live_ops(&s);
    assert_eq!(ops.len(), 1);
    match &ops[0] {
        EditOperation::ReplaceText {
            original_rect,
            replacement_rect,
            original_text,
            new_text,
            style,
            ..
        } => {
            assert_eq!(original_text, "Invoice");
            assert_eq!(new_text, "Receipt");
            assert_eq!(style.font_size, 18.0);
            assert!(close(original_rect.x, 70.5));
            assert!(close(original_rect.y, 700.0 - 3.6 - 1.5));
            assert!(close(original_rect.width, 73.0));
            assert!(close(original_rect.height, 21.0));
            assert_eq!(original_rect, replacement_rect);
        }
        other => panic!("expected replacement, got {:?}", other),
    }
    let el = s.overlay().iter().next().unwrap();
    assert_eq!(el.kind, OverlayKind::Replacement);
    assert!(el.cover.is_some());
}

#[test]
fn test_replace_editor_widens_for_longer_text() {
    let mut s = session_with_text();
    click(&mut s, 1, (100.0, 85.0));
    s.update_input("Commercial invoice").unwrap();
    s.set_input_measured_size(DomSize::new(160.0, 21.0)).unwrap();
    s.commit_text_input().unwrap();

    match &live_ops(&s)[0] {
        EditOperation::ReplaceText {
            original_rect,
            replacement_rect,
            ..
        } => {
            assert!(close(original_rect.width, 73.0));
            assert!(close(replacement_rect.width, 160.0));
            assert!(close(replacement_rect.x, original_rect.x));
        }
        other => panic!("expected replacement, got {:?}", other),
    }
}

#[test]
fn test_unchanged_replace_writes_nothing() {
    let mut s = session_with_text();
    click(&mut s, 1, (100.0, 85.0));
    assert!(!s.commit_text_input().unwrap());
    assert!(s.engine().operation_ids().is_empty());
    assert!(s.overlay().is_empty());
}

#[test]
fn test_mixed_styling_in_replacement_collapses_to_dominant() {
    let mut s = session_with_text();
    click(&mut s, 1, (100.0, 85.0));
    s.update_input("Re<b>ceipt</b>").unwrap();
    s.commit_text_input().unwrap();

    match &live_ops(&s)[0] {
        EditOperation::ReplaceText {
            new_text, style, ..
        } => {
            assert_eq!(new_text, "Receipt");
            assert!(style.is_bold);
        }
        other => panic!("expected replacement, got {:?}", other),
    }
}

#[test]
fn test_reediting_replacement_cancel_and_commit() {
    let mut s = session_with_text();
    click(&mut s, 1, (100.0, 85.0));
    s.update_input("Receipt").unwrap();
    s.commit_text_input().unwrap();
    s.set_tool(Tool::Select);

    double_click(&mut s, 1, (100.0, 85.0));
    assert_eq!(s.active_input().unwrap().markup, "Receipt");
    assert!(s.overlay().iter().next().unwrap().hidden);

    assert!(s.key_down(Key::Escape));
    let el = s.overlay().iter().next().unwrap();
    assert!(!el.hidden);
    assert_eq!(s.engine().operation_ids().len(), 1);

    double_click(&mut s, 1, (100.0, 85.0));
    s.update_input("Total").unwrap();
    s.commit_text_input().unwrap();
    let ops = live_ops(&s);
    assert_eq!(ops.len(), 1);
    assert!(matches!(&ops[0], EditOperation::ReplaceText { new_text, .. } if new_text == "Total"));
    assert_eq!(s.overlay().len(), 1);

    assert!(s.undo());
    let ops = live_ops(&s);
    assert!(matches!(&ops[0], EditOperation::ReplaceText { new_text, .. } if new_text == "Receipt"));
}

#[test]
fn test_emptying_existing_text_deletes_it() {
    let mut s = session(1);
    s.set_tool(Tool::AddText);
    click(&mut s, 1, (100.0, 500.0));
    s.update_input("Hi").unwrap();
    s.commit_text_input().unwrap();
    s.set_tool(Tool::Select);

    double_click(&mut s, 1, (105.0, 505.0));
    assert_eq!(s.active_input().unwrap().markup, "Hi");
    s.update_input("").unwrap();
    assert!(s.commit_text_input().unwrap());
    assert!(s.engine().operation_ids().is_empty());
    assert!(s.overlay().is_empty());

    assert!(s.undo());
    assert_eq!(s.overlay().len(), 1);
}

#[test]
fn test_editing_existing_text_is_one_undo_step() {
    let mut s = session(1);
    s.set_tool(Tool::AddText);
    click(&mut s, 1, (100.0, 500.0));
    s.update_input("Hi").unwrap();
    s.commit_text_input().unwrap();
    s.set_tool(Tool::Select);

    double_click(&mut s, 1, (105.0, 505.0));
    s.update_input("Hi <i>there</i>").unwrap();
    s.commit_text_input().unwrap();
    let ops = live_ops(&s);
    assert_eq!(ops.len(), 1);
    assert!(matches!(&ops[0], EditOperation::AddStyledText { .. }));

    assert!(s.undo());
    let ops = live_ops(&s);
    assert!(matches!(&ops[0], EditOperation::AddText { text, .. } if text == "Hi"));
}
