#![allow(dead_code)]

use lopdf::{dictionary, Document, Object};
use pdfedit_core::{EditOperation, LogSession};
use pdfedit_editor::{DomPoint, EditEngine, EditorConfig, EditorSession, PageViewport, TextContent};
use std::rc::Rc;

/// Minimal Letter-sized PDF with `pages` blank pages.
pub fn test_pdf(pages: u32) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::new();
    for _ in 0..pages {
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(Object::Reference(page_id));
    }
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

pub fn letter(scale: f64) -> Rc<PageViewport> {
    Rc::new(PageViewport::letter(scale, 0).unwrap())
}

/// One "Invoice" run at PDF (72, 700), 18pt, plus an address line.
pub fn invoice_text() -> TextContent {
    serde_json::from_str(
        r#"{
            "items": [
                {"str": "Invoice", "transform": [18, 0, 0, 18, 72, 700], "width": 70, "height": 18, "fontName": "g_d0_f1"},
                {"str": "Miami, FL 33101", "transform": [11, 0, 0, 11, 72, 650], "width": 90, "height": 11, "fontName": "g_d0_f2"}
            ],
            "styles": {
                "g_d0_f1": {"fontFamily": "sans-serif", "descent": -0.2},
                "g_d0_f2": {"fontFamily": "Times-Bold"}
            }
        }"#,
    )
    .unwrap()
}

/// Session over a blank document with every page registered at scale 1.
pub fn session(pages: u32) -> EditorSession<LogSession> {
    let engine = LogSession::new("test.pdf", &test_pdf(pages)).unwrap();
    let mut s = EditorSession::new(engine, EditorConfig::default());
    for page in 1..=pages {
        s.register_page(page, letter(1.0), &TextContent::default());
    }
    s.drain_events();
    s
}

/// Single-page session whose page carries [`invoice_text`].
pub fn session_with_text() -> EditorSession<LogSession> {
    let engine = LogSession::new("test.pdf", &test_pdf(1)).unwrap();
    let mut s = EditorSession::new(engine, EditorConfig::default());
    s.register_page(1, letter(1.0), &invoice_text());
    s.drain_events();
    s
}

pub fn drag(s: &mut EditorSession<LogSession>, page: u32, from: (f64, f64), to: (f64, f64)) {
    s.pointer_down(page, DomPoint::new(from.0, from.1));
    s.pointer_move(DomPoint::new(to.0, to.1));
    s.pointer_up(DomPoint::new(to.0, to.1));
}

pub fn click(s: &mut EditorSession<LogSession>, page: u32, at: (f64, f64)) {
    s.pointer_down(page, DomPoint::new(at.0, at.1));
    s.pointer_up(DomPoint::new(at.0, at.1));
}

/// Two clicks followed by the browser's dblclick, as the host delivers it.
pub fn double_click(s: &mut EditorSession<LogSession>, page: u32, at: (f64, f64)) {
    click(s, page, at);
    click(s, page, at);
    s.double_click(page, DomPoint::new(at.0, at.1));
}

pub fn live_ops(s: &EditorSession<LogSession>) -> Vec<EditOperation> {
    let mut ids = s.engine().operation_ids();
    ids.sort_unstable();
    ids.into_iter()
        .map(|id| serde_json::from_str(&s.engine().operation_json(id).unwrap()).unwrap())
        .collect()
}
