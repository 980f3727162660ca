//! Stateful editor handle exported to JavaScript
//!
//! JavaScript owns the DOM. It forwards pointer, keyboard and input events
//! here, then redraws whatever `drainEvents()` reports. Coordinates are
//! CSS pixels relative to the page's overlay container.

use crate::page_source::{js_error_message, JsPageRenderer, JsPageSource};
use crate::viewport::{JsViewport, PdfJsViewport};
use js_sys::{Function, Promise, Uint8Array};
use pdfedit_core::{EditOperation, LogSession, PdfEditError, TextStyle};
use pdfedit_editor::{
    load_pages, DomPoint, DomRect, DomSize, EditorConfig, EditorSession, Key, TextContent, Tool,
};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::future_to_promise;

fn to_js<E: std::fmt::Display>(e: E) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn serialize<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Largest id JavaScript numbers hold exactly (2^53 - 1).
pub(crate) const MAX_JS_ID: u64 = (1 << 53) - 1;

/// Element and notification ids cross the boundary as plain numbers, the
/// same type `serde_wasm_bindgen` gives them inside serialized events.
pub(crate) fn id_from_js(value: f64) -> Option<u64> {
    (value.fract() == 0.0 && value >= 0.0 && value <= MAX_JS_ID as f64).then_some(value as u64)
}

pub(crate) fn id_to_js(id: u64) -> f64 {
    id as f64
}

/// Accepts the same names as the toolbar's `data-tool` attributes.
pub(crate) fn parse_tool(name: &str) -> Result<Tool, String> {
    Tool::from_name(name).ok_or_else(|| format!("Unknown tool: {}", name))
}

pub(crate) fn parse_config(toml: Option<String>) -> Result<EditorConfig, String> {
    match toml {
        Some(s) if !s.trim().is_empty() => EditorConfig::from_toml_str(&s).map_err(|e| e.to_string()),
        _ => Ok(EditorConfig::default()),
    }
}

/// Export through a host function `(bytes: Uint8Array, opsJson: string) => Uint8Array`.
fn js_exporter(
    callback: Function,
) -> impl Fn(&[u8], &[EditOperation]) -> Result<Vec<u8>, PdfEditError> {
    move |document: &[u8], operations: &[EditOperation]| {
        let ops_json = serde_json::to_string(operations)?;
        let bytes = Uint8Array::new_with_length(document.len() as u32);
        bytes.copy_from(document);
        let result = callback
            .call2(&JsValue::NULL, &bytes.into(), &JsValue::from_str(&ops_json))
            .map_err(|e| PdfEditError::ExportFailed(js_error_message(&e)))?;
        if !result.is_instance_of::<Uint8Array>() {
            return Err(PdfEditError::ExportFailed(
                "exporter did not return a Uint8Array".to_string(),
            ));
        }
        Ok(Uint8Array::new(&result).to_vec())
    }
}

/// State of the open text input, for positioning the editable box and
/// syncing the style toolbar.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ActiveInputView<'a> {
    page: u32,
    rect: DomRect,
    markup: &'a str,
    style: &'a TextStyle,
    selection: Option<(usize, usize)>,
}

#[wasm_bindgen]
pub struct PdfEditor {
    session: Rc<RefCell<EditorSession<LogSession>>>,
}

#[wasm_bindgen]
impl PdfEditor {
    /// Open a document. `exporter` writes the operations into the PDF;
    /// without one, `export()` fails. `configToml` overrides thresholds
    /// and defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(
        name: &str,
        bytes: &[u8],
        exporter: Option<Function>,
        config_toml: Option<String>,
    ) -> Result<PdfEditor, JsValue> {
        let config = parse_config(config_toml).map_err(|e| JsValue::from_str(&e))?;
        let mut engine = LogSession::new(name, bytes).map_err(to_js)?;
        if let Some(callback) = exporter {
            engine = engine.with_exporter(js_exporter(callback));
        }
        Ok(PdfEditor {
            session: Rc::new(RefCell::new(EditorSession::new(engine, config))),
        })
    }

    #[wasm_bindgen(getter, js_name = pageCount)]
    pub fn page_count(&self) -> u32 {
        self.session.borrow().engine().page_count()
    }

    #[wasm_bindgen(getter, js_name = isSigned)]
    pub fn is_signed(&self) -> bool {
        self.session.borrow().engine().is_signed()
    }

    /// Render and register every page through `renderer`, in order.
    /// Resolves to the page count.
    #[wasm_bindgen(js_name = loadDocument)]
    pub fn load_document(&self, renderer: JsPageRenderer) -> Promise {
        let session = Rc::clone(&self.session);
        future_to_promise(async move {
            let mut source = JsPageSource::new(renderer);
            // Borrow only while registering; the renderer may call back in
            let count = load_pages(&mut source, |page, rendered| {
                session
                    .borrow_mut()
                    .register_page(page, rendered.viewport, &rendered.text_content);
            })
            .await
            .map_err(to_js)?;
            Ok(JsValue::from(count))
        })
    }

    /// Register (or re-register after zoom) one rendered page.
    #[wasm_bindgen(js_name = registerPage)]
    pub fn register_page(
        &self,
        page: u32,
        viewport: PdfJsViewport,
        text_content: JsValue,
    ) -> Result<(), JsValue> {
        let content: TextContent = if text_content.is_undefined() || text_content.is_null() {
            TextContent::default()
        } else {
            serde_wasm_bindgen::from_value(text_content).map_err(to_js)?
        };
        self.session
            .borrow_mut()
            .register_page(page, Rc::new(JsViewport::new(viewport)), &content);
        Ok(())
    }

    /// The page's canvas is about to be torn down.
    #[wasm_bindgen(js_name = invalidatePage)]
    pub fn invalidate_page(&self, page: u32) {
        self.session.borrow_mut().invalidate_page(page);
    }

    // ---- tools and pointer input ----

    #[wasm_bindgen(getter)]
    pub fn tool(&self) -> String {
        let tool = self.session.borrow().tool();
        serde_json::to_value(tool)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default()
    }

    #[wasm_bindgen(js_name = setTool)]
    pub fn set_tool(&self, name: &str) -> Result<(), JsValue> {
        let tool = parse_tool(name).map_err(|e| JsValue::from_str(&e))?;
        self.session.borrow_mut().set_tool(tool);
        Ok(())
    }

    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&self, page: u32, x: f64, y: f64) {
        self.session.borrow_mut().pointer_down(page, DomPoint::new(x, y));
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&self, x: f64, y: f64) {
        self.session.borrow_mut().pointer_move(DomPoint::new(x, y));
    }

    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&self, x: f64, y: f64) {
        self.session.borrow_mut().pointer_up(DomPoint::new(x, y));
    }

    #[wasm_bindgen(js_name = pointerLeave)]
    pub fn pointer_leave(&self) {
        self.session.borrow_mut().pointer_leave();
    }

    #[wasm_bindgen(js_name = doubleClick)]
    pub fn double_click(&self, page: u32, x: f64, y: f64) {
        self.session.borrow_mut().double_click(page, DomPoint::new(x, y));
    }

    /// Returns true when the key was handled and the default should be
    /// prevented.
    #[wasm_bindgen(js_name = keyDown)]
    pub fn key_down(&self, key: &str) -> bool {
        match Key::from_dom_key(key) {
            Some(key) => self.session.borrow_mut().key_down(key),
            None => false,
        }
    }

    /// `id` as reported by `drainEvents()` or `overlayElements()`.
    #[wasm_bindgen(js_name = selectElement)]
    pub fn select_element(&self, id: f64) -> bool {
        match id_from_js(id) {
            Some(id) => self.session.borrow_mut().select(id),
            None => false,
        }
    }

    pub fn deselect(&self) {
        self.session.borrow_mut().deselect();
    }

    #[wasm_bindgen(js_name = deleteSelected)]
    pub fn delete_selected(&self) -> Result<bool, JsValue> {
        self.session.borrow_mut().delete_selected().map_err(to_js)
    }

    // ---- active text input ----

    #[wasm_bindgen(js_name = activeInput)]
    pub fn active_input(&self) -> Result<JsValue, JsValue> {
        let session = self.session.borrow();
        match session.active_input() {
            Some(input) => serialize(&ActiveInputView {
                page: input.page,
                rect: input.rect,
                markup: &input.markup,
                style: &input.style,
                selection: input.selection,
            }),
            None => Ok(JsValue::NULL),
        }
    }

    #[wasm_bindgen(js_name = updateInput)]
    pub fn update_input(&self, markup: &str) -> Result<(), JsValue> {
        self.session.borrow_mut().update_input(markup).map_err(to_js)
    }

    /// `start == end` clears the selection.
    #[wasm_bindgen(js_name = setInputSelection)]
    pub fn set_input_selection(&self, start: usize, end: usize) -> Result<(), JsValue> {
        let range = (start != end).then(|| (start.min(end), start.max(end)));
        self.session
            .borrow_mut()
            .set_input_selection(range)
            .map_err(to_js)
    }

    #[wasm_bindgen(js_name = setInputMeasuredSize)]
    pub fn set_input_measured_size(&self, width: f64, height: f64) -> Result<(), JsValue> {
        self.session
            .borrow_mut()
            .set_input_measured_size(DomSize::new(width, height))
            .map_err(to_js)
    }

    #[wasm_bindgen(js_name = toggleBold)]
    pub fn toggle_bold(&self) -> Result<(), JsValue> {
        self.session.borrow_mut().toggle_bold().map_err(to_js)
    }

    #[wasm_bindgen(js_name = toggleItalic)]
    pub fn toggle_italic(&self) -> Result<(), JsValue> {
        self.session.borrow_mut().toggle_italic().map_err(to_js)
    }

    #[wasm_bindgen(js_name = setFontSize)]
    pub fn set_font_size(&self, size: f64) -> Result<(), JsValue> {
        self.session.borrow_mut().set_font_size(size).map_err(to_js)
    }

    #[wasm_bindgen(js_name = setFontFamily)]
    pub fn set_font_family(&self, family: &str) -> Result<(), JsValue> {
        self.session
            .borrow_mut()
            .set_font_family(family)
            .map_err(to_js)
    }

    #[wasm_bindgen(js_name = setTextColor)]
    pub fn set_text_color(&self, color: &str) -> Result<(), JsValue> {
        self.session.borrow_mut().set_text_color(color).map_err(to_js)
    }

    /// Returns whether anything was written to the log.
    #[wasm_bindgen(js_name = commitTextInput)]
    pub fn commit_text_input(&self) -> Result<bool, JsValue> {
        self.session.borrow_mut().commit_text_input().map_err(to_js)
    }

    #[wasm_bindgen(js_name = cancelTextInput)]
    pub fn cancel_text_input(&self) {
        self.session.borrow_mut().cancel_text_input();
    }

    // ---- history ----

    pub fn undo(&self) -> bool {
        self.session.borrow_mut().undo()
    }

    pub fn redo(&self) -> bool {
        self.session.borrow_mut().redo()
    }

    #[wasm_bindgen(js_name = canUndo)]
    pub fn can_undo(&self) -> bool {
        self.session.borrow().can_undo()
    }

    #[wasm_bindgen(js_name = canRedo)]
    pub fn can_redo(&self) -> bool {
        self.session.borrow().can_redo()
    }

    #[wasm_bindgen(js_name = hasUnsavedChanges)]
    pub fn has_unsaved_changes(&self) -> bool {
        self.session.borrow().has_unsaved_changes()
    }

    /// Throw away the overlay and project it again from the log.
    #[wasm_bindgen(js_name = rebuildOverlay)]
    pub fn rebuild_overlay(&self) {
        self.session.borrow_mut().rebuild_overlay();
    }

    // ---- output ----

    /// Export the edited PDF. `now` is the host clock in milliseconds,
    /// used to time the failure notification.
    pub fn export(&self, now: f64) -> Result<Uint8Array, JsValue> {
        let bytes = self.session.borrow_mut().export(now).map_err(to_js)?;
        let result = Uint8Array::new_with_length(bytes.len() as u32);
        result.copy_from(&bytes);
        Ok(result)
    }

    /// Live operations as a JSON array, in log order.
    #[wasm_bindgen(js_name = getOperationsJson)]
    pub fn get_operations_json(&self) -> Result<String, JsValue> {
        let session = self.session.borrow();
        serde_json::to_string(session.engine().log().operations()).map_err(to_js)
    }

    /// Events since the last call, oldest first.
    #[wasm_bindgen(js_name = drainEvents)]
    pub fn drain_events(&self) -> Result<JsValue, JsValue> {
        let events = self.session.borrow_mut().drain_events();
        serialize(&events)
    }

    /// Every overlay element in stacking order (last is topmost).
    #[wasm_bindgen(js_name = overlayElements)]
    pub fn overlay_elements(&self) -> Result<JsValue, JsValue> {
        let session = self.session.borrow();
        let elements: Vec<_> = session.overlay().iter().collect();
        serialize(&elements)
    }

    #[wasm_bindgen(js_name = selectedElement)]
    pub fn selected_element(&self) -> Option<f64> {
        self.session.borrow().overlay().selected_id().map(id_to_js)
    }

    // ---- notifications ----

    pub fn notifications(&self) -> Result<JsValue, JsValue> {
        serialize(self.session.borrow().notifications())
    }

    /// Expire notifications older than the display duration. Returns the
    /// ids that were removed.
    #[wasm_bindgen(js_name = updateNotifications)]
    pub fn update_notifications(&self, now: f64) -> Vec<f64> {
        self.session
            .borrow_mut()
            .update_notifications(now)
            .into_iter()
            .map(id_to_js)
            .collect()
    }

    #[wasm_bindgen(js_name = dismissNotification)]
    pub fn dismiss_notification(&self, id: f64) -> bool {
        match id_from_js(id) {
            Some(id) => self.session.borrow_mut().dismiss_notification(id),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_tool_names() {
        assert_eq!(parse_tool("whiteout"), Ok(Tool::Whiteout));
        assert_eq!(parse_tool("textbox"), Ok(Tool::AddTextBox));
        assert_eq!(parse_tool("lasso"), Err("Unknown tool: lasso".to_string()));
    }

    #[test]
    fn test_parse_config_defaults_and_overrides() {
        assert_eq!(parse_config(None).unwrap(), EditorConfig::default());
        assert_eq!(parse_config(Some("  ".into())).unwrap(), EditorConfig::default());

        let config = parse_config(Some("whiteout_min_drag = 8.0".into())).unwrap();
        assert_eq!(config.whiteout_min_drag, 8.0);
        assert!(parse_config(Some("whiteout_min_drag = \"big\"".into())).is_err());
    }

    #[test]
    fn test_ids_round_trip_through_serialized_events() {
        // Events reach JavaScript with ids as plain numbers
        let json = serde_json::to_value(pdfedit_editor::EditorEvent::ElementAdded { element: 42 })
            .unwrap();
        let id = json["element"].as_f64().unwrap();
        assert_eq!(id_from_js(id), Some(42));
        assert_eq!(id_to_js(42), id);
    }

    #[test]
    fn test_id_from_js_rejects_inexact_numbers() {
        assert_eq!(id_from_js(0.0), Some(0));
        assert_eq!(id_from_js(MAX_JS_ID as f64), Some(MAX_JS_ID));
        assert_eq!(id_from_js(1.5), None);
        assert_eq!(id_from_js(-1.0), None);
        assert_eq!(id_from_js(f64::NAN), None);
        assert_eq!(id_from_js(f64::INFINITY), None);
        assert_eq!(id_from_js(2f64.powi(60)), None);
    }
}

#[cfg(target_arch = "wasm32")]
mod wasm_tests {
    use super::*;
    use js_sys::{Array, Reflect};
    use lopdf::{dictionary, Document, Object};
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn one_page_pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", catalog_id);
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[wasm_bindgen_test]
    fn test_event_id_is_accepted_back() {
        let editor = PdfEditor::new("test.pdf", &one_page_pdf(), None, None).unwrap();
        // No exporter: the failure raises a notification
        assert!(editor.export(1_000.0).is_err());

        let events = Array::from(&editor.drain_events().unwrap());
        let notified = events
            .iter()
            .find(|e| Reflect::get(e, &"type".into()).unwrap().as_string().as_deref() == Some("notified"))
            .unwrap();
        let id = Reflect::get(&notified, &"id".into()).unwrap();
        assert!(id.as_f64().is_some());

        assert!(editor.dismiss_notification(id.as_f64().unwrap()));
        assert!(!editor.dismiss_notification(id.as_f64().unwrap()));
    }

    #[wasm_bindgen_test]
    fn test_select_unknown_element() {
        let editor = PdfEditor::new("test.pdf", &one_page_pdf(), None, None).unwrap();
        assert!(!editor.select_element(7.0));
        assert!(!editor.select_element(0.5));
        assert_eq!(editor.selected_element(), None);
    }
}
