//! Page loading through a host-provided renderer

use crate::viewport::{JsViewport, PdfJsViewport};
use js_sys::{Promise, Reflect};
use pdfedit_editor::{PageSource, RenderedPage, TextContent};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

#[wasm_bindgen]
extern "C" {
    /// `{ numPages, renderPage(n) }` supplied by the host. `renderPage`
    /// draws page `n` and resolves to `{ viewport, textContent }`.
    pub type JsPageRenderer;

    #[wasm_bindgen(method, getter, js_name = numPages)]
    fn num_pages(this: &JsPageRenderer) -> u32;

    #[wasm_bindgen(method, catch, js_name = renderPage)]
    fn render_page(this: &JsPageRenderer, page: u32) -> Result<Promise, JsValue>;
}

pub(crate) fn js_error_message(value: &JsValue) -> String {
    if let Some(s) = value.as_string() {
        return s;
    }
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    format!("{:?}", value)
}

pub struct JsPageSource {
    renderer: JsPageRenderer,
}

impl JsPageSource {
    pub fn new(renderer: JsPageRenderer) -> Self {
        Self { renderer }
    }
}

fn field(value: &JsValue, name: &str) -> Result<JsValue, String> {
    let v = Reflect::get(value, &JsValue::from_str(name)).map_err(|e| js_error_message(&e))?;
    if v.is_undefined() || v.is_null() {
        return Err(format!("renderPage result has no `{}`", name));
    }
    Ok(v)
}

impl PageSource for JsPageSource {
    type Error = String;

    fn page_count(&self) -> u32 {
        self.renderer.num_pages()
    }

    async fn render_page(&mut self, page: u32) -> Result<RenderedPage, String> {
        let promise = self
            .renderer
            .render_page(page)
            .map_err(|e| js_error_message(&e))?;
        let result = JsFuture::from(promise)
            .await
            .map_err(|e| js_error_message(&e))?;

        let viewport: PdfJsViewport = field(&result, "viewport")?.unchecked_into();
        let text_content: TextContent = serde_wasm_bindgen::from_value(field(&result, "textContent")?)
            .map_err(|e| format!("Invalid text content: {}", e))?;

        Ok(RenderedPage {
            viewport: Rc::new(JsViewport::new(viewport)),
            text_content,
        })
    }
}
