//! WASM bindings for the PDF annotation editor
//!
//! The page renderer (PDF.js) stays in JavaScript. Everything else lives in
//! Rust: the operation log, the overlay elements, selection, gestures and
//! the active text input.
//!
//! ## Architecture
//!
//! - `PdfEditor` wraps an `EditorSession` over a `LogSession`
//! - `JsViewport` adapts a PDF.js `PageViewport` for coordinate conversion
//! - `JsPageSource` renders pages through a host callback during load
//! - JavaScript forwards DOM events and redraws from drained events
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { PdfEditor } from './pkg/pdfedit_wasm.js';
//!
//! await init();
//!
//! const editor = new PdfEditor("form.pdf", bytes, exportWithPdfLib);
//! await editor.loadDocument({
//!     numPages: pdf.numPages,
//!     renderPage: async (n) => {
//!         const page = await pdf.getPage(n);
//!         const viewport = page.getViewport({ scale: 1.5 });
//!         await renderToCanvas(page, viewport);
//!         return { viewport, textContent: await page.getTextContent() };
//!     },
//! });
//!
//! editor.setTool("whiteout");
//! overlay.onpointerdown = (e) => editor.pointerDown(pageNum, e.offsetX, e.offsetY);
//! for (const event of editor.drainEvents()) redraw(event);
//!
//! const edited = editor.export(Date.now());
//! ```

pub mod editor;
pub mod page_source;
pub mod viewport;

use wasm_bindgen::prelude::*;

pub use editor::PdfEditor;
pub use page_source::{JsPageRenderer, JsPageSource};
pub use viewport::{JsViewport, PdfJsViewport};

/// Initialize the WASM module
/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    web_sys::console::log_1(&JsValue::from_str(&format!(
        "pdfedit-wasm {} ready",
        get_version()
    )));
}

/// Get the library version
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Whether the document carries digital signatures. Export of a signed
/// document is refused, so hosts can warn before any editing starts.
#[wasm_bindgen(js_name = hasSignatures)]
pub fn has_signatures(bytes: &[u8]) -> Result<bool, JsValue> {
    pdfedit_core::has_signatures(bytes).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Get page count from PDF bytes without opening an editor
#[wasm_bindgen(js_name = getPageCount)]
pub fn get_page_count(bytes: &[u8]) -> Result<u32, JsValue> {
    pdfedit_core::get_page_count(bytes).map_err(|e| JsValue::from_str(&e.to_string()))
}
