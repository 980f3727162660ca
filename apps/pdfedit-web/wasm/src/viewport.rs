//! PDF.js `PageViewport` seen through the editor's [`Viewport`] trait

use js_sys::Array;
use pdfedit_editor::Viewport;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    /// The object returned by `page.getViewport({ scale, rotation })`.
    #[wasm_bindgen(js_name = PageViewport)]
    pub type PdfJsViewport;

    #[wasm_bindgen(method, js_name = convertToPdfPoint)]
    fn convert_to_pdf_point(this: &PdfJsViewport, x: f64, y: f64) -> Array;

    #[wasm_bindgen(method, js_name = convertToViewportPoint)]
    fn convert_to_viewport_point(this: &PdfJsViewport, x: f64, y: f64) -> Array;

    #[wasm_bindgen(method, js_name = convertToViewportRectangle)]
    fn convert_to_viewport_rectangle(this: &PdfJsViewport, rect: Array) -> Array;

    #[wasm_bindgen(method, getter)]
    fn width(this: &PdfJsViewport) -> f64;

    #[wasm_bindgen(method, getter)]
    fn height(this: &PdfJsViewport) -> f64;

    #[wasm_bindgen(method, getter)]
    fn scale(this: &PdfJsViewport) -> f64;

    #[wasm_bindgen(method, getter)]
    fn rotation(this: &PdfJsViewport) -> f64;

    #[wasm_bindgen(method, getter, js_name = viewBox)]
    fn view_box(this: &PdfJsViewport) -> Array;
}

/// Owned handle on a PDF.js viewport.
pub struct JsViewport {
    inner: PdfJsViewport,
}

impl JsViewport {
    pub fn new(inner: PdfJsViewport) -> Self {
        Self { inner }
    }
}

fn number_at(values: &Array, index: u32) -> f64 {
    values.get(index).as_f64().unwrap_or(f64::NAN)
}

fn pair(values: Array) -> (f64, f64) {
    (number_at(&values, 0), number_at(&values, 1))
}

fn quad(values: Array) -> [f64; 4] {
    [
        number_at(&values, 0),
        number_at(&values, 1),
        number_at(&values, 2),
        number_at(&values, 3),
    ]
}

/// PDF.js reports rotation as any multiple of 90, including negatives.
pub(crate) fn normalize_rotation(degrees: f64) -> u32 {
    (degrees.round() as i64).rem_euclid(360) as u32
}

impl Viewport for JsViewport {
    fn convert_to_pdf_point(&self, x: f64, y: f64) -> (f64, f64) {
        pair(self.inner.convert_to_pdf_point(x, y))
    }

    fn convert_to_viewport_point(&self, x: f64, y: f64) -> (f64, f64) {
        pair(self.inner.convert_to_viewport_point(x, y))
    }

    fn convert_to_viewport_rectangle(&self, rect: [f64; 4]) -> [f64; 4] {
        let arg: Array = rect.iter().map(|v| JsValue::from_f64(*v)).collect();
        quad(self.inner.convert_to_viewport_rectangle(arg))
    }

    fn width(&self) -> f64 {
        self.inner.width()
    }

    fn height(&self) -> f64 {
        self.inner.height()
    }

    fn scale(&self) -> f64 {
        self.inner.scale()
    }

    fn rotation(&self) -> u32 {
        normalize_rotation(self.inner.rotation())
    }

    fn view_box(&self) -> [f64; 4] {
        quad(self.inner.view_box())
    }
}
