//! Coordinate transformation between DOM and PDF coordinate systems
//!
//! DOM space: CSS pixels, top-left origin, y down, scaled by zoom.
//! PDF space: points, bottom-left origin, y up.
//!
//! Everything is delegated to the page [`Viewport`], never to a locally
//! derived scale factor, so zoom and rotation are handled in one place.

use crate::geometry::{DomPoint, DomRect};
use crate::viewport::Viewport;
use pdfedit_core::PdfRect;

/// Convert DOM coordinates (top-left origin, pixels) to PDF coordinates (bottom-left origin, points)
pub fn dom_to_pdf(viewport: &dyn Viewport, x: f64, y: f64) -> (f64, f64) {
    viewport.convert_to_pdf_point(x, y)
}

/// Convert PDF coordinates to DOM coordinates
pub fn pdf_to_dom(viewport: &dyn Viewport, x: f64, y: f64) -> (f64, f64) {
    viewport.convert_to_viewport_point(x, y)
}

/// Convert a DOM rect to PDF space. Corners are converted independently
/// and then normalized, since the y flip and rotation reorder them.
pub fn dom_rect_to_pdf(viewport: &dyn Viewport, rect: &DomRect) -> PdfRect {
    let (x1, y1) = dom_to_pdf(viewport, rect.x, rect.y);
    let (x2, y2) = dom_to_pdf(viewport, rect.right(), rect.bottom());
    PdfRect::new(x1.min(x2), y1.min(y2), (x2 - x1).abs(), (y2 - y1).abs())
}

/// Convert a PDF rect to DOM space.
pub fn pdf_rect_to_dom(viewport: &dyn Viewport, rect: &PdfRect) -> DomRect {
    let [x1, y1, x2, y2] =
        viewport.convert_to_viewport_rectangle([rect.x, rect.y, rect.right(), rect.top()]);
    DomRect::new(x1.min(x2), y1.min(y2), (x2 - x1).abs(), (y2 - y1).abs())
}

/// PDF-space displacement for a DOM-space drag from `from` to `to`.
pub fn dom_delta_to_pdf(viewport: &dyn Viewport, from: DomPoint, to: DomPoint) -> (f64, f64) {
    let (x1, y1) = dom_to_pdf(viewport, from.x, from.y);
    let (x2, y2) = dom_to_pdf(viewport, to.x, to.y);
    (x2 - x1, y2 - y1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::PageViewport;

    #[test]
    fn test_dom_to_pdf_center() {
        let vp = PageViewport::letter(1.0, 0).unwrap();
        let (pdf_x, pdf_y) = dom_to_pdf(&vp, 306.0, 396.0);
        assert!((pdf_x - 306.0).abs() < 0.1);
        assert!((pdf_y - 396.0).abs() < 0.1);
    }

    #[test]
    fn test_corners() {
        let vp = PageViewport::letter(1.0, 0).unwrap();

        // Top-left DOM (0, 0) should map to top-left PDF (0, 792)
        let (x, y) = dom_to_pdf(&vp, 0.0, 0.0);
        assert!(x.abs() < 0.1);
        assert!((y - 792.0).abs() < 0.1);

        // Bottom-right DOM should map to bottom-right PDF
        let (x, y) = dom_to_pdf(&vp, vp.width(), vp.height());
        assert!((x - 612.0).abs() < 0.1);
        assert!(y.abs() < 0.1);
    }

    #[test]
    fn test_y_axis_flip() {
        let vp = PageViewport::letter(1.0, 0).unwrap();
        let dom = pdf_to_dom(&vp, 0.0, 100.0);
        assert_eq!(dom.1, 692.0);
    }

    #[test]
    fn test_rect_conversion_normalizes_corners() {
        let vp = PageViewport::letter(2.0, 0).unwrap();
        let dom = DomRect::new(100.0, 100.0, 200.0, 50.0);
        let pdf = dom_rect_to_pdf(&vp, &dom);
        assert!((pdf.x - 50.0).abs() < 1e-9);
        assert!((pdf.y - 717.0).abs() < 1e-9);
        assert!((pdf.width - 100.0).abs() < 1e-9);
        assert!((pdf.height - 25.0).abs() < 1e-9);

        let back = pdf_rect_to_dom(&vp, &pdf);
        assert!((back.x - dom.x).abs() < 1e-9);
        assert!((back.y - dom.y).abs() < 1e-9);
        assert!((back.width - dom.width).abs() < 1e-9);
        assert!((back.height - dom.height).abs() < 1e-9);
    }

    #[test]
    fn test_rotated_rect_swaps_axes() {
        let vp = PageViewport::letter(1.0, 90).unwrap();
        let pdf = PdfRect::new(100.0, 200.0, 50.0, 10.0);
        let dom = pdf_rect_to_dom(&vp, &pdf);
        assert!((dom.width - 10.0).abs() < 1e-9);
        assert!((dom.height - 50.0).abs() < 1e-9);
        assert!(dom.width >= 0.0 && dom.height >= 0.0);
    }

    #[test]
    fn test_delta_follows_y_flip() {
        let vp = PageViewport::letter(1.5, 0).unwrap();
        let (dx, dy) = dom_delta_to_pdf(&vp, DomPoint::new(0.0, 0.0), DomPoint::new(15.0, 30.0));
        assert!((dx - 10.0).abs() < 1e-9);
        assert!((dy + 20.0).abs() < 1e-9);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::viewport::PageViewport;
    use proptest::prelude::*;

    fn scale() -> impl Strategy<Value = f64> {
        prop_oneof![Just(1.0), Just(1.5), Just(2.0), 0.25f64..4.0]
    }

    fn rotation() -> impl Strategy<Value = i32> {
        prop_oneof![Just(0), Just(90), Just(180), Just(270)]
    }

    fn percentage() -> impl Strategy<Value = f64> {
        0.0f64..=1.0
    }

    proptest! {
        /// Property: PDF->DOM->PDF roundtrip returns original coordinates
        #[test]
        fn roundtrip_pdf_to_dom_to_pdf(
            scale in scale(),
            rotation in rotation(),
            page_w in 100.0f64..2000.0,
            page_h in 100.0f64..2000.0,
            x_pct in percentage(),
            y_pct in percentage(),
        ) {
            let vp = PageViewport::new([0.0, 0.0, page_w, page_h], scale, rotation).unwrap();
            let pdf_x = x_pct * page_w;
            let pdf_y = y_pct * page_h;

            let (dom_x, dom_y) = pdf_to_dom(&vp, pdf_x, pdf_y);
            let (back_x, back_y) = dom_to_pdf(&vp, dom_x, dom_y);

            let tolerance = 1e-6;
            prop_assert!(
                (back_x - pdf_x).abs() < tolerance,
                "PDF->DOM->PDF X roundtrip failed: {} -> {} -> {}", pdf_x, dom_x, back_x
            );
            prop_assert!(
                (back_y - pdf_y).abs() < tolerance,
                "PDF->DOM->PDF Y roundtrip failed: {} -> {} -> {}", pdf_y, dom_y, back_y
            );
        }

        /// Property: points inside the page land inside the rendered canvas
        #[test]
        fn page_points_stay_in_canvas(
            scale in scale(),
            rotation in rotation(),
            x_pct in percentage(),
            y_pct in percentage(),
        ) {
            let vp = PageViewport::letter(scale, rotation).unwrap();
            let (dom_x, dom_y) = pdf_to_dom(&vp, x_pct * 612.0, y_pct * 792.0);
            let tolerance = 1e-6;
            prop_assert!(dom_x >= -tolerance && dom_x <= vp.width() + tolerance);
            prop_assert!(dom_y >= -tolerance && dom_y <= vp.height() + tolerance);
        }

        /// Property: rect conversion roundtrips and never yields negative sizes
        #[test]
        fn rect_roundtrip(
            scale in scale(),
            rotation in rotation(),
            x in 0.0f64..500.0,
            y in 0.0f64..700.0,
            w in 0.0f64..100.0,
            h in 0.0f64..90.0,
        ) {
            let vp = PageViewport::letter(scale, rotation).unwrap();
            let pdf = PdfRect::new(x, y, w, h);
            let dom = pdf_rect_to_dom(&vp, &pdf);
            prop_assert!(dom.width >= 0.0 && dom.height >= 0.0);

            let back = dom_rect_to_pdf(&vp, &dom);
            let tolerance = 1e-6;
            prop_assert!((back.x - pdf.x).abs() < tolerance);
            prop_assert!((back.y - pdf.y).abs() < tolerance);
            prop_assert!((back.width - pdf.width).abs() < tolerance);
            prop_assert!((back.height - pdf.height).abs() < tolerance);
        }
    }
}
