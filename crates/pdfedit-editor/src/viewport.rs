//! Page viewport: the rendering library's per-page transform
//!
//! Every conversion between PDF space and DOM space goes through a
//! [`Viewport`]. Scale and rotation are opaque to callers.

use crate::error::EditorError;

/// Per-page transform as exposed by the rendering library.
pub trait Viewport {
    /// DOM (viewport) point to PDF point.
    fn convert_to_pdf_point(&self, x: f64, y: f64) -> (f64, f64);

    /// PDF point to DOM (viewport) point.
    fn convert_to_viewport_point(&self, x: f64, y: f64) -> (f64, f64);

    /// PDF rect `[x1, y1, x2, y2]` to viewport corners `[x1, y1, x2, y2]`.
    /// The returned corners are not normalized.
    fn convert_to_viewport_rectangle(&self, rect: [f64; 4]) -> [f64; 4] {
        let (x1, y1) = self.convert_to_viewport_point(rect[0], rect[1]);
        let (x2, y2) = self.convert_to_viewport_point(rect[2], rect[3]);
        [x1, y1, x2, y2]
    }

    /// Rendered width in CSS pixels.
    fn width(&self) -> f64;

    /// Rendered height in CSS pixels.
    fn height(&self) -> f64;

    fn scale(&self) -> f64;

    /// Rotation in degrees, one of 0, 90, 180, 270.
    fn rotation(&self) -> u32;

    /// Raw page bounds in PDF space `[x1, y1, x2, y2]`.
    fn view_box(&self) -> [f64; 4];
}

/// Native viewport reproducing the PDF.js transform matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct PageViewport {
    view_box: [f64; 4],
    scale: f64,
    rotation: u32,
    width: f64,
    height: f64,
    transform: [f64; 6],
}

impl PageViewport {
    pub fn new(view_box: [f64; 4], scale: f64, rotation: i32) -> Result<Self, EditorError> {
        let normalized = rotation.rem_euclid(360);
        let (a, b, c, d) = match normalized {
            0 => (1.0, 0.0, 0.0, -1.0),
            90 => (0.0, 1.0, 1.0, 0.0),
            180 => (-1.0, 0.0, 0.0, 1.0),
            270 => (0.0, -1.0, -1.0, 0.0),
            _ => return Err(EditorError::InvalidRotation(rotation)),
        };

        let center_x = (view_box[2] + view_box[0]) / 2.0;
        let center_y = (view_box[3] + view_box[1]) / 2.0;

        let (offset_x, offset_y, width, height) = if a == 0.0 {
            (
                (center_y - view_box[1]).abs() * scale,
                (center_x - view_box[0]).abs() * scale,
                (view_box[3] - view_box[1]).abs() * scale,
                (view_box[2] - view_box[0]).abs() * scale,
            )
        } else {
            (
                (center_x - view_box[0]).abs() * scale,
                (center_y - view_box[1]).abs() * scale,
                (view_box[2] - view_box[0]).abs() * scale,
                (view_box[3] - view_box[1]).abs() * scale,
            )
        };

        let transform = [
            a * scale,
            b * scale,
            c * scale,
            d * scale,
            offset_x - a * scale * center_x - c * scale * center_y,
            offset_y - b * scale * center_x - d * scale * center_y,
        ];

        Ok(Self {
            view_box,
            scale,
            rotation: normalized as u32,
            width,
            height,
            transform,
        })
    }

    /// US Letter page at the given scale and rotation.
    pub fn letter(scale: f64, rotation: i32) -> Result<Self, EditorError> {
        Self::new([0.0, 0.0, 612.0, 792.0], scale, rotation)
    }

    pub fn transform(&self) -> [f64; 6] {
        self.transform
    }
}

impl Viewport for PageViewport {
    fn convert_to_pdf_point(&self, x: f64, y: f64) -> (f64, f64) {
        let m = &self.transform;
        let det = m[0] * m[3] - m[1] * m[2];
        (
            (x * m[3] - y * m[2] + m[2] * m[5] - m[4] * m[3]) / det,
            (-x * m[1] + y * m[0] + m[4] * m[1] - m[5] * m[0]) / det,
        )
    }

    fn convert_to_viewport_point(&self, x: f64, y: f64) -> (f64, f64) {
        let m = &self.transform;
        (x * m[0] + y * m[2] + m[4], x * m[1] + y * m[3] + m[5])
    }

    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn scale(&self) -> f64 {
        self.scale
    }

    fn rotation(&self) -> u32 {
        self.rotation
    }

    fn view_box(&self) -> [f64; 4] {
        self.view_box
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: (f64, f64), b: (f64, f64)) -> bool {
        (a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9
    }

    #[test]
    fn test_unrotated_flips_y() {
        let vp = PageViewport::letter(1.0, 0).unwrap();
        assert_eq!(vp.width(), 612.0);
        assert_eq!(vp.height(), 792.0);
        assert!(close(vp.convert_to_viewport_point(0.0, 792.0), (0.0, 0.0)));
        assert!(close(vp.convert_to_viewport_point(0.0, 0.0), (0.0, 792.0)));
    }

    #[test]
    fn test_scale_applies_to_size_and_points() {
        let vp = PageViewport::letter(1.5, 0).unwrap();
        assert_eq!(vp.width(), 918.0);
        assert!(close(vp.convert_to_viewport_point(100.0, 692.0), (150.0, 150.0)));
    }

    #[test]
    fn test_rotation_swaps_dimensions() {
        let vp = PageViewport::letter(1.0, 90).unwrap();
        assert_eq!(vp.width(), 792.0);
        assert_eq!(vp.height(), 612.0);
        // PDF origin ends up at the top-left after a 90 degree rotation
        assert!(close(vp.convert_to_viewport_point(0.0, 0.0), (0.0, 0.0)));
    }

    #[test]
    fn test_negative_rotation_normalized() {
        let vp = PageViewport::letter(1.0, -90).unwrap();
        assert_eq!(vp.rotation(), 270);
    }

    #[test]
    fn test_invalid_rotation_rejected() {
        assert!(matches!(
            PageViewport::letter(1.0, 45),
            Err(EditorError::InvalidRotation(45))
        ));
    }

    #[test]
    fn test_offset_view_box() {
        let vp = PageViewport::new([50.0, 100.0, 662.0, 892.0], 1.0, 0).unwrap();
        assert!(close(vp.convert_to_viewport_point(50.0, 892.0), (0.0, 0.0)));
        assert!(close(vp.convert_to_pdf_point(0.0, 0.0), (50.0, 892.0)));
    }
}
