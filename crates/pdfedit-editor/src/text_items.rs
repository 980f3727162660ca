//! Original-PDF text runs
//!
//! Snapshot of the text the rendering library extracted from a page,
//! converted to PDF rects and on-screen bounds. A snapshot belongs to one
//! render of the page and is thrown away when the page is re-rendered.

use crate::coords::pdf_rect_to_dom;
use crate::geometry::{DomPoint, DomRect};
use crate::viewport::Viewport;
use pdfedit_core::fonts::{classify_family, name_is_bold, name_is_italic};
use pdfedit_core::{PdfRect, TextStyle};
use serde::Deserialize;
use std::collections::HashMap;

/// Text content as returned by the rendering library's `getTextContent()`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextContent {
    pub items: Vec<RawTextItem>,
    #[serde(default)]
    pub styles: HashMap<String, FontStyleInfo>,
}

/// One entry of `items`. Marked-content entries carry none of these
/// fields and come through as empty runs.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTextItem {
    #[serde(rename = "str", default)]
    pub text: String,
    /// `[a, b, c, d, e, f]` text matrix; `e`/`f` is the baseline origin
    #[serde(default)]
    pub transform: [f64; 6],
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(rename = "fontName", default)]
    pub font_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FontStyleInfo {
    #[serde(rename = "fontFamily", default)]
    pub font_family: String,
    #[serde(default)]
    pub descent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    /// Index into the raw item list
    pub index: usize,
    pub text: String,
    pub pdf_x: f64,
    /// Bottom of the run's box (baseline plus descent)
    pub pdf_y: f64,
    pub pdf_width: f64,
    pub pdf_height: f64,
    pub font_size: f64,
    /// CSS generic family
    pub font_family: String,
    pub is_bold: bool,
    pub is_italic: bool,
    pub dom_bounds: DomRect,
}

impl TextItem {
    pub fn pdf_rect(&self) -> PdfRect {
        PdfRect::new(self.pdf_x, self.pdf_y, self.pdf_width, self.pdf_height)
    }

    /// Style matching this run, for seeding editors.
    pub fn style(&self, color: &str) -> TextStyle {
        TextStyle {
            font_size: self.font_size,
            color: color.to_string(),
            font_name: Some(self.font_family.clone()),
            is_italic: self.is_italic,
            is_bold: self.is_bold,
        }
    }
}

/// Convert extracted content into text items for one render of a page.
/// Whitespace-only runs are skipped; indices still refer to the raw list.
pub fn extract_text_items(content: &TextContent, viewport: &dyn Viewport) -> Vec<TextItem> {
    content
        .items
        .iter()
        .enumerate()
        .filter(|(_, raw)| !raw.text.trim().is_empty())
        .map(|(index, raw)| {
            let t = raw.transform;
            let mut font_size = t[2].hypot(t[3]);
            if font_size <= 0.0 {
                font_size = raw.height;
            }
            let height = if raw.height > 0.0 { raw.height } else { font_size };

            let style = content.styles.get(&raw.font_name);
            let family_hint = style
                .map(|s| s.font_family.as_str())
                .filter(|f| !f.is_empty())
                .unwrap_or(raw.font_name.as_str());
            let descent = style.and_then(|s| s.descent).unwrap_or(0.0).min(0.0);

            let pdf_rect = PdfRect::new(t[4], t[5] + descent * font_size, raw.width, height);
            TextItem {
                index,
                text: raw.text.clone(),
                pdf_x: pdf_rect.x,
                pdf_y: pdf_rect.y,
                pdf_width: pdf_rect.width,
                pdf_height: pdf_rect.height,
                font_size,
                font_family: classify_family(family_hint).css_name().to_string(),
                is_bold: name_is_bold(&raw.font_name) || name_is_bold(family_hint),
                is_italic: name_is_italic(&raw.font_name) || name_is_italic(family_hint),
                dom_bounds: pdf_rect_to_dom(viewport, &pdf_rect),
            }
        })
        .collect()
}

/// Text items of one rendered page.
#[derive(Debug, Clone, Default)]
pub struct TextLayer {
    items: Vec<TextItem>,
}

impl TextLayer {
    pub fn new(items: Vec<TextItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[TextItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&TextItem> {
        self.items.iter().find(|item| item.index == index)
    }

    pub fn item_at(&self, point: DomPoint) -> Option<&TextItem> {
        self.items.iter().find(|item| item.dom_bounds.contains(point))
    }

    /// The run with the largest overlap with `rect`, used to match the
    /// style of text a whiteout covers.
    pub fn dominant_item_in(&self, rect: &PdfRect) -> Option<&TextItem> {
        self.items
            .iter()
            .map(|item| (item, item.pdf_rect().intersection_area(rect)))
            .filter(|(_, area)| *area > 0.0)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(item, _)| item)
    }
}
