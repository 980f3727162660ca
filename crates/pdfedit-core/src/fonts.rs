//! Font name classification
//!
//! PDF.js reports font names such as "g_d0_f1", "Times-Roman" or
//! "BCDEEE+ArialMT", plus a CSS family ("serif", "sans-serif", "monospace")
//! in the text content styles. The editor needs both directions: which CSS
//! family to seed an editor with, and which standard-14 font an operation
//! will end up using.

/// Base font family, independent of bold/italic variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFamily {
    Serif,
    SansSerif,
    Monospace,
}

impl FontFamily {
    /// CSS generic family used for on-screen editors.
    pub fn css_name(self) -> &'static str {
        match self {
            FontFamily::Serif => "serif",
            FontFamily::SansSerif => "sans-serif",
            FontFamily::Monospace => "monospace",
        }
    }

    /// Standard-14 font name for a style combination.
    pub fn standard_font(self, is_bold: bool, is_italic: bool) -> &'static str {
        match self {
            FontFamily::Serif => match (is_bold, is_italic) {
                (true, true) => "Times-BoldItalic",
                (true, false) => "Times-Bold",
                (false, true) => "Times-Italic",
                (false, false) => "Times-Roman",
            },
            FontFamily::SansSerif => match (is_bold, is_italic) {
                (true, true) => "Helvetica-BoldOblique",
                (true, false) => "Helvetica-Bold",
                (false, true) => "Helvetica-Oblique",
                (false, false) => "Helvetica",
            },
            FontFamily::Monospace => match (is_bold, is_italic) {
                (true, true) => "Courier-BoldOblique",
                (true, false) => "Courier-Bold",
                (false, true) => "Courier-Oblique",
                (false, false) => "Courier",
            },
        }
    }
}

/// Classify a font or family name into a base family.
/// Unknown names (including PDF.js internal ids) fall back to sans-serif.
pub fn classify_family(name: &str) -> FontFamily {
    let lower = name.to_lowercase();

    match lower.as_str() {
        "serif" => return FontFamily::Serif,
        "sans-serif" => return FontFamily::SansSerif,
        "monospace" => return FontFamily::Monospace,
        "cursive" | "fantasy" => return FontFamily::SansSerif,
        _ => {}
    }

    if lower.contains("times") || lower.contains("georgia") || lower.contains("garamond") {
        return FontFamily::Serif;
    }

    if lower.contains("courier")
        || lower.contains("mono")
        || lower.contains("consolas")
        || lower.contains("monaco")
    {
        return FontFamily::Monospace;
    }

    FontFamily::SansSerif
}

/// Whether a font name carries a bold weight marker.
pub fn name_is_bold(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("bold")
        || lower.contains("black")
        || lower.contains("heavy")
        || lower.contains("semibold")
        || lower.contains("demi")
}

/// Whether a font name carries an italic/oblique marker.
pub fn name_is_italic(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("italic") || lower.contains("oblique")
}

/// Map a font name to one of the standard 14 fonts, honoring style markers
/// embedded in the name ("Arial-BoldMT" -> "Helvetica-Bold").
pub fn map_to_standard_font(name: &str) -> &'static str {
    let lower = name.to_lowercase();
    if lower.contains("symbol") {
        return "Symbol";
    }
    if lower.contains("zapf") || lower.contains("dingbat") {
        return "ZapfDingbats";
    }

    classify_family(name).standard_font(lower.contains("bold"), name_is_italic(name))
}
