//! The active text input and its style toggles
//!
//! Exactly one text input can be open. Bold and italic toggles wrap the
//! selected run when the host reports a non-collapsed selection, and flip
//! the element style otherwise. Font size and family always apply to the
//! whole element since segments only carry bold/italic.

use crate::error::EditorError;
use crate::geometry::{DomRect, DomSize};
use crate::markup::{self, StyleAttr};
use pdfedit_core::{StyledTextSegment, TextStyle};

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveInput {
    pub page: u32,
    /// Where the input sits on the page
    pub rect: DomRect,
    pub markup: String,
    pub style: TextStyle,
    /// Character range of a non-collapsed selection inside the input
    pub selection: Option<(usize, usize)>,
    /// Rendered content size reported by the host
    pub measured: Option<DomSize>,
    initial_markup: String,
    initial_style: TextStyle,
}

impl ActiveInput {
    /// True when nothing was typed or restyled since the input opened.
    pub fn is_unchanged(&self) -> bool {
        self.markup == self.initial_markup && self.style == self.initial_style
    }

    pub fn plain_text(&self) -> String {
        markup::plain_text(&self.markup)
    }

    pub fn segments(&self) -> Vec<StyledTextSegment> {
        markup::parse_segments(&self.markup, self.style.is_bold, self.style.is_italic)
    }

    /// Decide how the content should be committed.
    pub fn payload(&self) -> TextPayload {
        TextPayload::from_markup(&self.markup, self.style.is_bold, self.style.is_italic)
    }
}

/// Content of a text input, reduced for commit.
#[derive(Debug, Clone, PartialEq)]
pub enum TextPayload {
    /// Nothing but whitespace
    Empty,
    Uniform {
        text: String,
        is_bold: bool,
        is_italic: bool,
    },
    /// At least two distinct styles after merging
    Styled(Vec<StyledTextSegment>),
}

impl TextPayload {
    pub fn from_markup(markup: &str, base_bold: bool, base_italic: bool) -> Self {
        let segments = trim_segments(markup::parse_segments(markup, base_bold, base_italic));
        if segments.is_empty() {
            return TextPayload::Empty;
        }
        if markup::distinct_styles(&segments) < 2 {
            // Runs start from the base style, so a single run only differs
            // from it when a tag wraps all of the text
            let (is_bold, is_italic) = (segments[0].is_bold, segments[0].is_italic);
            return TextPayload::Uniform {
                text: segments.into_iter().map(|s| s.text).collect(),
                is_bold,
                is_italic,
            };
        }
        TextPayload::Styled(segments)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, TextPayload::Empty)
    }

    pub fn text(&self) -> String {
        match self {
            TextPayload::Empty => String::new(),
            TextPayload::Uniform { text, .. } => text.clone(),
            TextPayload::Styled(segments) => segments.iter().map(|s| s.text.as_str()).collect(),
        }
    }

    /// Single-style form: mixed runs collapse to the style covering the
    /// most characters.
    pub fn collapsed(&self) -> (String, bool, bool) {
        match self {
            TextPayload::Empty => (String::new(), false, false),
            TextPayload::Uniform {
                text,
                is_bold,
                is_italic,
            } => (text.clone(), *is_bold, *is_italic),
            TextPayload::Styled(segments) => {
                let (bold, italic) = markup::dominant_style(segments);
                (self.text(), bold, italic)
            }
        }
    }
}

/// Strip leading whitespace from the first run and trailing whitespace
/// from the last, dropping runs that become empty.
fn trim_segments(mut segments: Vec<StyledTextSegment>) -> Vec<StyledTextSegment> {
    while let Some(first) = segments.first_mut() {
        let trimmed = first.text.trim_start().to_string();
        if trimmed.is_empty() {
            segments.remove(0);
        } else {
            first.text = trimmed;
            break;
        }
    }
    while let Some(last) = segments.last_mut() {
        let trimmed = last.text.trim_end().to_string();
        if trimmed.is_empty() {
            segments.pop();
        } else {
            last.text = trimmed;
            break;
        }
    }
    segments
}

/// What a style change did, so the host can update the open editor.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleChange {
    /// Markup was rewritten around the selection
    Markup(String),
    /// Element-wide style changed
    Style(TextStyle),
}

#[derive(Debug, Default)]
pub struct TextStyleController {
    active: Option<ActiveInput>,
}

impl TextStyleController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, page: u32, rect: DomRect, markup: String, style: TextStyle) -> &ActiveInput {
        let input = self.active.insert(ActiveInput {
            page,
            rect,
            initial_markup: markup.clone(),
            initial_style: style.clone(),
            markup,
            style,
            selection: None,
            measured: None,
        });
        &*input
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn input(&self) -> Option<&ActiveInput> {
        self.active.as_ref()
    }

    /// Close the input and return its final state.
    pub fn close(&mut self) -> Option<ActiveInput> {
        self.active.take()
    }

    fn input_mut(&mut self) -> Result<&mut ActiveInput, EditorError> {
        self.active.as_mut().ok_or(EditorError::NoActiveInput)
    }

    /// Content typed by the user, as reported by the host.
    pub fn set_markup(&mut self, markup: &str) -> Result<(), EditorError> {
        self.input_mut()?.markup = markup.to_string();
        Ok(())
    }

    /// Current selection inside the input; a collapsed range clears it.
    pub fn set_selection(&mut self, range: Option<(usize, usize)>) -> Result<(), EditorError> {
        self.input_mut()?.selection = range.filter(|(start, end)| start != end);
        Ok(())
    }

    pub fn set_measured_size(&mut self, size: DomSize) -> Result<(), EditorError> {
        self.input_mut()?.measured = Some(size);
        Ok(())
    }

    pub fn toggle_bold(&mut self) -> Result<StyleChange, EditorError> {
        self.toggle(StyleAttr::Bold)
    }

    pub fn toggle_italic(&mut self) -> Result<StyleChange, EditorError> {
        self.toggle(StyleAttr::Italic)
    }

    fn toggle(&mut self, attr: StyleAttr) -> Result<StyleChange, EditorError> {
        let input = self.input_mut()?;
        match input.selection {
            Some((start, end)) => {
                let segments = input.segments();
                let toggled = markup::toggle_range(&segments, start, end, attr);
                input.markup =
                    markup::render_segments(&toggled, input.style.is_bold, input.style.is_italic);
                tracing::debug!(?attr, start, end, "partial style toggle");
                Ok(StyleChange::Markup(input.markup.clone()))
            }
            None => {
                match attr {
                    StyleAttr::Bold => input.style.is_bold = !input.style.is_bold,
                    StyleAttr::Italic => input.style.is_italic = !input.style.is_italic,
                }
                Ok(StyleChange::Style(input.style.clone()))
            }
        }
    }

    pub fn set_font_size(&mut self, size: f64) -> Result<StyleChange, EditorError> {
        let input = self.input_mut()?;
        if size.is_finite() && size > 0.0 {
            input.style.font_size = size;
        }
        Ok(StyleChange::Style(input.style.clone()))
    }

    pub fn set_font_family(&mut self, family: &str) -> Result<StyleChange, EditorError> {
        let input = self.input_mut()?;
        input.style.font_name = Some(family.to_string());
        Ok(StyleChange::Style(input.style.clone()))
    }

    pub fn set_color(&mut self, color: &str) -> Result<StyleChange, EditorError> {
        let input = self.input_mut()?;
        input.style.color = color.to_string();
        Ok(StyleChange::Style(input.style.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn controller_with(markup: &str) -> TextStyleController {
        let mut c = TextStyleController::new();
        c.open(1, DomRect::new(0.0, 0.0, 100.0, 20.0), markup.to_string(), TextStyle::default());
        c
    }

    #[test]
    fn test_payload_uniform_for_plain_text() {
        assert_eq!(
            TextPayload::from_markup("  Hello  ", false, false),
            TextPayload::Uniform {
                text: "Hello".to_string(),
                is_bold: false,
                is_italic: false
            }
        );
        assert_eq!(TextPayload::from_markup(" <br> &nbsp;", false, false), TextPayload::Empty);
    }

    #[test]
    fn test_payload_styled_needs_two_styles() {
        assert_eq!(
            TextPayload::from_markup("Hello <b>World</b>", false, false),
            TextPayload::Styled(vec![
                StyledTextSegment::new("Hello ", false, false),
                StyledTextSegment::new("World", true, false),
            ])
        );
        // Bold wrapping everything is still a single style
        assert_eq!(
            TextPayload::from_markup("<b>All bold</b>", false, false),
            TextPayload::Uniform {
                text: "All bold".to_string(),
                is_bold: true,
                is_italic: false
            }
        );
    }

    #[test]
    fn test_payload_ignores_style_words_typed_as_text() {
        assert_eq!(
            TextPayload::from_markup("font-weight: bold &lt;b&gt;", true, false),
            TextPayload::Uniform {
                text: "font-weight: bold <b>".to_string(),
                is_bold: true,
                is_italic: false
            }
        );
    }

    #[test]
    fn test_collapsed_uses_dominant_style() {
        let payload = TextPayload::from_markup("a <i>longer run</i>", false, false);
        assert_eq!(payload.collapsed(), ("a longer run".to_string(), false, true));
    }

    #[test]
    fn test_toggle_without_selection_flips_element_style() {
        let mut c = controller_with("Hello");
        assert_eq!(
            c.toggle_bold().unwrap(),
            StyleChange::Style(TextStyle {
                is_bold: true,
                ..TextStyle::default()
            })
        );
        assert_eq!(c.input().unwrap().markup, "Hello");
    }

    #[test]
    fn test_toggle_with_selection_wraps_run() {
        let mut c = controller_with("Hello World");
        c.set_selection(Some((6, 11))).unwrap();
        assert_eq!(
            c.toggle_bold().unwrap(),
            StyleChange::Markup("Hello <b>World</b>".to_string())
        );
        assert!(!c.input().unwrap().style.is_bold);
    }

    #[test]
    fn test_collapsed_selection_is_ignored() {
        let mut c = controller_with("Hello");
        c.set_selection(Some((2, 2))).unwrap();
        assert!(c.input().unwrap().selection.is_none());
        assert!(matches!(c.toggle_italic().unwrap(), StyleChange::Style(_)));
    }

    #[test]
    fn test_font_size_applies_element_wide_with_selection() {
        let mut c = controller_with("Hello World");
        c.set_selection(Some((0, 5))).unwrap();
        let change = c.set_font_size(18.0).unwrap();
        assert!(matches!(change, StyleChange::Style(ref s) if s.font_size == 18.0));
        assert_eq!(c.input().unwrap().markup, "Hello World");
    }

    #[test]
    fn test_unchanged_tracking() {
        let mut c = controller_with("seed");
        assert!(c.input().unwrap().is_unchanged());
        c.set_markup("seeds").unwrap();
        assert!(!c.input().unwrap().is_unchanged());
    }

    #[test]
    fn test_no_active_input_errors() {
        let mut c = TextStyleController::new();
        assert!(matches!(c.toggle_bold(), Err(EditorError::NoActiveInput)));
        assert!(matches!(c.set_markup("x"), Err(EditorError::NoActiveInput)));
    }
}
