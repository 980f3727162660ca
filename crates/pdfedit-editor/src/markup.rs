//! Inline markup of editable text inputs
//!
//! Text inputs are contenteditable elements. Their markup is reduced to
//! styled runs (bold/italic flags) and rendered back for redisplay. Only
//! the subset a contenteditable produces for our toolbar is understood:
//! `b`, `strong`, `i`, `em`, `span` with `font-weight`/`font-style`, and
//! the line-break tags `br`, `div`, `p`. Any other tag is ignored while its
//! text is kept.

use html5ever::tendril::TendrilSink;
use html5ever::{parse_fragment, Attribute, LocalName, Namespace, ParseOpts, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use pdfedit_core::StyledTextSegment;
use std::cell::RefCell;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleAttr {
    Bold,
    Italic,
}

const HTML_NS: &str = "http://www.w3.org/1999/xhtml";

/// Parse markup the way the browser does for the inside of a `<body>`.
fn parse_dom(markup: &str) -> RcDom {
    let context = QualName::new(None, Namespace::from(HTML_NS), LocalName::from("body"));
    parse_fragment(RcDom::default(), ParseOpts::default(), context, Vec::new()).one(markup)
}

/// Collects styled runs from a DOM walk.
struct SegmentCollector {
    runs: Vec<StyledTextSegment>,
}

impl SegmentCollector {
    fn push(&mut self, text: &str, style: (bool, bool)) {
        if !text.is_empty() {
            self.runs
                .push(StyledTextSegment::new(text.to_string(), style.0, style.1));
        }
    }

    fn ends_line(&self) -> bool {
        self.runs.last().map_or(true, |r| r.text.ends_with('\n'))
    }

    fn visit(&mut self, node: &Handle, style: (bool, bool)) {
        match node.data {
            NodeData::Text { ref contents } => {
                // A contenteditable pads consecutive spaces with U+00A0.
                // They are ordinary spaces to the PDF text.
                let text = str::replace(&contents.borrow(), '\u{a0}', " ");
                self.push(&text, style);
            }
            NodeData::Element {
                ref name,
                ref attrs,
                ..
            } => match &*name.local {
                "br" => self.push("\n", style),
                "script" | "style" | "template" => {}
                tag => {
                    if matches!(tag, "div" | "p") && !self.ends_line() {
                        self.push("\n", style);
                    }
                    let inner = match tag {
                        "b" | "strong" => (true, style.1),
                        "i" | "em" => (style.0, true),
                        "span" | "font" => apply_style_attr(attrs, style),
                        _ => style,
                    };
                    self.visit_children(node, inner);
                }
            },
            _ => self.visit_children(node, style),
        }
    }

    fn visit_children(&mut self, node: &Handle, style: (bool, bool)) {
        for child in node.children.borrow().iter() {
            self.visit(child, style);
        }
    }
}

/// Reduce markup to styled runs. `base_bold`/`base_italic` is the style of
/// the input element itself. Adjacent runs with the same style are merged.
/// Entities are decoded and attribute text never reaches the runs.
pub fn parse_segments(markup: &str, base_bold: bool, base_italic: bool) -> Vec<StyledTextSegment> {
    let dom = parse_dom(markup);
    let mut collector = SegmentCollector { runs: Vec::new() };
    collector.visit(&dom.document, (base_bold, base_italic));
    merge_runs(collector.runs)
}

fn apply_style_attr(attrs: &RefCell<Vec<Attribute>>, inherited: (bool, bool)) -> (bool, bool) {
    let attrs = attrs.borrow();
    let Some(style) = attrs.iter().find(|a| &*a.name.local == "style") else {
        return inherited;
    };
    let value = style.value.to_ascii_lowercase();

    let (mut bold, mut italic) = inherited;
    for decl in value.split(';') {
        let Some((prop, val)) = decl.split_once(':') else {
            continue;
        };
        let val = val.trim();
        match prop.trim() {
            "font-weight" => {
                bold = match val {
                    "bold" | "bolder" => true,
                    "normal" | "lighter" => false,
                    numeric => numeric.parse::<u32>().map(|w| w >= 600).unwrap_or(bold),
                }
            }
            "font-style" => italic = val == "italic" || val == "oblique",
            _ => {}
        }
    }
    (bold, italic)
}

/// Merge adjacent runs with identical style and drop empty ones.
pub fn merge_runs(runs: Vec<StyledTextSegment>) -> Vec<StyledTextSegment> {
    let mut merged: Vec<StyledTextSegment> = Vec::with_capacity(runs.len());
    for run in runs.into_iter().filter(|r| !r.text.is_empty()) {
        match merged.last_mut() {
            Some(last) if last.is_bold == run.is_bold && last.is_italic == run.is_italic => {
                last.text.push_str(&run.text);
            }
            _ => merged.push(run),
        }
    }
    merged
}

/// Number of distinct (bold, italic) combinations.
pub fn distinct_styles(segments: &[StyledTextSegment]) -> usize {
    let mut seen: Vec<(bool, bool)> = Vec::new();
    for s in segments {
        let key = (s.is_bold, s.is_italic);
        if !seen.contains(&key) {
            seen.push(key);
        }
    }
    seen.len()
}

/// Style covering the most characters; ties go to the earliest run.
pub fn dominant_style(segments: &[StyledTextSegment]) -> (bool, bool) {
    let mut counts: Vec<((bool, bool), usize)> = Vec::new();
    for s in segments {
        let key = (s.is_bold, s.is_italic);
        let n = s.text.chars().count();
        match counts.iter_mut().find(|(k, _)| *k == key) {
            Some((_, total)) => *total += n,
            None => counts.push((key, n)),
        }
    }
    counts
        .iter()
        .fold(None, |best: Option<((bool, bool), usize)>, entry| match best {
            Some(b) if b.1 >= entry.1 => Some(b),
            _ => Some(*entry),
        })
        .map(|(key, _)| key)
        .unwrap_or((false, false))
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '\n' => out.push_str("<br>"),
            _ => out.push(c),
        }
    }
    out
}

/// Render runs as markup for an input whose own style is
/// `base_bold`/`base_italic`.
pub fn render_segments(segments: &[StyledTextSegment], base_bold: bool, base_italic: bool) -> String {
    let mut out = String::new();
    for s in segments {
        let body = escape(&s.text);
        let mut decls = Vec::new();
        if s.is_bold != base_bold {
            decls.push(if s.is_bold {
                "font-weight: bold"
            } else {
                "font-weight: normal"
            });
        }
        if s.is_italic != base_italic {
            decls.push(if s.is_italic {
                "font-style: italic"
            } else {
                "font-style: normal"
            });
        }

        match decls.as_slice() {
            [] => out.push_str(&body),
            ["font-weight: bold"] => {
                out.push_str("<b>");
                out.push_str(&body);
                out.push_str("</b>");
            }
            ["font-style: italic"] => {
                out.push_str("<i>");
                out.push_str(&body);
                out.push_str("</i>");
            }
            ["font-weight: bold", "font-style: italic"] => {
                out.push_str("<b><i>");
                out.push_str(&body);
                out.push_str("</i></b>");
            }
            _ => {
                out.push_str("<span style=\"");
                out.push_str(&decls.join("; "));
                out.push_str("\">");
                out.push_str(&body);
                out.push_str("</span>");
            }
        }
    }
    out
}

/// Plain text content of markup.
pub fn plain_text(markup: &str) -> String {
    parse_segments(markup, false, false)
        .into_iter()
        .map(|s| s.text)
        .collect()
}

/// Toggle `attr` over the character range `start..end`. If every character
/// in the range already has it, it is cleared; otherwise it is set.
pub fn toggle_range(
    segments: &[StyledTextSegment],
    start: usize,
    end: usize,
    attr: StyleAttr,
) -> Vec<StyledTextSegment> {
    let (start, end) = (start.min(end), start.max(end));

    // Split into per-character cells inside the range
    let mut cells: Vec<(char, bool, bool)> = Vec::new();
    for s in segments {
        for c in s.text.chars() {
            cells.push((c, s.is_bold, s.is_italic));
        }
    }
    let end = end.min(cells.len());
    if start >= end {
        return merge_runs(segments.to_vec());
    }

    let all_set = cells[start..end].iter().all(|&(_, b, i)| match attr {
        StyleAttr::Bold => b,
        StyleAttr::Italic => i,
    });
    let value = !all_set;

    for cell in &mut cells[start..end] {
        match attr {
            StyleAttr::Bold => cell.1 = value,
            StyleAttr::Italic => cell.2 = value,
        }
    }

    merge_runs(
        cells
            .into_iter()
            .map(|(c, b, i)| StyledTextSegment::new(c.to_string(), b, i))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn seg(text: &str, b: bool, i: bool) -> StyledTextSegment {
        StyledTextSegment::new(text, b, i)
    }

    #[test]
    fn test_parse_bold_sub_span() {
        assert_eq!(
            parse_segments("Hello <b>World</b>", false, false),
            vec![seg("Hello ", false, false), seg("World", true, false)]
        );
    }

    #[test]
    fn test_parse_nested_and_span_styles() {
        let markup = r#"<strong>A<em>B</em></strong><span style="font-style: italic">C</span>"#;
        assert_eq!(
            parse_segments(markup, false, false),
            vec![
                seg("A", true, false),
                seg("B", true, true),
                seg("C", false, true)
            ]
        );
    }

    #[test]
    fn test_parse_respects_base_style_and_explicit_normal() {
        let markup = r#"Bold <span style="font-weight: normal">plain</span>"#;
        assert_eq!(
            parse_segments(markup, true, false),
            vec![seg("Bold ", true, false), seg("plain", false, false)]
        );
    }

    #[test]
    fn test_parse_line_breaks_and_entities() {
        assert_eq!(
            plain_text("One<br>Two<div>Three</div>&amp;&lt;&copy;"),
            "One\nTwo\nThree&<\u{a9}"
        );
        assert_eq!(plain_text("<div>First</div><div>Second</div>"), "First\nSecond");
    }

    #[test]
    fn test_numeric_and_named_entities_decode() {
        assert_eq!(
            plain_text("caf&#233; &#x2019;s &copy; &euro;5"),
            "caf\u{e9} \u{2019}s \u{a9} \u{20ac}5"
        );
        assert_eq!(plain_text("AT&T & co"), "AT&T & co");
    }

    #[test]
    fn test_attribute_values_stay_out_of_text() {
        assert_eq!(plain_text(r#"<span title="a>b">Hi</span>"#), "Hi");
        assert_eq!(
            parse_segments(r#"<span data-x="1>0" style="font-weight: bold">Hi</span>"#, false, false),
            vec![seg("Hi", true, false)]
        );
    }

    #[test]
    fn test_non_breaking_spaces_become_spaces() {
        assert_eq!(plain_text("a&nbsp;&nbsp;b"), "a  b");
        assert_eq!(plain_text("a\u{a0}b"), "a b");
    }

    #[test]
    fn test_style_words_in_text_are_not_styling() {
        let segments = parse_segments("set font-weight: bold &lt;b&gt;", false, false);
        assert_eq!(segments, vec![seg("set font-weight: bold <b>", false, false)]);
    }

    #[test]
    fn test_merge_runs_joins_identical_styles() {
        assert_eq!(
            merge_runs(vec![
                seg("a", true, false),
                seg("", false, false),
                seg("b", true, false),
                seg("c", false, false)
            ]),
            vec![seg("ab", true, false), seg("c", false, false)]
        );
    }

    #[test]
    fn test_adjacent_identical_tags_collapse_to_one_style() {
        let segments = parse_segments("<b>Hel</b><b>lo</b>", false, false);
        assert_eq!(segments, vec![seg("Hello", true, false)]);
        assert_eq!(distinct_styles(&segments), 1);
    }

    #[test]
    fn test_render_roundtrips_through_parse() {
        let segments = vec![
            seg("Hello ", false, false),
            seg("World", true, false),
            seg(" & <more>", false, true),
        ];
        let markup = render_segments(&segments, false, false);
        assert_eq!(markup, "Hello <b>World</b><i> &amp; &lt;more&gt;</i>");
        assert_eq!(parse_segments(&markup, false, false), segments);

        let on_bold_base = render_segments(&segments, true, false);
        assert_eq!(parse_segments(&on_bold_base, true, false), segments);
    }

    #[test]
    fn test_toggle_range_sets_then_clears() {
        let plain = vec![seg("Hello World", false, false)];
        let bolded = toggle_range(&plain, 6, 11, StyleAttr::Bold);
        assert_eq!(
            bolded,
            vec![seg("Hello ", false, false), seg("World", true, false)]
        );

        let cleared = toggle_range(&bolded, 6, 11, StyleAttr::Bold);
        assert_eq!(cleared, plain);
    }

    #[test]
    fn test_toggle_range_partially_styled_sets_all() {
        let mixed = vec![seg("ab", true, false), seg("cd", false, false)];
        assert_eq!(
            toggle_range(&mixed, 1, 3, StyleAttr::Bold),
            vec![seg("abc", true, false), seg("d", false, false)]
        );
    }

    #[test]
    fn test_dominant_style_counts_characters() {
        let segments = vec![seg("Hi ", false, false), seg("everyone", true, false)];
        assert_eq!(dominant_style(&segments), (true, false));
        assert_eq!(dominant_style(&[]), (false, false));
    }
}
