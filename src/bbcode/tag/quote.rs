//! `[quote=NAME]BODY[/quote]` blocks.
//!
//! Blocks nest. Each closing marker pairs with the nearest unpaired opening
//! marker before it, so inner blocks resolve first.

use once_cell::sync::Lazy;
use regex::Regex;

/// Name must contain at least one non-space character.
static QUOTE_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[quote=([^\]\[]*[^\]\[\s][^\]\[]*)\]").unwrap());
/// Either marker. Group 1 is set only for openers.
static QUOTE_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\[quote=([^\]\[]*[^\]\[\s][^\]\[]*)\]|\[/quote\]").unwrap()
});

/// One quote marker found in a body.
struct QuoteMarker<'a> {
    start: usize,
    end: usize,
    /// Trimmed name for openers, None for closers.
    name: Option<&'a str>,
    /// Whether the marker belongs to a balanced block.
    paired: bool,
}

/// Finds every quote marker in one pass. Each closer pairs with the nearest
/// unpaired opener before it; markers left over are unpaired.
fn pair_quote_markers(input: &str) -> Vec<QuoteMarker<'_>> {
    let mut markers: Vec<QuoteMarker> = Vec::new();
    let mut open: Vec<usize> = Vec::new();

    for caps in QUOTE_MARKER.captures_iter(input) {
        let whole = match caps.get(0) {
            Some(whole) => whole,
            None => continue,
        };
        let name = caps.get(1).map(|name| name.as_str().trim());

        let paired = match name {
            Some(_) => {
                open.push(markers.len());
                false
            }
            None => match open.pop() {
                Some(opener) => {
                    markers[opener].paired = true;
                    true
                }
                // Stray closing marker.
                None => false,
            },
        };

        markers.push(QuoteMarker {
            start: whole.start(),
            end: whole.end(),
            name,
            paired,
        });
    }

    markers
}

pub(in crate::bbcode) fn render_quotes(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut cursor = 0;

    for marker in pair_quote_markers(input) {
        output.push_str(&input[cursor..marker.start]);
        cursor = marker.end;

        match (marker.paired, marker.name) {
            (false, _) => output.push_str(&input[marker.start..marker.end]),
            (true, Some(name)) => {
                output.push_str("<blockquote class=\"quote\"><cite><strong>");
                output.push_str(name);
                output.push_str("</strong> said:</cite><div>");
            }
            (true, None) => output.push_str("</div></blockquote>"),
        }
    }

    output.push_str(&input[cursor..]);
    output
}

/// Names referenced by `[quote=NAME]` openers in a raw body.
/// Trimmed, deduplicated, in order of first appearance.
pub fn extract_quote_names(body: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();

    for caps in QUOTE_OPEN.captures_iter(body) {
        let name = caps[1].trim();
        if !names.iter().any(|n| n == name) {
            names.push(name.to_owned());
        }
    }

    names
}

/// Builds the reply pre-fill for quoting `body` by `author`.
/// Quote blocks already inside `body` are dropped with their contents.
pub fn quote_for_reply(author: &str, body: &str) -> String {
    let mut stripped = String::with_capacity(body.len());
    let mut cursor = 0;
    let mut depth = 0usize;

    for marker in pair_quote_markers(body) {
        if depth == 0 {
            stripped.push_str(&body[cursor..marker.start]);
            if !marker.paired {
                stripped.push_str(&body[marker.start..marker.end]);
            }
        }
        cursor = marker.end;

        if marker.paired {
            match marker.name {
                Some(_) => depth += 1,
                None => depth -= 1,
            }
        }
    }

    stripped.push_str(&body[cursor..]);
    format!("[quote={}]{}[/quote]\n", author, stripped.trim())
}
