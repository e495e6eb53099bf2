//! Search term highlighting over rendered post HTML.

use crate::bbcode::escape_html;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static ENTITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"&(?:#\d+|[a-zA-Z]+);").unwrap());

/// Wraps case-insensitive matches of `term` in `<span class="highlight">`.
///
/// `html` must come from [`crate::bbcode::render`]. The term is escaped the
/// same way bodies are, then matched literally against text outside tags.
/// Matches that would split a character entity are skipped.
pub fn highlight(html: &str, term: &str) -> String {
    let term = term.trim();
    if term.is_empty() {
        return html.to_owned();
    }

    let pattern = match RegexBuilder::new(&regex::escape(&escape_html(term)))
        .case_insensitive(true)
        .build()
    {
        Ok(pattern) => pattern,
        Err(e) => {
            log::warn!("highlight: unusable search term: {}", e);
            return html.to_owned();
        }
    };

    let mut output = String::with_capacity(html.len());
    let mut cursor = 0;

    for tag in TAG.find_iter(html) {
        highlight_text(&mut output, &html[cursor..tag.start()], &pattern);
        output.push_str(tag.as_str());
        cursor = tag.end();
    }

    highlight_text(&mut output, &html[cursor..], &pattern);
    output
}

fn highlight_text(output: &mut String, text: &str, pattern: &Regex) {
    let entities: Vec<(usize, usize)> = ENTITY
        .find_iter(text)
        .map(|m| (m.start(), m.end()))
        .collect();
    let inside_entity = |pos: usize| entities.iter().any(|&(start, end)| start < pos && pos < end);

    let mut cursor = 0;
    for found in pattern.find_iter(text) {
        if inside_entity(found.start()) || inside_entity(found.end()) {
            continue;
        }

        output.push_str(&text[cursor..found.start()]);
        output.push_str("<span class=\"highlight\">");
        output.push_str(found.as_str());
        output.push_str("</span>");
        cursor = found.end();
    }

    output.push_str(&text[cursor..]);
}
