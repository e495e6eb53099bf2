//! Post body markup.
//!
//! Bodies are stored raw and converted to HTML on display by [`render`].
//! The conversion is a fixed sequence of pure `&str -> String` stages. The
//! first stage escapes everything, so later stages only ever see escaped
//! text and only ever emit markup they built themselves.

mod highlight;
mod tag;

pub use highlight::highlight;
pub use tag::quote::{extract_quote_names, quote_for_reply};

use once_cell::sync::Lazy;
use regex::Regex;

static NEWLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r\n|\n|\r").unwrap());

/// One stage of the rendering pipeline.
type Stage = fn(&str) -> String;

/// Stages in application order. Line breaks must stay last.
const PIPELINE: &[Stage] = &[
    escape_html,
    tag::inline::render_inline,
    tag::link::render_images,
    tag::link::render_titled_links,
    tag::link::render_bare_links,
    tag::quote::render_quotes,
    render_line_breaks,
];

/// Generates a string of HTML from a raw post body.
pub fn render(input: &str) -> String {
    PIPELINE
        .iter()
        .fold(input.to_owned(), |text, stage| stage(&text))
}

/// Escapes the five HTML-significant characters.
pub fn escape_html(input: &str) -> String {
    let mut output = String::with_capacity(input.len() + input.len() / 8);

    for c in input.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&#039;"),
            _ => output.push(c),
        }
    }

    output
}

/// Reverses [`escape_html`]. Used before validating captured URLs.
pub(crate) fn unescape_html(input: &str) -> String {
    input
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&amp;", "&")
}

fn render_line_breaks(input: &str) -> String {
    NEWLINE.replace_all(input, "<br>$0").into_owned()
}
