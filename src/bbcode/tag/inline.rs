use once_cell::sync::Lazy;
use regex::Regex;

static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)\[b\](.*?)\[/b\]").unwrap());
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)\[i\](.*?)\[/i\]").unwrap());
static UNDERLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)\[u\](.*?)\[/u\]").unwrap());

/// `[b]`, `[i]` and `[u]` to `<strong>`, `<em>` and `<u>`.
pub(in crate::bbcode) fn render_inline(input: &str) -> String {
    let output = BOLD.replace_all(input, "<strong>$1</strong>");
    let output = ITALIC.replace_all(&output, "<em>$1</em>");
    UNDERLINE.replace_all(&output, "<u>$1</u>").into_owned()
}
