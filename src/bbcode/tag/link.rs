//! Image and link markers. Captured URLs must survive [`validate_url`]
//! or the marker is left as literal text.

use crate::bbcode::{escape_html, unescape_html};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use url::Url;

static IMAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\[img\](https?:[^\s<\[\]]+?\.(?:jpg|jpeg|png|gif))\[/img\]").unwrap()
});
static TITLED_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)\[url=(https?:[^\s<\[\]]+)\](.*?)\[/url\]").unwrap()
});
static BARE_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[url\](https?:[^\s<\[\]]+)\[/url\]").unwrap());

/// Parses an escaped URL capture. Returns the normalized URL, escaped for
/// use in an attribute, or None when it is not an absolute http(s) URL with
/// a host.
pub(in crate::bbcode) fn validate_url(escaped: &str) -> Option<String> {
    let url = Url::parse(&unescape_html(escaped)).ok()?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return None,
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Some(escape_html(url.as_str())),
        _ => None,
    }
}

pub(in crate::bbcode) fn render_images(input: &str) -> String {
    IMAGE
        .replace_all(input, |caps: &Captures| match validate_url(&caps[1]) {
            Some(src) => format!("<img src=\"{}\" alt=\"User image\" loading=\"lazy\">", src),
            None => caps[0].to_owned(),
        })
        .into_owned()
}

pub(in crate::bbcode) fn render_titled_links(input: &str) -> String {
    TITLED_LINK
        .replace_all(input, |caps: &Captures| match validate_url(&caps[1]) {
            Some(href) => anchor(&href, &caps[2]),
            None => caps[0].to_owned(),
        })
        .into_owned()
}

pub(in crate::bbcode) fn render_bare_links(input: &str) -> String {
    BARE_LINK
        .replace_all(input, |caps: &Captures| match validate_url(&caps[1]) {
            Some(href) => anchor(&href, &caps[1]),
            None => caps[0].to_owned(),
        })
        .into_owned()
}

fn anchor(href: &str, text: &str) -> String {
    format!(
        "<a href=\"{}\" target=\"_blank\" rel=\"nofollow noopener\">{}</a>",
        href, text
    )
}

#[cfg(test)]
mod tests {
    use super::{render_bare_links, validate_url};

    #[test]
    fn url_validation() {
        assert_eq!(
            Some("https://example.com/a?b=1&amp;c=2".to_owned()),
            validate_url("https://example.com/a?b=1&amp;c=2")
        );
        assert_eq!(None, validate_url("https://"));
        assert_eq!(None, validate_url("javascript:alert(1)"));
        assert_eq!(None, validate_url("not a url"));
    }

    #[test]
    fn bare_link_text_is_as_written() {
        assert_eq!(
            "<a href=\"https://example.com/\" target=\"_blank\" rel=\"nofollow noopener\">https://example.com</a>",
            render_bare_links("[url]https://example.com[/url]")
        );
        assert_eq!(
            "<a href=\"https://example.com/a?b=1&amp;c=2\" target=\"_blank\" rel=\"nofollow noopener\">HTTPS://Example.com/a?b=1&amp;c=2</a>",
            render_bare_links("[url]HTTPS://Example.com/a?b=1&amp;c=2[/url]")
        );
    }
}
