//! Built-in sanitizers for markup, plain text, and URLs.
//!
//! These stand in for the host's own filtering primitives. Embedders with
//! an existing filtering stack can swap them out through [`Sanitize`].

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Host-sanitizer boundary invoked by the per-type rules.
pub trait Sanitize: Send + Sync {
    /// Strip tags and attributes outside the fixed allow-list.
    fn strip_unsafe_markup(&self, input: &str) -> String;

    /// Reduce to a single line of plain text: no tags, no control
    /// characters, collapsed whitespace.
    fn sanitize_plain_text(&self, input: &str) -> String;

    /// Clean a URL for storage. URLs with a scheme outside the allow-list
    /// reject to `""`; bare authorities get an `http://` prefix.
    fn sanitize_url(&self, input: &str) -> String;
}

static HTML_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment pattern"));

static DROPPED_ELEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)\s*>").expect("element pattern")
});

static TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"</?([a-zA-Z][a-zA-Z0-9]*)((?:[^>"']|"[^"]*"|'[^']*')*)>"#).expect("tag pattern")
});

static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([a-zA-Z][a-zA-Z0-9:_-]*)\s*=\s*("[^"]*"|'[^']*'|[^\s"'>]+)"#)
        .expect("attribute pattern")
});

static ANY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("bare tag pattern"));

/// Characters a stored URL may contain besides ASCII alphanumerics.
const URL_EXTRA: &str = "-_.~!*'();:@&=+$,/?#[]%";

const ALLOWED_SCHEMES: &[&str] = &["http", "https", "ftp", "ftps", "mailto", "tel"];

/// Default implementations used when the host provides none.
#[derive(Debug, Default)]
pub struct BuiltinSanitizer;

impl Sanitize for BuiltinSanitizer {
    fn strip_unsafe_markup(&self, input: &str) -> String {
        let no_comments = HTML_COMMENT.replace_all(input, "");
        let no_payloads = DROPPED_ELEMENT.replace_all(&no_comments, "");
        TAG.replace_all(&no_payloads, |caps: &Captures<'_>| {
            rebuild_tag(&caps[0], &caps[1], &caps[2])
        })
        .into_owned()
    }

    fn sanitize_plain_text(&self, input: &str) -> String {
        let no_tags = ANY_TAG.replace_all(input, "");
        let printable: String = no_tags
            .chars()
            .filter(|c| !c.is_control() || c.is_whitespace())
            .collect();
        printable.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn sanitize_url(&self, input: &str) -> String {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return String::new();
        }

        let mut cleaned = String::with_capacity(trimmed.len());
        for c in trimmed.chars() {
            if c == ' ' {
                cleaned.push_str("%20");
            } else if c.is_ascii_alphanumeric() || URL_EXTRA.contains(c) {
                cleaned.push(c);
            }
        }

        if let Some(scheme) = url_scheme(&cleaned) {
            if !ALLOWED_SCHEMES.contains(&scheme.as_str()) {
                return String::new();
            }
            cleaned
        } else if cleaned.starts_with('/') || cleaned.starts_with('#') || cleaned.starts_with('?')
        {
            cleaned
        } else {
            format!("http://{cleaned}")
        }
    }
}

/// Rebuild an allowed tag with only its allowed attributes; disallowed
/// tags vanish entirely.
fn rebuild_tag(whole: &str, name: &str, attrs: &str) -> String {
    let tag = name.to_ascii_lowercase();
    if !allowed_tag(&tag) {
        return String::new();
    }
    if whole.starts_with("</") {
        return format!("</{tag}>");
    }

    let mut out = format!("<{tag}");
    for caps in ATTRIBUTE.captures_iter(attrs) {
        let attr = caps[1].to_ascii_lowercase();
        let value = caps[2].trim_matches(|c| c == '"' || c == '\'');
        if allowed_attribute(&tag, &attr) && !value.to_ascii_lowercase().contains("javascript:") {
            out.push_str(&format!(" {attr}=\"{value}\""));
        }
    }
    if whole.ends_with("/>") {
        out.push_str(" />");
    } else {
        out.push('>');
    }
    out
}

fn allowed_tag(tag: &str) -> bool {
    matches!(
        tag,
        "a" | "abbr"
            | "b"
            | "blockquote"
            | "br"
            | "caption"
            | "cite"
            | "code"
            | "dd"
            | "del"
            | "div"
            | "dl"
            | "dt"
            | "em"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "hr"
            | "i"
            | "img"
            | "ins"
            | "li"
            | "ol"
            | "p"
            | "pre"
            | "q"
            | "s"
            | "span"
            | "strong"
            | "sub"
            | "sup"
            | "table"
            | "tbody"
            | "td"
            | "tfoot"
            | "th"
            | "thead"
            | "tr"
            | "u"
            | "ul"
    )
}

fn allowed_attribute(tag: &str, attr: &str) -> bool {
    if matches!(attr, "class" | "id" | "title") {
        return true;
    }
    match tag {
        "a" => matches!(attr, "href" | "rel" | "target" | "name"),
        "img" => matches!(attr, "src" | "alt" | "width" | "height"),
        "td" | "th" => matches!(attr, "colspan" | "rowspan" | "scope"),
        "blockquote" | "q" | "del" | "ins" => attr == "cite",
        "ol" => matches!(attr, "start" | "reversed"),
        _ => false,
    }
}

/// Extract an explicit scheme, if the colon really is a scheme separator
/// and not part of a path or query.
fn url_scheme(url: &str) -> Option<String> {
    let colon = url.find(':')?;
    let head = &url[..colon];
    if head.is_empty()
        || !head
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c == '+' || c == '-' || c == '.')
    {
        return None;
    }
    if let Some(stop) = url.find(['/', '?', '#']) {
        if stop < colon {
            return None;
        }
    }
    Some(head.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sanitizer() -> BuiltinSanitizer {
        BuiltinSanitizer
    }

    #[test]
    fn test_markup_keeps_allowed_tags() {
        let out = sanitizer().strip_unsafe_markup("<p>Hello <strong>world</strong></p>");
        assert_eq!(out, "<p>Hello <strong>world</strong></p>");
    }

    #[test]
    fn test_markup_drops_script_with_payload() {
        let out = sanitizer().strip_unsafe_markup("before<script>alert(1)</script>after");
        assert_eq!(out, "beforeafter");
    }

    #[test]
    fn test_markup_drops_disallowed_tag_keeps_text() {
        let out = sanitizer().strip_unsafe_markup("<iframe src=\"x\">framed</iframe>");
        assert_eq!(out, "framed");
    }

    #[test]
    fn test_markup_filters_attributes() {
        let out =
            sanitizer().strip_unsafe_markup("<a href=\"https://x.test\" onclick=\"evil()\">x</a>");
        assert_eq!(out, "<a href=\"https://x.test\">x</a>");
    }

    #[test]
    fn test_markup_drops_javascript_href() {
        let out = sanitizer().strip_unsafe_markup("<a href=\"javascript:alert(1)\">x</a>");
        assert_eq!(out, "<a>x</a>");
    }

    #[test]
    fn test_markup_strips_comments() {
        let out = sanitizer().strip_unsafe_markup("a<!-- hidden -->b");
        assert_eq!(out, "ab");
    }

    #[test]
    fn test_markup_idempotent() {
        let s = sanitizer();
        let once = s.strip_unsafe_markup("<p onclick='x'>hi<script>y</script></p>");
        let twice = s.strip_unsafe_markup(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_plain_text_strips_tags_and_collapses() {
        let out = sanitizer().sanitize_plain_text("  <b>two</b>\n\n words\t ");
        assert_eq!(out, "two words");
    }

    #[test]
    fn test_plain_text_drops_control_chars() {
        let out = sanitizer().sanitize_plain_text("a\u{7}b");
        assert_eq!(out, "ab");
    }

    #[test]
    fn test_plain_text_idempotent() {
        let s = sanitizer();
        let once = s.sanitize_plain_text("<i> spaced   out </i>");
        assert_eq!(s.sanitize_plain_text(&once), once);
    }

    #[test]
    fn test_url_clean_passthrough() {
        assert_eq!(sanitizer().sanitize_url("http://x"), "http://x");
        assert_eq!(
            sanitizer().sanitize_url("https://example.com/a?b=c#d"),
            "https://example.com/a?b=c#d"
        );
    }

    #[test]
    fn test_url_rejects_unknown_scheme() {
        assert_eq!(sanitizer().sanitize_url("javascript:alert(1)"), "");
        assert_eq!(sanitizer().sanitize_url("data:text/html,x"), "");
    }

    #[test]
    fn test_url_prepends_http() {
        assert_eq!(
            sanitizer().sanitize_url("www.example.com/img.png"),
            "http://www.example.com/img.png"
        );
    }

    #[test]
    fn test_url_relative_kept() {
        assert_eq!(sanitizer().sanitize_url("/uploads/a.png"), "/uploads/a.png");
    }

    #[test]
    fn test_url_encodes_spaces_and_drops_junk() {
        assert_eq!(
            sanitizer().sanitize_url("http://x/a b\"c"),
            "http://x/a%20bc"
        );
    }

    #[test]
    fn test_url_idempotent() {
        let s = sanitizer();
        let once = s.sanitize_url("www.example.com/a b");
        assert_eq!(s.sanitize_url(&once), once);
    }
}
