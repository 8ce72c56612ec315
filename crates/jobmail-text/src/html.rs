//! Plain text / HTML conversions.

use regex::Regex;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("HTML tag pattern is valid"));

/// Converts plain text to a minimal HTML fragment.
///
/// The text is trimmed, double spaces become `&nbsp;&nbsp;`, line feeds
/// become `<br />` and carriage returns are dropped.
#[must_use]
pub fn text_to_html(source: &str) -> String {
    if source.is_empty() {
        return String::new();
    }

    source
        .trim()
        .replace("  ", "&nbsp;&nbsp;")
        .replace('\n', "<br />")
        .replace('\r', "")
}

/// Removes every `<...>` tag from the input.
#[must_use]
pub fn strip_html_tags(source: &str) -> String {
    HTML_TAG.replace_all(source, "").into_owned()
}

/// Decodes the entities found in XML/HTML attribute values.
///
/// Handles `&quot;`, `&apos;`, `&#39;`, `&lt;`, `&gt;` and `&amp;`. Unknown
/// entities are left untouched.
#[must_use]
pub fn decode_html_entities(source: &str) -> String {
    if !source.contains('&') {
        return source.to_string();
    }

    let mut out = String::with_capacity(source.len());
    let mut rest = source;

    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];

        let decoded = [
            ("&quot;", '"'),
            ("&apos;", '\''),
            ("&#39;", '\''),
            ("&lt;", '<'),
            ("&gt;", '>'),
            ("&amp;", '&'),
        ]
        .into_iter()
        .find(|(entity, _)| tail.starts_with(entity));

        match decoded {
            Some((entity, c)) => {
                out.push(c);
                rest = &tail[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}
