use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::utils::decode_component;

static ANCHOR_HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\s[^>]*?href\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#)
        .expect("anchor pattern is valid")
});

/// Extract sub-folder names from an autoindex page, in listing order.
///
/// Only anchors whose `href` ends with `/` are folders. The href is HTML-unescaped,
/// reduced to its last path segment and percent-decoded. Parent links and duplicates
/// are dropped.
///
/// ```
/// use chat_export_viewer::parsers::parse_listing;
///
/// let html = r#"<a href="../">../</a><a href="Chat%20A/">Chat A/</a><a href="x.txt">x</a>"#;
/// assert_eq!(parse_listing(html), vec!["Chat A".to_string()]);
/// ```
pub fn parse_listing(html: &str) -> Vec<String> {
    let mut folders: Vec<String> = Vec::new();
    let mut skipped = 0usize;

    for captures in ANCHOR_HREF.captures_iter(html) {
        let Some(href) = captures.get(1).or_else(|| captures.get(2)).or_else(|| captures.get(3))
        else {
            continue;
        };
        let href = unescape_html(href.as_str());

        let Some(without_slash) = href.strip_suffix('/') else {
            skipped += 1;
            continue;
        };
        let segment = without_slash.rsplit('/').next().unwrap_or(without_slash);
        let name = decode_component(segment);

        if name.is_empty() || name == "." || name == ".." {
            skipped += 1;
            continue;
        }
        if !folders.contains(&name) {
            folders.push(name);
        }
    }

    debug!(folders = folders.len(), skipped, "Parsed directory listing");
    folders
}

fn unescape_html(raw: &str) -> String {
    raw.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
