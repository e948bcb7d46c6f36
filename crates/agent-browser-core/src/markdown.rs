//! HTML → compact markdown conversion.
//!
//! `htmd` does the conversion; a normalization pass then squeezes the output
//! into something an agent can read cheaply. Normalization is idempotent:
//! running it over already-normalized text is a no-op.

use regex::Regex;
use std::sync::OnceLock;

/// Tags htmd should skip outright, on top of the in-page visibility filter.
const SKIP_TAGS: [&str; 8] = [
    "script", "style", "nav", "footer", "header", "aside", "noscript", "iframe",
];

struct Patterns {
    trailing_ws: Regex,
    blank_runs: Regex,
    empty_link: Regex,
    empty_image: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        trailing_ws: Regex::new(r"(?m)[ \t]+$").expect("trailing ws pattern"),
        blank_runs: Regex::new(r"\n{3,}").expect("blank run pattern"),
        empty_link: Regex::new(r"\[([^\]]*)\]\(\s*\)").expect("empty link pattern"),
        empty_image: Regex::new(r"!\[\]\([^)]*\)").expect("empty image pattern"),
    })
}

/// Converts an HTML fragment to normalized markdown. Falls back to plain
/// text extraction when the converter rejects the input.
pub fn convert(html: &str) -> String {
    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(SKIP_TAGS.to_vec())
        .build();

    match converter.convert(html) {
        Ok(md) => normalize(&md),
        Err(_) => normalize(&extract_text(html)),
    }
}

/// Collapse runs of blank lines, strip whitespace-only lines, drop links
/// with empty targets (keeping the text) and images without alt text.
pub fn normalize(markdown: &str) -> String {
    let p = patterns();
    let pass = p.trailing_ws.replace_all(markdown, "");
    let pass = p.blank_runs.replace_all(&pass, "\n\n");
    let pass = p.empty_link.replace_all(&pass, "$1");
    let pass = p.empty_image.replace_all(&pass, "");
    pass.trim().to_string()
}

/// Plain-text fallback: whitespace-squeezed text of the main content area,
/// or of the whole document when no such area exists.
fn extract_text(html: &str) -> String {
    use scraper::{Html, Selector};

    let document = Html::parse_fragment(html);
    let candidates = ["article", "main", "body"];

    for raw in candidates {
        if let Ok(selector) = Selector::parse(raw) {
            if let Some(element) = document.select(&selector).next() {
                let text = squeeze(element.text());
                if !text.is_empty() {
                    return text;
                }
            }
        }
    }

    squeeze(document.root_element().text())
}

fn squeeze<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_blank_line_runs() {
        assert_eq!(normalize("a\n\n\n\n\nb"), "a\n\nb");
    }

    #[test]
    fn test_strips_whitespace_only_lines() {
        assert_eq!(normalize("a\n   \t\nb"), "a\n\nb");
    }

    #[test]
    fn test_empty_links_keep_their_text() {
        assert_eq!(normalize("see [docs]() for more"), "see docs for more");
        assert_eq!(normalize("[kept](https://x.io)"), "[kept](https://x.io)");
    }

    #[test]
    fn test_images_without_alt_are_dropped() {
        assert_eq!(normalize("before ![](spacer.gif) after"), "before  after");
        assert_eq!(normalize("![logo](logo.png)"), "![logo](logo.png)");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let messy = "  # Title  \n\n\n\n\ntext [x]() ![](y.png)\n   \n\nend\n\n";
        let once = normalize(messy);
        let twice = normalize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_convert_simple_fragment() {
        let md = convert("<h1>Title</h1><p>Hello <a href=\"https://x.io\">world</a></p>");
        assert!(md.contains("Title"));
        assert!(md.contains("[world](https://x.io)"));
    }

    #[test]
    fn test_convert_skips_script_content() {
        let md = convert("<p>visible</p><script>var hidden = 1;</script>");
        assert!(md.contains("visible"));
        assert!(!md.contains("hidden"));
    }

    #[test]
    fn test_extract_text_squeezes_whitespace() {
        let text = extract_text("<article><p>a\n\n  b</p><p>c</p></article>");
        assert_eq!(text, "a b c");
    }
}
