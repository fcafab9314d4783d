//! Visible-text extraction from fetched HTML.

use std::sync::OnceLock;

use scraper::{Html, Node, Selector};

use crate::document::MAX_CONTENT_CHARS;

/// Elements whose text never renders.
const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

fn body_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("body").expect("body selector"))
}

/// Text of the document body with whitespace runs collapsed and trimmed.
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let root = document
        .select(body_selector())
        .next()
        .unwrap_or_else(|| document.root_element());

    let mut raw = String::new();
    for node in root.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
        });
        if !hidden {
            raw.push_str(text);
        }
    }
    collapse_whitespace(&raw)
}

/// Replace every whitespace run with one space and trim both ends.
pub fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First `max` characters of `text`. Not word-aware.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Extraction plus the stored-content cap.
pub fn page_content(html: &str) -> String {
    truncate_chars(&extract_text(html), MAX_CONTENT_CHARS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn collapses_and_trims() {
        assert_eq!(collapse_whitespace("  a\n\n b   c  "), "a b c");
        assert_eq!(extract_text("  a\n\n b   c  "), "a b c");
    }

    #[test]
    fn body_text_only() {
        let html = "<html><head><title>T</title></head><body><p>hello</p>\n<p>world</p></body></html>";
        assert_eq!(extract_text(html), "hello world");
    }

    #[test]
    fn scripts_and_styles_are_skipped() {
        let html = "<body><script>var x = 1;</script><style>p{}</style><p>shown</p><noscript>js off</noscript></body>";
        assert_eq!(extract_text(html), "shown");
    }

    #[test]
    fn entities_are_decoded() {
        assert_eq!(extract_text("<body>a &amp; b</body>"), "a & b");
    }

    #[test]
    fn empty_body() {
        assert_eq!(extract_text("<body>  \n </body>"), "");
    }

    #[test]
    fn truncates_to_exact_length() {
        let text = "x".repeat(3000);
        let out = truncate_chars(&text, 2000);
        assert_eq!(out.len(), 2000);
        assert_eq!(out, text[..2000]);
    }

    #[test]
    fn truncation_counts_chars_not_bytes() {
        let text = "é".repeat(2500);
        let out = truncate_chars(&text, MAX_CONTENT_CHARS);
        assert_eq!(out.chars().count(), MAX_CONTENT_CHARS);
    }

    #[test]
    fn page_content_caps_long_pages() {
        let html = format!("<body>{}</body>", "ab".repeat(1500));
        assert_eq!(page_content(&html).chars().count(), MAX_CONTENT_CHARS);
    }

    proptest! {
        #[test]
        fn truncation_is_a_prefix(s in "\\PC{0,3000}", max in 0usize..2500) {
            let out = truncate_chars(&s, max);
            prop_assert!(s.starts_with(&out));
            prop_assert_eq!(out.chars().count(), s.chars().count().min(max));
        }

        #[test]
        fn collapsed_text_has_no_whitespace_runs(s in "[ a-c\\t\\n]{0,200}") {
            let out = collapse_whitespace(&s);
            prop_assert!(!out.contains("  "));
            prop_assert!(!out.starts_with(' ') && !out.ends_with(' '));
            prop_assert!(!out.contains('\n') && !out.contains('\t'));
        }
    }
}
