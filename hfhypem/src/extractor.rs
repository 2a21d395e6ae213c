//! Extraction of the JSON payload embedded in a listing page
//!
//! hypem.com hands its track list to the client-side player as the text
//! of a `<script>` element, e.g.
//!
//! ```html
//! <script type="application/json" id="displayList-data">{"tracks":[...]}</script>
//! ```
//!
//! The element is recognised by attribute *value* only: any attribute
//! equal to the marker qualifies, whatever its name.

use scraper::{Html, Node};

/// Attribute value marking the track list script
pub const DISPLAY_LIST_MARKER: &str = "displayList-data";

/// Returns the text of the first marked `<script>` in document order
///
/// The tree is walked pre-order with an explicit stack, so deep documents
/// cannot exhaust the call stack. The first child of the matching element
/// is returned verbatim when it is a text node. No match, or a match
/// without text, yields an empty string.
pub fn extract_embedded_json(document: &Html, marker: &str) -> String {
    let mut stack = vec![document.tree.root()];

    while let Some(node) = stack.pop() {
        if let Node::Element(element) = node.value() {
            if element.name() == "script" && element.attrs().any(|(_, value)| value == marker) {
                return node
                    .first_child()
                    .and_then(|child| child.value().as_text().map(|text| text.to_string()))
                    .unwrap_or_default();
            }
        }

        // Reversed so the leftmost child is popped first
        let children: Vec<_> = node.children().collect();
        stack.extend(children.into_iter().rev());
    }

    String::new()
}

/// Parses `html` and runs [`extract_embedded_json`] on it
pub fn extract_from_html(html: &str, marker: &str) -> String {
    let document = Html::parse_document(html);
    extract_embedded_json(&document, marker)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_marked_script() {
        let html = r#"<html><head>
            <script src="/player.js"></script>
            <script type="application/json" id="displayList-data">{"tracks":[]}</script>
        </head><body></body></html>"#;

        assert_eq!(
            extract_from_html(html, DISPLAY_LIST_MARKER),
            r#"{"tracks":[]}"#
        );
    }

    #[test]
    fn test_first_match_in_document_order_wins() {
        let html = r#"<html><body>
            <div><section><script id="displayList-data">A</script></section></div>
            <script id="displayList-data">B</script>
        </body></html>"#;

        assert_eq!(extract_from_html(html, DISPLAY_LIST_MARKER), "A");
    }

    #[test]
    fn test_head_precedes_body() {
        let html = r#"<html><head><script class="displayList-data">head</script></head>
            <body><script id="displayList-data">body</script></body></html>"#;

        assert_eq!(extract_from_html(html, DISPLAY_LIST_MARKER), "head");
    }

    #[test]
    fn test_any_attribute_name_qualifies() {
        let html = r#"<body><script data-role="displayList-data">payload</script></body>"#;
        assert_eq!(extract_from_html(html, DISPLAY_LIST_MARKER), "payload");
    }

    #[test]
    fn test_only_script_elements_match() {
        let html = r#"<body><div id="displayList-data">not me</div></body>"#;
        assert_eq!(extract_from_html(html, DISPLAY_LIST_MARKER), "");
    }

    #[test]
    fn test_missing_marker_yields_empty_string() {
        let html = r#"<html><body><script id="other">{}</script></body></html>"#;
        assert_eq!(extract_from_html(html, DISPLAY_LIST_MARKER), "");
        assert_eq!(extract_from_html("", DISPLAY_LIST_MARKER), "");
    }

    #[test]
    fn test_empty_marked_script_yields_empty_string() {
        let html = r#"<body><script id="displayList-data"></script></body>"#;
        assert_eq!(extract_from_html(html, DISPLAY_LIST_MARKER), "");
    }

    #[test]
    fn test_text_is_returned_verbatim() {
        let json = "\n  {\"tracks\": [{\"artist\": \"A & B <live>\"}]}\n";
        let html = format!(r#"<body><script id="displayList-data">{}</script></body>"#, json);
        assert_eq!(extract_from_html(&html, DISPLAY_LIST_MARKER), json);
    }

    #[test]
    fn test_deep_document() {
        let depth = 5_000;
        let html = format!(
            "{}<script id=\"displayList-data\">deep</script>{}",
            "<div>".repeat(depth),
            "</div>".repeat(depth)
        );
        assert_eq!(extract_from_html(&html, DISPLAY_LIST_MARKER), "deep");
    }
}
