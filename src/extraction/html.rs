use scraper::{Html, Node};

use super::{ExtractionError, FormatHandler};

/// Elements whose text content is not part of the readable page.
const HIDDEN_CONTAINERS: &[&str] = &["script", "style", "template"];

pub struct HtmlHandler;

impl FormatHandler for HtmlHandler {
    fn label(&self) -> &'static str {
        "HTML"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".html", ".htm"]
    }

    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        let source = String::from_utf8_lossy(bytes);
        Ok(visible_text(&Html::parse_document(&source)))
    }
}

/// Concatenates every text node in document order.
fn visible_text(document: &Html) -> String {
    let mut out = String::new();
    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| match ancestor.value() {
            Node::Element(element) => HIDDEN_CONTAINERS.contains(&element.name()),
            _ => false,
        });
        if !hidden {
            out.push_str(text);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> String {
        HtmlHandler.extract(html.as_bytes()).unwrap()
    }

    #[test]
    fn test_text_in_document_order() {
        let text = extract("<html><body><h1>Title</h1><p>First <b>bold</b> para.</p><p>Second</p></body></html>");
        assert_eq!(text, "TitleFirst bold para.Second");
    }

    #[test]
    fn test_entities_are_decoded() {
        let text = extract("<p>Fish &amp; chips &lt;3 &eacute;t&eacute;</p>");
        assert_eq!(text, "Fish & chips <3 été");
    }

    #[test]
    fn test_script_and_style_are_excluded() {
        let text = extract(
            "<html><head><title>Page</title><style>p { color: red; }</style></head>\
             <body><script>var x = 1;</script><p>Visible</p><template><p>later</p></template></body></html>",
        );
        assert_eq!(text, "PageVisible");
    }

    #[test]
    fn test_comments_are_excluded() {
        assert_eq!(extract("<p>a<!-- hidden -->b</p>"), "ab");
    }

    #[test]
    fn test_malformed_markup_is_tolerated() {
        let text = extract("<div><p>unclosed <span>tags");
        assert_eq!(text, "unclosed tags");
    }

    #[test]
    fn test_plain_text_and_invalid_utf8() {
        assert_eq!(extract("just words"), "just words");
        let text = HtmlHandler.extract(b"<p>caf\xe9</p>").unwrap();
        assert_eq!(text, "caf\u{FFFD}");
    }
}
