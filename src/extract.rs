use ego_tree::NodeRef;
use scraper::{Html, Node};

/// Tags whose entire subtree carries no page content.
const SKIP_TAGS: [&str; 5] = ["script", "style", "header", "footer", "nav"];

/// Extracts the visible text of an HTML document.
///
/// Subtrees rooted at non-content tags (script, style, header, footer, nav)
/// are dropped, remaining text nodes are joined and runs of whitespace are
/// collapsed to single spaces. Malformed input never fails: the document
/// parser recovers where it can, and inputs it cannot make sense of are
/// retried as a bare fragment before settling for an empty string.
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let text = visible_text(&document);
    if !text.is_empty() || html.trim().is_empty() {
        return text;
    }

    let fragment = Html::parse_fragment(html);
    visible_text(&fragment)
}

fn visible_text(document: &Html) -> String {
    let mut raw = String::new();
    collect_text(document.tree.root(), &mut raw);
    collapse_whitespace(&raw)
}

fn collect_text(node: NodeRef<'_, Node>, out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Element(element) if SKIP_TAGS.contains(&element.name()) => {}
            Node::Element(_) => collect_text(child, out),
            Node::Text(text) => {
                out.push_str(&text);
                out.push(' ');
            }
            _ => {}
        }
    }
}

fn collapse_whitespace(input: &str) -> String {
    let mut buf = String::with_capacity(input.len());
    for word in input.split_whitespace() {
        if !buf.is_empty() {
            buf.push(' ');
        }
        buf.push_str(word);
    }
    buf
}
