//! Markup to line-oriented text
//!
//! Executable and style content is removed before any text is collected, so
//! inline scripts never leak into name extraction.

use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::Html;

/// Elements whose entire subtree is discarded
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Elements that start a new line in the extracted text
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "li", "main", "nav", "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

/// Converts raw markup into clean, newline-separated text
///
/// Text nodes are concatenated in document order, with a line break wherever
/// the enclosing block element changes or a `<br>` occurs. Each resulting line is
/// trimmed, then split on runs of two or more spaces (merged headline text),
/// and empty chunks are dropped.
///
/// # Example
///
/// ```
/// use whose_domain::text::normalize;
///
/// let html = "<html><body><h1>Jane  Doe</h1><script>var x = 'Bob';</script></body></html>";
/// assert_eq!(normalize(html), "Jane\nDoe");
/// ```
pub fn normalize(markup: &str) -> String {
    let document = Html::parse_document(markup);
    let mut raw = String::new();
    let mut current_block = None;

    for node in document.tree.root().descendants() {
        let text = match node.value() {
            Node::Text(text) => text,
            Node::Element(element) if element.name() == "br" => {
                raw.push('\n');
                continue;
            }
            _ => continue,
        };

        if has_ancestor(node, SKIPPED_ELEMENTS) {
            continue;
        }

        let block = node
            .ancestors()
            .find(|ancestor| is_element_in(*ancestor, BLOCK_ELEMENTS))
            .map(|ancestor| ancestor.id());
        if block != current_block {
            raw.push('\n');
            current_block = block;
        }
        raw.push_str(text);
    }

    normalize_lines(&raw)
}

fn has_ancestor(node: NodeRef<'_, Node>, names: &[&str]) -> bool {
    node.ancestors().any(|ancestor| is_element_in(ancestor, names))
}

fn is_element_in(node: NodeRef<'_, Node>, names: &[&str]) -> bool {
    node.value()
        .as_element()
        .is_some_and(|element| names.contains(&element.name()))
}

/// Applies the line rules to already extracted text
pub fn normalize_lines(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .flat_map(|line| line.split("  "))
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Heuristic check for whether input looks like markup rather than plain text
pub fn looks_like_markup(input: &str) -> bool {
    let lowered = input.trim_start().to_lowercase();
    lowered.starts_with("<!doctype") || lowered.starts_with("<html") || lowered.contains("<body")
}
