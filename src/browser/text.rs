// src/browser/text.rs
use scraper::{ElementRef, Html, Node, Selector};

const SKIPPED_TAGS: [&str; 5] = ["script", "style", "noscript", "template", "svg"];

/// Visible text of a rendered page, one block per line.
pub fn page_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let root = Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next())
        .unwrap_or_else(|| document.root_element());

    let mut chunks = Vec::new();
    collect_text(root, &mut chunks);

    clean_text(&chunks.join("\n"))
}

fn collect_text(element: ElementRef<'_>, chunks: &mut Vec<String>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => chunks.push(text.to_string()),
            Node::Element(el) if SKIPPED_TAGS.contains(&el.name()) => {}
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, chunks);
                }
            }
            _ => {}
        }
    }
}

fn clean_text(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skips_scripts_and_styles() {
        let html = r#"<html><head><title>Profile</title><style>p{}</style></head>
            <body><script>var token = 1;</script>
            <h1>  Jane   Doe </h1><p>Cloud engineer</p><noscript>enable js</noscript></body></html>"#;

        let text = page_text(html);
        assert_eq!(text, "Jane Doe\nCloud engineer");
    }

    #[test]
    fn test_nested_blocks_keep_order() {
        let html = "<body><div><span>one</span><div>two<b>three</b></div></div>four</body>";
        assert_eq!(page_text(html), "one\ntwo\nthree\nfour");
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(page_text(""), "");
    }
}
