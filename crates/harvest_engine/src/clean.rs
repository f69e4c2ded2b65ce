use ego_tree::NodeRef;
use scraper::node::{Element, Node};
use scraper::{ElementRef, Html, Selector};

/// Blocks whose text mentions any of these are boilerplate sections.
const SKIPPED_SECTIONS: &[&str] = &["track listing", "references", "external links", "see also"];

pub trait TextCleaner: Send + Sync {
    /// Returns the readable text of a page; empty when nothing usable was found.
    fn clean(&self, html: &str) -> String;
}

/// Cleaner for MediaWiki article pages.
///
/// - reads `p`, `h2` and `h3` blocks inside `div.mw-parser-output`
/// - drops footnote markers, tables nested in a block and `[edit]` links
/// - still reads blocks that sit inside a top-level table
/// - skips blocks that belong to reference or link sections
/// - separates blocks with a blank line.
#[derive(Debug, Default, Clone, Copy)]
pub struct WikiTextCleaner;

impl TextCleaner for WikiTextCleaner {
    fn clean(&self, html: &str) -> String {
        let doc = Html::parse_document(html);
        let (Ok(content_sel), Ok(block_sel)) = (
            Selector::parse("div.mw-parser-output"),
            Selector::parse("p, h2, h3"),
        ) else {
            return String::new();
        };
        let Some(content) = doc.select(&content_sel).next() else {
            return String::new();
        };

        content
            .select(&block_sel)
            .map(block_text)
            .filter(|text| !text.is_empty() && !is_skipped_section(text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn block_text(block: ElementRef) -> String {
    let mut pieces = Vec::new();
    collect_text(*block, &mut pieces);
    pieces.join(" ")
}

fn collect_text<'a>(node: NodeRef<'a, Node>, pieces: &mut Vec<&'a str>) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    pieces.push(trimmed);
                }
            }
            Node::Element(element) if is_stripped(element) => {}
            Node::Element(_) => collect_text(child, pieces),
            _ => {}
        }
    }
}

fn is_stripped(element: &Element) -> bool {
    match element.name() {
        "sup" | "table" => true,
        "span" => element.classes().any(|class| class == "mw-editsection"),
        _ => false,
    }
}

fn is_skipped_section(text: &str) -> bool {
    let lower = text.to_lowercase();
    SKIPPED_SECTIONS.iter().any(|marker| lower.contains(marker))
}
