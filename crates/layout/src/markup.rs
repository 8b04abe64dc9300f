//! Assembly of column markup from precomputed block fragments.

use crate::content::{Block, Content};
use log::warn;
use std::collections::BTreeSet;

/// One fragment emitted into a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Piece {
    /// Opening tag of a block whose children follow.
    Open { block: u32, zeroed: bool },
    /// A complete block.
    Whole(u32),
    Close(u32),
}

/// Ordered column fragments plus the stack of tags still open.
///
/// Closing always pops the innermost open tag, so rendered markup stays
/// balanced no matter how the column ends.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnMarkup {
    pieces: Vec<Piece>,
    open: Vec<u32>,
}

/// An element whose top margin gets overridden while rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChainLink {
    Piece(usize),
    /// A descendant rendered inside a `Whole` piece.
    Nested(u32),
}

impl ColumnMarkup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn open_depth(&self) -> usize {
        self.open.len()
    }

    pub fn open(&mut self, block: u32, zeroed: bool) {
        self.pieces.push(Piece::Open { block, zeroed });
        self.open.push(block);
    }

    /// Re-opens every ancestor of `block`, outermost first.
    pub fn open_all(&mut self, content: &Content, block: &Block, zeroed: bool) {
        let mut ancestors: Vec<u32> = content.ancestors(block).map(|b| b.index).collect();
        ancestors.reverse();
        for index in ancestors {
            self.open(index, zeroed);
        }
    }

    pub fn whole(&mut self, block: u32) {
        self.pieces.push(Piece::Whole(block));
    }

    /// Closes the innermost open tag.
    pub fn close(&mut self) -> Option<u32> {
        let block = self.open.pop()?;
        self.pieces.push(Piece::Close(block));
        Some(block)
    }

    pub fn close_all(&mut self) {
        while self.close().is_some() {}
    }

    /// Removes the opening tag of `block` if it is the last fragment.
    pub fn pop_open(&mut self, block: u32) -> bool {
        match self.pieces.last() {
            Some(Piece::Open { block: b, .. }) if *b == block => {
                self.pieces.pop();
                self.open.pop();
                true
            }
            _ => false,
        }
    }

    /// Serializes the column.
    ///
    /// The first element gets `first_margin` as its top margin; the next
    /// `zero_depth` first-child elements below it get a zero top margin.
    pub fn render(&self, content: &Content, first_margin: f32, zero_depth: usize) -> String {
        let mut zero_pieces = BTreeSet::new();
        let mut nested = BTreeSet::new();
        for link in self.zero_chain(content, zero_depth) {
            match link {
                ChainLink::Piece(i) => zero_pieces.insert(i),
                ChainLink::Nested(b) => nested.insert(b),
            };
        }

        let mut out = String::new();
        for (i, piece) in self.pieces.iter().enumerate() {
            let margin = if i == 0 {
                Some(first_margin)
            } else {
                zero_pieces.contains(&i).then_some(0.0)
            };
            match *piece {
                Piece::Open { block, zeroed } => {
                    if let Some(block) = content.block(block) {
                        push_with_margin(&mut out, block.open_tag(zeroed), margin);
                    }
                }
                Piece::Whole(block) => {
                    if let Some(block) = content.block(block) {
                        render_whole(content, block, margin, &nested, &mut out);
                    }
                }
                Piece::Close(block) => {
                    if let Some(block) = content.block(block) {
                        out.push_str(block.close_tag());
                    }
                }
            }
        }
        out
    }

    /// Follows first-element children down from the first piece.
    fn zero_chain(&self, content: &Content, depth: usize) -> Vec<ChainLink> {
        let first_child_of = |b: u32| {
            content
                .block(b)
                .and_then(Block::first_child)
                .map(ChainLink::Nested)
        };

        let mut links = Vec::with_capacity(depth);
        let mut cur = ChainLink::Piece(0);
        for _ in 0..depth {
            let next = match cur {
                ChainLink::Piece(i) => match self.pieces.get(i) {
                    Some(Piece::Open { .. }) => match self.pieces.get(i + 1) {
                        Some(Piece::Open { .. } | Piece::Whole(_)) => Some(ChainLink::Piece(i + 1)),
                        _ => None,
                    },
                    Some(Piece::Whole(b)) => first_child_of(*b),
                    _ => None,
                },
                ChainLink::Nested(b) => first_child_of(b),
            };
            match next {
                Some(link) => {
                    links.push(link);
                    cur = link;
                }
                None => {
                    warn!("Margin chain ended after {} of {} levels", links.len(), depth);
                    break;
                }
            }
        }
        links
    }
}

fn render_whole(
    content: &Content,
    block: &Block,
    margin: Option<f32>,
    nested: &BTreeSet<u32>,
    out: &mut String,
) {
    let expand = block.has_children() && nested.iter().any(|&n| block.contains(n));
    if !expand {
        push_with_margin(out, block.html(), margin);
        return;
    }
    push_with_margin(out, block.open_tag(false), margin);
    for child in block.children.iter().filter_map(|&c| content.block(c)) {
        let margin = nested.contains(&child.index).then_some(0.0);
        render_whole(content, child, margin, nested, out);
    }
    out.push_str(block.close_tag());
}

fn push_with_margin(out: &mut String, html: &str, margin: Option<f32>) {
    match margin {
        Some(px) => out.push_str(&with_margin_top(html, px)),
        None => out.push_str(html),
    }
}

/// Sets the top margin of the first element in `html` through its inline
/// style.
pub fn with_margin_top(html: &str, px: f32) -> String {
    let Some(end) = html.find('>') else {
        return html.to_string();
    };
    let decl = format!("margin-top:{}px", px);
    let tag = &html[..end];

    if let Some(start) = tag.find(" style=\"") {
        let value_start = start + " style=\"".len();
        if let Some(len) = tag[value_start..].find('"') {
            let value_end = value_start + len;
            let existing = tag[value_start..value_end].trim_end().trim_end_matches(';');
            let sep = if existing.trim().is_empty() { "" } else { ";" };
            return format!(
                "{}{}{}{}{}",
                &html[..value_start],
                existing,
                sep,
                decl,
                &html[value_end..]
            );
        }
    }

    let insert = if tag.ends_with('/') { end - 1 } else { end };
    format!("{} style=\"{}\"{}", &html[..insert], decl, &html[insert..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{article, build_content, para};
    use folio_types::{BoxMetrics, SourceElement};

    #[test]
    fn test_with_margin_top_inserts_style() {
        assert_eq!(with_margin_top("<p>a</p>", -20.0), "<p style=\"margin-top:-20px\">a</p>");
        assert_eq!(
            with_margin_top("<p class=\"x\" style=\"color:red;\">a</p>", 0.0),
            "<p class=\"x\" style=\"color:red;margin-top:0px\">a</p>"
        );
        assert_eq!(with_margin_top("<br/>", 0.0), "<br style=\"margin-top:0px\"/>");
        assert_eq!(with_margin_top("text", 0.0), "text");
    }

    fn nested_content() -> Content {
        let inner = SourceElement::new("div")
            .with_metrics(BoxMetrics::with_height(80.0, 20.0))
            .with_child(para(40.0).with_text("a"))
            .with_child(para(40.0).with_text("b"));
        let outer = SourceElement::new("section")
            .with_metrics(BoxMetrics::with_height(80.0, 20.0))
            .with_child(inner);
        build_content(&article(vec![outer, para(40.0).with_text("c")]))
    }

    #[test]
    fn test_close_keeps_markup_balanced() {
        let content = nested_content();
        let mut markup = ColumnMarkup::new();
        markup.open(0, false);
        markup.open(1, false);
        markup.whole(2);
        assert_eq!(markup.open_depth(), 2);
        markup.close_all();
        assert_eq!(markup.open_depth(), 0);
        assert_eq!(
            markup.render(&content, 0.0, 0),
            "<section style=\"margin-top:0px\"><div><p>a</p></div></section>"
        );
    }

    #[test]
    fn test_pop_open_only_removes_trailing_tag() {
        let mut markup = ColumnMarkup::new();
        markup.open(0, false);
        markup.open(1, false);
        assert!(!markup.pop_open(0));
        assert!(markup.pop_open(1));
        assert!(markup.pop_open(0));
        assert!(markup.is_empty());
    }

    #[test]
    fn test_open_all_uses_zeroed_tags() {
        let content = nested_content();
        let mut markup = ColumnMarkup::new();
        markup.open_all(&content, &content.blocks[3], true);
        assert_eq!(
            markup.pieces(),
            &[
                Piece::Open { block: 0, zeroed: true },
                Piece::Open { block: 1, zeroed: true }
            ]
        );
    }

    #[test]
    fn test_zero_chain_descends_into_whole_blocks() {
        let content = nested_content();
        let mut markup = ColumnMarkup::new();
        markup.whole(0);
        markup.whole(4);
        assert_eq!(
            markup.render(&content, 0.0, 2),
            "<section style=\"margin-top:0px\"><div style=\"margin-top:0px\">\
             <p style=\"margin-top:0px\">a</p><p>b</p></div></section><p>c</p>"
        );
    }

    #[test]
    fn test_zero_chain_through_open_pieces() {
        let content = nested_content();
        let mut markup = ColumnMarkup::new();
        markup.open(0, false);
        markup.open(1, false);
        markup.whole(2);
        markup.close_all();
        assert_eq!(
            markup.render(&content, 0.0, 2),
            "<section style=\"margin-top:0px\"><div style=\"margin-top:0px\">\
             <p style=\"margin-top:0px\">a</p></div></section>"
        );
    }
}
