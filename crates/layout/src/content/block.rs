use folio_types::{BoxMetrics, SourceElement, SourceNode};

/// Elements whose content is opaque and can never be split.
pub(crate) const REPLACED_ELEMENTS: [&str; 9] = [
    "img", "video", "object", "embed", "iframe", "audio", "canvas", "svg", "table",
];

/// Elements assumed to only ever hold inline content.
pub(crate) const INLINE_CONTAINERS: [&str; 7] = ["p", "h1", "h2", "h3", "h4", "h5", "h6"];

/// Elements assumed to always hold block content.
pub(crate) const BLOCK_CONTAINERS: [&str; 6] = ["div", "article", "ul", "ol", "figure", "aside"];

pub(crate) fn is_replaced(el: &SourceElement) -> bool {
    REPLACED_ELEMENTS.contains(&el.tag_name().as_str())
}

pub(crate) fn is_inline_container(el: &SourceElement) -> bool {
    INLINE_CONTAINERS.contains(&el.tag_name().as_str())
}

pub(crate) fn is_block_container(el: &SourceElement) -> bool {
    BLOCK_CONTAINERS.contains(&el.tag_name().as_str())
}

/// Whether `el` should be treated like a `<div>` holding block children
/// rather than like a paragraph.
pub(crate) fn has_block_children(el: &SourceElement) -> bool {
    if is_inline_container(el) {
        return false;
    }
    if is_block_container(el) {
        return true;
    }
    let mut child_seen = false;
    for child in &el.children {
        match child {
            SourceNode::Text { content } if !content.trim().is_empty() => return false,
            SourceNode::Text { .. } => {}
            SourceNode::Figure(_) => return true,
            SourceNode::Element(child) => {
                if is_inline_container(child) || is_block_container(child) {
                    return true;
                }
                child_seen = true;
                match child.display {
                    Some(d) if d.is_inline() => return false,
                    Some(_) => return true,
                    None => {}
                }
            }
        }
    }
    child_seen
}

/// Precomputed markup for a block. Treated as opaque by the layout passes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockMarkup {
    /// The complete element.
    pub html: String,
    /// Opening tag, present only for blocks with children.
    pub open_tag: Option<String>,
    /// Opening tag with top margin, border and padding zeroed, used when an
    /// element is continued from a previous column.
    pub open_tag_zero: Option<String>,
    pub close_tag: Option<String>,
}

/// One node of the content tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub index: u32,
    pub metrics: BoxMetrics,
    /// Distance from the top border edge to the bottom of the first line.
    pub first_line: f32,
    pub breakable: bool,
    pub keeptogether: bool,
    pub keepwithnext: bool,
    pub column_break: bool,
    /// Root of a figure's fallback subtree.
    pub is_fallback: bool,
    /// Inside (or the root of) a fallback subtree.
    pub within_fallback: bool,
    /// Some descendant is a fallback root.
    pub contains_fallback: bool,
    /// Owning figure, for fallback roots.
    pub figure: Option<u32>,
    pub parent: Option<u32>,
    pub next_sibling: Option<u32>,
    /// Direct children in document order.
    pub children: Vec<u32>,
    /// Figures anchored directly within this block.
    pub figures: Vec<u32>,
    /// Index of the last block in this subtree.
    pub subtree_end: u32,
    pub markup: BlockMarkup,
}

impl Block {
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn first_child(&self) -> Option<u32> {
        self.children.first().copied()
    }

    pub fn contains(&self, index: u32) -> bool {
        index > self.index && index <= self.subtree_end
    }

    pub fn html(&self) -> &str {
        &self.markup.html
    }

    pub fn open_tag(&self, zeroed: bool) -> &str {
        let tag = if zeroed {
            self.markup.open_tag_zero.as_ref()
        } else {
            self.markup.open_tag.as_ref()
        };
        tag.map(String::as_str).unwrap_or("")
    }

    pub fn close_tag(&self) -> &str {
        self.markup.close_tag.as_deref().unwrap_or("")
    }
}

/// The first-line height of a block, given its first child (if any).
pub(crate) fn compute_first_line(
    metrics: &BoxMetrics,
    keeptogether: bool,
    contains_fallback: bool,
    first_child: Option<&Block>,
) -> f32 {
    if keeptogether {
        return metrics.outer_h;
    }
    match first_child {
        None => metrics.bp_top() + metrics.line_height,
        Some(child) if !contains_fallback => {
            let collapsed = if metrics.bp_top() > 0.0 {
                child.metrics.margin_top
            } else {
                0.0
            };
            metrics.bp_top() + child.first_line + collapsed
        }
        Some(child) => metrics.bp_top() + child.first_line,
    }
}
