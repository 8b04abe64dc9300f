//! The content model: a flattened pre-order arena of blocks plus the
//! figures anchored in them.

mod block;
mod builder;
mod figure;

pub use self::block::{Block, BlockMarkup};
pub use self::figure::{FALLBACK_SIZE, Figure, FigureSize};

use crate::{LayoutError, PaginationConfig};
use folio_traits::MetricsProvider;
use folio_types::{CapabilitySet, SourceElement};
use std::collections::BTreeMap;

/// A parsed article ready for pagination.
///
/// Blocks are stored in pre-order; a block's `index` is its position in
/// `blocks`, and parent/sibling links are indices into the same vector.
/// Nothing here is mutated once built, so one `Content` may be shared by
/// several pagination runs.
#[derive(Debug, Clone)]
pub struct Content {
    pub blocks: Vec<Block>,
    pub figures: Vec<Figure>,
    /// Base line height of the article.
    pub line_height: f32,
    /// Column width the article was measured at.
    pub col_width: f32,
    /// `itemprop` fields found in the article, keyed by lowercase name.
    pub fields: BTreeMap<String, String>,
    /// Capabilities figure size variants are resolved against.
    pub capabilities: CapabilitySet,
}

impl Content {
    /// Builds the content tree for `root`, measuring every element through
    /// `metrics`.
    ///
    /// Elements that cannot be measured or have zero height are dropped.
    /// Fails if the root itself cannot be measured or nothing remains.
    pub fn build(
        root: &SourceElement,
        metrics: &dyn MetricsProvider,
        config: &PaginationConfig,
    ) -> Result<Content, LayoutError> {
        builder::ContentBuilder::new(metrics, config).build(root)
    }

    pub fn block(&self, index: u32) -> Option<&Block> {
        self.blocks.get(index as usize)
    }

    pub fn figure(&self, index: u32) -> Option<&Figure> {
        self.figures.get(index as usize)
    }

    pub fn block_count(&self) -> u32 {
        self.blocks.len() as u32
    }

    /// The next block that is not a descendant of `block`.
    pub fn next_non_child(&self, block: &Block) -> Option<&Block> {
        let mut cur = block;
        loop {
            if let Some(next) = cur.next_sibling {
                return self.block(next);
            }
            cur = self.block(cur.parent?)?;
        }
    }

    /// Index of the next non-descendant block, or the block count when
    /// `block` ends the article.
    pub fn next_non_child_index(&self, block: &Block) -> u32 {
        self.next_non_child(block)
            .map(|b| b.index)
            .unwrap_or_else(|| self.block_count())
    }

    /// Ancestors of `block`, innermost first.
    pub fn ancestors<'a>(&'a self, block: &Block) -> impl Iterator<Item = &'a Block> + 'a {
        let mut next = block.parent;
        std::iter::from_fn(move || {
            let cur = self.block(next?)?;
            next = cur.parent;
            Some(cur)
        })
    }

    /// The figure whose fallback subtree contains `block`, if any.
    pub fn fallback_figure_of(&self, block: &Block) -> Option<&Figure> {
        if !block.within_fallback {
            return None;
        }
        std::iter::once(block)
            .chain(self.ancestors(block))
            .find(|b| b.is_fallback)
            .and_then(|b| self.figure(b.figure?))
    }
}
