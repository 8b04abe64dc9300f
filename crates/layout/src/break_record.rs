//! The resumable pagination cursor.

use crate::content::Content;
use folio_types::ContentPosition;
use log::warn;

/// Tracks how much of an article has been committed to pages.
///
/// Speculative work (grid scoring, container mapping) always runs against a
/// `clone()`; only page assembly mutates the live record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BreakRecord {
    /// Next block to place.
    pub index: u32,
    /// High-water mark of figures considered.
    pub figure_index: u32,
    /// Pixels of the current block still owed to the next column.
    pub overhang: f32,
    pub page_number: u32,
    pub finished: bool,
    /// Skipped figures eligible for retry, oldest first.
    pub delayed: Vec<u32>,
    /// Figures that will never be retried.
    pub failed: Vec<u32>,
}

impl BreakRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `other` sits at the same point of progress.
    ///
    /// Only the length of `delayed` is compared; pagination cannot advance
    /// while leaving all four values unchanged.
    pub fn progress_eq(&self, other: &BreakRecord) -> bool {
        self.index == other.index
            && self.figure_index == other.figure_index
            && self.overhang == other.overhang
            && self.delayed.len() == other.delayed.len()
    }

    pub fn position(&self) -> ContentPosition {
        ContentPosition::new(self.index, self.figure_index, self.overhang)
    }

    pub fn at_start(&self) -> bool {
        self.index == 0 && self.figure_index == 0 && self.overhang == 0.0
    }

    /// True once no non-fallback block remains and every required figure has
    /// been placed or had its fallback shown.
    pub fn at_end(&self, content: &Content) -> bool {
        if self.overhang != 0.0 {
            return false;
        }

        let mut i = self.index;
        while let Some(block) = content.block(i) {
            if !block.is_fallback {
                return false;
            }
            if let Some(figure) = block.figure.and_then(|f| content.figure(f)) {
                if !figure.optional && !self.figure_used(figure.figure_index) {
                    return false;
                }
            }
            i = content.next_non_child_index(block);
        }

        if self.delayed.is_empty() && self.figure_index as usize == content.figures.len() {
            return true;
        }

        let required = |i: &u32| content.figure(*i).is_some_and(|f| !f.optional);
        if self.delayed.iter().any(required) {
            return false;
        }
        !(self.figure_index..content.figures.len() as u32).any(|i| required(&i))
    }

    /// Marks figure `index` as placed.
    ///
    /// Figures behind the high-water mark are pulled out of `delayed` (or
    /// `failed`); otherwise every figure skipped on the way to `index` is
    /// delayed and the mark moves past it.
    pub fn use_figure(&mut self, index: u32) {
        if index < self.figure_index {
            if let Some(pos) = self.delayed.iter().position(|&d| d == index) {
                self.delayed.remove(pos);
            } else if let Some(pos) = self.failed.iter().position(|&d| d == index) {
                self.failed.remove(pos);
            }
        } else {
            self.delayed.extend(self.figure_index..index);
            self.figure_index = index + 1;
        }
    }

    /// Treats figure `index` as considered but keeps it eligible for retry.
    pub fn delay_figure(&mut self, index: u32) {
        if !self.delayed.contains(&index) {
            self.use_figure(index);
            self.delayed.push(index);
        }
    }

    /// Abandons figure `index` for the rest of the article.
    pub fn failed_figure(&mut self, index: u32) {
        self.use_figure(index);
        if self.failed.contains(&index) {
            warn!("Figure {} failed twice", index);
            return;
        }
        self.failed.push(index);
    }

    pub fn figure_used(&self, index: u32) -> bool {
        index < self.figure_index && !self.delayed.contains(&index) && !self.failed.contains(&index)
    }
}
