use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A stable marker for a point in the content stream.
///
/// Pages carry one at their beginning and end, which lets a reader resume
/// or deep-link to "the page containing position X".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContentPosition {
    pub block: u32,
    pub figure: u32,
    pub overhang: f32,
}

impl ContentPosition {
    /// Position past the end of any content.
    pub const END: ContentPosition = ContentPosition {
        block: u32::MAX,
        figure: u32::MAX,
        overhang: f32::INFINITY,
    };

    pub fn new(block: u32, figure: u32, overhang: f32) -> Self {
        Self {
            block,
            figure,
            overhang,
        }
    }

    /// Orders positions by reading progress: block index first, then
    /// overhang (less overhang is further along), then figure index.
    pub fn progress_cmp(&self, other: &Self) -> Ordering {
        self.block
            .cmp(&other.block)
            .then_with(|| other.overhang.total_cmp(&self.overhang))
            .then_with(|| self.figure.cmp(&other.figure))
    }

    pub fn less_or_equal(&self, other: &Self) -> bool {
        self.progress_cmp(other) != Ordering::Greater
    }

    pub fn greater(&self, other: &Self) -> bool {
        self.progress_cmp(other) == Ordering::Greater
    }

    pub fn is_end(&self) -> bool {
        *self == Self::END
    }
}

impl PartialOrd for ContentPosition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.progress_cmp(other))
    }
}
