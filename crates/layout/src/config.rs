use folio_types::CapabilitySet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaginationConfig {
    /// A column is considered "short" when the tallest column of its grid is
    /// more than this many times its own height. Short columns may be left
    /// empty instead of forcing an oversized block into them.
    ///
    /// Defaults to `1.5`.
    pub short_column_ratio: f32,

    /// Snap margins, border+padding and outer heights of every block onto the
    /// base line-height grid while the content tree is built.
    ///
    /// Defaults to `true`.
    pub normalize_metrics: bool,

    /// Emit `data-*` attributes describing block metrics and column state
    /// into the generated markup. Has no effect on layout decisions.
    ///
    /// Defaults to `false`.
    pub debug_annotations: bool,

    /// The maximum number of pages a paginator will produce for one article
    /// before giving up.
    ///
    /// Defaults to `1000`.
    pub max_pages: usize,

    /// Capabilities of the reading surface, used to pick figure size variants
    /// and filter grids.
    pub capabilities: CapabilitySet,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            short_column_ratio: 1.5,
            normalize_metrics: true,
            debug_annotations: false,
            max_pages: 1000,
            capabilities: CapabilitySet::modern(),
        }
    }
}
