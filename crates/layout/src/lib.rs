use folio_traits::MetricsError;
use folio_types::ContentPosition;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("No grid fits the content at block {}, figure {}.", .position.block, .position.figure)]
    NoGridFits { position: ContentPosition },
    #[error(
        "Pagination made no progress at block {}, figure {}, overhang {:.2}.",
        .position.block, .position.figure, .position.overhang
    )]
    NoForwardProgress { position: ContentPosition },
    #[error("Content contains no blocks or figures.")]
    EmptyContent,
    #[error("Metrics error: {0}")]
    Metrics(#[from] MetricsError),
    #[error("Generic layout error: {0}")]
    Generic(String),
}

pub mod break_record;
pub mod column;
pub mod config;
pub mod container;
pub mod content;
pub mod grid;
pub mod markup;
pub mod page;

pub use self::break_record::BreakRecord;
pub use self::column::{ColumnFill, compute_overhang, fill_column};
pub use self::config::PaginationConfig;
pub use self::container::fill_container;
pub use self::content::{Block, BlockMarkup, Content, Figure, FigureSize};
pub use self::grid::mapping::{ContainerMapping, map_containers};
pub use self::grid::scoring::{Selection, best};
pub use self::grid::{Grid, GridColumn, GridContainer, GridItem, ScoringFlags, sort_grids};
pub use self::markup::{ColumnMarkup, Piece, with_margin_top};
pub use self::page::{Page, PageOutcome, PlacedContainer, make_page};

// Re-export foundation types used throughout the public API
pub use folio_types::{BoxMetrics, CapabilitySet, Size};

#[cfg(test)]
mod grid_test;
#[cfg(test)]
mod test_utils;
