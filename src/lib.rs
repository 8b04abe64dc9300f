//! Magazine-style pagination.
//!
//! A [`Document`] bundles a measured article, its page templates and the
//! viewport. [`Document::paginate`] lays the article out page by page; the
//! [`Paginator`] does the same lazily and can be resumed at any point.

pub mod document;
pub mod error;
pub mod paginator;

pub use document::Document;
pub use error::PipelineError;
pub use paginator::{Paginator, find_page, paginate_all, prepare_grids};

pub use folio_layout::{
    BreakRecord, Content, Grid, LayoutError, Page, PageOutcome, PaginationConfig, make_page,
};
pub use folio_traits::{InMemoryMetricsProvider, MetricsError, MetricsProvider};
pub use folio_types::{
    BoxMetrics, CapabilitySet, ContentPosition, GridSpec, Size, SourceElement, SourceFigure,
    SourceNode,
};
