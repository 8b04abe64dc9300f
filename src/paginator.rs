//! Driving page assembly over a whole article.

use crate::document::Document;
use crate::error::PipelineError;
use folio_layout::{
    BreakRecord, Content, Grid, Page, PageOutcome, PaginationConfig, make_page, sort_grids,
};
use folio_traits::MetricsProvider;
use folio_types::{CapabilitySet, ContentPosition, GridSpec, Size};
use itertools::Itertools;
use log::{debug, error, info};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Builds the grids usable in `viewport`: theme and capability filtering,
/// size filtering, stretching to the viewport height, then sorting.
pub fn prepare_grids(
    specs: &[GridSpec],
    viewport: Size,
    capabilities: &CapabilitySet,
    theme: Option<&str>,
) -> Vec<Grid> {
    let mut grids: Vec<Grid> = specs
        .iter()
        .map(Grid::from_spec)
        .filter(|grid| theme.is_none_or(|t| grid.has_theme(t)))
        .filter(|grid| grid.meets_requirements(capabilities) && grid.size_filter(viewport))
        .map(|mut grid| {
            grid.stretch(viewport.height);
            grid
        })
        .collect();

    if grids.is_empty() {
        error!("No eligible grids at {}x{}", viewport.width, viewport.height);
    }
    sort_grids(&mut grids);
    debug!("Eligible grids: {}", grids.iter().map(|g| g.name.as_str()).join(", "));
    grids
}

/// Lazily lays out an article one committed page at a time.
///
/// Pages the assembler ignores are skipped. The iterator ends once the
/// article is finished; after an error it yields nothing more. The break
/// record stays available, so pagination can be resumed or inspected
/// between pages.
pub struct Paginator<'a> {
    content: &'a Content,
    grids: Vec<Grid>,
    metrics: &'a dyn MetricsProvider,
    config: &'a PaginationConfig,
    classes: Vec<String>,
    br: BreakRecord,
    produced: usize,
    failed: bool,
}

impl<'a> Paginator<'a> {
    /// `grids` should come from [`prepare_grids`].
    pub fn new(
        content: &'a Content,
        grids: Vec<Grid>,
        metrics: &'a dyn MetricsProvider,
        config: &'a PaginationConfig,
    ) -> Self {
        Self {
            content,
            grids,
            metrics,
            config,
            classes: Vec::new(),
            br: BreakRecord::new(),
            produced: 0,
            failed: false,
        }
    }

    pub fn with_classes(mut self, classes: Vec<String>) -> Self {
        self.classes = classes;
        self
    }

    pub fn break_record(&self) -> &BreakRecord {
        &self.br
    }

    pub fn pages_produced(&self) -> usize {
        self.produced
    }

    pub fn is_finished(&self) -> bool {
        self.br.finished
    }

    /// Whether the last page failed to lay out.
    pub fn has_failed(&self) -> bool {
        self.failed
    }

    /// Produces pages until one contains `position`, returning all pages
    /// made along the way. [`ContentPosition::END`] paginates everything.
    pub fn paginate_until(&mut self, position: &ContentPosition) -> Result<Vec<Page>, PipelineError> {
        let mut pages = Vec::new();
        for page in self.by_ref() {
            let page = page?;
            let reached = !position.is_end() && position.less_or_equal(&page.end);
            pages.push(page);
            if reached {
                break;
            }
        }
        Ok(pages)
    }
}

impl Iterator for Paginator<'_> {
    type Item = Result<Page, PipelineError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.br.finished || self.failed {
                return None;
            }
            if self.produced >= self.config.max_pages {
                error!("Page limit of {} reached", self.config.max_pages);
                self.failed = true;
                return Some(Err(PipelineError::PageLimitExceeded {
                    limit: self.config.max_pages,
                }));
            }

            match make_page(
                self.content,
                &self.grids,
                &mut self.br,
                &self.classes,
                self.metrics,
                self.config,
            ) {
                Ok(PageOutcome::Page(page)) => {
                    self.produced += 1;
                    info!("{}", page.summary());
                    return Some(Ok(*page));
                }
                Ok(PageOutcome::Ignore) => {
                    if self.br.finished {
                        info!("Page ignored during pagination and article terminated");
                    } else {
                        info!("Page ignored during pagination");
                    }
                }
                Err(e) => {
                    if self.br.finished {
                        return None;
                    }
                    self.failed = true;
                    self.br.finished = true;
                    return Some(Err(e.into()));
                }
            }
        }
    }
}

/// Index of the page holding `position`. [`ContentPosition::END`] maps to
/// the last page.
pub fn find_page(pages: &[Page], position: &ContentPosition) -> Option<usize> {
    if position.is_end() {
        return pages.len().checked_sub(1);
    }
    pages.iter().position(|p| p.contains_position(position))
}

/// Paginates independent documents, in parallel when the `parallel` feature
/// is enabled.
pub fn paginate_all(documents: &[Document]) -> Vec<Result<Vec<Page>, PipelineError>> {
    #[cfg(feature = "parallel")]
    {
        documents.par_iter().map(Document::paginate).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        documents.iter().map(Document::paginate).collect()
    }
}
