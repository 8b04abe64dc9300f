//! The JSON document format read by the CLI and the library entry points.

use crate::error::PipelineError;
use crate::paginator::{Paginator, prepare_grids};
use folio_layout::{Content, Grid, Page, PaginationConfig};
use folio_traits::InMemoryMetricsProvider;
use folio_types::{BoxMetrics, GridSpec, Size, SourceElement};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// An article with everything needed to paginate it.
///
/// Elements may carry their metrics inline; otherwise they are looked up
/// by id in `metrics`. Figure payloads render at the heights listed in
/// `rendered_heights` (keyed by their markup) or at their declared minimum.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Document {
    /// Root element of the article.
    pub content: SourceElement,
    pub grids: Vec<GridSpec>,
    /// Space available for one page.
    pub viewport: Size,
    /// Only grids carrying this class are used.
    pub theme: Option<String>,
    /// Extra classes for every page.
    pub classes: Vec<String>,
    pub config: PaginationConfig,
    pub metrics: BTreeMap<String, BoxMetrics>,
    pub rendered_heights: BTreeMap<String, f32>,
}

impl Document {
    pub fn from_json(json: &str) -> Result<Self, PipelineError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        info!("Loading document from {}", path.display());
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// A metrics provider serving the document's precomputed numbers.
    pub fn metrics_provider(&self) -> Result<InMemoryMetricsProvider, PipelineError> {
        let provider = InMemoryMetricsProvider::new();
        for (id, metrics) in &self.metrics {
            provider.add_metrics(id.clone(), *metrics)?;
        }
        for (markup, height) in &self.rendered_heights {
            provider.add_rendered_height(markup.clone(), *height)?;
        }
        Ok(provider)
    }

    pub fn build_content(&self, provider: &InMemoryMetricsProvider) -> Result<Content, PipelineError> {
        Ok(Content::build(&self.content, provider, &self.config)?)
    }

    /// Grids eligible for the viewport, stretched and sorted.
    pub fn eligible_grids(&self) -> Result<Vec<Grid>, PipelineError> {
        if self.grids.is_empty() {
            return Err(PipelineError::Config("no grids defined".to_string()));
        }
        let grids = prepare_grids(
            &self.grids,
            self.viewport,
            &self.config.capabilities,
            self.theme.as_deref(),
        );
        if grids.is_empty() {
            return Err(PipelineError::Config(format!(
                "no eligible grids at {}x{}",
                self.viewport.width, self.viewport.height
            )));
        }
        Ok(grids)
    }

    /// Lays out the whole article.
    pub fn paginate(&self) -> Result<Vec<Page>, PipelineError> {
        let provider = self.metrics_provider()?;
        let content = self.build_content(&provider)?;
        let grids = self.eligible_grids()?;
        Paginator::new(&content, grids, &provider, &self.config)
            .with_classes(self.classes.clone())
            .collect()
    }
}
