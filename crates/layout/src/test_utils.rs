use crate::config::PaginationConfig;
use crate::content::Content;
use crate::grid::Grid;
use folio_traits::InMemoryMetricsProvider;
use folio_types::{BoxMetrics, GridItemSpec, GridSpec, SourceElement};

/// Base line height used by every test fixture.
pub const LINE_HEIGHT: f32 = 20.0;

/// A paragraph with inline metrics and no margins.
pub fn para(height: f32) -> SourceElement {
    SourceElement::new("p").with_metrics(BoxMetrics::with_height(height, LINE_HEIGHT))
}

/// A paragraph with the given top and bottom margins.
pub fn para_with_margins(height: f32, margin_top: f32, margin_bottom: f32) -> SourceElement {
    SourceElement::new("p").with_metrics(BoxMetrics {
        margin_top,
        margin_bottom,
        outer_h: height,
        line_height: LINE_HEIGHT,
        ..Default::default()
    })
}

/// An article root, 300px wide, holding `children`.
pub fn article(children: Vec<SourceElement>) -> SourceElement {
    children.into_iter().fold(
        SourceElement::new("article").with_metrics(BoxMetrics {
            outer_w: 300.0,
            outer_h: 10_000.0,
            line_height: LINE_HEIGHT,
            ..Default::default()
        }),
        SourceElement::with_child,
    )
}

pub fn build_content(root: &SourceElement) -> Content {
    build_content_with(root, &PaginationConfig::default())
}

pub fn build_content_with(root: &SourceElement, config: &PaginationConfig) -> Content {
    let _ = env_logger::builder().is_test(true).try_init();
    let provider = InMemoryMetricsProvider::new();
    Content::build(root, &provider, config).expect("test content should build")
}

pub fn column(height: f32) -> GridItemSpec {
    GridItemSpec::Column {
        height,
        width: 300.0,
        min_height: 0.0,
        fixed: false,
    }
}

pub fn container(height: f32, sizes: &[&str], fixed: bool) -> GridItemSpec {
    GridItemSpec::Container {
        height,
        min_height: 0.0,
        sizes: sizes.iter().map(|s| s.to_string()).collect(),
        fixed,
        bottom: false,
    }
}

/// A grid spec whose content height is `height`, with matching line height.
pub fn grid_spec(name: &str, height: f32, items: Vec<GridItemSpec>) -> GridSpec {
    GridSpec {
        name: name.to_string(),
        size: BoxMetrics {
            outer_w: 300.0 * items.len().max(1) as f32,
            outer_h: height,
            line_height: LINE_HEIGHT,
            ..Default::default()
        },
        items,
        ..Default::default()
    }
}

/// A fixed single-column grid of the given height.
pub fn single_column_grid(height: f32) -> Grid {
    let mut spec = grid_spec("single", height, vec![column(height)]);
    spec.classes.push("fixed".to_string());
    Grid::from_spec(&spec)
}
