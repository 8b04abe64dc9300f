//! Page assembly: grid selection, container fill and column fill for one
//! page, committed against the live break record.

use crate::break_record::BreakRecord;
use crate::column::{ColumnFill, fill_column};
use crate::config::PaginationConfig;
use crate::container::fill_container;
use crate::content::{Content, FigureSize};
use crate::grid::scoring::best;
use crate::grid::{Grid, GridItem};
use crate::LayoutError;
use folio_traits::{ContainerSlot, MetricsProvider};
use folio_types::document::escape_attr;
use folio_types::{BoxMetrics, ContentPosition};
use handlebars::Handlebars;
use log::{debug, error, info, warn};
use std::collections::BTreeMap;

/// A figure variant placed in one of the page's containers.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedContainer {
    /// Container index within the grid.
    pub index: usize,
    pub figure_index: u32,
    pub size_name: String,
    /// Variant markup, still cloaked until the page is activated.
    pub markup: String,
    pub height: f32,
    pub zoomable: bool,
    pub scrollable: bool,
}

/// One laid-out page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// The chosen grid, with container and column heights as filled.
    pub grid: Grid,
    pub size: BoxMetrics,
    /// Zero-based page number within the article.
    pub page_number: u32,
    pub classes: Vec<String>,
    pub containers: Vec<PlacedContainer>,
    pub columns: Vec<ColumnFill>,
    /// Grid chrome with content fields filled in.
    pub chrome: Option<String>,
    pub begin: ContentPosition,
    pub end: ContentPosition,
    pub finished: bool,
    active: bool,
    debug: bool,
}

/// What assembling one page produced.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    Page(Box<Page>),
    /// Nothing to show; either pagination is complete or the chosen grid
    /// turned out unusable.
    Ignore,
}

/// Lays out the next page and advances `br` past its content.
///
/// `grids` must already be filtered and stretched for the viewport.
/// Returns [`PageOutcome::Ignore`] (with `br.finished` set) when no grid fits
/// because the article is complete.
pub fn make_page(
    content: &Content,
    grids: &[Grid],
    br: &mut BreakRecord,
    extra_classes: &[String],
    metrics: &dyn MetricsProvider,
    config: &PaginationConfig,
) -> Result<PageOutcome, LayoutError> {
    let original = br.clone();

    let Some(selection) = best(content, grids, br) else {
        br.finished = br.at_end(content) || br.figure_index as usize == content.figures.len();
        if br.finished {
            info!("Finished article in face of no fitting grid");
            return Ok(PageOutcome::Ignore);
        }
        error!("No grid fits at {:?}", br.position());
        return Err(LayoutError::NoGridFits {
            position: br.position(),
        });
    };

    let mut grid = grids
        .get(selection.grid)
        .cloned()
        .ok_or_else(|| LayoutError::Generic(format!("no grid {}", selection.grid)))?;
    debug!(
        "Page {} uses grid '{}' (score {})",
        br.page_number, grid.name, selection.score
    );
    let mut size = grid.stretched_size;
    let max_col_height = grid.max_col_height;
    let begin = br.position();

    let mut placed = Vec::new();
    for (i, mapping) in selection.containers.iter().enumerate() {
        let Some(mapping) = mapping else {
            continue;
        };
        let Some(figure) = content.figure(mapping.figure_index) else {
            continue;
        };
        let slot = ContainerSlot::new(br.page_number, i);

        match fill_container(&mut grid, i, mapping, slot, metrics, content.line_height)? {
            Some(height) => {
                br.use_figure(figure.figure_index);
                if i == 0 && grid.flags.size_to_container {
                    size.outer_h = height + grid.containers[0].delta + size.bp_height();
                }
                placed.push(PlacedContainer {
                    index: i,
                    figure_index: figure.figure_index,
                    size_name: mapping.size_name.clone(),
                    markup: mapping.variant.markup.clone(),
                    height,
                    zoomable: figure.zoomable,
                    scrollable: figure.scrollable,
                });
            }
            None => {
                info!("Container failure, figure {}", figure.figure_index);
                if !figure.optional && figure.fallback.is_some() {
                    // Keep the figure alive through its fallback
                    br.delay_figure(figure.figure_index);
                } else if !grid.containers[i].flexed {
                    br.failed_figure(figure.figure_index);
                }
            }
        }
    }

    let columns: Vec<ColumnFill> = grid
        .columns
        .iter()
        .map(|col| fill_column(content, br, col.height, max_col_height, col.min_h, config))
        .collect();

    if original.progress_eq(br) {
        error!("No progress made in pagination at {:?}", br.position());
        return Err(LayoutError::NoForwardProgress {
            position: br.position(),
        });
    }
    if placed.is_empty() && grid.flags.size_to_container {
        warn!("Grid '{}' sizes to an empty container, page ignored", grid.name);
        return Ok(PageOutcome::Ignore);
    }

    let chrome = grid
        .template
        .as_deref()
        .and_then(|t| render_chrome(t, &content.fields));
    let page_number = br.page_number;
    br.page_number += 1;
    br.finished = grid.flags.onlypage || br.at_end(content);

    Ok(PageOutcome::Page(Box::new(Page {
        grid,
        size,
        page_number,
        classes: extra_classes.to_vec(),
        containers: placed,
        columns,
        chrome,
        begin,
        end: br.position(),
        finished: br.finished,
        active: false,
        debug: config.debug_annotations,
    })))
}

fn render_chrome(template: &str, fields: &BTreeMap<String, String>) -> Option<String> {
    match Handlebars::new().render_template(template, fields) {
        Ok(html) => Some(html),
        Err(e) => {
            warn!("Grid template failed to render: {}", e);
            None
        }
    }
}

impl Page {
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether `position` falls within this page.
    pub fn contains_position(&self, position: &ContentPosition) -> bool {
        self.begin.less_or_equal(position) && !self.end.less_or_equal(position)
    }

    /// Page markup with figure payloads still cloaked.
    pub fn markup(&self) -> String {
        self.render(false)
    }

    /// Marks the page as shown and returns its live markup.
    pub fn activate(&mut self) -> String {
        self.active = true;
        self.render(true)
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    fn render(&self, live: bool) -> String {
        let mut class = String::from("page");
        for c in self.grid.classes.iter().chain(&self.classes) {
            class.push(' ');
            class.push_str(c);
        }

        let mut out = format!(
            "<div class=\"{}\" style=\"width:{}px;height:{}px;margin-top:{}px\">",
            escape_attr(&class),
            self.size.width(),
            self.size.height(),
            -self.size.outer_h / 2.0
        );
        if let Some(chrome) = &self.chrome {
            out.push_str(chrome);
        }

        for item in &self.grid.items {
            match *item {
                GridItem::Container(i) => {
                    if let Some(placed) = self.containers.iter().find(|c| c.index == i) {
                        self.render_container(&mut out, placed, live);
                    }
                }
                GridItem::Column(i) => {
                    if let Some(fill) = self.columns.get(i) {
                        self.render_column(&mut out, fill);
                    }
                }
            }
        }
        out.push_str("</div>");
        out
    }

    fn render_container(&self, out: &mut String, placed: &PlacedContainer, live: bool) {
        let mut class = format!("container {}", placed.size_name);
        if placed.zoomable {
            class.push_str(" zoomable");
        }
        if placed.scrollable {
            class.push_str(" scroll");
        }
        out.push_str(&format!("<div class=\"{}\"", escape_attr(&class)));
        if placed.zoomable {
            out.push_str(&format!(" data-figureindex=\"{}\"", placed.figure_index));
        }
        out.push_str(&format!(" style=\"height:{}px\">", placed.height));
        if live {
            out.push_str(&FigureSize::uncloak(&placed.markup));
        } else {
            out.push_str(&placed.markup);
        }
        out.push_str("</div>");
    }

    fn render_column(&self, out: &mut String, fill: &ColumnFill) {
        out.push_str("<div class=\"column\"");
        if self.debug {
            out.push_str(&format!(
                " data-overhang=\"{}\" data-contentheight=\"{}\"",
                fill.overhang, fill.content_height
            ));
            if let Some(first) = fill.first_block {
                out.push_str(&format!(" data-firstblock=\"{}\"", first));
            }
            if let Some(last) = fill.last_block {
                out.push_str(&format!(" data-lastblock=\"{}\"", last));
            }
        }
        out.push_str(&format!(" style=\"height:{}px\">", fill.height));
        out.push_str(&fill.markup);
        out.push_str("</div>");
    }

    /// Plain-text summary line for logs and the CLI.
    pub fn summary(&self) -> String {
        format!(
            "page {} grid={} begin={}/{}/{} end={}/{}/{} figures={} {}",
            self.page_number + 1,
            self.grid.name,
            self.begin.block,
            self.begin.figure,
            self.begin.overhang,
            self.end.block,
            self.end.figure,
            self.end.overhang,
            self.containers.len(),
            if self.finished { "finished" } else { "" }
        )
        .trim_end()
        .to_string()
    }
}
