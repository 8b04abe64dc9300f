//! Page templates: columns for flowed text plus containers for figures.

pub mod mapping;
pub mod scoring;

use folio_types::{BoxMetrics, CapabilitySet, GridItemSpec, GridSpec, Requirements, Size};
use log::{debug, error};
use std::collections::BTreeSet;

/// A text column within a grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridColumn {
    pub height: f32,
    pub width: f32,
    pub min_h: f32,
    pub flexible: bool,
    /// Distance between the column and the full grid height, kept constant
    /// while stretching.
    pub delta: f32,
    /// Shrunk to make room for a filled flexible container.
    pub flexed: bool,
}

impl GridColumn {
    fn stretch(&mut self, grid_height: f32) {
        if self.flexible {
            self.height = (grid_height - self.delta).max(0.0);
        }
    }
}

/// A figure slot within a grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridContainer {
    pub height: f32,
    pub min_h: f32,
    pub flexible: bool,
    pub delta: f32,
    /// Accepted size names, in increasing preference.
    pub sizes: Vec<String>,
    /// Anchored to the bottom of the page rather than the top.
    pub bottom: bool,
    pub flexed: bool,
}

impl GridContainer {
    fn stretch(&mut self, grid_height: f32) {
        if self.flexible {
            self.height = (grid_height - self.delta).max(0.0);
        }
    }
}

/// Position of a column or container in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridItem {
    Column(usize),
    Container(usize),
}

/// Page-targeting flags parsed from grid classes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoringFlags {
    pub onlypage: bool,
    pub firstpage: bool,
    pub odd: bool,
    pub even: bool,
    pub size_to_container: bool,
    /// Human (1-based) page numbers this grid is meant for.
    pub pages: BTreeSet<u32>,
    /// Human page numbers this grid must never be used on.
    pub non_pages: BTreeSet<u32>,
}

impl ScoringFlags {
    pub fn from_classes<S: AsRef<str>>(classes: &[S]) -> Self {
        let mut flags = ScoringFlags::default();
        for class in classes {
            let class = class.as_ref().to_ascii_lowercase();
            match class.as_str() {
                "onlypage" => flags.onlypage = true,
                "firstpage" => flags.firstpage = true,
                "odd" => flags.odd = true,
                "even" => flags.even = true,
                "sizetocontainer" => flags.size_to_container = true,
                other => {
                    if let Some(n) = other.strip_prefix("no-page-").and_then(|n| n.parse().ok()) {
                        flags.non_pages.insert(n);
                    } else if let Some(n) = other.strip_prefix("page-").and_then(|n| n.parse().ok())
                    {
                        flags.pages.insert(n);
                    }
                }
            }
        }
        flags
    }
}

/// A page template ready for scoring.
///
/// Grids are built once from a [`GridSpec`] and stretched to the available
/// page height before every pagination run; page assembly works on a copy.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub name: String,
    pub classes: Vec<String>,
    pub requirements: Requirements,
    pub flexible: bool,
    pub flags: ScoringFlags,
    pub size: BoxMetrics,
    /// Size after the last call to [`Grid::stretch`].
    pub stretched_size: BoxMetrics,
    pub line_height: f32,
    /// Sum of all column heights.
    pub text_height: f32,
    pub max_col_height: f32,
    pub col_width: f32,
    /// Columns disagree on width; never scored.
    pub invalid: bool,
    pub columns: Vec<GridColumn>,
    pub containers: Vec<GridContainer>,
    pub items: Vec<GridItem>,
    pub bonus: f32,
    /// Page chrome markup with `{{ field }}` placeholders.
    pub template: Option<String>,
}

impl Grid {
    pub fn from_spec(spec: &GridSpec) -> Self {
        let flexible = !spec.classes.iter().any(|c| c.eq_ignore_ascii_case("fixed"));
        let mut size = spec.size;
        if flexible {
            size.min_w = size.min_w.max(size.width());
        } else {
            size.min_h = size.height();
            size.min_w = size.width();
        }
        let grid_height = size.height();

        let mut grid = Grid {
            name: spec.name.clone(),
            classes: spec.classes.clone(),
            requirements: spec.requires,
            flexible,
            flags: ScoringFlags::from_classes(&spec.classes),
            size,
            stretched_size: size,
            line_height: if size.line_height > 0.0 { size.line_height } else { 1.0 },
            text_height: 0.0,
            max_col_height: 0.0,
            col_width: 0.0,
            invalid: false,
            columns: Vec::new(),
            containers: Vec::new(),
            items: Vec::with_capacity(spec.items.len()),
            bonus: spec.bonus,
            template: spec.template.clone(),
        };

        for item in &spec.items {
            match item {
                GridItemSpec::Column { height, width, min_height, fixed } => {
                    if grid.col_width == 0.0 {
                        grid.col_width = *width;
                    } else if grid.col_width != *width {
                        error!("Inconsistent column widths in grid '{}'", spec.name);
                        grid.invalid = true;
                    }
                    grid.items.push(GridItem::Column(grid.columns.len()));
                    grid.columns.push(GridColumn {
                        height: *height,
                        width: *width,
                        min_h: *min_height,
                        flexible: !fixed,
                        delta: (grid_height - height).max(0.0),
                        flexed: false,
                    });
                }
                GridItemSpec::Container { height, min_height, sizes, fixed, bottom } => {
                    grid.items.push(GridItem::Container(grid.containers.len()));
                    grid.containers.push(GridContainer {
                        height: *height,
                        min_h: *min_height,
                        flexible: !fixed,
                        delta: (grid_height - height).max(0.0),
                        sizes: sizes.clone(),
                        bottom: *bottom,
                        flexed: false,
                    });
                }
            }
        }
        grid.update_text_height();
        grid
    }

    pub(crate) fn update_text_height(&mut self) {
        self.text_height = self.columns.iter().map(|c| c.height).sum();
        self.max_col_height = self.columns.iter().map(|c| c.height).fold(0.0, f32::max);
    }

    /// Fits the grid to `total_height` of available page space.
    ///
    /// The resulting content height is the grid's minimum plus a whole number
    /// of line heights, capped at its maximum. Fixed grids are unchanged.
    pub fn stretch(&mut self, total_height: f32) -> &mut Self {
        if !self.flexible {
            return self;
        }

        let content_height = total_height - (self.size.margin_height() + self.size.bp_height());
        let max_h = if self.size.max_h > 0.0 { self.size.max_h } else { f32::INFINITY };
        let mut final_height = max_h.min(content_height.max(self.size.min_h));
        let delta = final_height - self.size.min_h;
        final_height -= delta % self.line_height;

        for col in &mut self.columns {
            col.stretch(final_height);
            col.flexed = false;
        }
        for container in &mut self.containers {
            container.stretch(final_height);
            container.flexed = false;
        }
        self.update_text_height();

        self.stretched_size = self.size;
        self.stretched_size.outer_h = final_height + self.size.bp_height();
        self.stretched_size.max_h = if self.flags.size_to_container {
            self.size.max_h
        } else {
            max_h.min(final_height + self.line_height * 3.0)
        };
        debug!(
            "Stretched grid '{}' to {} (text height {})",
            self.name, final_height, self.text_height
        );
        self
    }

    pub fn meets_requirements(&self, caps: &CapabilitySet) -> bool {
        self.requirements.satisfied_by(caps)
    }

    pub fn has_theme(&self, theme: &str) -> bool {
        self.classes.iter().any(|c| c == theme)
    }

    /// Whether the grid can be laid out in a viewport of `size`.
    pub fn size_filter(&self, size: Size) -> bool {
        let inner = Size::new(
            size.width - self.size.bp_width(),
            size.height - self.size.bp_height() - self.size.margin_height(),
        );
        self.size.in_size_range(inner)
    }

    /// Later items of the grid that a filled flexible container at `item`
    /// pushes aside.
    pub(crate) fn items_after(&self, item: GridItem) -> impl Iterator<Item = GridItem> + '_ {
        self.items
            .iter()
            .skip_while(move |i| **i != item)
            .skip(1)
            .copied()
    }

    fn sort_key(&self) -> f32 {
        self.size.width() + 20.0 * self.containers.len() as f32
    }
}

/// Orders grids widest and most container-rich first.
pub fn sort_grids(grids: &mut [Grid]) {
    grids.sort_by(|a, b| b.sort_key().total_cmp(&a.sort_key()));
}
