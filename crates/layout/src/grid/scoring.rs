//! Grid scoring and selection.

use super::Grid;
use super::mapping::{ContainerMapping, map_containers};
use crate::break_record::BreakRecord;
use crate::content::Content;
use log::debug;

pub const FIXED_CONTAINER: f32 = 5000.0;
pub const COLUMN: f32 = 50.0;
pub const EMPTY_CONTAINER_PENALTY: f32 = 5000.0;
pub const DIFFERENT_LINEHEIGHT: f32 = 2000.0;
pub const DIFFERENT_COLWIDTH: f32 = f32::INFINITY;
pub const CONTAINER_BONUS: f32 = 1000.0;
/// Per pixel of the mapped variant's minimum height.
pub const CONTAINER_AREA_BONUS: f32 = 1.0;
pub const REQUIRED_BLOCK_BONUS: f32 = 4000.0;
pub const PAGE_NUMBER: f32 = 12000.0;
pub const ONLY_PAGE: f32 = 4000.0;
pub const FIRST_PAGE: f32 = 4000.0;
pub const ODD_PAGE: f32 = 2000.0;
pub const EVEN_PAGE: f32 = 2000.0;
pub const NON_EVEN_ODD: f32 = f32::INFINITY;
pub const NON_ONLY_PAGE: f32 = f32::INFINITY;
pub const NON_FIRST_PAGE: f32 = f32::INFINITY;
pub const NON_PAGE_NUMBER: f32 = f32::INFINITY;
/// Scaled by the squared empty fraction of the text capacity.
pub const EMPTINESS_PENALTY: f32 = 4000.0;

/// Text capacity below which a grid counts as largely empty.
const EMPTY_FRACTION_THRESHOLD: f32 = 0.5;
/// Each filled container softens the emptiness penalty by this factor.
const FILLED_CONTAINER_DISCOUNT: f32 = 0.8;

/// The winning grid for the current break position.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Index into the candidate grid list.
    pub grid: usize,
    /// One optional mapping per container of the grid.
    pub containers: Vec<Option<ContainerMapping>>,
    pub score: f32,
}

/// Base score of `grid` from column count, metric compatibility and page
/// targeting alone.
pub fn score(grid: &Grid, content: &Content, br: &BreakRecord) -> f32 {
    let flags = &grid.flags;
    let human_page = br.page_number + 1;
    let mut score = grid.columns.len() as f32 * COLUMN;

    if grid.line_height != content.line_height {
        score -= DIFFERENT_LINEHEIGHT;
    }
    if grid.col_width != 0.0 && grid.col_width != content.col_width {
        score -= DIFFERENT_COLWIDTH;
    }

    if flags.onlypage {
        score += if br.page_number != 0 { -NON_ONLY_PAGE } else { ONLY_PAGE };
    }
    if flags.firstpage {
        score += if br.page_number != 0 { -NON_FIRST_PAGE } else { FIRST_PAGE };
    }
    if flags.pages.contains(&human_page) {
        score += PAGE_NUMBER;
    }
    if flags.non_pages.contains(&human_page) {
        score -= NON_PAGE_NUMBER;
    }

    if human_page % 2 == 1 {
        if flags.odd {
            score += ODD_PAGE;
        } else if flags.even {
            score -= NON_EVEN_ODD;
        }
    } else if flags.even {
        score += EVEN_PAGE;
    } else if flags.odd {
        score -= NON_EVEN_ODD;
    }

    if score >= 0.0 {
        score += grid.bonus;
    }
    score
}

/// Scores every grid against a speculative copy of `br` and returns the
/// best one, or `None` when every grid is disqualified.
///
/// Text fit is an estimate: blocks are summed against the grid's total
/// text height without breaking them into columns.
pub fn best(content: &Content, grids: &[Grid], br: &BreakRecord) -> Option<Selection> {
    let mut best: Option<Selection> = None;
    let mut high_score = f32::NEG_INFINITY;

    for (grid_index, grid) in grids.iter().enumerate() {
        if grid.invalid {
            continue;
        }
        let mut br = br.clone();
        let start_index = br.index;
        let mut height = br.overhang;
        let mut remaining = grid.text_height - height;
        // Overhang counts as a block
        let mut block_added = height > 0.0 && grid.text_height > 0.0;

        let mut score = score(grid, content, &br);
        let containers = map_containers(content, grid, &mut br);

        let mut filled: i32 = 0;
        for (container, mapping) in grid.containers.iter().zip(&containers) {
            match mapping {
                Some(mapping) => {
                    score += CONTAINER_BONUS + mapping.variant.min_h * CONTAINER_AREA_BONUS;
                    if content
                        .figure(mapping.figure_index)
                        .is_some_and(|f| !f.optional)
                    {
                        score += REQUIRED_BLOCK_BONUS;
                    }
                    if !container.flexible {
                        score += FIXED_CONTAINER;
                    }
                    filled += 1;
                }
                None if !container.flexible => score -= EMPTY_CONTAINER_PENALTY,
                None => {}
            }
        }

        if br.overhang > 0.0 {
            // The overhanging block is already counted
            if let Some(block) = content.block(br.index) {
                br.index = content.next_non_child_index(block);
            }
        }
        while grid.text_height > 0.0 && height <= grid.text_height {
            let Some(block) = content.block(br.index) else {
                break;
            };
            if block.is_fallback && block.figure.is_some_and(|f| br.figure_used(f)) {
                br.index = content.next_non_child_index(block);
                continue;
            }

            let estimate = block.metrics.outer_h + block.metrics.margin_top;
            if block.keeptogether && (estimate > grid.max_col_height || estimate > remaining) {
                break;
            }
            let partial = estimate > remaining;
            if partial && block.has_children() {
                br.index += 1;
                continue;
            }

            // A block that only partly fits still scores in full
            height += estimate;
            score += estimate;
            remaining -= estimate;
            block_added = true;
            br.index = content.next_non_child_index(block);
            if partial {
                break;
            }
        }

        if !block_added {
            let stalled = content
                .block(start_index)
                .filter(|b| br.overhang > 0.0 || b.within_fallback)
                .and_then(|b| content.fallback_figure_of(b))
                .is_some_and(|f| !f.optional);
            if stalled || filled == 0 {
                score = f32::NEG_INFINITY;
            }
        }

        if grid.text_height > 0.0 {
            let empty = remaining.max(0.0) / grid.text_height;
            if empty > EMPTY_FRACTION_THRESHOLD {
                score -= EMPTINESS_PENALTY
                    * empty
                    * empty
                    * FILLED_CONTAINER_DISCOUNT.powi(filled);
            }
        }

        debug!("Grid '{}' scored {}", grid.name, score);
        if score > high_score {
            high_score = score;
            best = Some(Selection {
                grid: grid_index,
                containers,
                score,
            });
        }
    }
    best
}
