//! The column filler: walks the content tree from the break position and
//! decides exactly where the column is cut.

use crate::break_record::BreakRecord;
use crate::config::PaginationConfig;
use crate::content::{Block, Content};
use crate::markup::ColumnMarkup;
use log::{debug, error, info, warn};

/// Result of filling one column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnFill {
    /// Final column height, snapped to the content's line grid.
    pub height: f32,
    pub markup: String,
    /// First block committed in full to this column.
    pub first_block: Option<u32>,
    /// Block the filler stopped on.
    pub last_block: Option<u32>,
    /// Height of the content placed, before clipping.
    pub content_height: f32,
    /// Overhang left on the break record.
    pub overhang: f32,
}

impl ColumnFill {
    fn empty(height: f32, br: &BreakRecord) -> Self {
        ColumnFill {
            height,
            overhang: br.overhang,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.markup.is_empty()
    }
}

/// Places as much content as fits into a column of `col_height`, advancing
/// `br` past everything placed.
///
/// `max_col_height` is the tallest column of the grid and drives the
/// short-column heuristic. Columns shorter than `min_h` are left empty with
/// `br` untouched.
pub fn fill_column(
    content: &Content,
    br: &mut BreakRecord,
    col_height: f32,
    max_col_height: f32,
    min_h: f32,
    config: &PaginationConfig,
) -> ColumnFill {
    let mut col_height = col_height;
    let line_height = content.line_height;
    if line_height > 0.0 && col_height % line_height != 0.0 {
        col_height -= col_height % line_height;
    }

    let Some(start) = content.block(br.index) else {
        return ColumnFill::empty(col_height, br);
    };
    if col_height <= 0.0 || col_height < min_h {
        info!("Column below minimum height at block {}: {}", start.index, col_height);
        return ColumnFill::empty(col_height, br);
    }

    let short_column = max_col_height / col_height > config.short_column_ratio;
    let mut markup = ColumnMarkup::new();
    if start.parent.is_some() {
        markup.open_all(content, start, true);
    }
    // The part of the current block already shown in an earlier column
    let init_margin_top = if br.overhang > 0.0 {
        start.metrics.outer_h - br.overhang
    } else {
        0.0
    };

    let block_count = content.block_count();
    let mut height = 0.0;
    let mut margin_top: f32 = 0.0;
    let mut is_first_block = true;
    let mut first_block: Option<u32> = None;
    let mut last_block: Option<&Block> = None;

    while br.index < block_count && height < col_height {
        let Some(block) = content.block(br.index) else {
            break;
        };
        last_block = Some(block);
        let next_sibling = block.next_sibling.and_then(|i| content.block(i));
        let next_non_child = content.next_non_child_index(block);

        if block.is_fallback
            && block.figure.is_some_and(|f| br.figure_used(f))
            && !(is_first_block && br.overhang > 0.0)
        {
            if block.parent.is_some() && next_sibling.is_none() {
                warn!("Skipped fallback {} leaves its parent open", block.index);
            }
            br.index = next_non_child;
            continue;
        }

        let remaining = col_height - height;
        let margin_and_first_line = if is_first_block && margin_top == 0.0 {
            margin_top = -init_margin_top;
            if br.overhang > 0.0 {
                block.metrics.line_height
            } else {
                block.first_line
            }
        } else {
            margin_top = margin_top.max(block.metrics.margin_top);
            margin_top + block.first_line
        };
        let mut margin_bottom = block
            .metrics
            .margin_bottom
            .max(next_sibling.map_or(0.0, |s| s.metrics.margin_top));
        let effective_height = block.metrics.outer_h + margin_top;

        let mut finish = remaining < margin_and_first_line;

        if !finish && block.keepwithnext && !(br.overhang > 0.0 || (is_first_block && !short_column)) {
            if let Some(next) = next_sibling {
                finish = remaining >= effective_height
                    && remaining < effective_height + margin_bottom + next.first_line;
                if finish {
                    debug!("Leaving column due to keepwithnext at block {}", block.index);
                }
            }
        }

        if finish {
            finish = !is_first_block || short_column;
            if !finish {
                debug!("Staying in virgin column despite non-fit at block {}", block.index);
            } else if short_column {
                debug!("Leaving short column empty at block {}", block.index);
            } else {
                debug!("Ending column early due to non-fit at block {}", block.index);
            }
        }

        if finish {
            finish = !block.contains_fallback;
        }

        if block.column_break && !is_first_block {
            finish = true;
        }

        if finish {
            back_out_open_tags(content, br, &mut markup, block);
            markup.close_all();
            break;
        }

        if block.is_fallback {
            if let Some(figure) = block.figure {
                br.use_figure(figure);
            }
        }

        if block.contains_fallback || (block.has_children() && remaining < effective_height) {
            if br.overhang > 0.0 {
                error!("Overhang present when opening block {}", block.index);
            }
            // Margins keep collapsing through a tag without border or padding
            if block.metrics.bp_top() > 0.0 {
                height += if is_first_block { 0.0 } else { margin_top };
                margin_top = 0.0;
                height += block.metrics.bp_top();
            }
            markup.open(block.index, false);
            br.index += 1;
            continue;
        }

        height += effective_height;
        markup.whole(block.index);
        is_first_block = false;
        first_block.get_or_insert(block.index);
        br.overhang = 0.0;

        if col_height > height + margin_bottom {
            br.index = next_non_child;

            if next_sibling.is_none() && block.parent.is_some() {
                let mut closes = 0;
                let mut parent = block.parent.and_then(|p| content.block(p));
                while let Some(p) = parent {
                    closes += 1;
                    if p.metrics.bp_bottom() > 0.0 {
                        height += margin_bottom + p.metrics.bp_bottom();
                        margin_bottom = p.metrics.margin_bottom;
                    } else {
                        margin_bottom = margin_bottom.max(p.metrics.margin_bottom);
                    }
                    if p.next_sibling.is_some() {
                        break;
                    }
                    parent = p.parent.and_then(|i| content.block(i));
                }

                if col_height > height + margin_bottom {
                    for _ in 0..closes {
                        markup.close();
                    }
                } else {
                    // Only closing border and padding overflow; clip them
                    markup.close_all();
                    height = col_height;
                    break;
                }
            }

            margin_top = margin_bottom;
            continue;
        }

        markup.close_all();
        if !block.breakable {
            // Never split; clip to the column and move on
            height = col_height;
            br.index = next_non_child;
            warn!("Unbreakable block {} shoved into column", block.index);
        } else {
            if height <= col_height {
                // Only margin overflowed
                br.index = next_non_child;
                height = col_height;
            }
            if block.keeptogether {
                warn!("Keeptogether block {} shoved into column", block.index);
            }
        }
        break;
    }

    let content_height = height;
    let Some(first) = first_block.and_then(|i| content.block(i)) else {
        if !markup.is_empty() {
            debug!("Clearing column contents since no block was added");
        }
        return ColumnFill {
            height: col_height,
            last_block: last_block.map(|b| b.index),
            content_height,
            ..ColumnFill::empty(col_height, br)
        };
    };

    if let Some(last) = last_block {
        col_height = compute_overhang(br, last, col_height, height);
    }

    let (first_margin, zero_depth) = if init_margin_top == 0.0 {
        (0.0, zero_chain_depth(content, first))
    } else {
        (-init_margin_top, 0)
    };

    ColumnFill {
        height: col_height,
        markup: markup.render(content, first_margin, zero_depth),
        first_block: Some(first.index),
        last_block: last_block.map(|b| b.index),
        content_height,
        overhang: br.overhang,
    }
}

/// Removes opening tags that would be left empty when the column ends at
/// `block`, rolling the cursor back to the outermost removed tag.
fn back_out_open_tags(
    content: &Content,
    br: &mut BreakRecord,
    markup: &mut ColumnMarkup,
    block: &Block,
) {
    let mut current = block;
    while let Some(parent) = current.parent.and_then(|p| content.block(p)) {
        if parent.index + 1 != current.index {
            break;
        }
        debug!("Backing out opened tag of block {}", parent.index);
        markup.pop_open(parent.index);
        br.index = parent.index;
        if parent.is_fallback {
            if let Some(figure) = parent.figure {
                br.delay_figure(figure);
            }
        }
        current = parent;
    }
}

/// How many first-child levels below the first element get their top margin
/// zeroed so collapsed margins don't reappear at the top of the column.
fn zero_chain_depth(content: &Content, first: &Block) -> usize {
    if first.parent.is_some() {
        let anchor = content
            .ancestors(first)
            .filter(|a| a.metrics.bp_top() > 0.0)
            .last()
            .unwrap_or(first);
        content.ancestors(anchor).count()
    } else {
        let mut depth = 0;
        let mut cur = first;
        while let Some(child) = cur.first_child().and_then(|c| content.block(c)) {
            depth += 1;
            cur = child;
        }
        depth
    }
}

/// Records how much of `last` sticks out of the column and returns the
/// column height, shortened so the cut falls on a line boundary.
pub fn compute_overhang(br: &mut BreakRecord, last: &Block, col_height: f32, height: f32) -> f32 {
    if col_height >= height {
        br.overhang = 0.0;
        return col_height;
    }
    if !last.breakable {
        error!("Overhang on unbreakable block {}", last.index);
    }
    if last.has_children() {
        error!("Overhang on block {} with children", last.index);
    }

    br.overhang = height - col_height;
    let content_only = br.overhang - last.metrics.bp_bottom();
    if content_only <= 0.0 {
        // Only border and padding stick out
        br.overhang = 0.0;
        br.index = last.index + 1;
        return col_height;
    }

    let line_height = last.metrics.line_height;
    if line_height <= 0.0 {
        return col_height;
    }
    let excess = ((last.metrics.height() - content_only) % line_height).max(0.0);
    if excess > 0.0 {
        br.overhang += excess;
        return col_height - excess;
    }
    col_height
}
