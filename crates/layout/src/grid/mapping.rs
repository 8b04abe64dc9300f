//! Matching figures to the containers of a grid.

use super::{Grid, GridContainer};
use crate::break_record::BreakRecord;
use crate::content::{Content, Figure, FigureSize};
use folio_types::CapabilitySet;
use log::trace;
use std::collections::VecDeque;

/// A figure size variant chosen for one container.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerMapping {
    pub figure_index: u32,
    pub size_name: String,
    pub variant: FigureSize,
    /// Copied from the container; used for scoring.
    pub flexible: bool,
}

/// Picks at most one figure for each container of `grid`.
///
/// Delayed figures are tried first, oldest first, then figures from the
/// record's high-water mark onwards. Every match is marked used on `br` so
/// later containers cannot claim the same figure. A required figure that
/// fits nowhere stops the forward search for that container.
pub fn map_containers(
    content: &Content,
    grid: &Grid,
    br: &mut BreakRecord,
) -> Vec<Option<ContainerMapping>> {
    grid.containers
        .iter()
        .map(|container| map_container(content, container, br))
        .collect()
}

fn map_container(
    content: &Content,
    container: &GridContainer,
    br: &mut BreakRecord,
) -> Option<ContainerMapping> {
    let figure_count = content.figures.len() as u32;
    let mut figure_index = br.figure_index;
    let mut delayed: VecDeque<u32> = br.delayed.iter().copied().collect();

    while !delayed.is_empty() || figure_index < figure_count {
        let (current, using_delayed) = match delayed.pop_front() {
            Some(index) => (index, true),
            None => (figure_index, false),
        };
        let Some(figure) = content.figure(current) else {
            if !using_delayed {
                figure_index += 1;
            }
            continue;
        };

        if let Some((size_name, variant)) = find_size(figure, container, &content.capabilities) {
            trace!("Figure {} fits container as '{}'", current, size_name);
            let mapping = ContainerMapping {
                figure_index: current,
                size_name: size_name.to_string(),
                variant: variant.clone(),
                flexible: container.flexible,
            };
            br.use_figure(current);
            return Some(mapping);
        }

        if !using_delayed {
            if !figure.optional {
                // Required figures are placed in document order
                return None;
            }
            figure_index += 1;
        }
    }
    None
}

/// The most preferred size the container accepts that the figure provides.
fn find_size<'a>(
    figure: &'a Figure,
    container: &'a GridContainer,
    caps: &CapabilitySet,
) -> Option<(&'a str, &'a FigureSize)> {
    container.sizes.iter().rev().find_map(|name| {
        let variant = figure.get_size(name, caps)?;
        if container.flexible && variant.min_h > 0.0 && variant.min_h > container.height {
            return None;
        }
        Some((name.as_str(), variant))
    })
}
