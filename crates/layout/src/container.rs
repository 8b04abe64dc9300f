//! Placing a mapped figure variant into its container.

use crate::LayoutError;
use crate::grid::mapping::ContainerMapping;
use crate::grid::{Grid, GridItem};
use folio_traits::{ContainerSlot, MetricsProvider, VariantPayload};
use folio_types::round_up;
use log::{debug, info};

/// Applies `mapping` to container `index` of `grid`.
///
/// Fixed containers always accept the variant and keep their height.
/// Flexible containers shrink to the rendered height, or reject the
/// variant (reverting it) when it is taller than the slot. A filled
/// flexible container pushes every later non-fixed column and container
/// of the grid aside by its height, rounded up to `line_height`.
///
/// Returns the container's resulting height, or `None` when the variant
/// did not fit.
pub fn fill_container(
    grid: &mut Grid,
    index: usize,
    mapping: &ContainerMapping,
    slot: ContainerSlot,
    metrics: &dyn MetricsProvider,
    line_height: f32,
) -> Result<Option<f32>, LayoutError> {
    let max_height = grid
        .containers
        .get(index)
        .map(|c| c.height)
        .ok_or_else(|| LayoutError::Generic(format!("grid has no container {}", index)))?;

    let payload = VariantPayload {
        size_name: &mapping.size_name,
        markup: &mapping.variant.markup,
        min_width: mapping.variant.min_w,
        min_height: mapping.variant.min_h,
    };
    let rendered = metrics.apply_size_variant(slot, &payload)?;

    if !mapping.flexible {
        return Ok(Some(max_height));
    }

    if rendered > max_height {
        info!(
            "Container failure for figure {}: {} > {}",
            mapping.figure_index, rendered, max_height
        );
        metrics.revert_size_variant(slot, &mapping.size_name)?;
        return Ok(None);
    }

    let push = if line_height > 0.0 && rendered % line_height != 0.0 {
        round_up(rendered, line_height)
    } else {
        rendered
    };
    grid.containers[index].height = rendered;

    let later: Vec<GridItem> = grid.items_after(GridItem::Container(index)).collect();
    for item in later {
        let (height, flexed) = match item {
            GridItem::Column(i) if grid.columns[i].flexible => {
                let col = &mut grid.columns[i];
                (&mut col.height, &mut col.flexed)
            }
            GridItem::Container(i) if grid.containers[i].flexible => {
                let c = &mut grid.containers[i];
                (&mut c.height, &mut c.flexed)
            }
            _ => continue,
        };
        *flexed = true;
        if *height <= push {
            debug!("{:?} shrunk to zero height", item);
            *height = 0.0;
        } else {
            *height -= push;
        }
    }
    grid.update_text_height();
    Ok(Some(rendered))
}
