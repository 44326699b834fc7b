//! Keyboard resize of the selected region's boundaries.

use crate::series::Area;
use crate::state::{RegionsAction, Store};
use crate::MIN_REGION_WIDTH_MS;

/// Which boundary of the target area moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Start,
    End,
}

/// Move one boundary of the selected region by `steps` keyboard steps
/// (negative = earlier). Step size comes from the keyboard interaction state.
///
/// The target area is the one under the pointer (hover wins over tap); with
/// no pointer inside any area, the first area for `Start`, the last for
/// `End`. The moved boundary is clamped so it cannot cross its own area's
/// other boundary, cannot cross a neighboring area, and cannot leave the
/// viewport. Returns whether the region changed.
pub fn resize_selected_region(store: &mut Store, edge: Edge, steps: i64) -> bool {
    let state = store.state();
    let Some(region_id) = state.regions.selected_id else {
        return false;
    };
    let Some(region) = state.regions.by_id.get(&region_id) else {
        return false;
    };
    if steps == 0 {
        return false;
    }

    let delta = steps as f64 * state.interaction.keyboard.step_size_ms;
    let viewport = state.view.viewport;

    // Areas are sorted by start, so list neighbors are time neighbors.
    let index = state
        .interaction
        .pointer_timestamp()
        .and_then(|ts| region.area_containing(ts))
        .unwrap_or(match edge {
            Edge::Start => 0,
            Edge::End => region.areas.len() - 1,
        });

    let mut areas = region.areas.clone();
    let area = areas[index];

    let moved = match edge {
        Edge::Start => {
            let lo = if index > 0 {
                areas[index - 1].end.max(viewport.min)
            } else {
                viewport.min
            };
            let hi = area.end - MIN_REGION_WIDTH_MS;
            if lo > hi {
                return false;
            }
            let start = (area.start + delta).clamp(lo, hi);
            Area { start, ..area }
        }
        Edge::End => {
            let hi = if index + 1 < areas.len() {
                areas[index + 1].start.min(viewport.max)
            } else {
                viewport.max
            };
            let lo = area.start + MIN_REGION_WIDTH_MS;
            if lo > hi {
                return false;
            }
            let end = (area.end + delta).clamp(lo, hi);
            Area { end, ..area }
        }
    };

    if moved == area {
        return false;
    }
    areas[index] = moved;
    store.dispatch(RegionsAction::SetAreas { id: region_id, areas });
    true
}
