//! Region creation: pointer drag and the two-step keyboard gesture.

use crate::series::Area;
use crate::state::{InteractionAction, PendingRegion, RegionSeed, RegionsAction, Store};

use super::last_region_id;

/// Create a region from a drag selection, or append an area to the current
/// append target on the same position.
///
/// Rejected (no dispatch) while comparison mode is active, for unknown
/// positions, and for degenerate intervals. Returns the affected region id.
pub fn create_region_from_drag(
    store: &mut Store,
    position_id: &str,
    start: f64,
    end: f64,
) -> Option<u64> {
    let state = store.state();

    if state.view.comparison.is_active {
        log::debug!("region creation ignored while comparison mode is active");
        return None;
    }
    if !state.view.available_positions.iter().any(|p| p == position_id) {
        log::warn!("region creation for unknown position '{position_id}'");
        return None;
    }
    let area = Area::normalized(start, end)?;

    // An active append target on the same position absorbs the drag
    // as an extra area instead of spawning a new region.
    if let Some(target_id) = state.regions.append_target_id {
        if let Some(target) = state.regions.by_id.get(&target_id) {
            if target.position_id == position_id {
                store.dispatch(RegionsAction::AppendArea { id: target_id, area });
                store.dispatch(RegionsAction::Select { id: Some(target_id) });
                return Some(target_id);
            }
        }
    }

    store.dispatch(RegionsAction::Add(RegionSeed {
        position_id: position_id.to_string(),
        areas: vec![area],
        note: String::new(),
        color: None,
    }));
    let id = last_region_id(store)?;
    store.dispatch(RegionsAction::Select { id: Some(id) });
    Some(id)
}

/// One step of the two-step keyboard region gesture.
///
/// State machine: `Idle → Pending → Idle`. The first press (with an active
/// tap) records the tap as the pending start. The second press on the same
/// position closes the interval and delegates to the drag path; the pending
/// state is cleared whether or not creation succeeds. A press while pending
/// on a *different* position restarts the capture there instead of
/// finalizing across positions.
pub fn keyboard_region_step(store: &mut Store) -> Option<u64> {
    let state = store.state();
    if !state.interaction.tap.is_active {
        return None;
    }
    let tap_position = state.interaction.tap.position_id.clone();
    let tap_timestamp = state.interaction.tap.timestamp;

    match &state.interaction.pending_region {
        PendingRegion::Pending { position_id, timestamp } if *position_id == tap_position => {
            let pending_timestamp = *timestamp;
            store.dispatch(InteractionAction::ClearPendingRegion);

            let start = pending_timestamp.min(tap_timestamp);
            let end = pending_timestamp.max(tap_timestamp);
            create_region_from_drag(store, &tap_position, start, end)
        }
        _ => {
            // Idle, or pending for another position: (re)start the capture
            store.dispatch(InteractionAction::BeginPendingRegion {
                position_id: tap_position,
                timestamp: tap_timestamp,
            });
            None
        }
    }
}
