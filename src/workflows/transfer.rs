//! Import/export orchestration and the comparison-to-regions conversion.

use crate::persist;
use crate::series::Area;
use crate::state::{MarkersAction, RegionSeed, RegionsAction, Store, ViewAction};

use super::last_region_id;

/// Whether an import replaces the collection or adds to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    Replace,
    Extend,
}

/// Turn the active comparison slice into one single-area region per included
/// position, then leave comparison mode. Returns the created region ids;
/// empty when comparison is inactive, unbounded, or has no positions.
pub fn comparison_slice_to_regions(store: &mut Store) -> Vec<u64> {
    let state = store.state();
    let comparison = &state.view.comparison;
    if !comparison.is_active {
        return Vec::new();
    }
    let Some((start, end)) = comparison.slice else {
        log::debug!("comparison slice is unbounded, nothing to convert");
        return Vec::new();
    };
    if comparison.included_positions.is_empty() {
        return Vec::new();
    }
    let Some(area) = Area::normalized(start, end) else {
        return Vec::new();
    };
    let positions: Vec<String> = comparison.included_positions.iter().cloned().collect();

    let mut created = Vec::with_capacity(positions.len());
    for position_id in positions {
        store.dispatch(RegionsAction::Add(RegionSeed {
            position_id,
            areas: vec![area],
            note: String::new(),
            color: None,
        }));
        if let Some(id) = last_region_id(store) {
            created.push(id);
        }
    }
    store.dispatch(ViewAction::ExitComparison);
    created
}

/// Parse a region document and replace or extend the collection.
/// Returns how many regions were imported.
pub fn import_regions(store: &mut Store, json: &str, mode: ImportMode) -> usize {
    let seeds = persist::parse_region_document(json);
    let count = seeds.len();
    match mode {
        ImportMode::Replace => store.dispatch(RegionsAction::Replace(seeds)),
        ImportMode::Extend => store.dispatch(RegionsAction::Extend(seeds)),
    }
    log::info!("imported {count} regions");
    count
}

/// Parse a marker CSV and replace the whole marker collection.
pub fn import_markers_csv(store: &mut Store, text: &str) -> usize {
    let seeds = persist::parse_markers_csv(text);
    let count = seeds.len();
    store.dispatch(MarkersAction::Replace(seeds));
    count
}

/// Parse a marker JSON document and replace the whole marker collection.
pub fn import_markers_json(store: &mut Store, json: &str) -> usize {
    let seeds = persist::parse_markers_json(json);
    let count = seeds.len();
    store.dispatch(MarkersAction::Replace(seeds));
    count
}
