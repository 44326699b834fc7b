//! Merge and split: reshaping regions without touching their samples.

use crate::state::{RegionSeed, RegionsAction, Store};

use super::last_region_id;

/// Split a multi-area region into one single-area region per area, each
/// inheriting the original's note and color. The original is removed and the
/// first replacement selected. No-op for regions with a single area.
pub fn split_region(store: &mut Store, region_id: u64) -> Vec<u64> {
    let state = store.state();
    let Some(region) = state.regions.by_id.get(&region_id) else {
        return Vec::new();
    };
    if region.areas.len() < 2 {
        log::debug!("split ignored: region {region_id} has a single area");
        return Vec::new();
    }

    let seeds: Vec<RegionSeed> = region
        .areas
        .iter()
        .map(|area| RegionSeed {
            position_id: region.position_id.clone(),
            areas: vec![*area],
            note: region.note.clone(),
            color: Some(region.color.clone()),
        })
        .collect();

    let mut new_ids = Vec::with_capacity(seeds.len());
    for seed in seeds {
        store.dispatch(RegionsAction::Add(seed));
        if let Some(id) = last_region_id(store) {
            new_ids.push(id);
        }
    }
    store.dispatch(RegionsAction::Remove { id: region_id });
    store.dispatch(RegionsAction::Select { id: new_ids.first().copied() });
    new_ids
}

/// Merge `source_id` into the currently selected region: the source's areas
/// join the target's area list and the source is removed. Rejected when the
/// regions live on different positions.
pub fn merge_regions(store: &mut Store, source_id: u64) -> bool {
    let state = store.state();
    let Some(target_id) = state.regions.selected_id else {
        log::debug!("merge ignored: no region selected");
        return false;
    };
    if target_id == source_id {
        return false;
    }
    let (Some(target), Some(source)) = (
        state.regions.by_id.get(&target_id),
        state.regions.by_id.get(&source_id),
    ) else {
        return false;
    };
    if target.position_id != source.position_id {
        log::warn!(
            "merge rejected: region {source_id} ('{}') and region {target_id} ('{}') \
             are on different positions",
            source.position_id,
            target.position_id
        );
        return false;
    }

    let areas = source.areas.clone();
    for area in areas {
        store.dispatch(RegionsAction::AppendArea { id: target_id, area });
    }
    store.dispatch(RegionsAction::Remove { id: source_id });
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Area;
    use crate::state::RegionsAction;

    fn add_region(store: &mut Store, position: &str, areas: &[(f64, f64)]) -> u64 {
        store.dispatch(RegionsAction::Add(RegionSeed {
            position_id: position.into(),
            areas: areas.iter().map(|&(s, e)| Area { start: s, end: e }).collect(),
            note: "n".into(),
            color: None,
        }));
        *store.state().regions.all_ids.last().unwrap()
    }

    #[test]
    fn test_merge_appends_areas_and_removes_source() {
        let mut store = Store::new();
        let a = add_region(&mut store, "P1", &[(0.0, 1000.0)]);
        let b = add_region(&mut store, "P1", &[(2000.0, 3000.0)]);
        store.dispatch(RegionsAction::Select { id: Some(a) });

        assert!(merge_regions(&mut store, b));

        let target = &store.state().regions.by_id[&a];
        assert_eq!(
            target.areas,
            vec![
                Area { start: 0.0, end: 1000.0 },
                Area { start: 2000.0, end: 3000.0 }
            ]
        );
        assert!(!store.state().regions.by_id.contains_key(&b));
    }

    #[test]
    fn test_merge_rejected_across_positions() {
        let mut store = Store::new();
        let a = add_region(&mut store, "P1", &[(0.0, 1000.0)]);
        let b = add_region(&mut store, "P2", &[(2000.0, 3000.0)]);
        store.dispatch(RegionsAction::Select { id: Some(a) });

        assert!(!merge_regions(&mut store, b));
        assert_eq!(store.state().regions.by_id[&a].areas.len(), 1);
        assert!(store.state().regions.by_id.contains_key(&b));
    }

    #[test]
    fn test_merge_needs_selection_and_distinct_regions() {
        let mut store = Store::new();
        let a = add_region(&mut store, "P1", &[(0.0, 1000.0)]);
        assert!(!merge_regions(&mut store, a));

        store.dispatch(RegionsAction::Select { id: Some(a) });
        assert!(!merge_regions(&mut store, a));
        assert!(!merge_regions(&mut store, 99));
    }

    #[test]
    fn test_split_replaces_with_single_area_regions() {
        let mut store = Store::new();
        let id = add_region(&mut store, "P1", &[(0.0, 1000.0), (2000.0, 3000.0), (4000.0, 5000.0)]);
        store.dispatch(RegionsAction::SetColor { id, color: "#123456".into() });

        let new_ids = split_region(&mut store, id);
        assert_eq!(new_ids.len(), 3);
        assert!(!store.state().regions.by_id.contains_key(&id));
        assert_eq!(store.state().regions.selected_id, Some(new_ids[0]));

        for (new_id, expected_start) in new_ids.iter().zip([0.0, 2000.0, 4000.0]) {
            let region = &store.state().regions.by_id[new_id];
            assert_eq!(region.areas.len(), 1);
            assert_eq!(region.areas[0].start, expected_start);
            assert_eq!(region.note, "n");
            assert_eq!(region.color, "#123456");
        }
    }

    #[test]
    fn test_split_single_area_noop() {
        let mut store = Store::new();
        let id = add_region(&mut store, "P1", &[(0.0, 1000.0)]);
        assert!(split_region(&mut store, id).is_empty());
        assert!(store.state().regions.by_id.contains_key(&id));
    }

    #[test]
    fn test_merge_then_split_round_trip() {
        let mut store = Store::new();
        let a = add_region(&mut store, "P1", &[(0.0, 1000.0)]);
        let b = add_region(&mut store, "P1", &[(2000.0, 3000.0)]);
        store.dispatch(RegionsAction::Select { id: Some(a) });
        merge_regions(&mut store, b);

        let parts = split_region(&mut store, a);
        assert_eq!(parts.len(), 2);
        assert_eq!(store.state().regions.all_ids.len(), 2);
    }
}
