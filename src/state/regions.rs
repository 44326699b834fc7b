//! Regions slice: normalized collection of annotated time selections.
//!
//! A region belongs to exactly one measurement position and owns one or more
//! disjoint areas. Every area-changing action bumps the region's `version`,
//! which the metrics cache folds into its key — stale reads are impossible by
//! construction, no caller has to remember to invalidate.

use std::collections::BTreeMap;

use crate::series::Area;

/// Rotating palette for auto-assigned region colors.
const REGION_COLORS: &[&str] = &[
    "#e53935", "#43a047", "#fdd835", "#3949ab", "#fb8c00", "#8e24aa", "#00acc1", "#d81b60",
];

/// A named, colored annotation over one or more disjoint time intervals
/// on one measurement position.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub id: u64,
    pub position_id: String,
    /// Non-empty, each area valid, kept sorted by start.
    pub areas: Vec<Area>,
    pub note: String,
    pub color: String,
    /// Bumped on every area change; part of the metrics cache key.
    pub version: u64,
}

impl Region {
    /// Earliest covered instant, for legacy single-interval consumers.
    pub fn start(&self) -> f64 {
        self.areas
            .iter()
            .map(|a| a.start)
            .fold(f64::INFINITY, f64::min)
    }

    /// Latest covered instant, for legacy single-interval consumers.
    pub fn end(&self) -> f64 {
        self.areas
            .iter()
            .map(|a| a.end)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Index of the area containing a timestamp, if any.
    pub fn area_containing(&self, timestamp: f64) -> Option<usize> {
        self.areas.iter().position(|a| a.contains(timestamp))
    }
}

/// Validated payload for creating one region.
#[derive(Debug, Clone)]
pub struct RegionSeed {
    pub position_id: String,
    pub areas: Vec<Area>,
    pub note: String,
    /// `None` picks the next palette color.
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionsState {
    pub by_id: BTreeMap<u64, Region>,
    /// Creation order.
    pub all_ids: Vec<u64>,
    /// Monotonic id source; the last assigned id.
    pub counter: u64,
    pub selected_id: Option<u64>,
    /// Region that absorbs the next drag as an extra area instead of a new region.
    pub append_target_id: Option<u64>,
}

#[derive(Debug, Clone)]
pub enum RegionsAction {
    Add(RegionSeed),
    AppendArea { id: u64, area: Area },
    SetAreas { id: u64, areas: Vec<Area> },
    SetNote { id: u64, note: String },
    SetColor { id: u64, color: String },
    Remove { id: u64 },
    Select { id: Option<u64> },
    SetAppendTarget { id: Option<u64> },
    /// Import: drop the whole collection, then add the seeds.
    Replace(Vec<RegionSeed>),
    /// Additive import.
    Extend(Vec<RegionSeed>),
}

/// Drop invalid areas and sort the survivors by start.
/// `None` when nothing survives (the action must no-op).
fn sanitize_areas(areas: &[Area]) -> Option<Vec<Area>> {
    let mut valid: Vec<Area> = areas.iter().copied().filter(Area::is_valid).collect();
    if valid.is_empty() {
        return None;
    }
    valid.sort_by(|a, b| a.start.partial_cmp(&b.start).unwrap_or(std::cmp::Ordering::Equal));
    Some(valid)
}

fn add_region(state: &mut RegionsState, seed: &RegionSeed) -> bool {
    let Some(areas) = sanitize_areas(&seed.areas) else {
        log::debug!("region add dropped: no valid areas for '{}'", seed.position_id);
        return false;
    };
    if seed.position_id.is_empty() {
        return false;
    }

    state.counter += 1;
    let id = state.counter;
    let color = seed.color.clone().unwrap_or_else(|| {
        REGION_COLORS[(id as usize - 1) % REGION_COLORS.len()].to_string()
    });

    state.by_id.insert(
        id,
        Region {
            id,
            position_id: seed.position_id.clone(),
            areas,
            note: seed.note.clone(),
            color,
            version: 0,
        },
    );
    state.all_ids.push(id);
    true
}

fn remove_region(state: &mut RegionsState, id: u64) {
    state.by_id.remove(&id);
    state.all_ids.retain(|&other| other != id);
    if state.selected_id == Some(id) {
        state.selected_id = None;
    }
    if state.append_target_id == Some(id) {
        state.append_target_id = None;
    }
}

/// Pure transition function for the regions slice.
/// Malformed actions return the state unchanged.
pub fn reduce(state: &RegionsState, action: &RegionsAction) -> RegionsState {
    let mut next = state.clone();
    match action {
        RegionsAction::Add(seed) => {
            if !add_region(&mut next, seed) {
                return state.clone();
            }
        }
        RegionsAction::AppendArea { id, area } => {
            if !area.is_valid() {
                return state.clone();
            }
            let Some(region) = next.by_id.get_mut(id) else {
                return state.clone();
            };
            region.areas.push(*area);
            region.areas.sort_by(|a, b| {
                a.start.partial_cmp(&b.start).unwrap_or(std::cmp::Ordering::Equal)
            });
            region.version += 1;
        }
        RegionsAction::SetAreas { id, areas } => {
            let Some(areas) = sanitize_areas(areas) else {
                return state.clone();
            };
            let Some(region) = next.by_id.get_mut(id) else {
                return state.clone();
            };
            region.areas = areas;
            region.version += 1;
        }
        RegionsAction::SetNote { id, note } => {
            // Notes don't feed the metrics engine; the version stays put
            let Some(region) = next.by_id.get_mut(id) else {
                return state.clone();
            };
            region.note = note.clone();
        }
        RegionsAction::SetColor { id, color } => {
            let Some(region) = next.by_id.get_mut(id) else {
                return state.clone();
            };
            region.color = color.clone();
        }
        RegionsAction::Remove { id } => {
            if !next.by_id.contains_key(id) {
                return state.clone();
            }
            remove_region(&mut next, *id);
        }
        RegionsAction::Select { id } => {
            if let Some(id) = id {
                if !next.by_id.contains_key(id) {
                    return state.clone();
                }
            }
            next.selected_id = *id;
        }
        RegionsAction::SetAppendTarget { id } => {
            if let Some(id) = id {
                if !next.by_id.contains_key(id) {
                    return state.clone();
                }
            }
            next.append_target_id = *id;
        }
        RegionsAction::Replace(seeds) => {
            next.by_id.clear();
            next.all_ids.clear();
            next.selected_id = None;
            next.append_target_id = None;
            for seed in seeds {
                add_region(&mut next, seed);
            }
        }
        RegionsAction::Extend(seeds) => {
            for seed in seeds {
                add_region(&mut next, seed);
            }
        }
    }
    next
}
