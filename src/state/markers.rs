//! Markers slice: instant annotations, unique by timestamp.
//!
//! The `all_ids` index is kept sorted by timestamp so consumers can render
//! and step through markers in time order without re-sorting.

use std::collections::BTreeMap;

/// Default color for markers created without an explicit one.
const MARKER_COLOR: &str = "#fb8c00";

/// An annotated instant, optionally pinned to one position's charts.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub id: u64,
    /// Ms since the Unix epoch; unique across the collection.
    pub timestamp: f64,
    pub note: String,
    pub color: String,
    /// Opaque descriptor blob carried through import/export.
    pub metrics: Option<serde_json::Value>,
    /// `None` marks the instant on every position.
    pub position_id: Option<String>,
}

/// Payload for creating one marker.
#[derive(Debug, Clone)]
pub struct MarkerSeed {
    pub timestamp: f64,
    pub note: String,
    pub color: Option<String>,
    pub metrics: Option<serde_json::Value>,
    pub position_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkersState {
    pub by_id: BTreeMap<u64, Marker>,
    /// Sorted by timestamp.
    pub all_ids: Vec<u64>,
    pub counter: u64,
    pub selected_id: Option<u64>,
}

impl MarkersState {
    fn has_timestamp(&self, timestamp: f64, except: Option<u64>) -> bool {
        self.by_id
            .values()
            .any(|m| m.timestamp == timestamp && Some(m.id) != except)
    }

    fn resort(&mut self) {
        let by_id = &self.by_id;
        self.all_ids.sort_by(|a, b| {
            let ta = by_id[a].timestamp;
            let tb = by_id[b].timestamp;
            ta.partial_cmp(&tb).unwrap_or(std::cmp::Ordering::Equal)
        });
    }
}

#[derive(Debug, Clone)]
pub enum MarkersAction {
    Add(MarkerSeed),
    SetTimestamp { id: u64, timestamp: f64 },
    SetNote { id: u64, note: String },
    SetColor { id: u64, color: String },
    Remove { id: u64 },
    Select { id: Option<u64> },
    /// Import: the whole collection is replaced.
    Replace(Vec<MarkerSeed>),
}

fn add_marker(state: &mut MarkersState, seed: &MarkerSeed) -> bool {
    if !seed.timestamp.is_finite() {
        return false;
    }
    if state.has_timestamp(seed.timestamp, None) {
        log::debug!("marker add dropped: duplicate timestamp {}", seed.timestamp);
        return false;
    }

    state.counter += 1;
    let id = state.counter;
    state.by_id.insert(
        id,
        Marker {
            id,
            timestamp: seed.timestamp,
            note: seed.note.clone(),
            color: seed.color.clone().unwrap_or_else(|| MARKER_COLOR.to_string()),
            metrics: seed.metrics.clone(),
            position_id: seed.position_id.clone(),
        },
    );
    state.all_ids.push(id);
    state.resort();
    true
}

/// Pure transition function for the markers slice.
pub fn reduce(state: &MarkersState, action: &MarkersAction) -> MarkersState {
    let mut next = state.clone();
    match action {
        MarkersAction::Add(seed) => {
            if !add_marker(&mut next, seed) {
                return state.clone();
            }
        }
        MarkersAction::SetTimestamp { id, timestamp } => {
            if !timestamp.is_finite() || next.has_timestamp(*timestamp, Some(*id)) {
                return state.clone();
            }
            let Some(marker) = next.by_id.get_mut(id) else {
                return state.clone();
            };
            marker.timestamp = *timestamp;
            next.resort();
        }
        MarkersAction::SetNote { id, note } => {
            let Some(marker) = next.by_id.get_mut(id) else {
                return state.clone();
            };
            marker.note = note.clone();
        }
        MarkersAction::SetColor { id, color } => {
            let Some(marker) = next.by_id.get_mut(id) else {
                return state.clone();
            };
            marker.color = color.clone();
        }
        MarkersAction::Remove { id } => {
            if next.by_id.remove(id).is_none() {
                return state.clone();
            }
            next.all_ids.retain(|other| other != id);
            if next.selected_id == Some(*id) {
                next.selected_id = None;
            }
        }
        MarkersAction::Select { id } => {
            if let Some(id) = id {
                if !next.by_id.contains_key(id) {
                    return state.clone();
                }
            }
            next.selected_id = *id;
        }
        MarkersAction::Replace(seeds) => {
            next.by_id.clear();
            next.all_ids.clear();
            next.selected_id = None;
            for seed in seeds {
                add_marker(&mut next, seed);
            }
        }
    }
    next
}
