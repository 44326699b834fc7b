//! Exchange documents: the flat region JSON document and the sibling
//! marker CSV/JSON formats.
//!
//! Import is best-effort everywhere: malformed rows and entries are skipped
//! with a warning, and a structurally invalid document (not an array) yields
//! an empty result instead of a partial crash. Export is the only fallible
//! path, and only through the serializer itself.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::series::Area;
use crate::state::{MarkerSeed, MarkersState, RegionSeed, RegionsState};

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ── Region document ───────────────────────────────────────────────────

/// One element of the region exchange document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionDocEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(rename = "positionId")]
    pub position_id: String,
    pub areas: Vec<Area>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Serialize every region, in creation order.
pub fn region_document(regions: &RegionsState) -> Vec<RegionDocEntry> {
    regions
        .all_ids
        .iter()
        .filter_map(|id| regions.by_id.get(id))
        .map(|region| RegionDocEntry {
            id: Some(region.id),
            position_id: region.position_id.clone(),
            areas: region.areas.clone(),
            note: (!region.note.is_empty()).then(|| region.note.clone()),
            color: Some(region.color.clone()),
        })
        .collect()
}

pub fn regions_to_json(regions: &RegionsState) -> Result<String, PersistError> {
    Ok(serde_json::to_string_pretty(&region_document(regions))?)
}

/// Parse a region document, dropping entries with no valid `positionId` or
/// no area surviving numeric/width validation.
pub fn parse_region_document(json: &str) -> Vec<RegionSeed> {
    let value: serde_json::Value = match serde_json::from_str(json) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("region document is not valid JSON: {e}");
            return Vec::new();
        }
    };
    let Some(entries) = value.as_array() else {
        log::warn!("region document is not an array, ignoring");
        return Vec::new();
    };

    let mut seeds = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        let Some(position_id) = entry
            .get("positionId")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
        else {
            log::warn!("region entry {index} has no positionId, skipping");
            continue;
        };

        let areas: Vec<Area> = entry
            .get("areas")
            .and_then(|v| v.as_array())
            .map(|raw| {
                raw.iter()
                    .filter_map(|a| serde_json::from_value::<Area>(a.clone()).ok())
                    .filter(Area::is_valid)
                    .collect()
            })
            .unwrap_or_default();
        if areas.is_empty() {
            log::warn!("region entry {index} ('{position_id}') has no valid areas, skipping");
            continue;
        }

        seeds.push(RegionSeed {
            position_id: position_id.to_string(),
            areas,
            note: entry
                .get("note")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            color: entry
                .get("color")
                .and_then(|v| v.as_str())
                .map(str::to_string),
        });
    }
    seeds
}

// ── Marker documents ──────────────────────────────────────────────────

pub const MARKER_CSV_HEADER: &str = "id,timestamp_ms,note,color,metrics_json,selected";

/// One element of the marker JSON document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerDocEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub timestamp_ms: f64,
    #[serde(default)]
    pub note: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<serde_json::Value>,
    #[serde(rename = "positionId", default, skip_serializing_if = "Option::is_none")]
    pub position_id: Option<String>,
}

pub fn markers_to_json(markers: &MarkersState) -> Result<String, PersistError> {
    let entries: Vec<MarkerDocEntry> = markers
        .all_ids
        .iter()
        .filter_map(|id| markers.by_id.get(id))
        .map(|marker| MarkerDocEntry {
            id: Some(marker.id),
            timestamp_ms: marker.timestamp,
            note: marker.note.clone(),
            color: Some(marker.color.clone()),
            metrics: marker.metrics.clone(),
            position_id: marker.position_id.clone(),
        })
        .collect();
    Ok(serde_json::to_string_pretty(&entries)?)
}

pub fn parse_markers_json(json: &str) -> Vec<MarkerSeed> {
    let value: serde_json::Value = match serde_json::from_str(json) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("marker document is not valid JSON: {e}");
            return Vec::new();
        }
    };
    let Some(entries) = value.as_array() else {
        log::warn!("marker document is not an array, ignoring");
        return Vec::new();
    };

    entries
        .iter()
        .enumerate()
        .filter_map(|(index, raw)| {
            match serde_json::from_value::<MarkerDocEntry>(raw.clone()) {
                Ok(entry) if entry.timestamp_ms.is_finite() => Some(MarkerSeed {
                    timestamp: entry.timestamp_ms,
                    note: entry.note,
                    color: entry.color,
                    metrics: entry.metrics,
                    position_id: entry.position_id,
                }),
                Ok(_) => {
                    log::warn!("marker entry {index} has a non-finite timestamp, skipping");
                    None
                }
                Err(e) => {
                    log::warn!("marker entry {index} is malformed ({e}), skipping");
                    None
                }
            }
        })
        .collect()
}

/// Serialize markers in timestamp order as quoted-field CSV.
pub fn markers_to_csv(markers: &MarkersState) -> String {
    let mut out = String::from(MARKER_CSV_HEADER);
    out.push('\n');
    for id in &markers.all_ids {
        let Some(marker) = markers.by_id.get(id) else {
            continue;
        };
        let metrics_json = marker
            .metrics
            .as_ref()
            .and_then(|m| serde_json::to_string(m).ok())
            .unwrap_or_default();
        let selected = markers.selected_id == Some(marker.id);
        let fields = [
            marker.id.to_string(),
            format_timestamp(marker.timestamp),
            marker.note.clone(),
            marker.color.clone(),
            metrics_json,
            selected.to_string(),
        ];
        let row: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

/// Parse the marker CSV, skipping the header and any malformed row.
pub fn parse_markers_csv(text: &str) -> Vec<MarkerSeed> {
    let mut seeds = Vec::new();
    for (number, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        if number == 0 && line.trim_start().starts_with("id,") {
            continue;
        }
        let fields = split_csv_line(line);
        if fields.len() < 6 {
            log::warn!("marker CSV line {} has {} fields, skipping", number + 1, fields.len());
            continue;
        }
        let Ok(timestamp) = fields[1].trim().parse::<f64>() else {
            log::warn!("marker CSV line {} has a bad timestamp, skipping", number + 1);
            continue;
        };
        if !timestamp.is_finite() {
            continue;
        }

        // A bad metrics blob degrades to "no metrics" rather than losing the row
        let metrics = (!fields[4].is_empty())
            .then(|| serde_json::from_str(&fields[4]).ok())
            .flatten();

        seeds.push(MarkerSeed {
            timestamp,
            note: fields[2].clone(),
            color: (!fields[3].is_empty()).then(|| fields[3].clone()),
            metrics,
            position_id: None,
        });
    }
    seeds
}

/// Whole milliseconds without a trailing `.0`, fractions kept as-is.
fn format_timestamp(timestamp: f64) -> String {
    if timestamp.fract() == 0.0 {
        format!("{}", timestamp as i64)
    } else {
        format!("{timestamp}")
    }
}

/// Quote a field when it contains a comma, quote, or newline; `"` becomes `""`.
fn csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Split one CSV line, honoring quoted fields with `""` escapes.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{markers, regions, MarkersAction, RegionsAction};

    fn regions_state(seeds: Vec<RegionSeed>) -> RegionsState {
        let mut state = RegionsState::default();
        for seed in seeds {
            state = regions::reduce(&state, &RegionsAction::Add(seed));
        }
        state
    }

    fn seed(position: &str, areas: &[(f64, f64)], note: &str) -> RegionSeed {
        RegionSeed {
            position_id: position.into(),
            areas: areas.iter().map(|&(s, e)| Area { start: s, end: e }).collect(),
            note: note.into(),
            color: None,
        }
    }

    #[test]
    fn test_region_round_trip_preserves_identity_fields() {
        let state = regions_state(vec![
            seed("P1", &[(0.0, 1000.0), (2000.0, 3000.0)], "night works"),
            seed("P2", &[(500.0, 800.0)], ""),
        ]);

        let json = regions_to_json(&state).unwrap();
        let seeds = parse_region_document(&json);
        let restored = regions_state(seeds);

        assert_eq!(restored.all_ids.len(), 2);
        for (a, b) in state.by_id.values().zip(restored.by_id.values()) {
            assert_eq!(a.position_id, b.position_id);
            assert_eq!(a.areas, b.areas);
            assert_eq!(a.note, b.note);
            assert_eq!(a.color, b.color);
        }
    }

    #[test]
    fn test_region_import_drops_invalid_entries() {
        let json = r#"[
            {"positionId": "P1", "areas": [{"start": 0, "end": 1000}]},
            {"positionId": "", "areas": [{"start": 0, "end": 1000}]},
            {"areas": [{"start": 0, "end": 1000}]},
            {"positionId": "P2", "areas": [{"start": 5, "end": 5}]},
            {"positionId": "P3", "areas": [{"start": 9, "end": 2000}, {"start": "x"}]}
        ]"#;
        let seeds = parse_region_document(json);
        assert_eq!(seeds.len(), 2);
        assert_eq!(seeds[0].position_id, "P1");
        // The malformed area is dropped, the valid sibling survives
        assert_eq!(seeds[1].position_id, "P3");
        assert_eq!(seeds[1].areas.len(), 1);
    }

    #[test]
    fn test_region_import_structurally_invalid_is_empty() {
        assert!(parse_region_document("{\"not\": \"an array\"}").is_empty());
        assert!(parse_region_document("nonsense").is_empty());
        assert!(parse_region_document("[]").is_empty());
    }

    fn markers_state(seeds: Vec<MarkerSeed>) -> MarkersState {
        markers::reduce(&MarkersState::default(), &MarkersAction::Replace(seeds))
    }

    #[test]
    fn test_marker_csv_round_trip_with_quoting() {
        let state = markers_state(vec![
            MarkerSeed {
                timestamp: 1000.0,
                note: "plain".into(),
                color: Some("#111111".into()),
                metrics: None,
                position_id: None,
            },
            MarkerSeed {
                timestamp: 2000.0,
                note: "has, comma and \"quotes\"".into(),
                color: Some("#222222".into()),
                metrics: Some(serde_json::json!({"laeq": 54.2})),
                position_id: None,
            },
        ]);

        let csv = markers_to_csv(&state);
        assert!(csv.starts_with(MARKER_CSV_HEADER));

        let restored = markers_state(parse_markers_csv(&csv));
        assert_eq!(restored.all_ids.len(), 2);

        let by_ts: Vec<_> = restored.all_ids.iter().map(|id| &restored.by_id[id]).collect();
        assert_eq!(by_ts[0].timestamp, 1000.0);
        assert_eq!(by_ts[1].note, "has, comma and \"quotes\"");
        assert_eq!(by_ts[1].color, "#222222");
        assert_eq!(by_ts[1].metrics, Some(serde_json::json!({"laeq": 54.2})));
    }

    #[test]
    fn test_marker_csv_skips_malformed_rows() {
        let csv = "id,timestamp_ms,note,color,metrics_json,selected\n\
                   1,1000,ok,#111111,,false\n\
                   2,not-a-number,bad,#111111,,false\n\
                   3,2000,short-row\n\
                   4,3000,bad-metrics,#111111,{not json},false\n";
        let seeds = parse_markers_csv(csv);
        assert_eq!(seeds.len(), 2);
        assert_eq!(seeds[0].timestamp, 1000.0);
        // Bad metrics blob degrades to None, the row survives
        assert_eq!(seeds[1].timestamp, 3000.0);
        assert!(seeds[1].metrics.is_none());
    }

    #[test]
    fn test_marker_json_round_trip() {
        let state = markers_state(vec![MarkerSeed {
            timestamp: 1500.5,
            note: "n".into(),
            color: Some("#333333".into()),
            metrics: None,
            position_id: Some("P1".into()),
        }]);

        let json = markers_to_json(&state).unwrap();
        let seeds = parse_markers_json(&json);
        assert_eq!(seeds.len(), 1);
        assert_eq!(seeds[0].timestamp, 1500.5);
        assert_eq!(seeds[0].position_id.as_deref(), Some("P1"));
    }

    #[test]
    fn test_split_csv_line_edge_cases() {
        assert_eq!(split_csv_line("a,b,c"), vec!["a", "b", "c"]);
        assert_eq!(split_csv_line("a,\"b,c\",d"), vec!["a", "b,c", "d"]);
        assert_eq!(split_csv_line("\"he said \"\"hi\"\"\",x"), vec!["he said \"hi\"", "x"]);
        assert_eq!(split_csv_line("a,,c"), vec!["a", "", "c"]);
    }
}
