//! Side-by-side aggregation of one shared time slice across positions.
//!
//! Built on the same region-metrics engine as single-position annotations —
//! a comparison row is just the metrics of a synthetic single-area selection.

use crate::region_metrics::{compute_region_metrics, MetricsResult};
use crate::series::{Area, MeasurementData};
use crate::state::AppState;

/// Metrics for one position over the shared comparison slice.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub position_id: String,
    pub metrics: MetricsResult,
}

/// One row per included position, each carrying the standard descriptors and
/// the averaged spectrum for the globally selected parameter. Positions
/// without loaded data still get a row — "no data" is a displayable result.
/// Empty when comparison is inactive, unbounded, or includes no positions.
pub fn aggregate_comparison(state: &AppState, data: &MeasurementData) -> Vec<ComparisonRow> {
    let comparison = &state.view.comparison;
    if !comparison.is_active {
        return Vec::new();
    }
    let Some((start, end)) = comparison.slice else {
        return Vec::new();
    };
    let areas = [Area { start, end }];
    let parameter = &state.view.selected_parameter;

    comparison
        .included_positions
        .iter()
        .map(|position_id| {
            let metrics = match data.get(position_id) {
                Some(position) => compute_region_metrics(&areas, position, parameter),
                None => MetricsResult::empty(Some(parameter.clone()), end - start),
            };
            ComparisonRow {
                position_id: position_id.clone(),
                metrics,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region_metrics::DataResolution;
    use crate::series::{PositionData, RawSeries};
    use crate::state::{reduce, Action, ViewAction};

    fn state_with_comparison(slice: (f64, f64), positions: &[&str]) -> AppState {
        let mut state = AppState::default();
        for action in [
            ViewAction::SetAvailablePositions(positions.iter().map(|s| s.to_string()).collect()),
            ViewAction::EnterComparison,
            ViewAction::SetComparisonSlice { start: slice.0, end: slice.1 },
        ] {
            state = reduce(&state, &Action::View(action));
        }
        for position in positions {
            state = reduce(&state, &Action::View(ViewAction::IncludePosition(position.to_string())));
        }
        state
    }

    fn data_with_log(position: &str, ts: &[f64], laeq: &[f64]) -> MeasurementData {
        let mut data = MeasurementData::default();
        data.positions.insert(
            position.to_string(),
            PositionData {
                log: Some(RawSeries {
                    datetime: ts.to_vec(),
                    laeq: laeq.to_vec(),
                    lafmax: None,
                    laf90: None,
                }),
                ..Default::default()
            },
        );
        data
    }

    #[test]
    fn test_one_row_per_included_position() {
        let state = state_with_comparison((0.0, 3000.0), &["P1", "P2"]);
        let mut data = data_with_log("P1", &[0.0, 1000.0, 2000.0], &[50.0, 52.0, 54.0]);
        data.positions.insert("P2".into(), PositionData::default());

        let rows = aggregate_comparison(&state, &data);
        assert_eq!(rows.len(), 2);

        let p1 = rows.iter().find(|r| r.position_id == "P1").unwrap();
        assert_eq!(p1.metrics.data_resolution, DataResolution::Log);
        assert!(p1.metrics.laeq.is_some());

        // No data loaded for P2: representable, not an error
        let p2 = rows.iter().find(|r| r.position_id == "P2").unwrap();
        assert_eq!(p2.metrics.data_resolution, DataResolution::None);
        assert!(p2.metrics.laeq.is_none());
    }

    #[test]
    fn test_empty_when_inactive_or_unbounded() {
        let data = data_with_log("P1", &[0.0], &[50.0]);

        let inactive = AppState::default();
        assert!(aggregate_comparison(&inactive, &data).is_empty());

        let mut unbounded = state_with_comparison((0.0, 3000.0), &["P1"]);
        unbounded = reduce(&unbounded, &Action::View(ViewAction::ClearComparisonSlice));
        assert!(aggregate_comparison(&unbounded, &data).is_empty());
    }

    #[test]
    fn test_rows_use_selected_parameter() {
        let mut state = state_with_comparison((0.0, 3000.0), &["P1"]);
        state = reduce(&state, &Action::View(ViewAction::SetParameter("LAeq".into())));
        let data = data_with_log("P1", &[0.0, 1000.0], &[50.0, 52.0]);

        let rows = aggregate_comparison(&state, &data);
        assert_eq!(rows[0].metrics.parameter.as_deref(), Some("LAeq"));
    }
}
