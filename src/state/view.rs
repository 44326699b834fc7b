//! View slice: visible positions, viewport, selected spectral parameter,
//! chart visibility, and comparison mode.

use std::collections::{BTreeMap, BTreeSet};

/// Visible time window shared by every chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub min: f64,
    pub max: f64,
}

impl Default for Viewport {
    // Unbounded until data announces its span; clamping against an
    // unbounded viewport is a no-op.
    fn default() -> Self {
        Self {
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewKind {
    #[default]
    Levels,
    Spectra,
}

/// One time slice shared across several positions for side-by-side
/// aggregation. `slice` is present only when both bounds are finite and
/// distinct, and is always stored with start ≤ end.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparisonState {
    pub is_active: bool,
    pub slice: Option<(f64, f64)>,
    pub included_positions: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub available_positions: Vec<String>,
    pub viewport: Viewport,
    pub selected_parameter: String,
    pub view_kind: ViewKind,
    pub chart_visibility: BTreeMap<String, bool>,
    pub comparison: ComparisonState,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            available_positions: Vec::new(),
            viewport: Viewport::default(),
            selected_parameter: "LZeq".to_string(),
            view_kind: ViewKind::default(),
            chart_visibility: BTreeMap::new(),
            comparison: ComparisonState::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ViewAction {
    SetAvailablePositions(Vec<String>),
    SetViewport { min: f64, max: f64 },
    SetParameter(String),
    SetViewKind(ViewKind),
    SetChartVisibility { chart: String, visible: bool },
    EnterComparison,
    ExitComparison,
    /// Stored normalized; degenerate bounds clear the slice instead.
    SetComparisonSlice { start: f64, end: f64 },
    ClearComparisonSlice,
    IncludePosition(String),
    ExcludePosition(String),
}

/// Pure transition function for the view slice.
pub fn reduce(state: &ViewState, action: &ViewAction) -> ViewState {
    let mut next = state.clone();
    match action {
        ViewAction::SetAvailablePositions(positions) => {
            next.available_positions = positions.clone();
            next.comparison
                .included_positions
                .retain(|p| positions.contains(p));
        }
        ViewAction::SetViewport { min, max } => {
            if !min.is_finite() || !max.is_finite() || min >= max {
                return state.clone();
            }
            next.viewport = Viewport { min: *min, max: *max };
        }
        ViewAction::SetParameter(parameter) => {
            if parameter.is_empty() {
                return state.clone();
            }
            next.selected_parameter = parameter.clone();
        }
        ViewAction::SetViewKind(kind) => {
            next.view_kind = *kind;
        }
        ViewAction::SetChartVisibility { chart, visible } => {
            next.chart_visibility.insert(chart.clone(), *visible);
        }
        ViewAction::EnterComparison => {
            next.comparison.is_active = true;
        }
        ViewAction::ExitComparison => {
            // Cancellation is a state transition: bounds reset with the mode
            next.comparison.is_active = false;
            next.comparison.slice = None;
        }
        ViewAction::SetComparisonSlice { start, end } => {
            next.comparison.slice = if start.is_finite() && end.is_finite() && start != end {
                Some((start.min(*end), start.max(*end)))
            } else {
                None
            };
        }
        ViewAction::ClearComparisonSlice => {
            next.comparison.slice = None;
        }
        ViewAction::IncludePosition(position) => {
            if !next.available_positions.contains(position) {
                return state.clone();
            }
            next.comparison.included_positions.insert(position.clone());
        }
        ViewAction::ExcludePosition(position) => {
            next.comparison.included_positions.remove(position);
        }
    }
    next
}
