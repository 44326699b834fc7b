//! Interaction slice: pointer and keyboard gesture state.

/// Last tap (click) on a chart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TapState {
    pub is_active: bool,
    pub timestamp: f64,
    pub position_id: String,
    pub source_chart: String,
}

/// Live pointer position over a chart. `spectral_y` carries the frequency
/// coordinate when hovering a spectrogram.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HoverState {
    pub is_active: bool,
    pub timestamp: f64,
    pub position_id: String,
    pub source_chart: String,
    pub spectral_y: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyboardState {
    pub enabled: bool,
    pub step_size_ms: f64,
}

impl Default for KeyboardState {
    fn default() -> Self {
        Self {
            enabled: false,
            step_size_ms: 1000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DragTool {
    #[default]
    Pan,
    BoxSelect,
}

/// The two-step keyboard region gesture, modeled explicitly so transitions
/// are matched exhaustively instead of inferred from nullness.
/// `Pending` only exists between the first and second keystroke.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PendingRegion {
    #[default]
    Idle,
    Pending { position_id: String, timestamp: f64 },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionState {
    pub tap: TapState,
    pub hover: HoverState,
    pub keyboard: KeyboardState,
    pub active_drag_tool: DragTool,
    pub pending_region: PendingRegion,
}

impl InteractionState {
    /// Pointer timestamp for boundary targeting; hover wins over tap.
    pub fn pointer_timestamp(&self) -> Option<f64> {
        if self.hover.is_active {
            Some(self.hover.timestamp)
        } else if self.tap.is_active {
            Some(self.tap.timestamp)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone)]
pub enum InteractionAction {
    Tap { timestamp: f64, position_id: String, source_chart: String },
    ClearTap,
    Hover {
        timestamp: f64,
        position_id: String,
        source_chart: String,
        spectral_y: Option<f64>,
    },
    ClearHover,
    SetKeyboardEnabled(bool),
    SetStepSize(f64),
    SetDragTool(DragTool),
    BeginPendingRegion { position_id: String, timestamp: f64 },
    ClearPendingRegion,
}

/// Pure transition function for the interaction slice.
pub fn reduce(state: &InteractionState, action: &InteractionAction) -> InteractionState {
    let mut next = state.clone();
    match action {
        InteractionAction::Tap { timestamp, position_id, source_chart } => {
            if !timestamp.is_finite() || position_id.is_empty() {
                return state.clone();
            }
            next.tap = TapState {
                is_active: true,
                timestamp: *timestamp,
                position_id: position_id.clone(),
                source_chart: source_chart.clone(),
            };
            // A pending capture never survives a tap on another position
            if let PendingRegion::Pending { position_id: pending_position, .. } =
                &next.pending_region
            {
                if pending_position != position_id {
                    next.pending_region = PendingRegion::Idle;
                }
            }
        }
        InteractionAction::ClearTap => {
            next.tap = TapState::default();
        }
        InteractionAction::Hover { timestamp, position_id, source_chart, spectral_y } => {
            if !timestamp.is_finite() || position_id.is_empty() {
                return state.clone();
            }
            next.hover = HoverState {
                is_active: true,
                timestamp: *timestamp,
                position_id: position_id.clone(),
                source_chart: source_chart.clone(),
                spectral_y: *spectral_y,
            };
        }
        InteractionAction::ClearHover => {
            next.hover = HoverState::default();
        }
        InteractionAction::SetKeyboardEnabled(enabled) => {
            next.keyboard.enabled = *enabled;
        }
        InteractionAction::SetStepSize(step_ms) => {
            if !step_ms.is_finite() || *step_ms <= 0.0 {
                return state.clone();
            }
            next.keyboard.step_size_ms = *step_ms;
        }
        InteractionAction::SetDragTool(tool) => {
            next.active_drag_tool = *tool;
        }
        InteractionAction::BeginPendingRegion { position_id, timestamp } => {
            if !timestamp.is_finite() || position_id.is_empty() {
                return state.clone();
            }
            next.pending_region = PendingRegion::Pending {
                position_id: position_id.clone(),
                timestamp: *timestamp,
            };
        }
        InteractionAction::ClearPendingRegion => {
            next.pending_region = PendingRegion::Idle;
        }
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tap_requires_finite_timestamp_and_position() {
        let state = InteractionState::default();
        let next = reduce(
            &state,
            &InteractionAction::Tap {
                timestamp: f64::NAN,
                position_id: "P1".into(),
                source_chart: "levels".into(),
            },
        );
        assert!(!next.tap.is_active);

        let next = reduce(
            &state,
            &InteractionAction::Tap {
                timestamp: 1000.0,
                position_id: String::new(),
                source_chart: "levels".into(),
            },
        );
        assert!(!next.tap.is_active);
    }

    #[test]
    fn test_pointer_prefers_hover_over_tap() {
        let mut state = InteractionState::default();
        assert!(state.pointer_timestamp().is_none());

        state = reduce(
            &state,
            &InteractionAction::Tap {
                timestamp: 1000.0,
                position_id: "P1".into(),
                source_chart: "levels".into(),
            },
        );
        assert_eq!(state.pointer_timestamp(), Some(1000.0));

        state = reduce(
            &state,
            &InteractionAction::Hover {
                timestamp: 2000.0,
                position_id: "P1".into(),
                source_chart: "levels".into(),
                spectral_y: None,
            },
        );
        assert_eq!(state.pointer_timestamp(), Some(2000.0));

        state = reduce(&state, &InteractionAction::ClearHover);
        assert_eq!(state.pointer_timestamp(), Some(1000.0));
    }

    #[test]
    fn test_pending_region_round_trip() {
        let mut state = InteractionState::default();
        assert_eq!(state.pending_region, PendingRegion::Idle);

        state = reduce(
            &state,
            &InteractionAction::BeginPendingRegion { position_id: "P1".into(), timestamp: 1000.0 },
        );
        assert_eq!(
            state.pending_region,
            PendingRegion::Pending { position_id: "P1".into(), timestamp: 1000.0 }
        );

        state = reduce(&state, &InteractionAction::ClearPendingRegion);
        assert_eq!(state.pending_region, PendingRegion::Idle);
    }

    #[test]
    fn test_pending_cleared_by_tap_on_other_position() {
        let mut state = reduce(
            &InteractionState::default(),
            &InteractionAction::BeginPendingRegion { position_id: "P1".into(), timestamp: 1000.0 },
        );

        // Same position: the capture survives (the second keystroke needs it)
        state = reduce(
            &state,
            &InteractionAction::Tap {
                timestamp: 4000.0,
                position_id: "P1".into(),
                source_chart: "levels".into(),
            },
        );
        assert!(matches!(state.pending_region, PendingRegion::Pending { .. }));

        // Different position: the capture is gone
        state = reduce(
            &state,
            &InteractionAction::Tap {
                timestamp: 9000.0,
                position_id: "P2".into(),
                source_chart: "levels".into(),
            },
        );
        assert_eq!(state.pending_region, PendingRegion::Idle);
    }

    #[test]
    fn test_step_size_rejects_non_positive() {
        let state = InteractionState::default();
        let next = reduce(&state, &InteractionAction::SetStepSize(0.0));
        assert_eq!(next.keyboard.step_size_ms, 1000.0);
        let next = reduce(&state, &InteractionAction::SetStepSize(250.0));
        assert_eq!(next.keyboard.step_size_ms, 250.0);
    }
}
