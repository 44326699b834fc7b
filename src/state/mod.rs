//! The immutable state tree and its pure transition functions.
//!
//! Four independent slices — interaction, view, markers, regions — each
//! reduced by `(state, action) -> state`. The [`Store`] replaces the whole
//! tree on every dispatch; readers always see a complete, consistent
//! snapshot. Single-threaded, synchronous, run-to-completion: no transition
//! awaits I/O or throws on malformed input.

pub mod interaction;
pub mod markers;
pub mod regions;
pub mod view;

pub use interaction::{DragTool, InteractionAction, InteractionState, PendingRegion};
pub use markers::{Marker, MarkerSeed, MarkersAction, MarkersState};
pub use regions::{Region, RegionSeed, RegionsAction, RegionsState};
pub use view::{ComparisonState, ViewAction, ViewKind, ViewState, Viewport};

/// The root state tree. Each slice owns its entities exclusively.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub interaction: InteractionState,
    pub view: ViewState,
    pub markers: MarkersState,
    pub regions: RegionsState,
}

/// One action, addressed to exactly one slice.
#[derive(Debug, Clone)]
pub enum Action {
    Interaction(InteractionAction),
    View(ViewAction),
    Markers(MarkersAction),
    Regions(RegionsAction),
}

impl From<InteractionAction> for Action {
    fn from(a: InteractionAction) -> Self {
        Action::Interaction(a)
    }
}

impl From<ViewAction> for Action {
    fn from(a: ViewAction) -> Self {
        Action::View(a)
    }
}

impl From<MarkersAction> for Action {
    fn from(a: MarkersAction) -> Self {
        Action::Markers(a)
    }
}

impl From<RegionsAction> for Action {
    fn from(a: RegionsAction) -> Self {
        Action::Regions(a)
    }
}

/// Root transition: route the action to its slice, keep the others as-is.
pub fn reduce(state: &AppState, action: &Action) -> AppState {
    match action {
        Action::Interaction(a) => AppState {
            interaction: interaction::reduce(&state.interaction, a),
            ..state.clone()
        },
        Action::View(a) => AppState {
            view: view::reduce(&state.view, a),
            ..state.clone()
        },
        Action::Markers(a) => AppState {
            markers: markers::reduce(&state.markers, a),
            ..state.clone()
        },
        Action::Regions(a) => AppState {
            regions: regions::reduce(&state.regions, a),
            ..state.clone()
        },
    }
}

/// Holds the current tree and applies dispatched actions in order.
/// Workflow orchestrators read through [`Store::state`] — possibly re-reading
/// after a dispatch to learn a newly assigned id — and never mutate directly.
#[derive(Debug, Default)]
pub struct Store {
    state: AppState,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: AppState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn dispatch(&mut self, action: impl Into<Action>) {
        self.state = reduce(&self.state, &action.into());
    }
}
