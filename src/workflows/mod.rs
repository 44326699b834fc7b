//! Workflow orchestrators: multi-action user intents.
//!
//! Each function reads the current tree through the [`Store`], consults
//! measurement data where needed, and dispatches one or more slice actions —
//! sometimes re-reading state in between to learn a newly assigned id.
//! Invalid input never throws; the workflow logs and leaves the tree alone.

pub mod autogen;
pub mod create;
pub mod reshape;
pub mod resize;
pub mod transfer;

pub use autogen::{auto_generate_regions, AutogenConfig, DayPeriod};
pub use create::{create_region_from_drag, keyboard_region_step};
pub use reshape::{merge_regions, split_region};
pub use resize::{resize_selected_region, Edge};
pub use transfer::{
    comparison_slice_to_regions, import_markers_csv, import_markers_json, import_regions,
    ImportMode,
};

use crate::state::Store;

/// Id of the most recently created region, if any.
/// Workflows call this right after dispatching an `Add` to discover the id
/// the reducer assigned.
pub(crate) fn last_region_id(store: &Store) -> Option<u64> {
    store.state().regions.all_ids.last().copied()
}
