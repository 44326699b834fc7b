//! Memoizing cache for region metrics.
//!
//! Lives outside the state tree: a derived-value memoizer, safe to clear at
//! any moment (the only cost is recomputation). The key folds in the region's
//! `version`, which every area-changing transition bumps — so a lookup can
//! never return a result computed for older bounds, and no workflow has to
//! remember to invalidate after mutating. `invalidate_region`/`clear` exist
//! for memory hygiene (region removal, data reload), not for correctness.

use std::collections::HashMap;

use crate::region_metrics::{compute_region_metrics, MetricsResult};
use crate::series::PositionData;
use crate::state::Region;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    region_id: u64,
    version: u64,
    parameter: String,
}

#[derive(Debug, Default)]
pub struct MetricsCache {
    entries: HashMap<CacheKey, MetricsResult>,
}

impl MetricsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached metrics for `(region, parameter)` at the region's current
    /// version, computing and storing on miss.
    pub fn get_or_compute(
        &mut self,
        region: &Region,
        position: &PositionData,
        parameter: &str,
    ) -> &MetricsResult {
        let key = CacheKey {
            region_id: region.id,
            version: region.version,
            parameter: parameter.to_string(),
        };
        self.entries
            .entry(key)
            .or_insert_with(|| compute_region_metrics(&region.areas, position, parameter))
    }

    /// Drop every cached parameter variant of one region.
    pub fn invalidate_region(&mut self, region_id: u64) {
        self.entries.retain(|key, _| key.region_id != region_id);
    }

    /// Full reset, e.g. after a data reload.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
