//! Measurement data types: raw level time series, prepared spectral matrices,
//! and the log/overview resolution fallback.
//!
//! These shapes mirror the prepared documents produced by the data-preparation
//! pipeline (which is not part of this crate): per position, up to two raw
//! series resolutions plus one spectral matrix per (resolution, parameter).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::metrics::slice_time_series;
use crate::MIN_REGION_WIDTH_MS;

/// One contiguous time interval, in ms since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub start: f64,
    pub end: f64,
}

impl Area {
    /// Build an area from two endpoints in either order.
    /// `None` if either endpoint is non-finite or the width is below minimum.
    pub fn normalized(a: f64, b: f64) -> Option<Self> {
        if !a.is_finite() || !b.is_finite() {
            return None;
        }
        let area = Self {
            start: a.min(b),
            end: a.max(b),
        };
        area.is_valid().then_some(area)
    }

    /// Finite endpoints, positive width at or above the minimum.
    pub fn is_valid(&self) -> bool {
        self.start.is_finite()
            && self.end.is_finite()
            && self.end - self.start >= MIN_REGION_WIDTH_MS
    }

    pub fn width(&self) -> f64 {
        self.end - self.start
    }

    pub fn contains(&self, timestamp: f64) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }
}

/// Stored time-series granularity. "Log" is the fine-grained record,
/// "overview" the coarse fallback used when log data is sparse or missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Resolution {
    Log,
    Overview,
}

impl Resolution {
    pub fn label(&self) -> &'static str {
        match self {
            Resolution::Log => "log",
            Resolution::Overview => "overview",
        }
    }
}

/// Raw per-position level series: parallel arrays of equal length.
/// `LAFmax`/`LAF90` columns are optional; callers fall back to `LAeq`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSeries {
    #[serde(rename = "Datetime")]
    pub datetime: Vec<f64>,
    #[serde(rename = "LAeq")]
    pub laeq: Vec<f64>,
    #[serde(rename = "LAFmax", default, skip_serializing_if = "Option::is_none")]
    pub lafmax: Option<Vec<f64>>,
    #[serde(rename = "LAF90", default, skip_serializing_if = "Option::is_none")]
    pub laf90: Option<Vec<f64>>,
}

impl RawSeries {
    pub fn len(&self) -> usize {
        self.datetime.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datetime.is_empty()
    }
}

/// Prepared spectral matrix for one (resolution, parameter) pair.
/// Row-major `[freq][time]`: `value(f, t) = levels_flat_transposed[f * n_times + t]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpectralData {
    pub frequency_labels: Vec<String>,
    pub times_ms: Vec<f64>,
    pub n_freqs: usize,
    pub n_times: usize,
    pub levels_flat_transposed: Vec<f64>,
}

impl SpectralData {
    /// Shape check: label/time axis lengths agree with the flattened matrix.
    pub fn is_consistent(&self) -> bool {
        self.frequency_labels.len() == self.n_freqs
            && self.times_ms.len() == self.n_times
            && self.levels_flat_transposed.len() == self.n_freqs * self.n_times
    }

    pub fn value(&self, freq: usize, time: usize) -> f64 {
        self.levels_flat_transposed[freq * self.n_times + time]
    }

    /// All samples of one frequency band, in time order.
    pub fn band(&self, freq: usize) -> &[f64] {
        &self.levels_flat_transposed[freq * self.n_times..(freq + 1) * self.n_times]
    }

    /// Index range of time samples falling in `[min(start,end), max(start,end)]`.
    /// The time axis is sorted ascending, so both edges are binary searches.
    pub fn time_index_range(&self, start_ms: f64, end_ms: f64) -> std::ops::Range<usize> {
        let lo = start_ms.min(end_ms);
        let hi = start_ms.max(end_ms);
        let first = self.times_ms.partition_point(|&t| t < lo);
        let last = self.times_ms.partition_point(|&t| t <= hi);
        first..last
    }
}

/// All prepared data for one measurement position.
#[derive(Debug, Clone, Default)]
pub struct PositionData {
    pub log: Option<RawSeries>,
    pub overview: Option<RawSeries>,
    /// Spectral matrices keyed by parameter name, per resolution.
    pub spectra_log: BTreeMap<String, SpectralData>,
    pub spectra_overview: BTreeMap<String, SpectralData>,
}

impl PositionData {
    pub fn series(&self, resolution: Resolution) -> Option<&RawSeries> {
        match resolution {
            Resolution::Log => self.log.as_ref(),
            Resolution::Overview => self.overview.as_ref(),
        }
    }

    pub fn insert_spectral(&mut self, resolution: Resolution, parameter: String, data: SpectralData) {
        match resolution {
            Resolution::Log => self.spectra_log.insert(parameter, data),
            Resolution::Overview => self.spectra_overview.insert(parameter, data),
        };
    }

    pub fn spectral(&self, resolution: Resolution, parameter: &str) -> Option<&SpectralData> {
        match resolution {
            Resolution::Log => self.spectra_log.get(parameter),
            Resolution::Overview => self.spectra_overview.get(parameter),
        }
    }

    /// Any spectral matrix for this parameter, log preferred.
    /// Used to recover frequency labels when no raw data overlaps a selection.
    pub fn any_spectral(&self, parameter: &str) -> Option<&SpectralData> {
        self.spectra_log
            .get(parameter)
            .or_else(|| self.spectra_overview.get(parameter))
    }
}

/// The full prepared dataset: one `PositionData` per measurement position.
#[derive(Debug, Clone, Default)]
pub struct MeasurementData {
    pub positions: BTreeMap<String, PositionData>,
}

impl MeasurementData {
    pub fn get(&self, position_id: &str) -> Option<&PositionData> {
        self.positions.get(position_id)
    }

    pub fn position_ids(&self) -> Vec<String> {
        self.positions.keys().cloned().collect()
    }
}

/// Concatenated slice of a series column over every area of a selection.
pub fn slice_areas(timestamps: &[f64], values: &[f64], areas: &[Area]) -> Vec<f64> {
    let mut out = Vec::new();
    for area in areas {
        out.extend(slice_time_series(timestamps, values, area.start, area.end));
    }
    out
}

/// A raw series resolved through the log → overview fallback.
/// Downstream code consumes this uniformly and never re-checks field presence.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedSeries<'a> {
    pub resolution: Resolution,
    pub series: &'a RawSeries,
}

/// Pick the dataset for a selection: "log" if its LAeq column has any samples
/// inside the areas, else "overview" on the same test, else `None`.
pub fn resolve_series<'a>(position: &'a PositionData, areas: &[Area]) -> Option<ResolvedSeries<'a>> {
    for resolution in [Resolution::Log, Resolution::Overview] {
        if let Some(series) = position.series(resolution) {
            if !slice_areas(&series.datetime, &series.laeq, areas).is_empty() {
                return Some(ResolvedSeries { resolution, series });
            }
        }
    }
    None
}
