//! Acoustic descriptors for one region (or any multi-area selection).
//!
//! Pure given its inputs; memoization lives in [`crate::cache`].

use serde::{Deserialize, Serialize};

use crate::metrics::{level_average, level_max, level_percentile_90, to_energy, to_level};
use crate::series::{resolve_series, slice_areas, Area, PositionData, Resolution, SpectralData};

/// Which stored granularity a result was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataResolution {
    Log,
    Overview,
    None,
}

impl DataResolution {
    pub fn label(&self) -> &'static str {
        match self {
            DataResolution::Log => "log",
            DataResolution::Overview => "overview",
            DataResolution::None => "none",
        }
    }
}

impl From<Resolution> for DataResolution {
    fn from(r: Resolution) -> Self {
        match r {
            Resolution::Log => DataResolution::Log,
            Resolution::Overview => DataResolution::Overview,
        }
    }
}

/// Frequency-band averages, one value (or `None`) per band.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Spectrum {
    pub labels: Vec<String>,
    pub values: Vec<Option<f64>>,
}

/// Derived descriptors for a selection. Cached, never a source of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsResult {
    pub laeq: Option<f64>,
    pub lafmax: Option<f64>,
    pub la90: Option<f64>,
    pub la90_available: bool,
    pub data_resolution: DataResolution,
    pub spectrum: Spectrum,
    pub parameter: Option<String>,
    pub duration_ms: f64,
}

impl MetricsResult {
    /// The "no data" result — representable and displayable, not an error.
    pub fn empty(parameter: Option<String>, duration_ms: f64) -> Self {
        Self {
            laeq: None,
            lafmax: None,
            la90: None,
            la90_available: false,
            data_resolution: DataResolution::None,
            spectrum: Spectrum::default(),
            parameter,
            duration_ms,
        }
    }
}

/// Compute all descriptors for a selection over one position's data.
///
/// Dataset selection is log → overview fallback on the LAeq column; LA90 is
/// only meaningful on log-resolution data (the coarse overview record is too
/// sparse for a percentile). Missing dedicated LAFmax/LAF90 columns fall back
/// to the LAeq samples.
pub fn compute_region_metrics(
    areas: &[Area],
    position: &PositionData,
    parameter: &str,
) -> MetricsResult {
    let duration_ms: f64 = areas
        .iter()
        .filter(|a| a.end > a.start)
        .map(|a| a.end - a.start)
        .sum();

    let Some(resolved) = resolve_series(position, areas) else {
        // Keep the frequency axis visible even when nothing overlaps
        let mut result = MetricsResult::empty(Some(parameter.to_string()), duration_ms);
        if let Some(spec) = position.any_spectral(parameter) {
            result.spectrum.labels = spec.frequency_labels.clone();
            result.spectrum.values = vec![None; spec.frequency_labels.len()];
        }
        return result;
    };

    let series = resolved.series;
    let laeq_values = slice_areas(&series.datetime, &series.laeq, areas);
    let laeq = level_average(&laeq_values);

    let lafmax = match &series.lafmax {
        Some(column) => level_max(&slice_areas(&series.datetime, column, areas)),
        None => level_max(&laeq_values),
    };

    let (la90, la90_available) = if resolved.resolution == Resolution::Log {
        let la90 = match &series.laf90 {
            Some(column) => level_percentile_90(&slice_areas(&series.datetime, column, areas)),
            None => level_percentile_90(&laeq_values),
        };
        (la90, true)
    } else {
        (None, false)
    };

    let spectrum = match position.spectral(resolved.resolution, parameter) {
        Some(spec) => averaged_spectrum(spec, areas),
        None => Spectrum::default(),
    };

    MetricsResult {
        laeq,
        lafmax,
        la90,
        la90_available,
        data_resolution: resolved.resolution.into(),
        spectrum,
        parameter: Some(parameter.to_string()),
        duration_ms,
    }
}

/// Energy-weighted band averages across possibly-discontiguous areas.
///
/// Per band: sum linear energies over every time index falling inside any
/// area, divide by the total counted samples, convert back to dB. This is a
/// single merged average, NOT the mean of per-area averages — a 3-sample area
/// carries three times the weight of a 1-sample area.
pub fn averaged_spectrum(spectral: &SpectralData, areas: &[Area]) -> Spectrum {
    let n_freqs = spectral.n_freqs;
    let mut energy = vec![0.0_f64; n_freqs];
    let mut count = vec![0_usize; n_freqs];

    for area in areas {
        for t in spectral.time_index_range(area.start, area.end) {
            for f in 0..n_freqs {
                let v = spectral.value(f, t);
                if v.is_finite() {
                    energy[f] += to_energy(v);
                    count[f] += 1;
                }
            }
        }
    }

    let values = (0..n_freqs)
        .map(|f| {
            if count[f] == 0 {
                return None;
            }
            let mean = energy[f] / count[f] as f64;
            (mean > 1e-12).then(|| to_level(mean))
        })
        .collect();

    Spectrum {
        labels: spectral.frequency_labels.clone(),
        values,
    }
}
