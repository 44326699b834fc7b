//! Acoustic level math on plain `f64` slices.
//!
//! Sound levels are logarithmic (decibels), so averaging happens in the
//! linear energy domain: convert each level to energy, average, convert back.
//! Every function here is pure and skips non-finite input samples.

/// Mean linear energy at or below this is treated as silence / no data.
const SILENCE_ENERGY_FLOOR: f64 = 1e-12;

/// Convert a decibel level to linear energy.
pub(crate) fn to_energy(level_db: f64) -> f64 {
    10f64.powf(level_db / 10.0)
}

/// Convert linear energy back to a decibel level.
pub(crate) fn to_level(energy: f64) -> f64 {
    10.0 * energy.log10()
}

/// Energy-average of decibel values (the LAeq of a sample set).
///
/// Returns `None` if the input has no finite values or the mean energy is
/// at the silence floor. Note this is NOT the arithmetic mean:
/// `level_average(&[50.0, 60.0])` is ~57.4 dB, not 55 dB.
pub fn level_average(values: &[f64]) -> Option<f64> {
    let mut sum = 0.0_f64;
    let mut count = 0_usize;
    for &v in values {
        if v.is_finite() {
            sum += to_energy(v);
            count += 1;
        }
    }
    if count == 0 {
        return None;
    }
    let mean = sum / count as f64;
    if mean <= SILENCE_ENERGY_FLOOR {
        return None;
    }
    Some(to_level(mean))
}

/// Maximum of the finite values, `None` if there are none.
pub fn level_max(values: &[f64]) -> Option<f64> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))))
}

/// The level exceeded 90% of the time (acoustics "L90", a background-noise
/// indicator): linear interpolation at the 10th-percentile rank of the
/// ascending-sorted finite values. `None` if the input is empty.
pub fn level_percentile_90(values: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let rank = 0.1 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let frac = rank - lo as f64;
    if lo + 1 < sorted.len() {
        Some(sorted[lo] + frac * (sorted[lo + 1] - sorted[lo]))
    } else {
        Some(sorted[lo])
    }
}

/// Energy-average each frequency band of a spectrum independently.
/// One output entry per band, `None` where the band has no usable data.
pub fn average_spectrum(bands: &[Vec<f64>]) -> Vec<Option<f64>> {
    bands.iter().map(|band| level_average(band)).collect()
}

/// Extract the values whose timestamp falls in `[min(start,end), max(start,end)]`.
///
/// The arrays are parallel; entries non-finite in either array are skipped.
/// O(n) scan, order preserving.
pub fn slice_time_series(timestamps: &[f64], values: &[f64], start_ms: f64, end_ms: f64) -> Vec<f64> {
    let lo = start_ms.min(end_ms);
    let hi = start_ms.max(end_ms);

    let mut out = Vec::new();
    for (&ts, &v) in timestamps.iter().zip(values.iter()) {
        if ts.is_finite() && v.is_finite() && ts >= lo && ts <= hi {
            out.push(v);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_average_is_energy_mean() {
        // Energy mean of 50 and 60 dB is ~57.4 dB, not the arithmetic 55
        let avg = level_average(&[50.0, 60.0]).unwrap();
        assert!((avg - 57.4).abs() < 0.1, "got {avg}");
    }

    #[test]
    fn test_level_average_single_value() {
        let avg = level_average(&[63.2]).unwrap();
        assert!((avg - 63.2).abs() < 1e-9);
    }

    #[test]
    fn test_level_average_skips_non_finite() {
        let with_gaps = level_average(&[50.0, f64::NAN, 60.0, f64::INFINITY]).unwrap();
        let clean = level_average(&[50.0, 60.0]).unwrap();
        assert!((with_gaps - clean).abs() < 1e-9);
    }

    #[test]
    fn test_level_average_empty_and_silence() {
        assert!(level_average(&[]).is_none());
        assert!(level_average(&[f64::NAN]).is_none());
        // -200 dB is far below the silence floor
        assert!(level_average(&[-200.0]).is_none());
    }

    #[test]
    fn test_level_max() {
        assert_eq!(level_max(&[40.0, 55.0, 51.0]), Some(55.0));
        assert_eq!(level_max(&[40.0, f64::NAN, 55.0]), Some(55.0));
        assert_eq!(level_max(&[]), None);
        assert_eq!(level_max(&[f64::NAN]), None);
    }

    #[test]
    fn test_level_percentile_90_interpolates() {
        // Sorted: [40,50,60,70,80], rank 0.1*4 = 0.4 → 40 + 0.4*10 = 44
        let l90 = level_percentile_90(&[80.0, 40.0, 60.0, 70.0, 50.0]).unwrap();
        assert!((l90 - 44.0).abs() < 1e-9, "got {l90}");
    }

    #[test]
    fn test_level_percentile_90_single_and_empty() {
        assert_eq!(level_percentile_90(&[42.0]), Some(42.0));
        assert!(level_percentile_90(&[]).is_none());
    }

    #[test]
    fn test_average_spectrum_per_band() {
        let bands = vec![vec![50.0, 60.0], vec![], vec![f64::NAN]];
        let avg = average_spectrum(&bands);
        assert_eq!(avg.len(), 3);
        assert!((avg[0].unwrap() - 57.4).abs() < 0.1);
        assert!(avg[1].is_none());
        assert!(avg[2].is_none());
    }

    #[test]
    fn test_slice_time_series_inclusive_window() {
        let ts = [0.0, 1000.0, 2000.0, 3000.0];
        let vs = [10.0, 20.0, 30.0, 40.0];
        assert_eq!(slice_time_series(&ts, &vs, 500.0, 2500.0), vec![20.0, 30.0]);
        // Bounds are inclusive
        assert_eq!(slice_time_series(&ts, &vs, 1000.0, 2000.0), vec![20.0, 30.0]);
    }

    #[test]
    fn test_slice_time_series_swapped_bounds() {
        let ts = [0.0, 1000.0, 2000.0];
        let vs = [10.0, 20.0, 30.0];
        assert_eq!(slice_time_series(&ts, &vs, 2500.0, 500.0), vec![20.0, 30.0]);
    }

    #[test]
    fn test_slice_time_series_skips_non_finite_pairs() {
        let ts = [0.0, f64::NAN, 2000.0];
        let vs = [10.0, 20.0, f64::NAN];
        assert_eq!(slice_time_series(&ts, &vs, 0.0, 3000.0), vec![10.0]);
    }
}
