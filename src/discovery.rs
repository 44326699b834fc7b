//! Locate and load prepared measurement documents from a directory.
//!
//! The data-preparation pipeline writes one JSON document per position and
//! resolution (`<position>_log.json`, `<position>_overview.json`) plus one
//! per prepared spectral matrix
//! (`<position>_spectra_<resolution>_<parameter>.json`). Unreadable or
//! malformed files are skipped with a warning; only an unusable root
//! directory is an error.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use walkdir::WalkDir;

use crate::series::{MeasurementData, RawSeries, Resolution, SpectralData};

static SPECTRA_FILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<pos>.+)_spectra_(?P<res>log|overview)_(?P<param>[A-Za-z0-9]+)\.json$")
        .unwrap()
});

static SERIES_FILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<pos>.+)_(?P<res>log|overview)\.json$").unwrap()
});

#[derive(Error, Debug)]
pub enum DiscoverError {
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn parse_resolution(s: &str) -> Resolution {
    match s {
        "log" => Resolution::Log,
        _ => Resolution::Overview,
    }
}

/// Scan `root` for prepared documents and assemble the dataset.
pub fn load_measurement_dir(root: &Path) -> Result<MeasurementData, DiscoverError> {
    if !root.is_dir() {
        return Err(DiscoverError::NotADirectory(root.to_path_buf()));
    }

    let mut data = MeasurementData::default();
    let mut loaded = 0_usize;

    for entry in WalkDir::new(root).min_depth(1).max_depth(2) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("skipping unreadable entry: {e}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };

        // The spectra pattern is a superset of the series pattern, so it
        // must be tried first.
        if let Some(caps) = SPECTRA_FILE_RE.captures(name) {
            let position = caps["pos"].to_string();
            let resolution = parse_resolution(&caps["res"]);
            let parameter = caps["param"].to_string();
            if let Some(spectral) = read_spectral(entry.path()) {
                data.positions
                    .entry(position)
                    .or_default()
                    .insert_spectral(resolution, parameter, spectral);
                loaded += 1;
            }
        } else if let Some(caps) = SERIES_FILE_RE.captures(name) {
            let position = caps["pos"].to_string();
            let resolution = parse_resolution(&caps["res"]);
            if let Some(series) = read_series(entry.path()) {
                let entry = data.positions.entry(position).or_default();
                match resolution {
                    Resolution::Log => entry.log = Some(series),
                    Resolution::Overview => entry.overview = Some(series),
                }
                loaded += 1;
            }
        }
    }

    log::info!(
        "loaded {loaded} documents for {} positions from {}",
        data.positions.len(),
        root.display()
    );
    Ok(data)
}

fn read_series(path: &Path) -> Option<RawSeries> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("cannot read {}: {e}", path.display());
            return None;
        }
    };
    let series: RawSeries = match serde_json::from_str(&text) {
        Ok(series) => series,
        Err(e) => {
            log::warn!("cannot parse {}: {e}", path.display());
            return None;
        }
    };

    // Columns must stay parallel with the time axis
    let n = series.datetime.len();
    let columns_ok = series.laeq.len() == n
        && series.lafmax.as_ref().is_none_or(|c| c.len() == n)
        && series.laf90.as_ref().is_none_or(|c| c.len() == n);
    if !columns_ok {
        log::warn!("{}: column lengths disagree, skipping", path.display());
        return None;
    }
    Some(series)
}

fn read_spectral(path: &Path) -> Option<SpectralData> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("cannot read {}: {e}", path.display());
            return None;
        }
    };
    let spectral: SpectralData = match serde_json::from_str(&text) {
        Ok(spectral) => spectral,
        Err(e) => {
            log::warn!("cannot parse {}: {e}", path.display());
            return None;
        }
    };
    if !spectral.is_consistent() {
        log::warn!("{}: matrix shape disagrees with axes, skipping", path.display());
        return None;
    }
    Some(spectral)
}
