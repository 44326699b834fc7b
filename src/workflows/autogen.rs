//! Auto-generation of daytime/nighttime regions from the data's time span.

use chrono::{NaiveDate, TimeZone, Utc};

use crate::series::{Area, MeasurementData, PositionData, Resolution};
use crate::state::{RegionSeed, RegionsAction, Store};
use crate::MIN_REGION_WIDTH_MS;

use super::last_region_id;

/// The two standard assessment periods of a calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPeriod {
    Daytime,
    Nighttime,
}

impl DayPeriod {
    pub fn label(&self) -> &'static str {
        match self {
            DayPeriod::Daytime => "Daytime",
            DayPeriod::Nighttime => "Nighttime",
        }
    }

    fn color(&self) -> &'static str {
        match self {
            DayPeriod::Daytime => "#fdd835",
            DayPeriod::Nighttime => "#3949ab",
        }
    }
}

/// Day boundaries and outlier trimming for auto-generation.
#[derive(Debug, Clone)]
pub struct AutogenConfig {
    /// Hour at which daytime begins (and nighttime ends).
    pub day_start_hour: u32,
    /// Hour at which nighttime begins (and daytime ends).
    pub night_start_hour: u32,
    /// Share of timestamps discarded at each end of the span, to keep stray
    /// pre/post-measurement samples from stretching the generated days.
    pub trim_fraction: f64,
}

impl Default for AutogenConfig {
    fn default() -> Self {
        Self {
            day_start_hour: 7,
            night_start_hour: 23,
            trim_fraction: 0.002,
        }
    }
}

/// Generate one region per (position × requested mode): per-day single-area
/// regions when both modes are requested, a single multi-area aggregate per
/// position when only one is. Returns the created region ids.
pub fn auto_generate_regions(
    store: &mut Store,
    data: &MeasurementData,
    positions: &[String],
    modes: &[DayPeriod],
    config: &AutogenConfig,
) -> Vec<u64> {
    let mut modes_dedup: Vec<DayPeriod> = Vec::new();
    for &mode in modes {
        if !modes_dedup.contains(&mode) {
            modes_dedup.push(mode);
        }
    }
    if modes_dedup.is_empty() {
        return Vec::new();
    }
    let aggregate = modes_dedup.len() == 1;

    let mut positions_dedup: Vec<&String> = Vec::new();
    for position in positions {
        if !positions_dedup.contains(&position) {
            positions_dedup.push(position);
        }
    }

    let mut created = Vec::new();
    for position_id in positions_dedup {
        let Some(position) = data.get(position_id) else {
            log::warn!("autogen: no data for position '{position_id}', skipping");
            continue;
        };
        let timestamps = collect_timestamps(position);
        let Some(range) = trimmed_range(&timestamps, config.trim_fraction) else {
            log::warn!("autogen: position '{position_id}' has too little data, skipping");
            continue;
        };

        for &mode in &modes_dedup {
            let intervals = day_intervals(range, mode, config);
            if intervals.is_empty() {
                continue;
            }

            let seeds: Vec<RegionSeed> = if aggregate {
                vec![RegionSeed {
                    position_id: position_id.clone(),
                    areas: intervals.iter().map(|&(_, area)| area).collect(),
                    note: mode.label().to_string(),
                    color: Some(mode.color().to_string()),
                }]
            } else {
                intervals
                    .iter()
                    .map(|&(day, area)| RegionSeed {
                        position_id: position_id.clone(),
                        areas: vec![area],
                        note: format!("{} {}", mode.label(), day),
                        color: Some(mode.color().to_string()),
                    })
                    .collect()
            };

            for seed in seeds {
                store.dispatch(RegionsAction::Add(seed));
                if let Some(id) = last_region_id(store) {
                    created.push(id);
                }
            }
        }
    }

    log::info!("autogen: created {} regions", created.len());
    created
}

/// Sorted, deduplicated finite timestamps from both stored resolutions.
fn collect_timestamps(position: &PositionData) -> Vec<f64> {
    let mut timestamps = Vec::new();
    for resolution in [Resolution::Log, Resolution::Overview] {
        if let Some(series) = position.series(resolution) {
            timestamps.extend(series.datetime.iter().copied().filter(|t| t.is_finite()));
        }
    }
    timestamps.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    timestamps.dedup();
    timestamps
}

/// The span left after discarding `fraction` of the samples at each end.
fn trimmed_range(timestamps: &[f64], fraction: f64) -> Option<(f64, f64)> {
    if timestamps.len() < 2 {
        return None;
    }
    let cut = (timestamps.len() as f64 * fraction.clamp(0.0, 0.5)).floor() as usize;
    let lo = timestamps[cut];
    let hi = timestamps[timestamps.len() - 1 - cut];
    (lo < hi).then_some((lo, hi))
}

/// Epoch ms of `day` at `hour`:00:00 UTC.
fn hour_ms(day: NaiveDate, hour: u32) -> Option<f64> {
    let naive = day.and_hms_opt(hour, 0, 0)?;
    Some(Utc.from_utc_datetime(&naive).timestamp_millis() as f64)
}

/// One clamped interval per calendar day the trimmed range spans.
/// Iteration starts one day early so the night reaching into the first
/// morning is covered; clamping drops everything outside the range.
fn day_intervals(
    range: (f64, f64),
    mode: DayPeriod,
    config: &AutogenConfig,
) -> Vec<(NaiveDate, Area)> {
    let (range_start, range_end) = range;
    let Some(first_dt) = Utc.timestamp_millis_opt(range_start as i64).single() else {
        return Vec::new();
    };
    let Some(last_dt) = Utc.timestamp_millis_opt(range_end as i64).single() else {
        return Vec::new();
    };

    let first_day = first_dt.date_naive();
    let last_day = last_dt.date_naive();
    let mut day = first_day.pred_opt().unwrap_or(first_day);

    let mut intervals = Vec::new();
    while day <= last_day {
        let bounds = match mode {
            DayPeriod::Daytime => hour_ms(day, config.day_start_hour)
                .zip(hour_ms(day, config.night_start_hour)),
            DayPeriod::Nighttime => hour_ms(day, config.night_start_hour)
                .zip(day.succ_opt().and_then(|next| hour_ms(next, config.day_start_hour))),
        };
        if let Some((lo, hi)) = bounds {
            let start = lo.max(range_start);
            let end = hi.min(range_end);
            if end - start >= MIN_REGION_WIDTH_MS {
                intervals.push((day, Area { start, end }));
            }
        }

        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    intervals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::RawSeries;

    fn ms(y: i32, m: u32, d: u32, h: u32) -> f64 {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap().timestamp_millis() as f64
    }

    fn hourly_series(from: f64, hours: usize) -> RawSeries {
        let step = 3_600_000.0;
        RawSeries {
            datetime: (0..hours).map(|i| from + i as f64 * step).collect(),
            laeq: vec![50.0; hours],
            lafmax: None,
            laf90: None,
        }
    }

    fn data_with(position: &str, series: RawSeries) -> MeasurementData {
        let mut data = MeasurementData::default();
        data.positions.insert(
            position.to_string(),
            PositionData { log: Some(series), ..Default::default() },
        );
        data
    }

    #[test]
    fn test_single_day_daytime_is_one_clamped_interval() {
        // Full calendar day of hourly samples
        let data = data_with("P1", hourly_series(ms(2024, 3, 15, 0), 24));
        let mut store = Store::new();

        let ids = auto_generate_regions(
            &mut store,
            &data,
            &["P1".to_string()],
            &[DayPeriod::Daytime],
            &AutogenConfig { trim_fraction: 0.0, ..Default::default() },
        );

        assert_eq!(ids.len(), 1);
        let region = &store.state().regions.by_id[&ids[0]];
        assert_eq!(region.areas.len(), 1);
        assert_eq!(region.areas[0].start, ms(2024, 3, 15, 7));
        assert_eq!(region.areas[0].end, ms(2024, 3, 15, 23));
        assert_eq!(region.note, "Daytime");
    }

    #[test]
    fn test_single_mode_aggregates_multiple_days() {
        // Two full days → one region with one daytime area per day
        let data = data_with("P1", hourly_series(ms(2024, 3, 15, 0), 48));
        let mut store = Store::new();

        let ids = auto_generate_regions(
            &mut store,
            &data,
            &["P1".to_string()],
            &[DayPeriod::Daytime],
            &AutogenConfig { trim_fraction: 0.0, ..Default::default() },
        );

        assert_eq!(ids.len(), 1);
        let region = &store.state().regions.by_id[&ids[0]];
        assert_eq!(region.areas.len(), 2);
        assert_eq!(region.areas[0].start, ms(2024, 3, 15, 7));
        assert_eq!(region.areas[1].start, ms(2024, 3, 16, 7));
    }

    #[test]
    fn test_both_modes_emit_per_day_regions_without_overlap() {
        // Spans 2024-03-15 00:00 through 2024-03-17 00:00
        let data = data_with("P1", hourly_series(ms(2024, 3, 15, 0), 49));
        let mut store = Store::new();

        let ids = auto_generate_regions(
            &mut store,
            &data,
            &["P1".to_string()],
            &[DayPeriod::Daytime, DayPeriod::Nighttime],
            &AutogenConfig { trim_fraction: 0.0, ..Default::default() },
        );

        // 2 daytime regions + 3 nighttime (first morning, middle night,
        // clamped last evening)
        assert_eq!(ids.len(), 5);

        // Same-mode intervals never overlap day to day
        let state = store.state();
        for mode_note in ["Daytime", "Nighttime"] {
            let mut areas: Vec<Area> = state
                .regions
                .by_id
                .values()
                .filter(|r| r.note.starts_with(mode_note))
                .map(|r| r.areas[0])
                .collect();
            areas.sort_by(|a, b| a.start.partial_cmp(&b.start).unwrap());
            for pair in areas.windows(2) {
                assert!(pair[0].end <= pair[1].start, "{mode_note} overlaps: {pair:?}");
            }
        }

        // Night reaching into the first morning is clamped to the data start
        let first_night = state
            .regions
            .by_id
            .values()
            .filter(|r| r.note.starts_with("Nighttime"))
            .map(|r| r.areas[0])
            .fold(None::<Area>, |acc, a| match acc {
                Some(best) if best.start <= a.start => Some(best),
                _ => Some(a),
            })
            .unwrap();
        assert_eq!(first_night.start, ms(2024, 3, 15, 0));
        assert_eq!(first_night.end, ms(2024, 3, 15, 7));
    }

    #[test]
    fn test_trim_discards_outlier_timestamps() {
        // 20 in-day samples plus stray samples weeks away on both sides
        let mut series = hourly_series(ms(2024, 3, 15, 6), 20);
        series.datetime.insert(0, ms(2024, 1, 1, 0));
        series.laeq.insert(0, 50.0);
        series.datetime.push(ms(2024, 6, 1, 0));
        series.laeq.push(50.0);

        let data = data_with("P1", series);
        let mut store = Store::new();

        let ids = auto_generate_regions(
            &mut store,
            &data,
            &["P1".to_string()],
            &[DayPeriod::Daytime],
            &AutogenConfig { trim_fraction: 0.05, ..Default::default() },
        );

        assert_eq!(ids.len(), 1);
        let region = &store.state().regions.by_id[&ids[0]];
        // Only 2024-03-15 daytime survives; the January/June strays are gone
        assert_eq!(region.areas.len(), 1);
        assert_eq!(region.areas[0].start, ms(2024, 3, 15, 7));
    }

    #[test]
    fn test_timestamps_merged_from_both_resolutions() {
        let mut data = data_with("P1", hourly_series(ms(2024, 3, 15, 0), 12));
        if let Some(p) = data.positions.get_mut("P1") {
            // Overview extends the span into the evening
            p.overview = Some(hourly_series(ms(2024, 3, 15, 12), 12));
        }
        let mut store = Store::new();

        let ids = auto_generate_regions(
            &mut store,
            &data,
            &["P1".to_string()],
            &[DayPeriod::Daytime],
            &AutogenConfig { trim_fraction: 0.0, ..Default::default() },
        );

        let region = &store.state().regions.by_id[&ids[0]];
        assert_eq!(region.areas[0].end, ms(2024, 3, 15, 23));
    }

    #[test]
    fn test_unknown_position_and_empty_modes_skip() {
        let data = data_with("P1", hourly_series(ms(2024, 3, 15, 0), 24));
        let mut store = Store::new();

        assert!(auto_generate_regions(
            &mut store,
            &data,
            &["P9".to_string()],
            &[DayPeriod::Daytime],
            &AutogenConfig::default(),
        )
        .is_empty());

        assert!(auto_generate_regions(&mut store, &data, &["P1".to_string()], &[], &AutogenConfig::default()).is_empty());
        assert!(store.state().regions.by_id.is_empty());
    }
}
