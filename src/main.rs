use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};

use levelmark::cache::MetricsCache;
use levelmark::comparison::{aggregate_comparison, ComparisonRow};
use levelmark::persist;
use levelmark::region_metrics::MetricsResult;
use levelmark::series::MeasurementData;
use levelmark::state::{Store, ViewAction};
use levelmark::workflows::{self, DayPeriod, ImportMode};

#[derive(Parser)]
#[command(name = "levelmark", version, about = "Annotate and analyze long-term noise measurements")]
struct Cli {
    /// Measurement data directory (per-position JSON documents)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Day,
    Night,
    Both,
}

impl Mode {
    fn periods(self) -> Vec<DayPeriod> {
        match self {
            Mode::Day => vec![DayPeriod::Daytime],
            Mode::Night => vec![DayPeriod::Nighttime],
            Mode::Both => vec![DayPeriod::Daytime, DayPeriod::Nighttime],
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compute acoustic descriptors for every region in a document
    Metrics {
        /// Region document (JSON)
        regions: PathBuf,

        /// Spectral parameter to average (default from config)
        #[arg(short, long)]
        parameter: Option<String>,

        /// Also print the averaged spectrum per region
        #[arg(long)]
        spectra: bool,
    },

    /// Generate daytime/nighttime regions from the data's time span
    Autogen {
        /// Output region document
        #[arg(short, long)]
        output: PathBuf,

        /// Positions to cover (default: every position in the data)
        #[arg(short = 'P', long)]
        positions: Vec<String>,

        #[arg(long, value_enum, default_value = "both")]
        mode: Mode,
    },

    /// Aggregate one shared time slice across positions
    Compare {
        /// Slice start (ms since epoch)
        #[arg(long)]
        start: f64,

        /// Slice end (ms since epoch)
        #[arg(long)]
        end: f64,

        /// Positions to include (default: every position in the data)
        #[arg(short = 'P', long)]
        positions: Vec<String>,

        /// Spectral parameter to average (default from config)
        #[arg(short, long)]
        parameter: Option<String>,
    },

    /// Convert a marker document between CSV and JSON
    ConvertMarkers {
        /// Input file (.csv or .json)
        input: PathBuf,

        /// Output file (.csv or .json)
        output: PathBuf,
    },

    /// Show a summary of the measurement directory
    Stats,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let config = levelmark::config::AppConfig::load();

    match cli.command {
        Commands::Metrics { regions, parameter, spectra } => {
            let data = load_data(&cli.data_dir, &config)?;
            let parameter = parameter.unwrap_or_else(|| config.default_parameter.clone());

            let document = std::fs::read_to_string(&regions)
                .with_context(|| format!("Failed to read {}", regions.display()))?;

            let mut store = store_for(&data, &parameter);
            let imported = workflows::import_regions(&mut store, &document, ImportMode::Replace);
            if imported == 0 {
                anyhow::bail!("No valid regions in {}", regions.display());
            }

            let mut cache = MetricsCache::new();
            let ids: Vec<u64> = store.state().regions.all_ids.clone();

            let pb = ProgressBar::new(ids.len() as u64);
            pb.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} regions ({eta})",
                )
                .unwrap()
                .progress_chars("#>-"),
            );

            let mut rows = Vec::with_capacity(ids.len());
            for id in ids {
                let state = store.state();
                let Some(region) = state.regions.by_id.get(&id) else {
                    continue;
                };
                if let Some(position) = data.get(&region.position_id) {
                    let metrics = cache.get_or_compute(region, position, &parameter).clone();
                    rows.push((region.clone(), metrics));
                } else {
                    let duration: f64 = region.areas.iter().map(|a| a.width()).sum();
                    rows.push((
                        region.clone(),
                        MetricsResult::empty(Some(parameter.clone()), duration),
                    ));
                }
                pb.inc(1);
            }
            pb.finish_and_clear();

            print_metrics_table(&rows);
            if spectra {
                for (region, metrics) in &rows {
                    print_spectrum(&format!("Region {} ({})", region.id, region.position_id), metrics);
                }
            }
        }

        Commands::Autogen { output, positions, mode } => {
            let data = load_data(&cli.data_dir, &config)?;
            let positions = if positions.is_empty() {
                data.position_ids()
            } else {
                positions
            };

            let mut store = store_for(&data, &config.default_parameter);
            let created = workflows::auto_generate_regions(
                &mut store,
                &data,
                &positions,
                &mode.periods(),
                &config.autogen(),
            );
            if created.is_empty() {
                anyhow::bail!("No regions generated — is there data for those positions?");
            }

            let json = persist::regions_to_json(&store.state().regions)
                .context("Failed to serialize regions")?;
            std::fs::write(&output, json)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Wrote {} regions to {}", created.len(), output.display());
        }

        Commands::Compare { start, end, positions, parameter } => {
            let data = load_data(&cli.data_dir, &config)?;
            let parameter = parameter.unwrap_or_else(|| config.default_parameter.clone());
            let positions = if positions.is_empty() {
                data.position_ids()
            } else {
                positions
            };

            let mut store = store_for(&data, &parameter);
            store.dispatch(ViewAction::EnterComparison);
            store.dispatch(ViewAction::SetComparisonSlice { start, end });
            for position in &positions {
                store.dispatch(ViewAction::IncludePosition(position.clone()));
            }

            let rows = aggregate_comparison(store.state(), &data);
            if rows.is_empty() {
                anyhow::bail!("Nothing to compare — check the slice bounds and positions");
            }
            print_comparison_table(&rows);
            for row in &rows {
                print_spectrum(&row.position_id, &row.metrics);
            }
        }

        Commands::ConvertMarkers { input, output } => {
            let text = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;

            let mut store = Store::new();
            let imported = if has_extension(&input, "csv") {
                workflows::import_markers_csv(&mut store, &text)
            } else {
                workflows::import_markers_json(&mut store, &text)
            };

            let markers = &store.state().markers;
            let rendered = if has_extension(&output, "csv") {
                persist::markers_to_csv(markers)
            } else {
                persist::markers_to_json(markers).context("Failed to serialize markers")?
            };
            std::fs::write(&output, rendered)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Converted {} markers to {}", imported, output.display());
        }

        Commands::Stats => {
            let data = load_data(&cli.data_dir, &config)?;
            print_stats(&data);
        }
    }

    Ok(())
}

/// Resolve the data directory (CLI > config) and load it.
fn load_data(cli_dir: &Option<PathBuf>, config: &levelmark::config::AppConfig) -> Result<MeasurementData> {
    let dir = cli_dir
        .clone()
        .or_else(|| config.data_dir.clone())
        .context("No data directory. Pass --data-dir or set data_dir in config.")?;
    let data = levelmark::discovery::load_measurement_dir(&dir)
        .with_context(|| format!("Failed to load {}", dir.display()))?;
    if data.positions.is_empty() {
        anyhow::bail!("No measurement documents found in {}", dir.display());
    }
    Ok(data)
}

/// Store primed with the dataset's positions and the chosen parameter.
fn store_for(data: &MeasurementData, parameter: &str) -> Store {
    let mut store = Store::new();
    store.dispatch(ViewAction::SetAvailablePositions(data.position_ids()));
    store.dispatch(ViewAction::SetParameter(parameter.to_string()));
    store
}

fn has_extension(path: &std::path::Path, ext: &str) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

fn fmt_instant(ms: f64) -> String {
    match Utc.timestamp_millis_opt(ms as i64).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => "?".to_string(),
    }
}

fn fmt_level(level: Option<f64>) -> String {
    match level {
        Some(v) => format!("{v:.1}"),
        None => "-".to_string(),
    }
}

fn print_metrics_table(rows: &[(levelmark::state::Region, MetricsResult)]) {
    println!(
        "{:<4} {:<14} {:<16} {:>8} {:>5} {:>9} {:>6} {:>6} {:>6}  {}",
        "Id", "Position", "Start", "Min", "Areas", "Res", "LAeq", "LAFmax", "LA90", "Note"
    );
    println!("{}", "-".repeat(95));

    for (region, metrics) in rows {
        let la90 = if metrics.la90_available {
            fmt_level(metrics.la90)
        } else {
            "n/a".to_string()
        };
        println!(
            "{:<4} {:<14} {:<16} {:>8.1} {:>5} {:>9} {:>6} {:>6} {:>6}  {}",
            region.id,
            region.position_id,
            fmt_instant(region.start()),
            metrics.duration_ms / 60_000.0,
            region.areas.len(),
            metrics.data_resolution.label(),
            fmt_level(metrics.laeq),
            fmt_level(metrics.lafmax),
            la90,
            region.note,
        );
    }
}

fn print_comparison_table(rows: &[ComparisonRow]) {
    println!(
        "{:<14} {:>8} {:>9} {:>6} {:>6} {:>6}",
        "Position", "Min", "Res", "LAeq", "LAFmax", "LA90"
    );
    println!("{}", "-".repeat(55));

    for row in rows {
        let m = &row.metrics;
        let la90 = if m.la90_available {
            fmt_level(m.la90)
        } else {
            "n/a".to_string()
        };
        println!(
            "{:<14} {:>8.1} {:>9} {:>6} {:>6} {:>6}",
            row.position_id,
            m.duration_ms / 60_000.0,
            m.data_resolution.label(),
            fmt_level(m.laeq),
            fmt_level(m.lafmax),
            la90,
        );
    }
}

fn print_spectrum(title: &str, metrics: &MetricsResult) {
    if metrics.spectrum.labels.is_empty() {
        return;
    }
    let parameter = metrics.parameter.as_deref().unwrap_or("?");
    println!();
    println!("{title} — averaged {parameter} spectrum");
    for (label, value) in metrics.spectrum.labels.iter().zip(&metrics.spectrum.values) {
        println!("  {:>8} Hz  {:>6}", label, fmt_level(*value));
    }
}

fn print_stats(data: &MeasurementData) {
    println!(
        "{:<14} {:>9} {:>9} {:<16} {:<16}  {}",
        "Position", "Log", "Overview", "From", "To", "Spectra"
    );
    println!("{}", "-".repeat(90));

    for (position_id, position) in &data.positions {
        let log_len = position.log.as_ref().map_or(0, |s| s.len());
        let overview_len = position.overview.as_ref().map_or(0, |s| s.len());

        let mut span: Option<(f64, f64)> = None;
        for series in [&position.log, &position.overview].into_iter().flatten() {
            for &ts in &series.datetime {
                if ts.is_finite() {
                    span = Some(match span {
                        Some((lo, hi)) => (lo.min(ts), hi.max(ts)),
                        None => (ts, ts),
                    });
                }
            }
        }

        let mut parameters: Vec<&String> = position
            .spectra_log
            .keys()
            .chain(position.spectra_overview.keys())
            .collect();
        parameters.sort();
        parameters.dedup();
        let parameters = parameters
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let (from, to) = match span {
            Some((lo, hi)) => (fmt_instant(lo), fmt_instant(hi)),
            None => ("-".to_string(), "-".to_string()),
        };
        println!(
            "{:<14} {:>9} {:>9} {:<16} {:<16}  {}",
            position_id, log_len, overview_len, from, to, parameters
        );
    }
}
