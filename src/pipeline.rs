//! One report run: load, clean, aggregate, detect, then write artifacts.
//!
//! `analyze` holds the pure part so tests and other front-ends can use it
//! without touching the filesystem. `run` adds the console report and files.

use crate::anomalies;
use crate::charts;
use crate::cleaner::{self, CleanReport};
use crate::config::RunConfig;
use crate::error::AppError;
use crate::inspect;
use crate::kpi;
use crate::loader;
use crate::output;
use crate::types::{AnomalyEvent, AnomalyRow, KpiRow, ProductionRecord, RawRow, RunSummary, WellKpi};
use crate::util::format_int;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const ANOMALIES_FILE: &str = "anomalies_detected.csv";
pub const KPIS_FILE: &str = "kpis_summary.csv";
pub const SUMMARY_FILE: &str = "run_summary.json";

/// Computed results of one dataset.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub records: Vec<ProductionRecord>,
    pub clean_report: CleanReport,
    pub kpis: Vec<WellKpi>,
    pub anomalies: Vec<AnomalyEvent>,
}

pub fn analyze(rows: &[RawRow], threshold: f64) -> Analysis {
    let (records, clean_report) = cleaner::clean(rows);
    let kpis = kpi::aggregate(&records);
    let anomalies = anomalies::detect(&records, threshold);
    Analysis {
        records,
        clean_report,
        kpis,
        anomalies,
    }
}

/// Execute a full run. Only input problems and an unusable output directory
/// are fatal; a failed artifact is logged and left out of the summary.
pub fn run(config: &RunConfig) -> Result<RunSummary, AppError> {
    let (rows, load_report) = loader::load_raw(&config.input)?;
    std::fs::create_dir_all(&config.out_dir).map_err(|e| AppError::output(&config.out_dir, e))?;

    println!(
        "Processing dataset... ({} rows loaded, {} malformed rows skipped)",
        format_int(load_report.rows_read),
        format_int(load_report.malformed_rows)
    );
    print!("{}", inspect::overview_raw(&rows, config.preview_rows));

    let analysis = analyze(&rows, config.threshold);
    let report = &analysis.clean_report;
    println!(
        "\nCleaning complete: {} rows kept, {} dropped ({} bad date, {} missing well, {} missing rate); {} negative values treated as missing.",
        format_int(report.rows_out),
        format_int(report.rows_dropped()),
        format_int(report.dropped_bad_date),
        format_int(report.dropped_missing_well),
        format_int(report.dropped_missing_rate),
        format_int(report.negatives_replaced)
    );
    print!("{}", inspect::overview_records(&analysis.records, config.preview_rows));

    println!("\nAnomalies (threshold {:.1}%):", config.threshold * 100.0);
    print!("{}", anomalies::format_listing(&analysis.anomalies));

    let mut artifacts = Vec::new();
    let anomaly_rows = anomalies::to_rows(&analysis.anomalies);
    save(&mut artifacts, &config.out_dir.join(ANOMALIES_FILE), |p| {
        output::write_csv(p, &AnomalyRow::HEADERS, &anomaly_rows)
    });

    let kpi_rows = kpi::to_rows(&analysis.kpis);
    save(&mut artifacts, &config.out_dir.join(KPIS_FILE), |p| {
        output::write_csv(p, &KpiRow::HEADERS, &kpi_rows)
    });
    println!("\nWell KPI Summary:");
    output::preview_table_rows(&kpi_rows, config.preview_rows);

    if config.charts {
        let charts = charts::render_all(&analysis.records, &config.out_dir);
        info!(count = charts.len(), "charts rendered");
        artifacts.extend(charts.iter().map(|p| p.display().to_string()));
    }

    let mut summary = RunSummary {
        input: config.input.display().to_string(),
        threshold: config.threshold,
        rows_read: load_report.rows_read,
        malformed_rows: load_report.malformed_rows,
        rows_cleaned: report.rows_out,
        rows_dropped: report.rows_dropped(),
        wells: analysis.kpis.len(),
        anomalies: analysis.anomalies.len(),
        artifacts,
    };
    let summary_path = config.out_dir.join(SUMMARY_FILE);
    summary.artifacts.push(summary_path.display().to_string());
    if let Err(e) = output::write_json(&summary_path, &summary) {
        warn!("{e}");
        summary.artifacts.pop();
    }

    println!(
        "\n{} wells analysed, {} anomalies flagged. Outputs saved to {}:",
        format_int(summary.wells),
        format_int(summary.anomalies),
        config.out_dir.display()
    );
    for a in &summary.artifacts {
        println!("  {a}");
    }
    Ok(summary)
}

fn save<F>(artifacts: &mut Vec<String>, path: &Path, write: F)
where
    F: FnOnce(&Path) -> Result<(), AppError>,
{
    match write(path) {
        Ok(()) => {
            info!(path = %path.display(), "artifact written");
            artifacts.push(path.display().to_string());
        }
        Err(e) => warn!("{e}"),
    }
}

/// Paths of the fixed tabular artifacts under `out_dir`.
pub fn artifact_paths(out_dir: &Path) -> [PathBuf; 3] {
    [
        out_dir.join(ANOMALIES_FILE),
        out_dir.join(KPIS_FILE),
        out_dir.join(SUMMARY_FILE),
    ]
}
