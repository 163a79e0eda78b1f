//! Dataset overview printed before and after cleaning: a row preview and
//! descriptive statistics for each rate column.
use crate::output::render_table;
use crate::types::{ProductionRecord, RateType, RawRow};
use crate::util::{average, format_int, parse_f64_safe, quantile, std_dev};
use tabled::Tabled;

#[derive(Debug, Clone, Tabled, PartialEq)]
pub struct RateStats {
    #[tabled(rename = "column")]
    pub column: &'static str,
    pub count: usize,
    #[tabled(display_with = "display_stat")]
    pub mean: Option<f64>,
    #[tabled(display_with = "display_stat")]
    pub std: Option<f64>,
    #[tabled(display_with = "display_stat")]
    pub min: Option<f64>,
    #[tabled(rename = "25%", display_with = "display_stat")]
    pub q25: Option<f64>,
    #[tabled(rename = "50%", display_with = "display_stat")]
    pub q50: Option<f64>,
    #[tabled(rename = "75%", display_with = "display_stat")]
    pub q75: Option<f64>,
    #[tabled(display_with = "display_stat")]
    pub max: Option<f64>,
}

fn display_stat(v: &Option<f64>) -> String {
    v.map(|v| format!("{v:.2}")).unwrap_or_else(|| "NaN".to_string())
}

pub fn describe(column: &'static str, values: &[f64]) -> RateStats {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mean = (!sorted.is_empty()).then(|| average(&sorted));
    RateStats {
        column,
        count: sorted.len(),
        mean,
        std: std_dev(&sorted),
        min: sorted.first().copied(),
        q25: quantile(&sorted, 0.25),
        q50: quantile(&sorted, 0.5),
        q75: quantile(&sorted, 0.75),
        max: sorted.last().copied(),
    }
}

/// Statistics over raw rows; only values that coerce to numbers count.
pub fn describe_raw(rows: &[RawRow]) -> Vec<RateStats> {
    RateType::ALL
        .iter()
        .map(|&rate| {
            let values: Vec<f64> = rows.iter().filter_map(|r| parse_f64_safe(r.rate(rate))).collect();
            describe(rate.column(), &values)
        })
        .collect()
}

pub fn describe_records(records: &[ProductionRecord]) -> Vec<RateStats> {
    RateType::ALL
        .iter()
        .map(|&rate| {
            let values: Vec<f64> = records.iter().map(|r| r.rate(rate)).collect();
            describe(rate.column(), &values)
        })
        .collect()
}

#[derive(Tabled, Clone)]
struct PreviewRow {
    #[tabled(rename = "Well_name")]
    well_name: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Oil_rate")]
    oil_rate: String,
    #[tabled(rename = "Gas_rate")]
    gas_rate: String,
    #[tabled(rename = "Water_rate")]
    water_rate: String,
}

pub fn overview_raw(rows: &[RawRow], preview_rows: usize) -> String {
    let show = |v: &Option<String>| v.clone().unwrap_or_else(|| "NaN".to_string());
    let head: Vec<PreviewRow> = rows
        .iter()
        .take(preview_rows)
        .map(|r| PreviewRow {
            well_name: show(&r.well_name),
            date: show(&r.date),
            oil_rate: show(&r.oil_rate),
            gas_rate: show(&r.gas_rate),
            water_rate: show(&r.water_rate),
        })
        .collect();
    format_overview(rows.len(), &head, &describe_raw(rows), preview_rows)
}

pub fn overview_records(records: &[ProductionRecord], preview_rows: usize) -> String {
    let head: Vec<PreviewRow> = records
        .iter()
        .take(preview_rows)
        .map(|r| PreviewRow {
            well_name: r.well_name.clone(),
            date: r.date.to_string(),
            oil_rate: r.oil_rate.to_string(),
            gas_rate: r.gas_rate.to_string(),
            water_rate: r.water_rate.to_string(),
        })
        .collect();
    format_overview(records.len(), &head, &describe_records(records), preview_rows)
}

fn format_overview(n_rows: usize, head: &[PreviewRow], stats: &[RateStats], preview_rows: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!("\nData Overview: {} rows\n", format_int(n_rows)));
    out.push_str(&format!("\nFirst {} Rows:\n", preview_rows));
    out.push_str(&render_table(head));
    out.push_str("\nBasic Stats:\n");
    out.push_str(&render_table(stats));
    out
}
