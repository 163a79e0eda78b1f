use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tabled::Tabled;

use crate::util::{display_2dp, display_opt_2dp};

/// Required CSV columns, in the order they are reported when missing.
pub const REQUIRED_COLUMNS: [&str; 5] = ["Well_name", "Date", "Oil_rate", "Gas_rate", "Water_rate"];

/// One CSV row exactly as read. Every field stays textual so that bad values
/// survive loading and are judged by the cleaner.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct RawRow {
    #[serde(rename = "Well_name")]
    pub well_name: Option<String>,
    #[serde(rename = "Date")]
    pub date: Option<String>,
    #[serde(rename = "Oil_rate")]
    pub oil_rate: Option<String>,
    #[serde(rename = "Gas_rate")]
    pub gas_rate: Option<String>,
    #[serde(rename = "Water_rate")]
    pub water_rate: Option<String>,
}

impl RawRow {
    pub fn rate(&self, rate: RateType) -> Option<&str> {
        match rate {
            RateType::Oil => self.oil_rate.as_deref(),
            RateType::Gas => self.gas_rate.as_deref(),
            RateType::Water => self.water_rate.as_deref(),
        }
    }
}

/// A validated daily production record: parsed date, non-negative finite rates.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionRecord {
    pub well_name: String,
    pub date: NaiveDate,
    pub oil_rate: f64,
    pub gas_rate: f64,
    pub water_rate: f64,
}

impl ProductionRecord {
    pub fn rate(&self, rate: RateType) -> f64 {
        match rate {
            RateType::Oil => self.oil_rate,
            RateType::Gas => self.gas_rate,
            RateType::Water => self.water_rate,
        }
    }
}

/// Records grouped per well (ascending name), each group sorted by date.
/// The sort is stable, so same-day records keep their input order.
pub fn group_by_well(records: &[ProductionRecord]) -> BTreeMap<&str, Vec<&ProductionRecord>> {
    let mut by_well: BTreeMap<&str, Vec<&ProductionRecord>> = BTreeMap::new();
    for r in records {
        by_well.entry(r.well_name.as_str()).or_default().push(r);
    }
    for group in by_well.values_mut() {
        group.sort_by_key(|r| r.date);
    }
    by_well
}

impl From<&ProductionRecord> for RawRow {
    fn from(r: &ProductionRecord) -> Self {
        RawRow {
            well_name: Some(r.well_name.clone()),
            date: Some(r.date.format("%Y-%m-%d").to_string()),
            oil_rate: Some(r.oil_rate.to_string()),
            gas_rate: Some(r.gas_rate.to_string()),
            water_rate: Some(r.water_rate.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum RateType {
    #[serde(rename = "Oil_rate")]
    Oil,
    #[serde(rename = "Gas_rate")]
    Gas,
    #[serde(rename = "Water_rate")]
    Water,
}

impl RateType {
    pub const ALL: [RateType; 3] = [RateType::Oil, RateType::Gas, RateType::Water];

    /// CSV column name, also used as the anomaly `Type` value.
    pub fn column(self) -> &'static str {
        match self {
            RateType::Oil => "Oil_rate",
            RateType::Gas => "Gas_rate",
            RateType::Water => "Water_rate",
        }
    }

    /// Human label, e.g. "Oil Rate".
    pub fn label(self) -> &'static str {
        match self {
            RateType::Oil => "Oil Rate",
            RateType::Gas => "Gas Rate",
            RateType::Water => "Water Rate",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            RateType::Oil | RateType::Water => "STB/day",
            RateType::Gas => "MSCF/day",
        }
    }
}

impl fmt::Display for RateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Per-well summary, unrounded. `water_cut_pct` and `gas_oil_ratio` are
/// `None` when their denominator is zero.
#[derive(Debug, Clone, PartialEq)]
pub struct WellKpi {
    pub well_name: String,
    pub production_days: i64,
    pub first_production: NaiveDate,
    pub last_production: NaiveDate,
    pub cum_oil: f64,
    pub cum_gas: f64,
    pub cum_water: f64,
    pub avg_oil_rate: f64,
    pub avg_gas_rate: f64,
    pub avg_water_rate: f64,
    pub water_cut_pct: Option<f64>,
    pub gas_oil_ratio: Option<f64>,
}

/// A day-over-day change beyond the threshold for one well and fluid.
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyEvent {
    pub well_name: String,
    pub date: NaiveDate,
    pub rate_type: RateType,
    pub current_rate: f64,
    pub previous_rate: f64,
    pub change_fraction: f64,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct KpiRow {
    #[serde(rename = "Well_name")]
    #[tabled(rename = "Well_name")]
    pub well_name: String,
    pub production_days: i64,
    pub first_production: NaiveDate,
    pub last_production: NaiveDate,
    #[tabled(display_with = "display_2dp")]
    pub cum_oil: f64,
    #[tabled(display_with = "display_2dp")]
    pub cum_gas: f64,
    #[tabled(display_with = "display_2dp")]
    pub cum_water: f64,
    #[tabled(display_with = "display_2dp")]
    pub avg_oil_rate: f64,
    #[tabled(display_with = "display_2dp")]
    pub avg_gas_rate: f64,
    #[tabled(display_with = "display_2dp")]
    pub avg_water_rate: f64,
    #[serde(rename = "water_cut (%)")]
    #[tabled(rename = "water_cut (%)", display_with = "display_opt_2dp")]
    pub water_cut: Option<f64>,
    #[serde(rename = "gas_oil_ratio (scf/stb)")]
    #[tabled(rename = "gas_oil_ratio (scf/stb)", display_with = "display_opt_2dp")]
    pub gas_oil_ratio: Option<f64>,
}

impl KpiRow {
    pub const HEADERS: [&'static str; 12] = [
        "Well_name",
        "production_days",
        "first_production",
        "last_production",
        "cum_oil",
        "cum_gas",
        "cum_water",
        "avg_oil_rate",
        "avg_gas_rate",
        "avg_water_rate",
        "water_cut (%)",
        "gas_oil_ratio (scf/stb)",
    ];
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct AnomalyRow {
    #[serde(rename = "Well_name")]
    #[tabled(rename = "Well_name")]
    pub well_name: String,
    #[serde(rename = "Date")]
    #[tabled(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Type")]
    #[tabled(rename = "Type")]
    pub rate_type: RateType,
    #[serde(rename = "Current Rate")]
    #[tabled(rename = "Current Rate")]
    pub current_rate: f64,
    #[serde(rename = "Previous Rate")]
    #[tabled(rename = "Previous Rate")]
    pub previous_rate: f64,
    #[serde(rename = "Change (%)")]
    #[tabled(rename = "Change (%)")]
    pub change_pct: f64,
}

impl AnomalyRow {
    pub const HEADERS: [&'static str; 6] =
        ["Well_name", "Date", "Type", "Current Rate", "Previous Rate", "Change (%)"];
}

/// Machine-readable record of one run, written as `run_summary.json`.
#[derive(Debug, Serialize, Clone, Default)]
pub struct RunSummary {
    pub input: String,
    pub threshold: f64,
    pub rows_read: usize,
    pub malformed_rows: usize,
    pub rows_cleaned: usize,
    pub rows_dropped: usize,
    pub wells: usize,
    pub anomalies: usize,
    pub artifacts: Vec<String>,
}
