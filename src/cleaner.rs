use crate::types::{ProductionRecord, RateType, RawRow};
use crate::util::{parse_date_safe, parse_f64_safe};
use tracing::info;

/// Counts describing what cleaning did. Drops are outcomes, not errors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanReport {
    pub rows_in: usize,
    pub rows_out: usize,
    pub dropped_bad_date: usize,
    pub dropped_missing_well: usize,
    pub dropped_missing_rate: usize,
    pub negatives_replaced: usize,
}

impl CleanReport {
    pub fn rows_dropped(&self) -> usize {
        self.rows_in - self.rows_out
    }
}

/// Validate raw rows into production records.
///
/// A row survives only with a well name, a parseable date and all three rates
/// numeric and non-negative. Negative rates are physically invalid and are
/// treated exactly like a missing value. Input order is kept.
pub fn clean(rows: &[RawRow]) -> (Vec<ProductionRecord>, CleanReport) {
    let mut report = CleanReport { rows_in: rows.len(), ..CleanReport::default() };
    let mut records = Vec::with_capacity(rows.len());

    for row in rows {
        let Some(date) = parse_date_safe(row.date.as_deref()) else {
            report.dropped_bad_date += 1;
            continue;
        };
        // Only a blank name is missing; NA markers apply to values, and `-` or
        // `None` can be real well names.
        let Some(well_name) = row.well_name.as_deref().map(str::trim).filter(|w| !w.is_empty()) else {
            report.dropped_missing_well += 1;
            continue;
        };

        let mut rates = [None; 3];
        for (slot, rate) in rates.iter_mut().zip(RateType::ALL) {
            *slot = match parse_f64_safe(row.rate(rate)) {
                Some(v) if v < 0.0 => {
                    report.negatives_replaced += 1;
                    None
                }
                other => other,
            };
        }
        let [Some(oil_rate), Some(gas_rate), Some(water_rate)] = rates else {
            report.dropped_missing_rate += 1;
            continue;
        };

        records.push(ProductionRecord {
            well_name: well_name.to_string(),
            date,
            oil_rate,
            gas_rate,
            water_rate,
        });
    }

    report.rows_out = records.len();
    info!(
        rows_in = report.rows_in,
        rows_out = report.rows_out,
        bad_date = report.dropped_bad_date,
        missing_rate = report.dropped_missing_rate,
        "cleaned production data"
    );
    (records, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn raw(well: &str, date: &str, oil: &str, gas: &str, water: &str) -> RawRow {
        let field = |s: &str| if s.is_empty() { None } else { Some(s.to_string()) };
        RawRow {
            well_name: field(well),
            date: field(date),
            oil_rate: field(oil),
            gas_rate: field(gas),
            water_rate: field(water),
        }
    }

    #[test]
    fn valid_rows_pass_through() {
        let rows = vec![
            raw("A1", "2024-01-01", "100", "500", "10"),
            raw("A1", "2024-01-02", "110", "510", "12"),
            raw("A2", "2024-01-01", "95", "480", "9"),
        ];
        let (records, report) = clean(&rows);
        assert_eq!(records.len(), 3);
        assert_eq!(report.rows_dropped(), 0);
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(records[2].oil_rate, 95.0);
    }

    #[test]
    fn negative_rate_and_bad_date_rows_are_dropped() {
        let rows = vec![
            raw("A1", "2024-01-01", "100", "500", "10"),
            raw("A1", "2024-01-02", "-5", "510", "12"),
            raw("A1", "yesterday", "100", "500", "10"),
            raw("A2", "2024-01-01", "95", "480", "9"),
        ];
        let (records, report) = clean(&rows);
        assert_eq!(records.len(), 2);
        assert_eq!(report.dropped_bad_date, 1);
        assert_eq!(report.dropped_missing_rate, 1);
        assert_eq!(report.negatives_replaced, 1);
        assert_eq!(report.rows_out, 2);
    }

    #[test]
    fn missing_or_non_numeric_rates_drop_the_row() {
        let rows = vec![
            raw("A1", "2024-01-01", "NA", "500", "10"),
            raw("A1", "2024-01-02", "100", "", "12"),
            raw("A1", "2024-01-03", "100", "500", "lots"),
            raw("A1", "2024-01-04", "0", "0", "0"),
        ];
        let (records, report) = clean(&rows);
        assert_eq!(records.len(), 1);
        assert_eq!(report.dropped_missing_rate, 3);
        assert_eq!(records[0].oil_rate, 0.0);
    }

    #[test]
    fn blank_well_name_is_dropped() {
        let (records, report) = clean(&[raw(" ", "2024-01-01", "1", "2", "3")]);
        assert!(records.is_empty());
        assert_eq!(report.dropped_missing_well, 1);
    }

    #[test]
    fn na_like_well_names_are_kept() {
        let rows = vec![raw("-", "2024-01-01", "1", "2", "3"), raw(" None ", "2024-01-01", "1", "2", "3")];
        let (records, report) = clean(&rows);
        assert_eq!(report.dropped_missing_well, 0);
        let names: Vec<&str> = records.iter().map(|r| r.well_name.as_str()).collect();
        assert_eq!(names, vec!["-", "None"]);
    }

    #[test]
    fn two_digit_year_dates_give_the_right_span() {
        let rows = vec![raw("A1", "01/01/24", "100", "500", "10"), raw("A1", "01/05/24", "90", "500", "10")];
        let (records, report) = clean(&rows);
        assert_eq!(report.rows_out, 2);
        let kpis = crate::kpi::aggregate(&records);
        assert_eq!(kpis[0].first_production, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(kpis[0].last_production, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(kpis[0].production_days, 5);
    }

    #[test]
    fn output_has_no_negative_or_missing_values() {
        let rows = vec![
            raw("A1", "2024-01-01", "1.5", "-0.1", "3"),
            raw("B", "01/15/2024", "2", "3", "4"),
            raw("C", "2024-13-01", "2", "3", "4"),
        ];
        let (records, _) = clean(&rows);
        assert_eq!(records.len(), 1);
        for r in &records {
            for rate in RateType::ALL {
                assert!(r.rate(rate) >= 0.0 && r.rate(rate).is_finite());
            }
        }
    }

    #[test]
    fn cleaning_is_idempotent() {
        let rows = vec![
            raw("A1", "2024-01-01", "100.25", "500", "10"),
            raw("A1", "2024/01/02", "-1", "500", "10"),
            raw("A2", "2024-01-03 06:00:00", "0.1", "1e2", "0"),
        ];
        let (once, _) = clean(&rows);
        let back: Vec<RawRow> = once.iter().map(RawRow::from).collect();
        let (twice, report) = clean(&back);
        assert_eq!(once, twice);
        assert_eq!(report.rows_dropped(), 0);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        let (records, report) = clean(&[]);
        assert!(records.is_empty());
        assert_eq!(report, CleanReport::default());
    }
}
