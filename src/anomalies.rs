use crate::types::{group_by_well, AnomalyEvent, AnomalyRow, ProductionRecord, RateType};
use crate::util::{format_number, round_to};

/// Scan every well's chronological records for day-over-day rate jumps.
///
/// For each adjacent pair and each fluid the change is
/// `(current - previous) / previous`; a pair is flagged when
/// `|change| > threshold`. A zero previous value leaves the change undefined
/// and the pair is never flagged. The first record of a well has no
/// predecessor and is never flagged either.
///
/// Events come out grouped by well (ascending name), then by date, then by
/// fluid in oil/gas/water order.
pub fn detect(records: &[ProductionRecord], threshold: f64) -> Vec<AnomalyEvent> {
    let mut events = Vec::new();
    for group in group_by_well(records).values() {
        for pair in group.windows(2) {
            let (prev, curr) = (pair[0], pair[1]);
            for rate in RateType::ALL {
                let Some(change) = relative_change(prev.rate(rate), curr.rate(rate)) else {
                    continue;
                };
                if change.abs() > threshold {
                    events.push(AnomalyEvent {
                        well_name: curr.well_name.clone(),
                        date: curr.date,
                        rate_type: rate,
                        current_rate: curr.rate(rate),
                        previous_rate: prev.rate(rate),
                        change_fraction: change,
                    });
                }
            }
        }
    }
    events
}

fn relative_change(previous: f64, current: f64) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }
    Some((current - previous) / previous).filter(|c| c.is_finite())
}

impl AnomalyEvent {
    /// Change as a percentage rounded to one decimal.
    pub fn change_pct(&self) -> f64 {
        round_to(self.change_fraction * 100.0, 1)
    }
}

pub fn to_rows(events: &[AnomalyEvent]) -> Vec<AnomalyRow> {
    events
        .iter()
        .map(|e| AnomalyRow {
            well_name: e.well_name.clone(),
            date: e.date,
            rate_type: e.rate_type,
            current_rate: round_to(e.current_rate, 2),
            previous_rate: round_to(e.previous_rate, 2),
            change_pct: e.change_pct(),
        })
        .collect()
}

/// Console listing of detected anomalies.
pub fn format_listing(events: &[AnomalyEvent]) -> String {
    if events.is_empty() {
        return "\n<   No anomalies detected based on the given threshold.   >\n".to_string();
    }
    let mut out = format!("\n<   Detected Anomalies! ({})   >\n\n", events.len());
    for row in to_rows(events) {
        out.push_str(&format!(
            "Well: {} | Date: {} | Type: {}\n",
            row.well_name, row.date, row.rate_type
        ));
        out.push_str(&format!(
            "  ➤  {}: {} | Change: {:.1}%\n",
            row.rate_type.label(),
            format_number(row.current_rate, 2),
            row.change_pct
        ));
        out.push_str(&format!("  ➤  Previous Day: {}\n\n", format_number(row.previous_rate, 2)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate};

    fn rec(well: &str, day: u32, oil: f64, gas: f64, water: f64) -> ProductionRecord {
        ProductionRecord {
            well_name: well.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            oil_rate: oil,
            gas_rate: gas,
            water_rate: water,
        }
    }

    #[test]
    fn flags_change_above_threshold() {
        let data = vec![rec("A1", 1, 100.0, 500.0, 10.0), rec("A1", 2, 130.0, 500.0, 10.0)];
        let events = detect(&data, 0.2);
        assert_eq!(events.len(), 1);
        let e = &events[0];
        assert_eq!(e.well_name, "A1");
        assert_eq!(e.date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(e.rate_type, RateType::Oil);
        assert_eq!(e.change_pct(), 30.0);
        assert_eq!(e.previous_rate, 100.0);
        assert_eq!(e.current_rate, 130.0);

        assert!(detect(&data, 0.35).is_empty());
    }

    #[test]
    fn threshold_is_exclusive() {
        let data = vec![rec("A1", 1, 100.0, 1.0, 1.0), rec("A1", 2, 130.0, 1.0, 1.0)];
        assert!(detect(&data, 0.3).is_empty());
    }

    #[test]
    fn drops_are_flagged_with_negative_change() {
        let data = vec![rec("A1", 1, 100.0, 1.0, 1.0), rec("A1", 2, 40.0, 1.0, 1.0)];
        let events = detect(&data, 0.3);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].change_pct(), -60.0);
    }

    #[test]
    fn single_record_well_never_flags() {
        let data = vec![rec("Solo", 1, 100.0, 500.0, 10.0)];
        assert!(detect(&data, 0.0).is_empty());
    }

    #[test]
    fn zero_previous_value_is_skipped() {
        let data = vec![rec("A1", 1, 0.0, 0.0, 10.0), rec("A1", 2, 500.0, 0.0, 10.0)];
        assert!(detect(&data, 0.1).is_empty());

        // The zero pair is skipped, the following pair is still judged.
        let data = vec![
            rec("A1", 1, 0.0, 1.0, 1.0),
            rec("A1", 2, 50.0, 1.0, 1.0),
            rec("A1", 3, 100.0, 1.0, 1.0),
        ];
        let events = detect(&data, 0.5);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].date.day(), 3);
        assert_eq!(events[0].change_pct(), 100.0);
    }

    #[test]
    fn unsorted_input_is_compared_chronologically() {
        let data = vec![
            rec("A1", 3, 100.0, 1.0, 1.0),
            rec("A1", 1, 100.0, 1.0, 1.0),
            rec("A1", 2, 200.0, 1.0, 1.0),
        ];
        let events = detect(&data, 0.3);
        let got: Vec<(u32, f64)> = events.iter().map(|e| (e.date.day(), e.change_pct())).collect();
        assert_eq!(got, vec![(2, 100.0), (3, -50.0)]);
    }

    #[test]
    fn ordering_is_well_then_date_then_fluid() {
        let data = vec![
            rec("B", 1, 10.0, 10.0, 10.0),
            rec("B", 2, 20.0, 20.0, 10.0),
            rec("A", 2, 10.0, 10.0, 50.0),
            rec("A", 1, 10.0, 10.0, 10.0),
            rec("A", 3, 50.0, 10.0, 50.0),
        ];
        let events = detect(&data, 0.3);
        let got: Vec<(&str, u32, RateType)> =
            events.iter().map(|e| (e.well_name.as_str(), e.date.day(), e.rate_type)).collect();
        assert_eq!(
            got,
            vec![
                ("A", 2, RateType::Water),
                ("A", 3, RateType::Oil),
                ("B", 2, RateType::Oil),
                ("B", 2, RateType::Gas),
            ]
        );
    }

    #[test]
    fn zero_threshold_flags_every_nonzero_change() {
        let data = vec![rec("A1", 1, 100.0, 5.0, 1.0), rec("A1", 2, 100.5, 5.0, 1.0)];
        let events = detect(&data, 0.0);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].rate_type, RateType::Oil);
    }

    #[test]
    fn report_rows_round_values() {
        let data = vec![rec("A1", 1, 3.0, 1.0, 1.0), rec("A1", 2, 10.123456, 1.0, 1.0)];
        let rows = to_rows(&detect(&data, 0.3));
        assert_eq!(rows[0].current_rate, 10.12);
        assert_eq!(rows[0].previous_rate, 3.0);
        assert_eq!(rows[0].change_pct, 237.4);
    }

    #[test]
    fn listing_mentions_each_event() {
        let data = vec![rec("A1", 1, 100.0, 1.0, 1.0), rec("A1", 2, 130.0, 1.0, 1.0)];
        let text = format_listing(&detect(&data, 0.2));
        assert!(text.contains("Detected Anomalies! (1)"));
        assert!(text.contains("Well: A1 | Date: 2024-01-02 | Type: Oil_rate"));
        assert!(text.contains("Change: 30.0%"));
        assert!(format_listing(&[]).contains("No anomalies detected"));
    }

    #[test]
    fn empty_dataset_gives_no_events() {
        assert!(detect(&[], 0.3).is_empty());
    }
}
