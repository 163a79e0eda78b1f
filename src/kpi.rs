use crate::types::{KpiRow, ProductionRecord, WellKpi};
use crate::util::{inclusive_days, ratio, round_to};
use std::collections::BTreeMap;

/// Compute one KPI entry per well, ordered by well name.
///
/// "Cumulative" values are plain sums of the per-record rates; no rate-times-
/// elapsed-time integration is done. Ratios with a zero denominator are `None`.
pub fn aggregate(records: &[ProductionRecord]) -> Vec<WellKpi> {
    #[derive(Default)]
    struct Acc {
        count: usize,
        first: Option<chrono::NaiveDate>,
        last: Option<chrono::NaiveDate>,
        oil: f64,
        gas: f64,
        water: f64,
    }

    let mut map: BTreeMap<&str, Acc> = BTreeMap::new();
    for r in records {
        let e = map.entry(r.well_name.as_str()).or_default();
        e.count += 1;
        e.first = Some(e.first.map_or(r.date, |d| d.min(r.date)));
        e.last = Some(e.last.map_or(r.date, |d| d.max(r.date)));
        e.oil += r.oil_rate;
        e.gas += r.gas_rate;
        e.water += r.water_rate;
    }

    map.into_iter()
        .filter_map(|(well, acc)| {
            let (first, last) = (acc.first?, acc.last?);
            let n = acc.count as f64;
            Some(WellKpi {
                well_name: well.to_string(),
                production_days: inclusive_days(first, last),
                first_production: first,
                last_production: last,
                cum_oil: acc.oil,
                cum_gas: acc.gas,
                cum_water: acc.water,
                avg_oil_rate: acc.oil / n,
                avg_gas_rate: acc.gas / n,
                avg_water_rate: acc.water / n,
                water_cut_pct: ratio(acc.water, acc.oil + acc.water).map(|f| f * 100.0),
                gas_oil_ratio: ratio(acc.gas, acc.oil),
            })
        })
        .collect()
}

/// Report rows with every float rounded to two decimals.
pub fn to_rows(kpis: &[WellKpi]) -> Vec<KpiRow> {
    kpis.iter()
        .map(|k| KpiRow {
            well_name: k.well_name.clone(),
            production_days: k.production_days,
            first_production: k.first_production,
            last_production: k.last_production,
            cum_oil: round_to(k.cum_oil, 2),
            cum_gas: round_to(k.cum_gas, 2),
            cum_water: round_to(k.cum_water, 2),
            avg_oil_rate: round_to(k.avg_oil_rate, 2),
            avg_gas_rate: round_to(k.avg_gas_rate, 2),
            avg_water_rate: round_to(k.avg_water_rate, 2),
            water_cut: k.water_cut_pct.map(|v| round_to(v, 2)),
            gas_oil_ratio: k.gas_oil_ratio.map(|v| round_to(v, 2)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rec(well: &str, (y, m, d): (i32, u32, u32), oil: f64, gas: f64, water: f64) -> ProductionRecord {
        ProductionRecord {
            well_name: well.to_string(),
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            oil_rate: oil,
            gas_rate: gas,
            water_rate: water,
        }
    }

    #[test]
    fn one_row_per_well_sorted_by_name() {
        let data = vec![
            rec("B2", (2024, 1, 1), 1.0, 1.0, 1.0),
            rec("A1", (2024, 1, 2), 1.0, 1.0, 1.0),
            rec("B2", (2024, 1, 3), 1.0, 1.0, 1.0),
            rec("A1", (2024, 1, 1), 1.0, 1.0, 1.0),
            rec("C3", (2024, 1, 1), 1.0, 1.0, 1.0),
        ];
        let kpis = aggregate(&data);
        let names: Vec<&str> = kpis.iter().map(|k| k.well_name.as_str()).collect();
        assert_eq!(names, vec!["A1", "B2", "C3"]);
    }

    #[test]
    fn production_days_is_inclusive_span_with_gaps() {
        let data = vec![
            rec("A1", (2024, 1, 5), 10.0, 0.0, 0.0),
            rec("A1", (2024, 1, 1), 10.0, 0.0, 0.0),
        ];
        let k = &aggregate(&data)[0];
        assert_eq!(k.production_days, 5);
        assert_eq!(k.first_production, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(k.last_production, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
    }

    #[test]
    fn sums_averages_and_ratios() {
        let data = vec![
            rec("A1", (2024, 1, 1), 100.0, 500.0, 10.0),
            rec("A1", (2024, 1, 2), 110.0, 510.0, 12.0),
        ];
        let k = &aggregate(&data)[0];
        assert_eq!(k.cum_oil, 210.0);
        assert_eq!(k.cum_gas, 1010.0);
        assert_eq!(k.cum_water, 22.0);
        assert_eq!(k.avg_oil_rate, 105.0);
        assert_eq!(k.avg_water_rate, 11.0);
        let wc = k.water_cut_pct.unwrap();
        assert!((wc - 22.0 / 232.0 * 100.0).abs() < 1e-9);
        let gor = k.gas_oil_ratio.unwrap();
        assert!((gor - 1010.0 / 210.0).abs() < 1e-9);

        let row = &to_rows(&aggregate(&data))[0];
        assert_eq!(row.water_cut, Some(9.48));
        assert_eq!(row.gas_oil_ratio, Some(4.81));
    }

    #[test]
    fn zero_denominators_are_undefined_not_errors() {
        let data = vec![rec("Dry", (2024, 1, 1), 0.0, 50.0, 0.0)];
        let k = &aggregate(&data)[0];
        assert_eq!(k.water_cut_pct, None);
        assert_eq!(k.gas_oil_ratio, None);

        let wet = vec![rec("Wet", (2024, 1, 1), 0.0, 0.0, 5.0)];
        let k = &aggregate(&wet)[0];
        assert_eq!(k.water_cut_pct, Some(100.0));
        assert_eq!(k.gas_oil_ratio, None);
    }

    #[test]
    fn empty_dataset_gives_no_rows() {
        assert!(aggregate(&[]).is_empty());
        assert!(to_rows(&[]).is_empty());
    }
}
