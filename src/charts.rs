//! Trend charts rendered to SVG with Plotters.
//!
//! Series preparation is kept apart from drawing: the `*_series` / `monthly_*`
//! functions are pure and tested, the `draw_*` functions only lay out what
//! they are given.
//!
//! SVG output needs no system font libraries; text is written as `<text>`
//! nodes and laid out by the viewer.

use crate::error::AppError;
use crate::types::{group_by_well, ProductionRecord, RateType};
use crate::util::ratio;
use chrono::{Datelike, NaiveDate};
use plotters::prelude::*;
use std::collections::BTreeMap;
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const SIZE: (u32, u32) = (1000, 500);
const WATER: RGBColor = RGBColor(135, 206, 235);
const OIL: RGBColor = BLACK;
const GAS: RGBColor = RGBColor(255, 165, 0);

type DrawResult = Result<(), Box<dyn Error>>;

/// A named line, possibly broken into several segments where values are
/// undefined.
struct Line {
    name: String,
    color: RGBColor,
    segments: Vec<Vec<(NaiveDate, f64)>>,
}

/// Per-well daily values of one fluid, chronological.
pub fn daily_series(records: &[ProductionRecord], rate: RateType) -> BTreeMap<String, Vec<(NaiveDate, f64)>> {
    group_by_well(records)
        .into_iter()
        .map(|(well, group)| (well.to_string(), group.iter().map(|r| (r.date, r.rate(rate))).collect::<Vec<_>>()))
        .collect()
}

/// Per-well, per-month sums of each fluid (`[oil, gas, water]`), months as
/// `YYYY-MM`.
pub fn monthly_totals(records: &[ProductionRecord]) -> BTreeMap<String, BTreeMap<String, [f64; 3]>> {
    let mut out: BTreeMap<String, BTreeMap<String, [f64; 3]>> = BTreeMap::new();
    for r in records {
        let month = format!("{:04}-{:02}", r.date.year(), r.date.month());
        let e = out.entry(r.well_name.clone()).or_default().entry(month).or_insert([0.0; 3]);
        for (slot, rate) in e.iter_mut().zip(RateType::ALL) {
            *slot += r.rate(rate);
        }
    }
    out
}

/// Running sums of each fluid (`[oil, gas, water]`) per well, chronological.
pub fn cumulative_series(records: &[ProductionRecord]) -> BTreeMap<String, Vec<(NaiveDate, [f64; 3])>> {
    group_by_well(records)
        .into_iter()
        .map(|(well, group)| {
            let series: Vec<_> = group
                .iter()
                .scan([0.0; 3], |acc, r| {
                    for (slot, rate) in acc.iter_mut().zip(RateType::ALL) {
                        *slot += r.rate(rate);
                    }
                    Some((r.date, *acc))
                })
                .collect();
            (well.to_string(), series)
        })
        .collect()
}

/// Daily gas-oil and water-oil ratios per well; `None` on zero-oil days.
pub fn ratio_series(
    records: &[ProductionRecord],
) -> BTreeMap<String, Vec<(NaiveDate, Option<f64>, Option<f64>)>> {
    group_by_well(records)
        .into_iter()
        .map(|(well, group)| {
            let series: Vec<_> = group
                .iter()
                .map(|r| (r.date, ratio(r.gas_rate, r.oil_rate), ratio(r.water_rate, r.oil_rate)))
                .collect();
            (well.to_string(), series)
        })
        .collect()
}

/// Well names may contain characters that are unsafe in file names.
pub fn file_stem(well: &str) -> String {
    well.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Split a series at undefined values into continuous runs.
fn segments(points: impl IntoIterator<Item = (NaiveDate, Option<f64>)>) -> Vec<Vec<(NaiveDate, f64)>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for (date, v) in points {
        match v {
            Some(v) => current.push((date, v)),
            None if !current.is_empty() => out.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn palette(idx: usize) -> RGBColor {
    let (r, g, b) = Palette99::pick(idx).rgb();
    RGBColor(r, g, b)
}

/// Render every chart into `out_dir`. A failing chart is logged and skipped;
/// the paths of the charts written are returned.
pub fn render_all(records: &[ProductionRecord], out_dir: &Path) -> Vec<PathBuf> {
    let mut written = Vec::new();
    if records.is_empty() {
        return written;
    }
    let mut record = |result: Result<PathBuf, AppError>| match result {
        Ok(path) => {
            debug!(path = %path.display(), "chart saved");
            written.push(path);
        }
        Err(e) => warn!("{e}"),
    };

    for rate in RateType::ALL {
        let path = out_dir.join(format!("{}_by_well.svg", rate.column().to_lowercase()));
        record(render_daily(records, rate, &path).map(|_| path));
    }
    let monthly = monthly_totals(records);
    for (idx, rate) in RateType::ALL.into_iter().enumerate() {
        let path = out_dir.join(format!("monthly_{}_totals.svg", rate.column().to_lowercase()));
        record(render_monthly_totals(&monthly, idx, rate, &path).map(|_| path));
    }
    for (well, months) in &monthly {
        let path = out_dir.join(format!("stacked_monthly_production_{}.svg", file_stem(well)));
        record(render_stacked(well, months, &path).map(|_| path));
    }
    for (well, series) in cumulative_series(records) {
        let path = out_dir.join(format!("cumulative_production_{}.svg", file_stem(&well)));
        record(render_cumulative(&well, &series, &path).map(|_| path));
    }
    for (well, series) in ratio_series(records) {
        let path = out_dir.join(format!("ratio_trends_{}.svg", file_stem(&well)));
        record(render_ratios(&well, &series, &path).map(|_| path));
    }
    written
}

fn render_daily(records: &[ProductionRecord], rate: RateType, path: &Path) -> Result<(), AppError> {
    let lines: Vec<Line> = daily_series(records, rate)
        .into_iter()
        .enumerate()
        .map(|(idx, (well, points))| Line {
            name: well,
            color: palette(idx),
            segments: vec![points],
        })
        .collect();
    let title = format!("Daily {} Production by Well", rate.label().trim_end_matches(" Rate"));
    let y_desc = format!("{} ({})", rate.label(), rate.unit());
    draw_lines(path, &title, &y_desc, &lines).map_err(|e| AppError::chart(path, e))
}

fn render_monthly_totals(
    monthly: &BTreeMap<String, BTreeMap<String, [f64; 3]>>,
    fluid: usize,
    rate: RateType,
    path: &Path,
) -> Result<(), AppError> {
    let months: Vec<String> = {
        let mut all: Vec<String> = monthly.values().flat_map(|m| m.keys().cloned()).collect();
        all.sort();
        all.dedup();
        all
    };
    let n_wells = monthly.len().max(1) as f64;
    let width = 0.8 / n_wells;

    let mut bars = Vec::new();
    let mut legend = Vec::new();
    for (w, (well, per_month)) in monthly.iter().enumerate() {
        let color = palette(w);
        legend.push((well.clone(), color));
        for (i, month) in months.iter().enumerate() {
            if let Some(v) = per_month.get(month) {
                let left = i as f64 - 0.4 + w as f64 * width;
                bars.push(((left, 0.0), (left + width, v[fluid]), color));
            }
        }
    }
    let name = rate.label().trim_end_matches(" Rate");
    let title = format!("Monthly {name} Production by Well");
    let y_desc = format!("Total {name}");
    draw_bars(path, &title, &y_desc, &months, &bars, &legend, &[]).map_err(|e| AppError::chart(path, e))
}

fn render_stacked(well: &str, per_month: &BTreeMap<String, [f64; 3]>, path: &Path) -> Result<(), AppError> {
    let months: Vec<String> = per_month.keys().cloned().collect();
    let mut bars = Vec::new();
    let mut totals = Vec::new();
    for (i, [oil, gas, water]) in per_month.values().copied().enumerate() {
        let x = i as f64;
        // Water at the bottom, then oil, gas on top.
        bars.push(((x - 0.4, 0.0), (x + 0.4, water), WATER));
        bars.push(((x - 0.4, water), (x + 0.4, water + oil), OIL));
        bars.push(((x - 0.4, water + oil), (x + 0.4, water + oil + gas), GAS));
        let total = water + oil + gas;
        totals.push((x, total, format!("{total:.0}")));
    }
    let legend = [("Water".to_string(), WATER), ("Oil".to_string(), OIL), ("Gas".to_string(), GAS)];
    let title = format!("Monthly Stacked Production - {well}");
    draw_bars(path, &title, "Production Volume", &months, &bars, &legend, &totals)
        .map_err(|e| AppError::chart(path, e))
}

fn render_cumulative(well: &str, series: &[(NaiveDate, [f64; 3])], path: &Path) -> Result<(), AppError> {
    let line = |name: &str, color: RGBColor, idx: usize| Line {
        name: name.to_string(),
        color,
        segments: vec![series.iter().map(|(d, v)| (*d, v[idx])).collect()],
    };
    let lines = [line("Cumulative Gas", GAS, 1), line("Cumulative Oil", OIL, 0), line("Cumulative Water", WATER, 2)];
    let title = format!("Cumulative Production - {well}");
    draw_lines(path, &title, "Cumulative Volume", &lines).map_err(|e| AppError::chart(path, e))
}

fn render_ratios(well: &str, series: &[(NaiveDate, Option<f64>, Option<f64>)], path: &Path) -> Result<(), AppError> {
    let lines = [
        Line {
            name: "GOR (Gas/Oil)".to_string(),
            color: GAS,
            segments: segments(series.iter().map(|(d, gor, _)| (*d, *gor))),
        },
        Line {
            name: "WOR (Water/Oil)".to_string(),
            color: BLUE,
            segments: segments(series.iter().map(|(d, _, wor)| (*d, *wor))),
        },
    ];
    let title = format!("GOR and WOR Trends - {well}");
    draw_lines(path, &title, "Ratio", &lines).map_err(|e| AppError::chart(path, e))
}

fn date_label(days: &i32) -> String {
    NaiveDate::from_num_days_from_ce_opt(*days)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn upper_bound(max: f64) -> f64 {
    if max.is_finite() && max > 0.0 {
        max * 1.1
    } else {
        1.0
    }
}

fn draw_lines(path: &Path, title: &str, y_desc: &str, lines: &[Line]) -> DrawResult {
    let points = || lines.iter().flat_map(|l| l.segments.iter().flatten());
    let x0 = points().map(|(d, _)| d.num_days_from_ce()).min().unwrap_or(0);
    let x1 = points().map(|(d, _)| d.num_days_from_ce()).max().unwrap_or(0).max(x0 + 1);
    let y1 = upper_bound(points().map(|(_, v)| *v).fold(0.0, f64::max));

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 22))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(70)
        .build_cartesian_2d(x0..x1, 0f64..y1)?;

    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc(y_desc)
        .x_labels(8)
        .x_label_formatter(&date_label)
        .draw()?;

    for line in lines {
        let color = line.color;
        chart
            .draw_series(LineSeries::new(std::iter::empty::<(i32, f64)>(), color.stroke_width(2)))?
            .label(line.name.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
        for seg in &line.segments {
            let pts = seg.iter().map(|(d, v)| (d.num_days_from_ce(), *v));
            chart.draw_series(LineSeries::new(pts, color.stroke_width(2)))?;
        }
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

type Bar = ((f64, f64), (f64, f64), RGBColor);

fn draw_bars(
    path: &Path,
    title: &str,
    y_desc: &str,
    months: &[String],
    bars: &[Bar],
    legend: &[(String, RGBColor)],
    labels: &[(f64, f64, String)],
) -> DrawResult {
    let n = months.len().max(1) as f64;
    let y1 = upper_bound(bars.iter().map(|(_, (_, top), _)| *top).fold(0.0, f64::max));

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 22))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(70)
        .build_cartesian_2d(-0.5f64..(n - 0.5), 0f64..y1)?;

    let month_label = |v: &f64| {
        let idx = v.round();
        if (v - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        months.get(idx as usize).cloned().unwrap_or_default()
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Month")
        .y_desc(y_desc)
        .x_labels(months.len().max(2))
        .x_label_formatter(&month_label)
        .draw()?;

    chart.draw_series(bars.iter().map(|&(a, b, color)| Rectangle::new([a, b], color.filled())))?;
    for (name, color) in legend {
        let color = *color;
        chart
            .draw_series(std::iter::empty::<Rectangle<(f64, f64)>>())?
            .label(name.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
    }
    chart.draw_series(labels.iter().map(|(x, y, text)| {
        Text::new(text.clone(), (*x - 0.1, *y + y1 * 0.03), ("sans-serif", 12).into_font())
    }))?;

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}
