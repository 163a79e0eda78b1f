// Utility helpers for parsing and basic statistics.
//
// All the "dirty" CSV value handling lives here so the cleaner and the
// aggregations can work with typed values only.
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};

/// Markers that mean "no value" in production exports.
const NA_MARKERS: [&str; 10] = ["NA", "N/A", "n/a", "null", "NULL", "NaN", "nan", "#N/A", "None", "-"];

const DATE_FORMATS: [&str; 9] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%Y%m%d",
    "%d %b %Y",
    "%b %d, %Y",
    "%m/%d/%y",
    "%m-%d-%y",
];

const DATETIME_FORMATS: [&str; 4] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M", "%m/%d/%Y %H:%M"];

// chrono's `%Y` takes one to four digits, so `01/02/24` would otherwise
// match a four-digit-year format as year 1.
const MIN_YEAR: i32 = 1000;

/// Trim a field and map blanks and NA markers to `None`.
pub fn non_missing(s: Option<&str>) -> Option<&str> {
    let s = s?.trim();
    if s.is_empty() || NA_MARKERS.contains(&s) {
        return None;
    }
    Some(s)
}

/// Coerce a field to a finite `f64`.
///
/// - Trims whitespace and honours the NA markers.
/// - Accepts standard float syntax (`12`, `-3.5`, `1e3`).
/// - Non-finite results (`inf`, `NaN`) count as missing.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = non_missing(s)?;
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDate> {
    let s = non_missing(s)?;
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok().filter(|d| d.year() >= MIN_YEAR))
        .or_else(|| {
            // Timestamps keep only their calendar day.
            DATETIME_FORMATS.iter().find_map(|fmt| {
                NaiveDateTime::parse_from_str(s, fmt)
                    .ok()
                    .map(|dt| dt.date())
                    .filter(|d| d.year() >= MIN_YEAR)
            })
        })
}

/// Inclusive number of calendar days between two dates.
pub fn inclusive_days(first: NaiveDate, last: NaiveDate) -> i64 {
    (last - first).num_days() + 1
}

pub fn round_to(v: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (v * factor).round() / factor
}

/// `numerator / denominator`, or `None` when the denominator is zero or the
/// result is not finite.
pub fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    Some(numerator / denominator).filter(|v| v.is_finite())
}

/// Mean of `v`, or 0.0 for no values (a well always has at least one record).
pub fn average(v: &[f64]) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

/// Sample standard deviation (n - 1). `None` below two values.
pub fn std_dev(v: &[f64]) -> Option<f64> {
    if v.len() < 2 {
        return None;
    }
    let mean = average(v);
    let ss: f64 = v.iter().map(|x| (x - mean).powi(2)).sum();
    Some((ss / (v.len() - 1) as f64).sqrt())
}

/// Quantile with linear interpolation between closest ranks. `sorted` must be
/// ascending.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus thousands separators, e.g. `1,234,567.89`.
    if !n.is_finite() {
        return "NaN".to_string();
    }
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Row and well counts, e.g. `12,480 rows loaded`.
    n.to_formatted_string(&Locale::en)
}

pub fn display_2dp(v: &f64) -> String {
    format_number(*v, 2)
}

pub fn display_opt_2dp(v: &Option<f64>) -> String {
    match v {
        Some(v) => format_number(*v, 2),
        None => "NaN".to_string(),
    }
}
