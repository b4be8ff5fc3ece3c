use chrono::{Datelike, NaiveDate};

/// Full-date formats tried first.
pub const DAY_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];

/// Month-granularity formats. The day is pinned to the 1st before parsing,
/// so each entry carries a leading `%d`.
pub const MONTH_FORMATS: &[&str] = &[
    "%d %Y-%m",
    "%d %Y/%m",
    "%d %m/%Y",
    "%d %b %Y",
    "%d %b-%Y",
    "%d %b-%y",
    "%d %B %Y",
    "%d %B-%Y",
];

/// Parse a reporting-period label to the first day of the period.
///
/// Recognises days (`2024-03-15`), months (`2024-03`, `03/2024`,
/// `Mar 2024`, `March 2024`), quarters (`2024-Q1`, `Q1 2024`) and years
/// (`2024`, `FY2024`).
pub fn parse_period(label: &str) -> Option<NaiveDate> {
    let s = label.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in DAY_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }

    let pinned = format!("01 {s}");
    for fmt in MONTH_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(&pinned, fmt) {
            return Some(d);
        }
    }

    if let Some(d) = parse_quarter(s) {
        return Some(d);
    }

    let year = s
        .strip_prefix("FY")
        .or_else(|| s.strip_prefix("fy"))
        .unwrap_or(s)
        .trim();
    if year.len() == 4 {
        if let Ok(y) = year.parse::<i32>() {
            return NaiveDate::from_ymd_opt(y, 1, 1);
        }
    }

    None
}

fn parse_quarter(s: &str) -> Option<NaiveDate> {
    let upper = s.to_uppercase();
    let (year_part, quarter_part) = if let Some((y, q)) = upper.split_once("-Q") {
        (y.trim().to_string(), q.trim().to_string())
    } else if let Some(rest) = upper.strip_prefix('Q') {
        let (q, y) = rest.split_once(|c: char| c == ' ' || c == '-')?;
        (y.trim().to_string(), q.trim().to_string())
    } else {
        return None;
    };

    let year: i32 = year_part.parse().ok()?;
    let quarter: u32 = quarter_part.parse().ok()?;
    if !(1..=4).contains(&quarter) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, (quarter - 1) * 3 + 1, 1)
}

/// Format a period start as `Mon YYYY`.
pub fn format_period(date: NaiveDate) -> String {
    date.format("%b %Y").to_string()
}

/// `Mon YYYY to Mon YYYY` for the first and last labels, when both parse.
pub fn describe_span(labels: &[String]) -> Option<String> {
    let first = parse_period(labels.first()?)?;
    let last = parse_period(labels.last()?)?;
    if first == last {
        Some(format_period(first))
    } else {
        Some(format!("{} to {}", format_period(first), format_period(last)))
    }
}

/// Days since the Unix epoch, used as the chart x coordinate for dated periods.
pub fn period_ordinal(date: NaiveDate) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
    (date - epoch).num_days() as f64
}

/// Format a chart x coordinate (days since epoch) back to `Mon YYYY`.
pub fn format_ordinal(days: f64) -> String {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
    let shifted = chrono::TimeDelta::try_days(days.round() as i64)
        .and_then(|delta| epoch.checked_add_signed(delta));
    match shifted {
        Some(d) => format!("{} {}", month_abbrev(d.month()), d.year()),
        None => format!("{days:.0}"),
    }
}

fn month_abbrev(month: u32) -> &'static str {
    const NAMES: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    NAMES[((month.max(1) - 1) % 12) as usize]
}

/// Permutation that orders `labels` chronologically, or `None` when any
/// label fails to parse (callers then keep document order).
pub fn chronological_order(labels: &[String]) -> Option<Vec<usize>> {
    let dates: Vec<NaiveDate> = labels
        .iter()
        .map(|l| parse_period(l))
        .collect::<Option<Vec<_>>>()?;
    let mut order: Vec<usize> = (0..labels.len()).collect();
    // Stable, so equal dates keep their document order.
    order.sort_by_key(|&i| dates[i]);
    Some(order)
}

/// Sort labels chronologically when every one parses; otherwise return them unchanged.
pub fn sort_periods(labels: &[String]) -> Vec<String> {
    match chronological_order(labels) {
        Some(order) => order.into_iter().map(|i| labels[i].clone()).collect(),
        None => labels.to_vec(),
    }
}

/// Whether every label in the column looks like a period.
pub fn all_periods(labels: &[String]) -> bool {
    !labels.is_empty() && labels.iter().all(|l| parse_period(l).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_common_period_labels() {
        assert_eq!(parse_period("2024-03"), Some(ymd(2024, 3, 1)));
        assert_eq!(parse_period("2024-03-15"), Some(ymd(2024, 3, 15)));
        assert_eq!(parse_period("2024/11"), Some(ymd(2024, 11, 1)));
        assert_eq!(parse_period("07/2023"), Some(ymd(2023, 7, 1)));
        assert_eq!(parse_period("Mar 2024"), Some(ymd(2024, 3, 1)));
        assert_eq!(parse_period("September 2022"), Some(ymd(2022, 9, 1)));
        assert_eq!(parse_period("2024-Q3"), Some(ymd(2024, 7, 1)));
        assert_eq!(parse_period("Q2 2021"), Some(ymd(2021, 4, 1)));
        assert_eq!(parse_period("FY2020"), Some(ymd(2020, 1, 1)));
        assert_eq!(parse_period("2019"), Some(ymd(2019, 1, 1)));
    }

    #[test]
    fn full_month_names_parse_and_sort() {
        assert_eq!(parse_period("March 2024"), Some(ymd(2024, 3, 1)));
        assert_eq!(parse_period("december-2023"), Some(ymd(2023, 12, 1)));
        let labels: Vec<String> = ["March 2024", "January 2024", "February 2024"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(sort_periods(&labels), vec!["January 2024", "February 2024", "March 2024"]);
        assert!(all_periods(&labels));
    }

    #[test]
    fn span_uses_first_and_last_labels() {
        let labels: Vec<String> = ["2024-01", "2024-06"].iter().map(|s| s.to_string()).collect();
        assert_eq!(describe_span(&labels).as_deref(), Some("Jan 2024 to Jun 2024"));
        assert_eq!(describe_span(&labels[..1]).as_deref(), Some("Jan 2024"));
        assert_eq!(describe_span(&["North".to_string()]), None);
        assert_eq!(describe_span(&[]), None);
    }

    #[test]
    fn rejects_non_periods() {
        assert_eq!(parse_period(""), None);
        assert_eq!(parse_period("Scope 1"), None);
        assert_eq!(parse_period("2024-Q5"), None);
        assert_eq!(parse_period("12.5"), None);
    }

    #[test]
    fn sorts_when_all_parse() {
        let labels: Vec<String> = ["2024-03", "2024-01", "2024-02"].iter().map(|s| s.to_string()).collect();
        assert_eq!(sort_periods(&labels), vec!["2024-01", "2024-02", "2024-03"]);
        assert_eq!(chronological_order(&labels), Some(vec![1, 2, 0]));
    }

    #[test]
    fn keeps_order_when_any_label_is_opaque() {
        let labels: Vec<String> = ["Week B", "2024-01"].iter().map(|s| s.to_string()).collect();
        assert_eq!(sort_periods(&labels), labels);
        assert!(!all_periods(&labels));
    }

    #[test]
    fn ordinal_round_trip_formatting() {
        let d = ymd(2024, 5, 1);
        assert_eq!(format_period(d), "May 2024");
        assert_eq!(format_ordinal(period_ordinal(d)), "May 2024");
    }
}
