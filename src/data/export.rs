use std::io::Write;
use std::path::Path;

use crate::analytics::TabSummary;
use crate::processing::statistics::fmt_fixed;

fn cell(value: Option<f64>, decimals: u32) -> String {
    match value {
        Some(v) if v.is_finite() => fmt_fixed(v, decimals),
        _ => String::new(),
    }
}

fn record<W: Write, F: AsRef<[u8]>>(out: &mut csv::Writer<W>, fields: &[F]) -> Result<(), String> {
    out.write_record(fields).map_err(|e| format!("Failed to write report: {e}"))
}

/// Write the tab's cards, statistics, anomalies and correlations as a
/// sectioned CSV report.
pub fn write_tab_report<W: Write>(writer: W, tab: &TabSummary) -> Result<(), String> {
    let mut out = csv::WriterBuilder::new().flexible(true).from_writer(writer);
    let blank = [String::new()];

    record(&mut out, &[tab.title.clone()])?;
    record(&mut out, &blank)?;

    record(&mut out, &["Card", "Value", "Unit", "Change %"])?;
    for card in &tab.cards {
        record(&mut out, &[card.title.clone(), cell(Some(card.value), 2), card.unit.clone(), cell(card.change, 1)])?;
    }
    record(&mut out, &blank)?;

    record(&mut out, &[
        "Series",
        "Unit",
        "Count",
        "Mean",
        "Median",
        "Std Dev",
        "Min",
        "Max",
    ])?;
    for row in &tab.stats {
        let s = &row.stats;
        record(&mut out, &[
            row.series.clone(),
            row.unit.clone(),
            s.count.to_string(),
            fmt_fixed(s.mean, 2),
            fmt_fixed(s.median, 2),
            fmt_fixed(s.std_dev, 2),
            fmt_fixed(s.min, 2),
            fmt_fixed(s.max, 2),
        ])?;
    }
    record(&mut out, &blank)?;

    record(&mut out, &[
        "Series",
        "Period",
        "Value",
        "Z-Score",
        "Deviation %",
        "Severity",
    ])?;
    for a in &tab.anomalies {
        let r = &a.record;
        record(&mut out, &[
            a.series.clone(),
            r.period_label.clone(),
            fmt_fixed(r.value, 2),
            fmt_fixed(r.z_score, 2),
            fmt_fixed(r.percent_deviation, 1),
            r.severity.label().to_string(),
        ])?;
    }

    if !tab.correlations.is_empty() {
        record(&mut out, &blank)?;
        record(&mut out, &["Left", "Right", "Coefficient", "Strength"])?;
        for c in &tab.correlations {
            record(&mut out, &[
                c.left.clone(),
                c.right.clone(),
                cell(c.coefficient, 2),
                c.strength.map(|s| s.label().to_string()).unwrap_or_else(|| "n/a".to_string()),
            ])?;
        }
    }

    for b in &tab.breakdowns {
        record(&mut out, &blank)?;
        record(&mut out, &[b.title.as_str(), "Count", "Share %"])?;
        for r in &b.rows {
            record(&mut out, &[r.category.clone(), fmt_fixed(r.count, 0), fmt_fixed(r.share, 1)])?;
        }
    }

    out.flush().map_err(|e| format!("Failed to write report: {e}"))
}

/// Export a tab report to a CSV file.
pub fn export_tab_report(path: &Path, tab: &TabSummary) -> Result<(), String> {
    let file = std::fs::File::create(path).map_err(|e| format!("Cannot create file: {e}"))?;
    write_tab_report(file, tab)?;
    tracing::info!("Exported {} report to {:?}", tab.title, path);
    Ok(())
}

/// Tab-separated anomaly table for pasting into a spreadsheet.
pub fn anomalies_as_text(tab: &TabSummary) -> String {
    let mut text = String::from("Series\tPeriod\tValue\tZ-Score\tDeviation %\tSeverity\n");
    for a in &tab.anomalies {
        let r = &a.record;
        text.push_str(&format!(
            "{}\t{}\t{}\t{}\t{}\t{}\n",
            a.series,
            r.period_label,
            fmt_fixed(r.value, 2),
            fmt_fixed(r.z_score, 2),
            fmt_fixed(r.percent_deviation, 1),
            r.severity.label(),
        ));
    }
    text
}

/// Plain-text statistics report, one block per series.
pub fn stats_as_text(tab: &TabSummary) -> String {
    let mut report = String::new();
    for row in &tab.stats {
        if row.stats.is_empty() {
            report.push_str(&format!("{}:\n  No valid numeric data.\n", row.series));
        } else {
            report.push_str(&row.stats.report(&row.series));
        }
        report.push('\n');
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::waste;
    use crate::data::payload::{WastePayload, WastePeriod};

    fn tab() -> TabSummary {
        let mut periods: Vec<WastePeriod> = (1..=12)
            .map(|m| WastePeriod {
                period: format!("2024-{m:02}"),
                generated: 10.0,
                recycled: 4.0,
                landfilled: 5.0,
                incinerated: 1.0,
            })
            .collect();
        periods[5].generated = 90.0;
        waste::summarize(&WastePayload {
            unit: "t".to_string(),
            periods,
        })
    }

    #[test]
    fn report_contains_every_section() {
        let mut buf = Vec::new();
        write_tab_report(&mut buf, &tab()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("Waste\n"));
        assert!(text.contains("Card,Value,Unit,Change %"));
        assert!(text.contains("Series,Unit,Count,Mean,Median,Std Dev,Min,Max"));
        assert!(text.contains("Generated,2024-06,90.00"));
        assert!(text.contains("Left,Right,Coefficient,Strength"));
        assert!(text.contains("Disposal Route,Count,Share %"));
    }

    #[test]
    fn clipboard_text_has_one_line_per_anomaly() {
        let tab = tab();
        let text = anomalies_as_text(&tab);
        assert_eq!(text.lines().count(), tab.anomalies.len() + 1);
        assert!(text.lines().nth(1).unwrap().starts_with("Generated\t2024-06"));
    }

    #[test]
    fn stats_text_has_a_block_per_series() {
        let tab = tab();
        let text = stats_as_text(&tab);
        assert!(text.starts_with("Generated:\n  Count: 12\n"));
        assert_eq!(text.matches("Std Dev:").count(), tab.stats.len());
    }

    #[test]
    fn exports_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("waste.csv");
        export_tab_report(&path, &tab()).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("Severity"));
    }
}
