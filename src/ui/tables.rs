use std::cmp::Ordering;

use egui_extras::{Column, TableBuilder};

use crate::analytics::{Breakdown, SeriesAnomaly, SeriesStatsRow, TabSummary};
use crate::data::periods;
use crate::processing::anomaly::{self, Severity};
use crate::processing::correlation::CorrelationRow;
use crate::processing::statistics::{fmt_fixed, round_to, SeriesStats};
use crate::state::theme::Theme;

/// Direction for table column sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

pub const ANOMALY_COLUMNS: [&str; 6] = ["Series", "Period", "Value", "Z-Score", "Deviation %", "Severity"];

/// Ascending -> descending -> original order.
pub fn cycle_sort(current: Option<(usize, SortDirection)>, col: usize) -> Option<(usize, SortDirection)> {
    match current {
        Some((c, SortDirection::Ascending)) if c == col => Some((col, SortDirection::Descending)),
        Some((c, SortDirection::Descending)) if c == col => None,
        _ => Some((col, SortDirection::Ascending)),
    }
}

fn compare_periods(a: &str, b: &str) -> Ordering {
    match (periods::parse_period(a), periods::parse_period(b)) {
        (Some(da), Some(db)) => da.cmp(&db),
        _ => a.cmp(b),
    }
}

fn compare_anomalies(a: &SeriesAnomaly, b: &SeriesAnomaly, col: usize) -> Ordering {
    let (ra, rb) = (&a.record, &b.record);
    match col {
        0 => a.series.cmp(&b.series),
        1 => compare_periods(&ra.period_label, &rb.period_label),
        2 => ra.value.total_cmp(&rb.value),
        // Magnitude, so the most extreme scores group together either way.
        3 => ra.z_score.abs().total_cmp(&rb.z_score.abs()),
        4 => ra.percent_deviation.total_cmp(&rb.percent_deviation),
        _ => ra.severity.cmp(&rb.severity),
    }
}

/// Row order for the anomaly table under the given sort state.
pub fn sorted_anomaly_indices(anomalies: &[SeriesAnomaly], sort: Option<(usize, SortDirection)>) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..anomalies.len()).collect();
    if let Some((col, dir)) = sort {
        indices.sort_by(|&a, &b| {
            let cmp = compare_anomalies(&anomalies[a], &anomalies[b], col);
            match dir {
                SortDirection::Ascending => cmp,
                SortDirection::Descending => cmp.reverse(),
            }
        });
    }
    indices
}

fn sort_arrow(sort: Option<(usize, SortDirection)>, col: usize) -> &'static str {
    match sort {
        Some((c, SortDirection::Ascending)) if c == col => " ^",
        Some((c, SortDirection::Descending)) if c == col => " v",
        _ => "",
    }
}

pub fn show_stats_table(ui: &mut egui::Ui, id: &str, rows: &[SeriesStatsRow]) {
    if rows.is_empty() {
        ui.label(egui::RichText::new("No series.").weak());
        return;
    }
    ui.push_id(id, |ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .column(Column::auto().at_least(140.0))
            .columns(Column::auto().at_least(70.0), 7)
            .header(20.0, |mut header| {
                for title in ["Series", "Unit", "Count", "Mean", "Median", "Std Dev", "Min", "Max"] {
                    header.col(|ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|mut body| {
                for row in rows {
                    let s = &row.stats;
                    body.row(18.0, |mut r| {
                        r.col(|ui| {
                            ui.label(&row.series);
                        });
                        r.col(|ui| {
                            ui.label(&row.unit);
                        });
                        r.col(|ui| {
                            ui.label(s.count.to_string());
                        });
                        for v in [s.mean, s.median, s.std_dev, s.min, s.max] {
                            r.col(|ui| {
                                ui.label(fmt_fixed(v, 2));
                            });
                        }
                    });
                }
            });
    });
}

/// Anomaly table with clickable headers. Returns the new sort state when a
/// header was clicked.
pub fn show_anomaly_table(
    ui: &mut egui::Ui,
    id: &str,
    anomalies: &[SeriesAnomaly],
    sort: Option<(usize, SortDirection)>,
    theme: &Theme,
) -> Option<Option<(usize, SortDirection)>> {
    if anomalies.is_empty() {
        ui.label(egui::RichText::new("No values more than 2 standard deviations from the mean.").weak());
        return None;
    }

    let order = sorted_anomaly_indices(anomalies, sort);
    let clicked_col: std::cell::Cell<Option<usize>> = std::cell::Cell::new(None);

    ui.push_id(id, |ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .columns(Column::auto().at_least(90.0), ANOMALY_COLUMNS.len())
            .min_scrolled_height(160.0)
            .header(20.0, |mut header| {
                for (col, title) in ANOMALY_COLUMNS.iter().enumerate() {
                    header.col(|ui| {
                        if ui.button(format!("{title}{}", sort_arrow(sort, col))).clicked() {
                            clicked_col.set(Some(col));
                        }
                    });
                }
            })
            .body(|body| {
                body.rows(18.0, order.len(), |mut row| {
                    let a = &anomalies[order[row.index()]];
                    let r = &a.record;
                    let color = theme.severity_color(r.severity);
                    row.col(|ui| {
                        ui.label(&a.series);
                    });
                    row.col(|ui| {
                        ui.label(&r.period_label);
                    });
                    row.col(|ui| {
                        ui.label(fmt_fixed(r.value, 2));
                    });
                    row.col(|ui| {
                        ui.label(fmt_fixed(r.z_score, 2));
                    });
                    row.col(|ui| {
                        ui.label(format!("{:+}%", fmt_fixed(r.percent_deviation, 1)));
                    });
                    row.col(|ui| {
                        ui.colored_label(color, r.severity.label());
                    });
                });
            });
    });

    clicked_col.get().map(|col| cycle_sort(sort, col))
}

/// Severity of one cell against its series statistics; `None` for gaps.
pub fn cell_severity(value: f64, stats: &SeriesStats) -> Option<Severity> {
    value
        .is_finite()
        .then(|| Severity::classify(round_to(anomaly::z_score(value, stats), 2)))
}

/// Every period with one column per series, each cell coloured by severity.
pub fn show_period_table(ui: &mut egui::Ui, id: &str, tab: &TabSummary, theme: &Theme) {
    let Some(first) = tab.series.first() else {
        return;
    };
    let stats: Vec<SeriesStats> = tab
        .series
        .iter()
        .map(|s| tab.stats_for(&s.label).copied().unwrap_or_default())
        .collect();

    ui.push_id(id, |ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .column(Column::auto().at_least(90.0))
            .columns(Column::auto().at_least(90.0), tab.series.len())
            .max_scroll_height(260.0)
            .header(20.0, |mut header| {
                header.col(|ui| {
                    ui.strong("Period");
                });
                for s in &tab.series {
                    header.col(|ui| {
                        ui.strong(&s.label);
                    });
                }
            })
            .body(|body| {
                body.rows(18.0, first.periods.len(), |mut row| {
                    let i = row.index();
                    row.col(|ui| {
                        ui.label(&first.periods[i]);
                    });
                    for (s, st) in tab.series.iter().zip(&stats) {
                        let value = s.values.get(i).copied().unwrap_or(f64::NAN);
                        row.col(|ui| match cell_severity(value, st) {
                            Some(sev) => {
                                ui.colored_label(theme.severity_color(sev), fmt_fixed(value, 2));
                            }
                            None => {
                                ui.label(egui::RichText::new("-").weak());
                            }
                        });
                    }
                });
            });
    });
}

pub fn show_correlation_table(ui: &mut egui::Ui, id: &str, rows: &[CorrelationRow], theme: &Theme) {
    if rows.is_empty() {
        return;
    }
    ui.push_id(id, |ui| {
        TableBuilder::new(ui)
            .striped(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .columns(Column::auto().at_least(110.0), 5)
            .header(20.0, |mut header| {
                for title in ["Series", "Against", "Coefficient", "Direction", "Strength"] {
                    header.col(|ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|mut body| {
                for c in rows {
                    body.row(18.0, |mut r| {
                        r.col(|ui| {
                            ui.label(&c.left);
                        });
                        r.col(|ui| {
                            ui.label(&c.right);
                        });
                        r.col(|ui| {
                            ui.label(c.coefficient.map(|v| fmt_fixed(v, 2)).unwrap_or_else(|| "-".to_string()));
                        });
                        r.col(|ui| {
                            ui.label(c.direction());
                        });
                        r.col(|ui| match c.strength {
                            Some(s) => {
                                ui.colored_label(theme.strength_color(s), s.label());
                            }
                            None => {
                                ui.label(egui::RichText::new("insufficient data").weak());
                            }
                        });
                    });
                }
            });
    });
}

pub fn show_breakdown_table(ui: &mut egui::Ui, breakdown: &Breakdown) {
    ui.push_id(&breakdown.title, |ui| {
        egui::Grid::new("breakdown_grid")
            .striped(true)
            .num_columns(3)
            .min_col_width(80.0)
            .show(ui, |ui| {
                ui.strong(&breakdown.title);
                ui.strong("Count");
                ui.strong("Share");
                ui.end_row();
                for row in &breakdown.rows {
                    ui.label(&row.category);
                    ui.label(fmt_fixed(row.count, 0));
                    ui.add(
                        egui::ProgressBar::new((row.share / 100.0).clamp(0.0, 1.0) as f32)
                            .desired_width(140.0)
                            .text(format!("{}%", fmt_fixed(row.share, 1))),
                    );
                    ui.end_row();
                }
            });
    });
}
