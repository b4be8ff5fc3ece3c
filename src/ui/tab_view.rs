use egui_plot::{Bar, BarChart, HLine, Legend, Line, LineStyle, MarkerShape, Plot, PlotPoints, Points};

use crate::analytics::{SummaryCard, TabSummary};
use crate::data::periods;
use crate::state::app_state::{AppState, ChartKind, TabId, ViewOptions};
use crate::state::metric_series::MetricSeries;
use crate::state::theme::Theme;
use crate::ui::tables::{self, SortDirection};

/// Actions a tab asks the app to perform after rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabAction {
    Open(TabId),
    RemoveSheet(usize),
    ExportReport,
    CopyAnomalies,
    CopyStats,
}

/// Chart coordinates for every series. Dated x values are used only when
/// all series have them, so a mixed chart shares one axis.
pub fn chart_points(series: &[MetricSeries]) -> (Vec<Vec<[f64; 2]>>, bool) {
    let coords: Vec<(Vec<f64>, bool)> = series.iter().map(|s| s.x_coords()).collect();
    let dated = !coords.is_empty() && coords.iter().all(|(_, d)| *d);
    let points = series
        .iter()
        .zip(coords)
        .map(|(s, (xs, _))| {
            let xs: Vec<f64> = if dated { xs } else { (0..s.point_count()).map(|i| i as f64).collect() };
            xs.into_iter()
                .zip(&s.values)
                .filter(|(_, y)| y.is_finite())
                .map(|(x, &y)| [x, y])
                .collect()
        })
        .collect();
    (points, dated)
}

/// Smallest gap between neighbouring x values, used to size bars.
fn x_spacing(points: &[Vec<[f64; 2]>]) -> f64 {
    let min_gap = points
        .iter()
        .flat_map(|p| p.windows(2).map(|w| w[1][0] - w[0][0]))
        .filter(|d| *d > 0.0)
        .fold(f64::INFINITY, f64::min);
    if min_gap.is_finite() {
        min_gap
    } else {
        1.0
    }
}

fn card(ui: &mut egui::Ui, card: &SummaryCard, theme: Theme, rising_is_good: bool) {
    egui::Frame::new()
        .fill(theme.card_bg())
        .corner_radius(egui::CornerRadius::same(8))
        .inner_margin(egui::Margin::same(12))
        .show(ui, |ui| {
            ui.set_min_width(190.0);
            ui.vertical(|ui| {
                ui.label(egui::RichText::new(&card.title).weak());
                ui.label(egui::RichText::new(card.display_value()).heading().strong());
                if let Some(caption) = &card.caption {
                    ui.small(caption);
                }
                if let (Some(change), Some(text)) = (card.change, card.display_change()) {
                    ui.colored_label(theme.change_color(change, rising_is_good), text);
                }
            });
        });
}

fn series_toggles(ui: &mut egui::Ui, series: &mut [MetricSeries]) {
    ui.horizontal_wrapped(|ui| {
        for s in series.iter_mut() {
            let text = egui::RichText::new(&s.label).color(s.color32());
            ui.checkbox(&mut s.visible, text);
        }
    });
}

fn show_chart(ui: &mut egui::Ui, plot_id: &str, tab: &TabSummary, view: &ViewOptions, theme: Theme) {
    let visible: Vec<MetricSeries> = tab.series.iter().filter(|s| s.visible).cloned().collect();
    if visible.is_empty() {
        ui.label(egui::RichText::new("No series selected.").weak());
        return;
    }

    let (points, dated) = chart_points(&visible);
    let axis_labels: Vec<String> = visible[0].periods.clone();
    let spacing = x_spacing(&points);

    let mut plot = Plot::new(plot_id)
        .height(320.0)
        .legend(Legend::default())
        .allow_scroll(false);
    plot = if dated {
        plot.x_axis_formatter(|mark, _range| periods::format_ordinal(mark.value))
            .label_formatter(|name, value| {
                let when = periods::format_ordinal(value.x);
                if name.is_empty() {
                    format!("{when}\n{:.2}", value.y)
                } else {
                    format!("{name}\n{when}\n{:.2}", value.y)
                }
            })
    } else {
        plot.x_axis_formatter(move |mark, _range| {
            let i = mark.value.round();
            if (mark.value - i).abs() < 1e-6 && i >= 0.0 {
                axis_labels.get(i as usize).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        })
    };

    plot.show(ui, |plot_ui| {
        let n = visible.len() as f64;
        for (i, (s, pts)) in visible.iter().zip(&points).enumerate() {
            let color = s.color32();
            match view.chart_kind {
                ChartKind::Line => {
                    plot_ui.line(Line::new(PlotPoints::from(pts.clone())).name(&s.label).color(color).width(2.0));
                }
                ChartKind::Bars => {
                    let width = spacing * 0.8 / n;
                    let offset = (i as f64 - (n - 1.0) / 2.0) * width;
                    let bars = pts.iter().map(|p| Bar::new(p[0] + offset, p[1]).width(width)).collect();
                    plot_ui.bar_chart(BarChart::new(bars).name(&s.label).color(color));
                }
            }
            if view.show_mean_line {
                if let Some(stats) = tab.stats_for(&s.label) {
                    plot_ui.hline(
                        HLine::new(stats.mean)
                            .name(format!("{} mean", s.label))
                            .color(color.gamma_multiply(0.6))
                            .style(LineStyle::dashed_loose()),
                    );
                }
            }
        }

        if view.show_anomaly_markers {
            for (s, xs) in visible.iter().map(|s| (s, anomaly_xs(s, dated))) {
                let marks: Vec<(egui::Color32, [f64; 2])> = tab
                    .anomalies
                    .iter()
                    .filter(|a| a.series == s.label)
                    .filter_map(|a| {
                        let idx = s.periods.iter().position(|p| *p == a.record.period_label)?;
                        let x = *xs.get(idx)?;
                        Some((theme.severity_color(a.record.severity), [x, a.record.value]))
                    })
                    .collect();
                for (color, p) in marks {
                    plot_ui.points(
                        Points::new(PlotPoints::from(vec![p]))
                            .shape(MarkerShape::Diamond)
                            .radius(6.0)
                            .filled(true)
                            .color(color),
                    );
                }
            }
        }
    });
}

fn anomaly_xs(series: &MetricSeries, dated: bool) -> Vec<f64> {
    if dated {
        series.x_coords().0
    } else {
        (0..series.point_count()).map(|i| i as f64).collect()
    }
}

fn rising_is_good(tab: &TabSummary) -> bool {
    tab.title == "Workforce"
}

/// Render one analytics tab. `sort` is the anomaly table's sort state.
pub fn show_tab(
    ui: &mut egui::Ui,
    id: TabId,
    tab: &mut TabSummary,
    view: &mut ViewOptions,
    sort: &mut Option<(usize, SortDirection)>,
    theme: Theme,
) -> Option<TabAction> {
    let mut action = None;
    let id_str = format!("{id:?}");

    ui.horizontal(|ui| {
        ui.heading(&tab.title);
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if let TabId::Sheet(i) = id {
                if ui.button("Remove").clicked() {
                    action = Some(TabAction::RemoveSheet(i));
                }
            }
            if ui
                .add_enabled(!tab.anomalies.is_empty(), egui::Button::new("Copy Anomalies"))
                .clicked()
            {
                action = Some(TabAction::CopyAnomalies);
            }
            if ui.button("Export Report").clicked() {
                action = Some(TabAction::ExportReport);
            }
        });
    });
    ui.add_space(6.0);

    let good = rising_is_good(tab);
    ui.horizontal_wrapped(|ui| {
        for c in &tab.cards {
            card(ui, c, theme, good);
        }
    });
    ui.add_space(10.0);

    if !tab.series.is_empty() {
        egui::CollapsingHeader::new("Trend")
            .id_salt(format!("{id_str}_trend"))
            .default_open(true)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    for kind in [ChartKind::Line, ChartKind::Bars] {
                        ui.selectable_value(&mut view.chart_kind, kind, kind.label());
                    }
                    ui.separator();
                    ui.checkbox(&mut view.show_mean_line, "Mean line");
                    ui.checkbox(&mut view.show_anomaly_markers, "Anomaly markers");
                });
                series_toggles(ui, &mut tab.series);
                show_chart(ui, &format!("{id_str}_plot"), tab, view, theme);
            });

        egui::CollapsingHeader::new("Statistics")
            .id_salt(format!("{id_str}_stats"))
            .default_open(true)
            .show(ui, |ui| {
                tables::show_stats_table(ui, &format!("{id_str}_stats_table"), &tab.stats);
                if ui.small_button("Copy Statistics").clicked() {
                    action = Some(TabAction::CopyStats);
                }
            });

        egui::CollapsingHeader::new("By Period")
            .id_salt(format!("{id_str}_periods"))
            .default_open(false)
            .show(ui, |ui| {
                tables::show_period_table(ui, &format!("{id_str}_period_table"), tab, &theme);
            });

        egui::CollapsingHeader::new(format!("Anomalies ({})", tab.anomaly_count()))
            .id_salt(format!("{id_str}_anomalies"))
            .default_open(true)
            .show(ui, |ui| {
                if let Some(new_sort) =
                    tables::show_anomaly_table(ui, &format!("{id_str}_anomaly_table"), &tab.anomalies, *sort, &theme)
                {
                    *sort = new_sort;
                }
            });
    }

    if !tab.correlations.is_empty() {
        egui::CollapsingHeader::new("Correlations")
            .id_salt(format!("{id_str}_corr"))
            .default_open(true)
            .show(ui, |ui| {
                tables::show_correlation_table(ui, &format!("{id_str}_corr_table"), &tab.correlations, &theme);
            });
    }

    for b in &tab.breakdowns {
        egui::CollapsingHeader::new(&b.title)
            .id_salt(format!("{id_str}_{}", b.title))
            .default_open(true)
            .show(ui, |ui| tables::show_breakdown_table(ui, b));
    }

    action
}

/// Company details and an index of the loaded tabs.
pub fn show_overview(ui: &mut egui::Ui, state: &AppState) -> Option<TabAction> {
    let mut action = None;

    let company = state.payload.as_ref().and_then(|p| p.company.as_ref());
    match company {
        Some(c) => {
            ui.heading(if c.name.is_empty() { "Unnamed company" } else { c.name.as_str() });
            egui::Grid::new("company_grid").num_columns(2).spacing([24.0, 4.0]).show(ui, |ui| {
                if let Some(industry) = &c.industry {
                    ui.label(egui::RichText::new("Industry").weak());
                    ui.label(industry);
                    ui.end_row();
                }
                if let Some(year) = c.reporting_year {
                    ui.label(egui::RichText::new("Reporting year").weak());
                    ui.label(year.to_string());
                    ui.end_row();
                }
                if let Some(currency) = &c.currency {
                    ui.label(egui::RichText::new("Currency").weak());
                    ui.label(currency);
                    ui.end_row();
                }
            });
        }
        None => {
            ui.heading("Overview");
        }
    }
    ui.add_space(12.0);

    if state.tabs.is_empty() {
        ui.label(
            egui::RichText::new("Open a payload (JSON) or import a sheet (CSV/XLSX), or drop a file onto the window.")
                .weak(),
        );
        return None;
    }

    egui::Grid::new("overview_tabs")
        .striped(true)
        .num_columns(5)
        .min_col_width(90.0)
        .show(ui, |ui| {
            ui.strong("Section");
            ui.strong("Coverage");
            ui.strong("Series");
            ui.strong("Anomalies");
            ui.label("");
            ui.end_row();
            for (id, tab) in &state.tabs {
                if ui.link(&tab.title).clicked() {
                    action = Some(TabAction::Open(*id));
                }
                let coverage = tab
                    .series
                    .first()
                    .and_then(|s| periods::describe_span(&s.periods))
                    .unwrap_or_else(|| "-".to_string());
                ui.label(coverage);
                ui.label(tab.series.len().to_string());
                let count = tab.anomaly_count();
                if count > 0 {
                    ui.colored_label(
                        state.theme.severity_color(crate::processing::anomaly::Severity::Medium),
                        count.to_string(),
                    );
                } else {
                    ui.label("0");
                }
                match id {
                    TabId::Sheet(i) => {
                        if ui.small_button("Remove").clicked() {
                            action = Some(TabAction::RemoveSheet(*i));
                        }
                    }
                    _ => {
                        ui.label("");
                    }
                }
                ui.end_row();
            }
        });

    action
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn dated_series_share_a_day_axis() {
        let series = vec![
            MetricSeries::new("a", "t", labels(&["2024-01", "2024-02"]), vec![1.0, 2.0]),
            MetricSeries::new("b", "t", labels(&["2024-01", "2024-02"]), vec![3.0, f64::NAN]),
        ];
        let (points, dated) = chart_points(&series);
        assert!(dated);
        assert_eq!(points[0][1][0] - points[0][0][0], 31.0);
        assert_eq!(points[1].len(), 1);
        assert_eq!(x_spacing(&points), 31.0);
    }

    #[test]
    fn mixed_labels_fall_back_to_index() {
        let series = vec![
            MetricSeries::new("a", "t", labels(&["2024-01", "2024-02"]), vec![1.0, 2.0]),
            MetricSeries::new("b", "t", labels(&["North", "South"]), vec![3.0, 4.0]),
        ];
        let (points, dated) = chart_points(&series);
        assert!(!dated);
        assert_eq!(points[0], vec![[0.0, 1.0], [1.0, 2.0]]);
        assert_eq!(x_spacing(&points), 1.0);
    }

    #[test]
    fn single_point_bars_default_to_unit_width() {
        let series = vec![MetricSeries::new("a", "t", labels(&["2024-01"]), vec![1.0])];
        let (points, _) = chart_points(&series);
        assert_eq!(x_spacing(&points), 1.0);
    }
}
