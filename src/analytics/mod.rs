//! Reshapes report payloads into what a dashboard tab displays: summary
//! cards, chart series, per-series statistics, anomalies, correlations and
//! categorical breakdowns. Everything here is pure and recomputed whenever
//! a payload is loaded.

pub mod cards;
pub mod ghg;
pub mod sheet;
pub mod waste;
pub mod workforce;

use serde::{Deserialize, Serialize};

use crate::processing::anomaly::{self, AnomalyRecord};
use crate::processing::correlation::CorrelationRow;
use crate::processing::statistics::SeriesStats;
use crate::state::metric_series::MetricSeries;

pub use cards::SummaryCard;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesStatsRow {
    pub series: String,
    pub unit: String,
    pub stats: SeriesStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesAnomaly {
    pub series: String,
    pub record: AnomalyRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownRow {
    pub category: String,
    pub count: f64,
    /// Percent of the breakdown total.
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    pub title: String,
    pub rows: Vec<BreakdownRow>,
}

impl Breakdown {
    /// Shares are computed against `total`, or the row sum when `total` is `None`.
    pub fn from_counts(title: &str, counts: &[(String, f64)], total: Option<f64>) -> Self {
        let total = total.unwrap_or_else(|| counts.iter().map(|(_, c)| c).sum());
        Self {
            title: title.to_string(),
            rows: counts
                .iter()
                .map(|(category, count)| BreakdownRow {
                    category: category.clone(),
                    count: *count,
                    share: cards::share(*count, total),
                })
                .collect(),
        }
    }
}

/// Everything one analytics tab renders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TabSummary {
    pub title: String,
    pub cards: Vec<SummaryCard>,
    pub series: Vec<MetricSeries>,
    pub stats: Vec<SeriesStatsRow>,
    pub anomalies: Vec<SeriesAnomaly>,
    pub correlations: Vec<CorrelationRow>,
    pub breakdowns: Vec<Breakdown>,
}

impl TabSummary {
    pub fn stats_for(&self, series: &str) -> Option<&SeriesStats> {
        self.stats.iter().find(|s| s.series == series).map(|s| &s.stats)
    }

    pub fn anomaly_count(&self) -> usize {
        self.anomalies.len()
    }
}

/// Per-series statistics and anomalies, in series order.
pub fn analyze_series(series: &[MetricSeries]) -> (Vec<SeriesStatsRow>, Vec<SeriesAnomaly>) {
    let mut stats_rows = Vec::with_capacity(series.len());
    let mut anomalies = Vec::new();
    for s in series {
        let stats = SeriesStats::compute(&s.values);
        let samples = anomaly::label_samples(&s.periods, &s.values);
        for record in anomaly::detect(&samples, &stats) {
            anomalies.push(SeriesAnomaly {
                series: s.label.clone(),
                record,
            });
        }
        stats_rows.push(SeriesStatsRow {
            series: s.label.clone(),
            unit: s.unit.clone(),
            stats,
        });
    }
    if !anomalies.is_empty() {
        tracing::info!("Detected {} anomalies across {} series", anomalies.len(), series.len());
    }
    (stats_rows, anomalies)
}

/// Name/value pairs for correlation helpers.
pub fn named_values(series: &[MetricSeries]) -> Vec<(String, Vec<f64>)> {
    series.iter().map(|s| (s.label.clone(), s.values.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_series_tags_anomalies_with_series_name() {
        let periods: Vec<String> = (1..=12).map(|m| format!("2024-{m:02}")).collect();
        let mut spiky = vec![5.0; 12];
        spiky[6] = 50.0;
        let series = vec![
            MetricSeries::new("Flat", "t", periods.clone(), vec![3.0; 12]),
            MetricSeries::new("Spiky", "t", periods, spiky),
        ];
        let (stats, anomalies) = analyze_series(&series);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].stats.std_dev, 0.0);
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].series, "Spiky");
        assert_eq!(anomalies[0].record.period_label, "2024-07");
    }

    #[test]
    fn breakdown_shares() {
        let counts = vec![("A".to_string(), 30.0), ("B".to_string(), 10.0)];
        let b = Breakdown::from_counts("Mix", &counts, None);
        assert_eq!(b.rows[0].share, 75.0);
        let b = Breakdown::from_counts("Mix", &counts, Some(0.0));
        assert_eq!(b.rows[1].share, 0.0);
    }
}
