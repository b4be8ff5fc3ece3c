use crate::analytics::cards::{self, SummaryCard};
use crate::analytics::{analyze_series, named_values, TabSummary};
use crate::data::loader::MetricSheet;
use crate::processing::correlation;
use crate::state::metric_series::{assign_colors, MetricSeries};

/// Build a tab for an imported metric sheet: every metric is a series and
/// every pair of metrics is correlated.
pub fn summarize(sheet: &MetricSheet) -> TabSummary {
    let mut series: Vec<MetricSeries> = sheet
        .metrics
        .iter()
        .map(|m| MetricSeries::new(m.name.clone(), m.unit.clone(), sheet.periods.clone(), m.values.clone()))
        .collect();
    assign_colors(&mut series);

    let summary_cards = series
        .iter()
        .map(|s| {
            let change = s.last_two().and_then(|(prev, cur)| cards::percent_change(prev, cur));
            let card = SummaryCard::new(&s.label, cards::finite_sum(&s.values), &s.unit).with_change(change);
            if s.unit == "%" {
                // Summing percentages is meaningless; show the latest value instead.
                let latest = s.values.iter().rev().copied().find(|v| v.is_finite()).unwrap_or(0.0);
                SummaryCard { value: latest, caption: Some("latest".to_string()), ..card }
            } else {
                card.with_caption("total")
            }
        })
        .collect();

    let (stats, anomalies) = analyze_series(&series);
    let correlations = correlation::correlation_matrix(&named_values(&series));

    TabSummary {
        title: sheet.name.clone(),
        cards: summary_cards,
        series,
        stats,
        anomalies,
        correlations,
        breakdowns: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::MetricColumn;

    #[test]
    fn one_card_per_metric_and_full_matrix() {
        let sheet = MetricSheet {
            name: "plant".to_string(),
            periods: vec!["2024-01".into(), "2024-02".into(), "2024-03".into()],
            metrics: vec![
                MetricColumn { name: "Energy".into(), unit: "MWh".into(), values: vec![1.0, 2.0, f64::NAN] },
                MetricColumn { name: "Water".into(), unit: "m\u{00B3}".into(), values: vec![3.0, 5.0, 7.0] },
                MetricColumn { name: "Renewable Share".into(), unit: "%".into(), values: vec![10.0, 20.0, 30.0] },
            ],
        };
        let tab = summarize(&sheet);
        assert_eq!(tab.title, "plant");
        assert_eq!(tab.cards.len(), 3);
        assert_eq!(tab.cards[0].value, 3.0);
        assert_eq!(tab.cards[2].value, 30.0);
        assert_eq!(tab.cards[2].caption.as_deref(), Some("latest"));
        assert_eq!(tab.correlations.len(), 3);
        assert_eq!(tab.stats[0].stats.count, 2);
    }
}
