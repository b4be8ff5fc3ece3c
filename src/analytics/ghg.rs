use crate::analytics::cards::{self, SummaryCard};
use crate::analytics::{analyze_series, named_values, TabSummary};
use crate::data::payload::{EmissionsPeriod, GhgPayload};
use crate::processing::correlation;
use crate::processing::statistics::fmt_fixed;
use crate::state::metric_series::{assign_colors, MetricSeries};

pub const SCOPE1: &str = "Scope 1";
pub const SCOPE2: &str = "Scope 2";
pub const SCOPE3: &str = "Scope 3";
pub const TOTAL: &str = "Total";

/// Build the GHG emissions tab from a payload.
pub fn summarize(ghg: &GhgPayload) -> TabSummary {
    let periods: Vec<String> = ghg.periods.iter().map(|p| p.period.clone()).collect();
    let column = |f: fn(&EmissionsPeriod) -> f64| -> Vec<f64> {
        ghg.periods.iter().map(f).collect()
    };

    let scope1 = column(|p| p.scope1);
    let scope2 = column(|p| p.scope2);
    let scope3 = column(|p| p.scope3);
    let totals = column(|p| p.total());

    let mut series = vec![
        MetricSeries::new(SCOPE1, &ghg.unit, periods.clone(), scope1.clone()),
        MetricSeries::new(SCOPE2, &ghg.unit, periods.clone(), scope2.clone()),
        MetricSeries::new(SCOPE3, &ghg.unit, periods.clone(), scope3.clone()),
        MetricSeries::new(TOTAL, &ghg.unit, periods, totals.clone()),
    ];
    assign_colors(&mut series);

    let grand_total = cards::finite_sum(&totals);
    let mut summary_cards = vec![SummaryCard::new("Total Emissions", grand_total, &ghg.unit)
        .with_caption(format!("{} reporting periods", ghg.periods.len()))];
    for (label, values) in [(SCOPE1, &scope1), (SCOPE2, &scope2), (SCOPE3, &scope3)] {
        let scope_total = cards::finite_sum(values);
        summary_cards.push(
            SummaryCard::new(&format!("{label} Share"), cards::share(scope_total, grand_total), "%")
                .with_caption(format!("{} {}", fmt_fixed(scope_total, 2), ghg.unit)),
        );
    }
    if let Some(total_series) = series.last() {
        if let Some(latest) = total_series.values.last() {
            let change = total_series
                .last_two()
                .and_then(|(prev, cur)| cards::percent_change(prev, cur));
            let caption = total_series.periods.last().cloned().unwrap_or_default();
            summary_cards.push(
                SummaryCard::new("Latest Period", *latest, &ghg.unit)
                    .with_caption(caption)
                    .with_change(change),
            );
        }
    }

    let (stats, anomalies) = analyze_series(&series);
    let correlations = correlation::correlate_pairs(
        &named_values(&series),
        &[(SCOPE1, SCOPE2), (SCOPE1, SCOPE3), (SCOPE2, SCOPE3), (TOTAL, SCOPE3)],
    );

    TabSummary {
        title: "GHG Emissions".to_string(),
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
    use crate::processing::correlation::CorrelationStrength;

    fn payload() -> GhgPayload {
        let periods = (1..=12)
            .map(|m| EmissionsPeriod {
                period: format!("2024-{m:02}"),
                scope1: 10.0 + m as f64,
                scope2: 20.0 + 2.0 * m as f64,
                scope3: if m == 12 { 400.0 } else { 50.0 },
            })
            .collect();
        GhgPayload {
            unit: "tCO2e".to_string(),
            periods,
        }
    }

    #[test]
    fn builds_scope_series_and_cards() {
        let tab = summarize(&payload());
        let labels: Vec<&str> = tab.series.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec![SCOPE1, SCOPE2, SCOPE3, TOTAL]);
        assert_eq!(tab.series[3].values[0], 11.0 + 22.0 + 50.0);

        let total = tab.cards[0].value;
        let shares: f64 = tab.cards[1..4].iter().map(|c| c.value).sum();
        assert!((shares - 100.0).abs() < 1e-9);
        assert!(total > 0.0);

        let latest = tab.cards.last().unwrap();
        assert_eq!(latest.title, "Latest Period");
        assert_eq!(latest.caption.as_deref(), Some("2024-12"));
        assert!(latest.change.unwrap() > 100.0);
    }

    #[test]
    fn flags_scope3_spike() {
        let tab = summarize(&payload());
        assert!(tab
            .anomalies
            .iter()
            .any(|a| a.series == SCOPE3 && a.record.period_label == "2024-12"));
        assert!(tab.anomalies.iter().all(|a| a.record.z_score.abs() > 2.0));
    }

    #[test]
    fn correlates_scopes_from_data() {
        let tab = summarize(&payload());
        assert_eq!(tab.correlations.len(), 4);
        let s1s2 = &tab.correlations[0];
        assert!((s1s2.coefficient.unwrap() - 1.0).abs() < 1e-9);
        assert_eq!(s1s2.strength, Some(CorrelationStrength::VeryStrong));
    }

    #[test]
    fn empty_payload_yields_zero_cards() {
        let tab = summarize(&GhgPayload {
            unit: "tCO2e".to_string(),
            periods: Vec::new(),
        });
        assert_eq!(tab.cards.len(), 4);
        assert_eq!(tab.cards[0].value, 0.0);
        assert!(tab.anomalies.is_empty());
        assert!(tab.correlations.iter().all(|c| c.coefficient.is_none()));
    }
}
