use crate::analytics::cards::{self, SummaryCard};
use crate::analytics::{analyze_series, named_values, Breakdown, TabSummary};
use crate::data::payload::{WastePayload, WastePeriod};
use crate::processing::correlation;
use crate::state::metric_series::{assign_colors, MetricSeries};

pub const GENERATED: &str = "Generated";
pub const RECYCLED: &str = "Recycled";
pub const LANDFILLED: &str = "Landfilled";
pub const INCINERATED: &str = "Incinerated";
pub const RECYCLING_RATE: &str = "Recycling Rate";

/// Recycled tonnage as a percent of generated; 0 when nothing was generated.
pub fn recycling_rate(period: &WastePeriod) -> f64 {
    cards::share(period.recycled, period.generated)
}

/// Build the waste tab from a payload.
pub fn summarize(waste: &WastePayload) -> TabSummary {
    let periods: Vec<String> = waste.periods.iter().map(|p| p.period.clone()).collect();
    let column = |f: fn(&WastePeriod) -> f64| -> Vec<f64> { waste.periods.iter().map(f).collect() };

    let generated = column(|p| p.generated);
    let recycled = column(|p| p.recycled);
    let landfilled = column(|p| p.landfilled);
    let incinerated = column(|p| p.incinerated);
    let rates = column(recycling_rate);

    let mut series = vec![
        MetricSeries::new(GENERATED, &waste.unit, periods.clone(), generated.clone()),
        MetricSeries::new(RECYCLED, &waste.unit, periods.clone(), recycled.clone()),
        MetricSeries::new(LANDFILLED, &waste.unit, periods.clone(), landfilled.clone()),
        MetricSeries::new(INCINERATED, &waste.unit, periods.clone(), incinerated.clone()),
        MetricSeries::new(RECYCLING_RATE, "%", periods, rates),
    ];
    assign_colors(&mut series);
    // The rate lives on a different scale; keep it off the tonnage chart by default.
    if let Some(rate) = series.last_mut() {
        rate.visible = false;
    }

    let total_generated = cards::finite_sum(&generated);
    let total_recycled = cards::finite_sum(&recycled);
    let total_landfilled = cards::finite_sum(&landfilled);
    let total_incinerated = cards::finite_sum(&incinerated);

    let mut summary_cards = vec![
        SummaryCard::new("Total Generated", total_generated, &waste.unit)
            .with_caption(format!("{} reporting periods", waste.periods.len())),
        SummaryCard::new(
            "Diversion Rate",
            cards::share(total_recycled + total_incinerated, total_generated),
            "%",
        )
        .with_caption("recycled or incinerated"),
        SummaryCard::new("Landfill Share", cards::share(total_landfilled, total_generated), "%"),
    ];
    if let Some(gen_series) = series.first() {
        if let Some(latest) = gen_series.values.last() {
            let change = gen_series
                .last_two()
                .and_then(|(prev, cur)| cards::percent_change(prev, cur));
            summary_cards.push(
                SummaryCard::new("Latest Period", *latest, &waste.unit)
                    .with_caption(gen_series.periods.last().cloned().unwrap_or_default())
                    .with_change(change),
            );
        }
    }

    let destinations = vec![
        (RECYCLED.to_string(), total_recycled),
        (LANDFILLED.to_string(), total_landfilled),
        (INCINERATED.to_string(), total_incinerated),
    ];
    let breakdowns = vec![Breakdown::from_counts("Disposal Route", &destinations, None)];

    let (stats, anomalies) = analyze_series(&series);
    let correlations = correlation::correlate_pairs(
        &named_values(&series),
        &[(GENERATED, RECYCLED), (GENERATED, LANDFILLED), (RECYCLED, LANDFILLED)],
    );

    TabSummary {
        title: "Waste".to_string(),
        cards: summary_cards,
        series,
        stats,
        anomalies,
        correlations,
        breakdowns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period(label: &str, generated: f64, recycled: f64, landfilled: f64, incinerated: f64) -> WastePeriod {
        WastePeriod {
            period: label.to_string(),
            generated,
            recycled,
            landfilled,
            incinerated,
        }
    }

    #[test]
    fn rate_guards_zero_generation() {
        assert_eq!(recycling_rate(&period("2024-01", 0.0, 0.0, 0.0, 0.0)), 0.0);
        assert!((recycling_rate(&period("2024-01", 10.0, 4.0, 5.0, 1.0)) - 40.0).abs() < 1e-9);
    }

    #[test]
    fn cards_and_breakdown() {
        let payload = WastePayload {
            unit: "t".to_string(),
            periods: vec![
                period("2024-01", 10.0, 4.0, 5.0, 1.0),
                period("2024-02", 20.0, 10.0, 8.0, 2.0),
            ],
        };
        let tab = summarize(&payload);
        assert_eq!(tab.cards[0].value, 30.0);
        assert!((tab.cards[1].value - 17.0 / 30.0 * 100.0).abs() < 1e-9);
        assert!((tab.cards[2].value - 13.0 / 30.0 * 100.0).abs() < 1e-9);
        assert_eq!(tab.cards[3].change, Some(100.0));

        let route = &tab.breakdowns[0];
        assert_eq!(route.rows.len(), 3);
        let shares: f64 = route.rows.iter().map(|r| r.share).sum();
        assert!((shares - 100.0).abs() < 1e-9);

        let rate = tab.series.iter().find(|s| s.label == RECYCLING_RATE).unwrap();
        assert!((rate.values[0] - 40.0).abs() < 1e-9);
        assert!((rate.values[1] - 50.0).abs() < 1e-9);
        assert!(!rate.visible);
        assert_eq!(tab.correlations.len(), 3);
    }
}
