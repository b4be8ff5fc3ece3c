use crate::analytics::cards::{self, SummaryCard};
use crate::analytics::{analyze_series, Breakdown, BreakdownRow, TabSummary};
use crate::data::payload::{CategoryCount, WorkforcePayload};
use crate::state::metric_series::{assign_colors, MetricSeries};

pub const HEADCOUNT: &str = "Headcount";

fn counts(list: &[CategoryCount]) -> Vec<(String, f64)> {
    list.iter().map(|c| (c.category.clone(), c.count as f64)).collect()
}

/// Female share of the gender breakdown, matched case-insensitively on
/// "female"/"women"/"woman".
pub fn female_share(workforce: &WorkforcePayload) -> f64 {
    let female: u64 = workforce
        .gender
        .iter()
        .filter(|g| matches!(g.category.trim().to_lowercase().as_str(), "female" | "women" | "woman" | "f"))
        .map(|g| g.count)
        .sum();
    cards::share(female as f64, workforce.total() as f64)
}

/// Build the workforce diversity tab from a payload.
pub fn summarize(workforce: &WorkforcePayload) -> TabSummary {
    let total = workforce.total() as f64;

    let mut breakdowns = Vec::new();
    if !workforce.gender.is_empty() {
        breakdowns.push(Breakdown::from_counts("Gender", &counts(&workforce.gender), Some(total)));
    }
    if !workforce.age_groups.is_empty() {
        breakdowns.push(Breakdown::from_counts("Age Group", &counts(&workforce.age_groups), Some(total)));
    }
    if !workforce.departments.is_empty() {
        // Department rows report the female share within each department.
        breakdowns.push(Breakdown {
            title: "Department (female share)".to_string(),
            rows: workforce
                .departments
                .iter()
                .map(|d| BreakdownRow {
                    category: d.name.clone(),
                    count: d.headcount as f64,
                    share: cards::share(d.female as f64, d.headcount as f64),
                })
                .collect(),
        });
    }

    let mut summary_cards = vec![
        SummaryCard::new("Total Employees", total, "people"),
        SummaryCard::new("Female Share", female_share(workforce), "%"),
        SummaryCard::new("Departments", workforce.departments.len() as f64, ""),
    ];
    if let Some(largest) = workforce.departments.iter().max_by_key(|d| d.headcount) {
        summary_cards.push(
            SummaryCard::new("Largest Department", largest.headcount as f64, "people")
                .with_caption(largest.name.clone()),
        );
    }

    let mut series = Vec::new();
    if !workforce.headcount.is_empty() {
        series.push(MetricSeries::new(
            HEADCOUNT,
            "people",
            workforce.headcount.iter().map(|h| h.period.clone()).collect(),
            workforce.headcount.iter().map(|h| h.value).collect(),
        ));
    }
    assign_colors(&mut series);
    if let Some(change) = series
        .first()
        .and_then(|s| s.last_two())
        .and_then(|(prev, cur)| cards::percent_change(prev, cur))
    {
        summary_cards[0].change = Some(change);
    }

    let (stats, anomalies) = analyze_series(&series);

    TabSummary {
        title: "Workforce".to_string(),
        cards: summary_cards,
        series,
        stats,
        anomalies,
        correlations: Vec::new(),
        breakdowns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::payload::{DepartmentCount, PeriodValue};

    fn category(name: &str, count: u64) -> CategoryCount {
        CategoryCount {
            category: name.to_string(),
            count,
        }
    }

    fn payload() -> WorkforcePayload {
        WorkforcePayload {
            total_employees: Some(200),
            gender: vec![category("Female", 80), category("Male", 116), category("Non-binary", 4)],
            age_groups: vec![category("<30", 50), category("30-50", 110), category(">50", 40)],
            departments: vec![
                DepartmentCount { name: "Operations".into(), headcount: 120, female: 30 },
                DepartmentCount { name: "Finance".into(), headcount: 80, female: 50 },
            ],
            headcount: vec![
                PeriodValue { period: "2024-01".into(), value: 190.0 },
                PeriodValue { period: "2024-02".into(), value: 200.0 },
            ],
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
    }

    #[test]
    fn breakdowns_and_cards() {
        let tab = summarize(&payload());
        assert_eq!(tab.breakdowns.len(), 3);
        assert_close(tab.breakdowns[0].rows[0].share, 40.0);
        // 110 / 200 * 100 is not exactly 55 in binary.
        assert_close(tab.breakdowns[1].rows[1].share, 55.0);
        assert_close(tab.breakdowns[2].rows[1].share, 62.5);

        assert_eq!(tab.cards[0].value, 200.0);
        assert!((tab.cards[0].change.unwrap() - 100.0 / 19.0).abs() < 1e-9);
        assert_close(tab.cards[1].value, 40.0);
        assert_eq!(tab.cards[2].value, 2.0);
        assert_eq!(tab.cards[3].caption.as_deref(), Some("Operations"));
        assert_eq!(tab.stats[0].series, HEADCOUNT);
    }

    #[test]
    fn empty_workforce_is_zeroed() {
        let tab = summarize(&WorkforcePayload::default());
        assert!(tab.breakdowns.is_empty());
        assert!(tab.series.is_empty());
        assert_eq!(tab.cards[0].value, 0.0);
        assert_eq!(tab.cards[1].value, 0.0);
    }
}
