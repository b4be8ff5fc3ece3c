use serde::{Deserialize, Serialize};

use crate::processing::statistics::fmt_fixed;

/// A headline number shown at the top of a tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryCard {
    pub title: String,
    pub value: f64,
    pub unit: String,
    pub caption: Option<String>,
    /// Percent change against the previous period, if known.
    pub change: Option<f64>,
}

impl SummaryCard {
    pub fn new(title: &str, value: f64, unit: &str) -> Self {
        Self {
            title: title.to_string(),
            value,
            unit: unit.to_string(),
            caption: None,
            change: None,
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn with_change(mut self, change: Option<f64>) -> Self {
        self.change = change;
        self
    }

    pub fn display_value(&self) -> String {
        let decimals = if self.unit == "people" { 0 } else { 2 };
        let number = fmt_fixed(self.value, decimals);
        match self.unit.as_str() {
            "" => number,
            "%" => format!("{number}%"),
            unit => format!("{number} {unit}"),
        }
    }

    pub fn display_change(&self) -> Option<String> {
        self.change.map(|c| {
            let arrow = if c > 0.0 {
                "\u{25B2}"
            } else if c < 0.0 {
                "\u{25BC}"
            } else {
                "\u{25B6}"
            };
            format!("{arrow} {}% vs previous", fmt_fixed(c.abs(), 1))
        })
    }
}

/// Percent change from `previous` to `current`; `None` when `previous` is 0.
pub fn percent_change(previous: f64, current: f64) -> Option<f64> {
    if previous == 0.0 || !previous.is_finite() || !current.is_finite() {
        return None;
    }
    Some((current - previous) / previous.abs() * 100.0)
}

/// `part` as a percent of `total`; 0 when `total` is 0.
pub fn share(part: f64, total: f64) -> f64 {
    if total == 0.0 {
        0.0
    } else {
        part / total * 100.0
    }
}

/// Sum of the finite values.
pub fn finite_sum(values: &[f64]) -> f64 {
    values.iter().filter(|v| v.is_finite()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_change_handles_zero_base() {
        assert_eq!(percent_change(0.0, 10.0), None);
        assert_eq!(percent_change(100.0, 110.0), Some(10.0));
        assert_eq!(percent_change(-50.0, -25.0), Some(50.0));
    }

    #[test]
    fn share_of_zero_total() {
        assert_eq!(share(5.0, 0.0), 0.0);
        assert_eq!(share(1.0, 4.0), 25.0);
    }

    #[test]
    fn card_formatting() {
        let card = SummaryCard::new("Total", 1234.567, "tCO2e").with_change(Some(-4.26));
        assert_eq!(card.display_value(), "1234.57 tCO2e");
        assert_eq!(card.display_change().unwrap(), "\u{25BC} 4.3% vs previous");
        assert_eq!(SummaryCard::new("Rate", 42.0, "%").display_value(), "42.00%");
        assert_eq!(SummaryCard::new("Staff", 120.0, "people").display_value(), "120 people");
    }

    #[test]
    fn finite_sum_skips_nan() {
        assert_eq!(finite_sum(&[1.0, f64::NAN, 2.0]), 3.0);
    }
}
