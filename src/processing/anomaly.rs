//! Z-score anomaly detection over a single metric series.

use serde::{Deserialize, Serialize};

use crate::processing::statistics::{round_to, SeriesStats};

/// Samples whose |z| exceeds this are reported as anomalies.
pub const Z_THRESHOLD: f64 = 2.0;

/// Boundary between Medium and High severity.
pub const HIGH_SEVERITY_Z: f64 = 3.0;

/// One reporting period's value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledSample {
    pub label: String,
    pub value: f64,
}

impl LabeledSample {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn classify(z: f64) -> Self {
        let magnitude = z.abs();
        if magnitude > HIGH_SEVERITY_Z {
            Severity::High
        } else if magnitude > Z_THRESHOLD {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub period_label: String,
    pub value: f64,
    /// Rounded to 2 decimals.
    pub z_score: f64,
    /// Deviation from the series mean in percent, rounded to 1 decimal.
    pub percent_deviation: f64,
    pub severity: Severity,
}

/// Z-score of `value` against the series. A zero standard deviation is
/// replaced by 1, so a constant series scores 0 everywhere.
pub fn z_score(value: f64, stats: &SeriesStats) -> f64 {
    let divisor = if stats.std_dev == 0.0 { 1.0 } else { stats.std_dev };
    (value - stats.mean) / divisor
}

/// Deviation from the mean in percent. A zero mean is replaced by 1.
pub fn percent_deviation(value: f64, stats: &SeriesStats) -> f64 {
    let base = if stats.mean == 0.0 { 1.0 } else { stats.mean };
    (value - stats.mean) / base * 100.0
}

/// Flag every sample whose |z| exceeds [`Z_THRESHOLD`], in input order.
pub fn detect(samples: &[LabeledSample], stats: &SeriesStats) -> Vec<AnomalyRecord> {
    samples
        .iter()
        .filter(|s| s.value.is_finite())
        .filter_map(|s| {
            let z = z_score(s.value, stats);
            // Compare the rounded score so a reported 2.00 is never listed.
            let rounded = round_to(z, 2);
            if rounded.abs() <= Z_THRESHOLD {
                return None;
            }
            Some(AnomalyRecord {
                period_label: s.label.clone(),
                value: s.value,
                z_score: rounded,
                percent_deviation: round_to(percent_deviation(s.value, stats), 1),
                severity: Severity::classify(rounded),
            })
        })
        .collect()
}

/// Pair period labels with values, truncating to the shorter of the two.
pub fn label_samples(labels: &[String], values: &[f64]) -> Vec<LabeledSample> {
    labels
        .iter()
        .zip(values.iter())
        .map(|(l, &v)| LabeledSample::new(l.clone(), v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(values: &[f64]) -> Vec<LabeledSample> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| LabeledSample::new(format!("P{}", i + 1), v))
            .collect()
    }

    #[test]
    fn constant_series_has_no_anomalies() {
        for v in [0.0, 7.5, -3.0, 1e6] {
            let data = vec![v; 12];
            let stats = SeriesStats::compute(&data);
            assert_eq!(stats.std_dev, 0.0);
            assert!(detect(&samples(&data), &stats).is_empty());
        }
    }

    #[test]
    fn spike_is_flagged() {
        let mut data = vec![10.0; 11];
        data.push(100.0);
        let stats = SeriesStats::compute(&data);
        let found = detect(&samples(&data), &stats);
        assert_eq!(found.len(), 1);
        let rec = &found[0];
        assert_eq!(rec.period_label, "P12");
        assert_eq!(rec.value, 100.0);
        assert!(rec.z_score > 3.0);
        assert_eq!(rec.severity, Severity::High);
        // mean is 17.5, so the spike sits 471.4% above it
        assert_eq!(rec.percent_deviation, 471.4);
    }

    #[test]
    fn detect_never_returns_values_within_threshold() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 50.0, -30.0];
        let stats = SeriesStats::compute(&data);
        for rec in detect(&samples(&data), &stats) {
            assert!(rec.z_score.abs() > Z_THRESHOLD);
            assert_ne!(rec.severity, Severity::Low);
        }
    }

    #[test]
    fn scores_that_round_to_threshold_are_excluded() {
        let stats = SeriesStats {
            count: 10,
            mean: 0.0,
            median: 0.0,
            std_dev: 1.0,
            min: -5.0,
            max: 5.0,
        };
        assert!(detect(&samples(&[2.004]), &stats).is_empty());
        assert_eq!(detect(&samples(&[2.006]), &stats)[0].z_score, 2.01);
    }

    #[test]
    fn zero_mean_uses_unit_base_for_percent() {
        let stats = SeriesStats {
            count: 3,
            mean: 0.0,
            median: 0.0,
            std_dev: 1.0,
            min: -3.0,
            max: 3.0,
        };
        let found = detect(&samples(&[2.5, 0.5]), &stats);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].z_score, 2.5);
        assert_eq!(found[0].percent_deviation, 250.0);
        assert_eq!(found[0].severity, Severity::Medium);
    }

    #[test]
    fn severity_bands() {
        assert_eq!(Severity::classify(3.01), Severity::High);
        assert_eq!(Severity::classify(-3.5), Severity::High);
        assert_eq!(Severity::classify(2.5), Severity::Medium);
        assert_eq!(Severity::classify(2.0), Severity::Low);
        assert_eq!(Severity::classify(0.0), Severity::Low);
    }

    #[test]
    fn label_samples_truncates() {
        let labels = vec!["Jan".to_string(), "Feb".to_string(), "Mar".to_string()];
        let paired = label_samples(&labels, &[1.0, 2.0]);
        assert_eq!(paired.len(), 2);
        assert_eq!(paired[1], LabeledSample::new("Feb", 2.0));
    }
}
