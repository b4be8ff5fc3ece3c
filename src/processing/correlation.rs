use serde::{Deserialize, Serialize};

/// Qualitative strength of a correlation coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrelationStrength {
    VeryStrong,
    Strong,
    Moderate,
    Weak,
}

impl CorrelationStrength {
    pub fn label(&self) -> &'static str {
        match self {
            CorrelationStrength::VeryStrong => "Very Strong",
            CorrelationStrength::Strong => "Strong",
            CorrelationStrength::Moderate => "Moderate",
            CorrelationStrength::Weak => "Weak",
        }
    }
}

/// Classify a coefficient by magnitude; the sign does not matter.
pub fn label(coefficient: f64) -> CorrelationStrength {
    let magnitude = coefficient.abs();
    if magnitude > 0.8 {
        CorrelationStrength::VeryStrong
    } else if magnitude > 0.7 {
        CorrelationStrength::Strong
    } else if magnitude > 0.4 {
        CorrelationStrength::Moderate
    } else {
        CorrelationStrength::Weak
    }
}

/// Pearson product-moment correlation over the pairs where both values are
/// finite. Returns `None` with fewer than two pairs or when either side is
/// constant.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y.iter())
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(&a, &b)| (a, b))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for &(a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

/// A correlation between two named series, as shown in the correlation table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationRow {
    pub left: String,
    pub right: String,
    pub coefficient: Option<f64>,
    pub strength: Option<CorrelationStrength>,
}

impl CorrelationRow {
    pub fn between(left: &str, left_values: &[f64], right: &str, right_values: &[f64]) -> Self {
        let coefficient = pearson(left_values, right_values);
        Self {
            left: left.to_string(),
            right: right.to_string(),
            coefficient,
            strength: coefficient.map(label),
        }
    }

    /// "positive", "negative" or "n/a".
    pub fn direction(&self) -> &'static str {
        match self.coefficient {
            Some(c) if c > 0.0 => "positive",
            Some(c) if c < 0.0 => "negative",
            Some(_) => "none",
            None => "n/a",
        }
    }
}

/// Correlate the named pairs of series. Pairs naming an unknown series are skipped.
pub fn correlate_pairs(series: &[(String, Vec<f64>)], pairs: &[(&str, &str)]) -> Vec<CorrelationRow> {
    let find = |name: &str| series.iter().find(|(label, _)| label == name);
    pairs
        .iter()
        .filter_map(|&(l, r)| {
            let (left, lv) = find(l)?;
            let (right, rv) = find(r)?;
            Some(CorrelationRow::between(left, lv, right, rv))
        })
        .collect()
}

/// Correlate every unordered pair of series.
pub fn correlation_matrix(series: &[(String, Vec<f64>)]) -> Vec<CorrelationRow> {
    let mut rows = Vec::new();
    for i in 0..series.len() {
        for j in (i + 1)..series.len() {
            let (l, lv) = &series[i];
            let (r, rv) = &series[j];
            rows.push(CorrelationRow::between(l, lv, r, rv));
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_bands() {
        assert_eq!(label(0.85), CorrelationStrength::VeryStrong);
        assert_eq!(label(0.72), CorrelationStrength::Strong);
        assert_eq!(label(0.68), CorrelationStrength::Moderate);
        assert_eq!(label(0.58), CorrelationStrength::Moderate);
        assert_eq!(label(0.1), CorrelationStrength::Weak);
        assert_eq!(label(-0.9), CorrelationStrength::VeryStrong);
        assert_eq!(label(0.85).label(), "Very Strong");
    }

    #[test]
    fn pearson_perfect_lines() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let up = [3.0, 5.0, 7.0, 9.0, 11.0];
        let down = [10.0, 8.0, 6.0, 4.0, 2.0];
        assert!((pearson(&x, &up).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&x, &down).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_degenerate_inputs() {
        assert_eq!(pearson(&[1.0], &[2.0]), None);
        assert_eq!(pearson(&[1.0, 2.0, 3.0], &[4.0, 4.0, 4.0]), None);
        assert_eq!(pearson(&[], &[]), None);
    }

    #[test]
    fn pearson_skips_non_finite_pairs() {
        let x = [1.0, f64::NAN, 2.0, 3.0];
        let y = [2.0, 100.0, 4.0, 6.0];
        assert!((pearson(&x, &y).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn pairs_and_matrix() {
        let series = vec![
            ("A".to_string(), vec![1.0, 2.0, 3.0]),
            ("B".to_string(), vec![2.0, 4.0, 6.0]),
            ("C".to_string(), vec![5.0, 5.0, 5.0]),
        ];
        let rows = correlate_pairs(&series, &[("A", "B"), ("A", "Missing")]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].strength, Some(CorrelationStrength::VeryStrong));
        assert_eq!(rows[0].direction(), "positive");

        let matrix = correlation_matrix(&series);
        assert_eq!(matrix.len(), 3);
        let ac = matrix.iter().find(|r| r.left == "A" && r.right == "C").unwrap();
        assert_eq!(ac.coefficient, None);
        assert_eq!(ac.direction(), "n/a");
    }
}
