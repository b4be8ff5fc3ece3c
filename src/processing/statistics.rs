use serde::{Deserialize, Serialize};

/// Descriptive statistics for a metric series.
///
/// An empty series yields all-zero fields rather than an error so the
/// dashboard cards always have something to show.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SeriesStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl SeriesStats {
    /// Compute statistics from sample values, filtering out NaN and infinities.
    pub fn compute(samples: &[f64]) -> Self {
        let mut vals: Vec<f64> = samples.iter().copied().filter(|v| v.is_finite()).collect();
        if vals.is_empty() {
            return Self::default();
        }

        let count = vals.len();
        let min = vals.iter().copied().fold(f64::INFINITY, f64::min);
        let max = vals.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        // Work on values divided by a power of two so sums near f64::MAX
        // stay finite. The division is exact, so ordinary data is unaffected.
        let scale = magnitude_scale(min.abs().max(max.abs()));
        let n = count as f64;
        let scaled_mean = vals.iter().map(|v| v / scale).sum::<f64>() / n;
        // Clamp only absorbs rounding drift.
        let mean = (scaled_mean * scale).clamp(min, max);
        let scaled_variance = vals
            .iter()
            .map(|v| (v / scale - scaled_mean).powi(2))
            .sum::<f64>()
            / n;
        let std_dev = scaled_variance.sqrt() * scale;

        vals.sort_by(|a, b| a.total_cmp(b));
        // Upper-middle element for even counts, not the average of the two.
        let median = vals[count / 2];

        SeriesStats {
            count,
            mean,
            median,
            std_dev,
            min,
            max,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    /// Relative spread (`std_dev / mean`), zero when the mean is zero.
    pub fn coefficient_of_variation(&self) -> f64 {
        if self.mean == 0.0 {
            0.0
        } else {
            self.std_dev / self.mean
        }
    }

    /// Format as a multi-line report string.
    pub fn report(&self, label: &str) -> String {
        format!(
            "{}:\n  Count: {}\n  Mean: {}\n  Median: {}\n  Std Dev: {}\n  Min: {}\n  Max: {}\n  Range: {}\n  CV: {}\n",
            label,
            self.count,
            fmt_fixed(self.mean, 2),
            fmt_fixed(self.median, 2),
            fmt_fixed(self.std_dev, 2),
            fmt_fixed(self.min, 2),
            fmt_fixed(self.max, 2),
            fmt_fixed(self.range(), 2),
            fmt_fixed(self.coefficient_of_variation(), 3),
        )
    }
}

/// Largest power of two not above `max_abs`, and at least 1.
fn magnitude_scale(max_abs: f64) -> f64 {
    if max_abs <= 1.0 {
        return 1.0;
    }
    let exponent = (max_abs.log2().floor() as i32).clamp(0, f64::MAX_EXP - 1);
    2f64.powi(exponent)
}

/// Round to a fixed number of decimals, half away from zero.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Display formatting with a fixed number of decimals. Negative zero prints as `0`.
pub fn fmt_fixed(value: f64, decimals: u32) -> String {
    let rounded = round_to(value, decimals);
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{:.*}", decimals as usize, rounded)
}
