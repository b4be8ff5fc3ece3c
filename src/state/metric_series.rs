use serde::{Deserialize, Serialize};

use crate::data::periods;

/// Chart palette, cycled by series index.
pub const COLOR_PALETTE: [[u8; 4]; 10] = [
    [46, 125, 50, 255],   // Green
    [25, 118, 210, 255],  // Blue
    [239, 108, 0, 255],   // Orange
    [123, 31, 162, 255],  // Purple
    [0, 151, 167, 255],   // Teal
    [198, 40, 40, 255],   // Red
    [249, 168, 37, 255],  // Amber
    [93, 64, 55, 255],    // Brown
    [96, 125, 139, 255],  // Blue Grey
    [216, 27, 96, 255],   // Pink
];

pub fn color_for_index(index: usize) -> [u8; 4] {
    COLOR_PALETTE[index % COLOR_PALETTE.len()]
}

static NEXT_SERIES_ID: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(1);

fn next_series_id() -> u64 {
    NEXT_SERIES_ID.fetch_add(1, std::sync::atomic::Ordering::Relaxed)
}

/// One metric over reporting periods, e.g. monthly Scope 1 emissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSeries {
    pub id: u64,
    pub label: String,
    pub unit: String,
    pub periods: Vec<String>,
    pub values: Vec<f64>,
    pub color: [u8; 4],
    pub visible: bool,
}

impl MetricSeries {
    pub fn new(label: impl Into<String>, unit: impl Into<String>, periods: Vec<String>, values: Vec<f64>) -> Self {
        Self {
            id: next_series_id(),
            label: label.into(),
            unit: unit.into(),
            periods,
            values,
            color: [0, 0, 0, 0],
            visible: true,
        }
    }

    pub fn with_color(mut self, color: [u8; 4]) -> Self {
        self.color = color;
        self
    }

    pub fn color32(&self) -> egui::Color32 {
        egui::Color32::from_rgba_unmultiplied(self.color[0], self.color[1], self.color[2], self.color[3])
    }

    pub fn point_count(&self) -> usize {
        self.values.len().min(self.periods.len())
    }

    /// The most recent value and the one before it.
    pub fn last_two(&self) -> Option<(f64, f64)> {
        let n = self.point_count();
        if n < 2 {
            return None;
        }
        Some((self.values[n - 2], self.values[n - 1]))
    }

    /// Chart x coordinates: days since epoch when every period label is a
    /// date, otherwise the row index.
    pub fn x_coords(&self) -> (Vec<f64>, bool) {
        let n = self.point_count();
        let dates: Option<Vec<f64>> = self.periods[..n]
            .iter()
            .map(|p| periods::parse_period(p).map(periods::period_ordinal))
            .collect();
        match dates {
            Some(xs) if n > 0 => (xs, true),
            _ => ((0..n).map(|i| i as f64).collect(), false),
        }
    }
}

/// Give every series without a colour the next palette entry.
pub fn assign_colors(series: &mut [MetricSeries]) {
    for (i, s) in series.iter_mut().enumerate() {
        if s.color == [0, 0, 0, 0] {
            s.color = color_for_index(i);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn periods(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn dated_periods_become_day_ordinals() {
        let s = MetricSeries::new("Scope 1", "tCO2e", periods(&["2024-01", "2024-02"]), vec![1.0, 2.0]);
        let (xs, dated) = s.x_coords();
        assert!(dated);
        assert_eq!(xs[1] - xs[0], 31.0);
    }

    #[test]
    fn opaque_periods_fall_back_to_index() {
        let s = MetricSeries::new("Waste", "t", periods(&["North", "South", "East"]), vec![1.0, 2.0, 3.0]);
        assert_eq!(s.x_coords(), (vec![0.0, 1.0, 2.0], false));
        assert_eq!(s.last_two(), Some((2.0, 3.0)));
    }

    #[test]
    fn ids_are_unique_and_colors_assigned() {
        let mut list = vec![
            MetricSeries::new("a", "", vec![], vec![]),
            MetricSeries::new("b", "", vec![], vec![]).with_color([1, 2, 3, 255]),
        ];
        assert_ne!(list[0].id, list[1].id);
        assign_colors(&mut list);
        assert_eq!(list[0].color, color_for_index(0));
        assert_eq!(list[1].color, [1, 2, 3, 255]);
        assert_eq!(list[0].last_two(), None);
    }
}
