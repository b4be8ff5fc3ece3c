use egui::{Color32, Visuals};
use serde::{Deserialize, Serialize};

use crate::processing::anomaly::Severity;
use crate::processing::correlation::CorrelationStrength;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    pub fn toggle(&self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn visuals(&self) -> Visuals {
        match self {
            Theme::Dark => Visuals::dark(),
            Theme::Light => Visuals::light(),
        }
    }

    pub fn card_bg(&self) -> Color32 {
        match self {
            Theme::Dark => Color32::from_rgb(32, 36, 40),
            Theme::Light => Color32::from_rgb(245, 247, 245),
        }
    }

    pub fn severity_color(&self, severity: Severity) -> Color32 {
        match (self, severity) {
            (_, Severity::High) => Color32::from_rgb(229, 57, 53),
            (Theme::Dark, Severity::Medium) => Color32::from_rgb(255, 183, 77),
            (Theme::Light, Severity::Medium) => Color32::from_rgb(230, 120, 0),
            (Theme::Dark, Severity::Low) => Color32::from_gray(170),
            (Theme::Light, Severity::Low) => Color32::from_gray(90),
        }
    }

    pub fn strength_color(&self, strength: CorrelationStrength) -> Color32 {
        match strength {
            CorrelationStrength::VeryStrong => Color32::from_rgb(67, 160, 71),
            CorrelationStrength::Strong => Color32::from_rgb(124, 179, 66),
            CorrelationStrength::Moderate => Color32::from_rgb(251, 192, 45),
            CorrelationStrength::Weak => match self {
                Theme::Dark => Color32::from_gray(150),
                Theme::Light => Color32::from_gray(110),
            },
        }
    }

    /// Colour for a period-over-period change; whether a rise is good depends on the metric.
    pub fn change_color(&self, change: f64, higher_is_better: bool) -> Color32 {
        let good = if higher_is_better { change >= 0.0 } else { change <= 0.0 };
        if good {
            Color32::from_rgb(67, 160, 71)
        } else {
            Color32::from_rgb(229, 57, 53)
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Theme::Dark => "Dark",
            Theme::Light => "Light",
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Theme::Dark
    }
}
