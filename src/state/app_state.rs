use serde::{Deserialize, Serialize};

use crate::analytics::{self, TabSummary};
use crate::data::loader::MetricSheet;
use crate::data::payload::DashboardPayload;
use crate::state::theme::Theme;

pub const VERSION: &str = "0.1.0";

/// Which dashboard tab is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TabId {
    Overview,
    Ghg,
    Waste,
    Workforce,
    Sheet(usize),
}

impl Default for TabId {
    fn default() -> Self {
        TabId::Overview
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartKind {
    Line,
    Bars,
}

impl Default for ChartKind {
    fn default() -> Self {
        ChartKind::Line
    }
}

impl ChartKind {
    pub fn label(&self) -> &'static str {
        match self {
            ChartKind::Line => "Line",
            ChartKind::Bars => "Bars",
        }
    }
}

/// Display preferences persisted with the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewOptions {
    pub chart_kind: ChartKind,
    pub show_anomaly_markers: bool,
    pub show_mean_line: bool,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            chart_kind: ChartKind::default(),
            show_anomaly_markers: true,
            show_mean_line: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppState {
    pub payload: Option<DashboardPayload>,
    pub sheets: Vec<MetricSheet>,
    pub active_tab: TabId,
    pub theme: Theme,
    pub view: ViewOptions,
    /// Derived from `payload` and `sheets`; rebuilt by [`AppState::rebuild_tabs`].
    #[serde(skip)]
    pub tabs: Vec<(TabId, TabSummary)>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_payload(&mut self, payload: DashboardPayload) {
        self.payload = Some(payload);
        self.rebuild_tabs();
        self.active_tab = self
            .tabs
            .iter()
            .map(|(id, _)| *id)
            .find(|id| *id != TabId::Overview)
            .unwrap_or(TabId::Overview);
    }

    pub fn add_sheet(&mut self, sheet: MetricSheet) {
        self.sheets.push(sheet);
        self.rebuild_tabs();
        self.active_tab = TabId::Sheet(self.sheets.len() - 1);
    }

    pub fn remove_sheet(&mut self, index: usize) {
        if index >= self.sheets.len() {
            return;
        }
        self.sheets.remove(index);
        self.rebuild_tabs();
        if !self.has_tab(self.active_tab) {
            self.active_tab = TabId::Overview;
        }
    }

    /// Recompute every tab summary from the loaded data.
    pub fn rebuild_tabs(&mut self) {
        let mut tabs = Vec::new();
        if let Some(payload) = &self.payload {
            if let Some(ghg) = &payload.ghg {
                tabs.push((TabId::Ghg, analytics::ghg::summarize(ghg)));
            }
            if let Some(waste) = &payload.waste {
                tabs.push((TabId::Waste, analytics::waste::summarize(waste)));
            }
            if let Some(workforce) = &payload.workforce {
                tabs.push((TabId::Workforce, analytics::workforce::summarize(workforce)));
            }
        }
        for (i, sheet) in self.sheets.iter().enumerate() {
            tabs.push((TabId::Sheet(i), analytics::sheet::summarize(sheet)));
        }
        self.tabs = tabs;
    }

    pub fn has_tab(&self, id: TabId) -> bool {
        id == TabId::Overview || self.tabs.iter().any(|(t, _)| *t == id)
    }

    pub fn tab(&self, id: TabId) -> Option<&TabSummary> {
        self.tabs.iter().find(|(t, _)| *t == id).map(|(_, s)| s)
    }

    pub fn tab_mut(&mut self, id: TabId) -> Option<&mut TabSummary> {
        self.tabs.iter_mut().find(|(t, _)| *t == id).map(|(_, s)| s)
    }

    pub fn to_session_json(&self) -> Result<String, String> {
        serde_json::to_string_pretty(self).map_err(|e| format!("Failed to serialize session: {e}"))
    }

    /// Restore a saved session and rebuild its derived tabs.
    pub fn from_session_json(json: &str) -> Result<Self, String> {
        let mut state: AppState =
            serde_json::from_str(json).map_err(|e| format!("Failed to parse session: {e}"))?;
        state.rebuild_tabs();
        if !state.has_tab(state.active_tab) {
            state.active_tab = TabId::Overview;
        }
        Ok(state)
    }
}
