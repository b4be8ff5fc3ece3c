use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use eframe::egui;

use crate::data::export;
use crate::data::loader::{self, LoadedData};
use crate::data::payload::{self, DashboardPayload};
use crate::state::app_state::{AppState, TabId, VERSION};
use crate::state::theme::Theme;
use crate::ui::import_dialog::{self, DialogResult, ImportDialogState, ImportSelection};
use crate::ui::tab_view::{self, TabAction};
use crate::ui::tables::SortDirection;

pub const SESSION_EXTENSION: &str = "esglens";

/// What a file on disk should be opened as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Payload,
    Sheet,
    Session,
}

impl FileKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "json" => Some(FileKind::Payload),
            "csv" | "xls" | "xlsx" => Some(FileKind::Sheet),
            SESSION_EXTENSION => Some(FileKind::Session),
            _ => None,
        }
    }
}

enum Loaded {
    Payload(DashboardPayload),
    Sheet(LoadedData),
    Session(AppState),
}

/// File parsing runs on a worker thread; the result is polled every frame.
struct PendingLoad {
    path: PathBuf,
    result: Arc<Mutex<Option<Result<Loaded, String>>>>,
}

pub struct EsgLensApp {
    pub state: AppState,
    /// Column picker shown after a sheet is read.
    pub import_dialog: Option<ImportDialogState>,
    pub error_message: Option<String>,
    pub show_about: bool,
    anomaly_sort: Option<(usize, SortDirection)>,
    /// Tab the current sort applies to.
    sort_tab: TabId,
    pending_load: Option<PendingLoad>,
}

fn apply_rounding(visuals: &mut egui::Visuals) {
    visuals.window_corner_radius = egui::CornerRadius::same(8);
    visuals.widgets.noninteractive.corner_radius = egui::CornerRadius::same(6);
    visuals.widgets.inactive.corner_radius = egui::CornerRadius::same(6);
    visuals.widgets.hovered.corner_radius = egui::CornerRadius::same(6);
    visuals.widgets.active.corner_radius = egui::CornerRadius::same(6);
    visuals.widgets.open.corner_radius = egui::CornerRadius::same(6);
    visuals.widgets.hovered.bg_stroke = egui::Stroke::new(1.5, egui::Color32::from_gray(160));
    visuals.widgets.active.bg_stroke = egui::Stroke::new(2.0, egui::Color32::from_gray(200));
}

impl EsgLensApp {
    pub fn new(cc: &eframe::CreationContext<'_>, initial_file: Option<PathBuf>) -> Self {
        let ctx = &cc.egui_ctx;
        let mut style = (*ctx.style()).clone();

        style.text_styles.insert(egui::TextStyle::Body, egui::FontId::proportional(15.0));
        style.text_styles.insert(egui::TextStyle::Button, egui::FontId::proportional(14.5));
        style.text_styles.insert(egui::TextStyle::Heading, egui::FontId::proportional(22.0));
        style.text_styles.insert(egui::TextStyle::Small, egui::FontId::proportional(12.0));
        style.text_styles.insert(egui::TextStyle::Monospace, egui::FontId::monospace(13.5));

        style.spacing.button_padding = egui::vec2(10.0, 5.0);
        style.spacing.item_spacing = egui::vec2(8.0, 6.0);
        style.spacing.window_margin = egui::Margin::same(12);
        style.spacing.indent = 20.0;
        apply_rounding(&mut style.visuals);
        ctx.set_style(style);

        let mut app = Self {
            state: AppState::new(),
            import_dialog: None,
            error_message: None,
            show_about: false,
            anomaly_sort: None,
            sort_tab: TabId::Overview,
            pending_load: None,
        };
        if let Some(path) = initial_file {
            app.open_path(&path);
        }
        app
    }

    fn pick_and_open(&mut self, filter_name: &str, extensions: &[&str]) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter(filter_name, extensions)
            .add_filter("All Files", &["*"])
            .pick_file()
        {
            self.open_path(&path);
        }
    }

    /// Start loading `path` in the background, choosing the parser by extension.
    pub fn open_path(&mut self, path: &Path) {
        let Some(kind) = FileKind::from_path(path) else {
            self.error_message = Some(format!("Unsupported file type: {}", path.display()));
            return;
        };
        if self.pending_load.is_some() {
            tracing::warn!("Ignoring {:?}; another file is still loading", path);
            return;
        }

        let path_buf = path.to_path_buf();
        let result: Arc<Mutex<Option<Result<Loaded, String>>>> = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&result);
        let worker_path = path_buf.clone();

        std::thread::spawn(move || {
            let outcome = match kind {
                FileKind::Payload => payload::load_payload(&worker_path).map(Loaded::Payload),
                FileKind::Sheet => loader::load_file(&worker_path).map(Loaded::Sheet),
                FileKind::Session => std::fs::read_to_string(&worker_path)
                    .map_err(|e| format!("Cannot read file: {e}"))
                    .and_then(|json| AppState::from_session_json(&json))
                    .map(Loaded::Session),
            };
            if let Ok(mut guard) = slot.lock() {
                *guard = Some(outcome);
            }
        });

        self.pending_load = Some(PendingLoad {
            path: path_buf,
            result,
        });
    }

    fn finish_load(&mut self, path: &Path, outcome: Result<Loaded, String>) {
        match outcome {
            Ok(Loaded::Payload(p)) => {
                tracing::info!("Loaded payload from {:?}", path);
                self.state.set_payload(p);
            }
            Ok(Loaded::Sheet(data)) => {
                tracing::info!("Read {} rows from {:?}", data.row_count, path);
                self.import_dialog = Some(ImportDialogState::new(data));
            }
            Ok(Loaded::Session(restored)) => {
                tracing::info!("Session loaded from {:?}", path);
                self.state = restored;
            }
            Err(e) => {
                tracing::error!("Failed to load {:?}: {e}", path);
                self.error_message = Some(e);
            }
        }
    }

    fn process_import(&mut self, data: &LoadedData, selection: ImportSelection) {
        match loader::build_metric_sheet(data, selection.period_col, &selection.metric_cols) {
            Ok(sheet) => {
                tracing::info!("Imported {} metrics from {}", sheet.metrics.len(), sheet.name);
                self.state.add_sheet(sheet);
            }
            Err(e) => {
                tracing::error!("Import failed: {e}");
                self.error_message = Some(e);
            }
        }
    }

    fn save_session(&mut self) {
        let json = match self.state.to_session_json() {
            Ok(j) => j,
            Err(e) => {
                tracing::error!("{e}");
                self.error_message = Some(e);
                return;
            }
        };
        if let Some(path) = rfd::FileDialog::new()
            .set_file_name(format!("session.{SESSION_EXTENSION}"))
            .add_filter("ESG Lens Session", &[SESSION_EXTENSION])
            .save_file()
        {
            match std::fs::write(&path, json) {
                Ok(()) => tracing::info!("Session saved to {:?}", path),
                Err(e) => {
                    tracing::error!("Failed to save session: {e}");
                    self.error_message = Some(format!("Failed to save session: {e}"));
                }
            }
        }
    }

    fn export_report(&mut self) {
        let Some(tab) = self.state.tab(self.state.active_tab) else {
            return;
        };
        let filename = format!("{}_report.csv", tab.title.replace(' ', "_"));
        if let Some(path) = rfd::FileDialog::new()
            .set_file_name(&filename)
            .add_filter("CSV Files", &["csv"])
            .save_file()
        {
            if let Err(e) = export::export_tab_report(&path, tab) {
                tracing::error!("{e}");
                self.error_message = Some(e);
            }
        }
    }

    fn copy_to_clipboard(&mut self, what: &str, text: String) {
        match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(text)) {
            Ok(()) => tracing::info!("Copied {what} to clipboard"),
            Err(e) => {
                tracing::error!("Clipboard error: {e}");
                self.error_message = Some(format!("Clipboard error: {e}"));
            }
        }
    }

    fn handle_action(&mut self, action: TabAction) {
        match action {
            TabAction::Open(id) => self.state.active_tab = id,
            TabAction::RemoveSheet(i) => self.state.remove_sheet(i),
            TabAction::ExportReport => self.export_report(),
            TabAction::CopyAnomalies => {
                if let Some(tab) = self.state.tab(self.state.active_tab) {
                    let text = export::anomalies_as_text(tab);
                    self.copy_to_clipboard("anomalies", text);
                }
            }
            TabAction::CopyStats => {
                if let Some(tab) = self.state.tab(self.state.active_tab) {
                    let text = export::stats_as_text(tab);
                    self.copy_to_clipboard("statistics", text);
                }
            }
        }
    }

    fn menu_bar(&mut self, ui: &mut egui::Ui) -> Option<TabAction> {
        let mut action = None;
        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Open Payload...").clicked() {
                    ui.close_menu();
                    self.pick_and_open("ESG Payload", &["json"]);
                }
                if ui.button("Import Sheet...").clicked() {
                    ui.close_menu();
                    self.pick_and_open("Data Files", &["csv", "xls", "xlsx"]);
                }
                ui.separator();
                if ui.button("Load Session...").clicked() {
                    ui.close_menu();
                    self.pick_and_open("ESG Lens Session", &[SESSION_EXTENSION]);
                }
                if ui.button("Save Session...").clicked() {
                    ui.close_menu();
                    self.save_session();
                }
                ui.separator();
                let has_tab = self.state.tab(self.state.active_tab).is_some();
                if ui.add_enabled(has_tab, egui::Button::new("Export Report...")).clicked() {
                    ui.close_menu();
                    action = Some(TabAction::ExportReport);
                }
                if ui.add_enabled(has_tab, egui::Button::new("Copy Anomalies")).clicked() {
                    ui.close_menu();
                    action = Some(TabAction::CopyAnomalies);
                }
            });
            ui.menu_button("View", |ui| {
                let theme_label = match self.state.theme {
                    Theme::Dark => "Light Mode",
                    Theme::Light => "Dark Mode",
                };
                if ui.button(theme_label).clicked() {
                    self.state.theme = self.state.theme.toggle();
                    ui.close_menu();
                }
                ui.checkbox(&mut self.state.view.show_mean_line, "Mean line");
                ui.checkbox(&mut self.state.view.show_anomaly_markers, "Anomaly markers");
            });
            ui.menu_button("Help", |ui| {
                if ui.button("About ESG Lens").clicked() {
                    self.show_about = true;
                    ui.close_menu();
                }
            });

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.small(format!("v{VERSION}"));
            });
        });
        action
    }

    fn tab_strip(&mut self, ui: &mut egui::Ui) {
        ui.horizontal_wrapped(|ui| {
            let active = &mut self.state.active_tab;
            ui.selectable_value(active, TabId::Overview, "Overview");
            for (id, tab) in &self.state.tabs {
                let label = match tab.anomaly_count() {
                    0 => tab.title.clone(),
                    n => format!("{} ({n})", tab.title),
                };
                ui.selectable_value(active, *id, label);
            }
        });
    }
}

impl eframe::App for EsgLensApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut visuals = self.state.theme.visuals();
        apply_rounding(&mut visuals);
        ctx.set_visuals(visuals);

        // Dropped files
        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|f| f.path.clone())
                .filter(|p| FileKind::from_path(p).is_some())
                .collect()
        });
        if let Some(path) = dropped.first() {
            self.open_path(path);
        }

        let mut actions: Vec<TabAction> = Vec::new();

        egui::TopBottomPanel::top("header")
            .frame(egui::Frame::side_top_panel(&ctx.style()).inner_margin(egui::Margin::symmetric(16, 8)))
            .show(ctx, |ui| {
                if let Some(a) = self.menu_bar(ui) {
                    actions.push(a);
                }
                ui.add_space(4.0);
                self.tab_strip(ui);
            });

        egui::TopBottomPanel::bottom("footer")
            .frame(egui::Frame::side_top_panel(&ctx.style()).inner_margin(egui::Margin::symmetric(16, 6)))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    let sections = self.state.tabs.len();
                    let anomalies: usize = self.state.tabs.iter().map(|(_, t)| t.anomaly_count()).sum();
                    ui.label(
                        egui::RichText::new(format!("{sections} sections, {anomalies} anomalies flagged")).weak(),
                    );
                    if let Some(company) = self.state.payload.as_ref().and_then(|p| p.company.as_ref()) {
                        ui.separator();
                        ui.label(egui::RichText::new(&company.name).weak());
                    }
                });
            });

        if self.sort_tab != self.state.active_tab {
            self.sort_tab = self.state.active_tab;
            self.anomaly_sort = None;
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
                let active = self.state.active_tab;
                let action = if active == TabId::Overview {
                    tab_view::show_overview(ui, &self.state)
                } else {
                    let AppState { tabs, view, theme, .. } = &mut self.state;
                    match tabs.iter_mut().find(|(id, _)| *id == active) {
                        Some((_, tab)) => {
                            tab_view::show_tab(ui, active, tab, view, &mut self.anomaly_sort, *theme)
                        }
                        None => {
                            ui.label("This section is no longer loaded.");
                            None
                        }
                    }
                };
                if let Some(a) = action {
                    actions.push(a);
                }
            });
        });

        for action in actions {
            self.handle_action(action);
        }

        // Poll background load
        let finished = self.pending_load.as_ref().and_then(|pending| {
            let outcome = pending.result.lock().ok().and_then(|mut guard| guard.take());
            outcome.map(|o| (pending.path.clone(), o))
        });
        if let Some((path, outcome)) = finished {
            self.pending_load = None;
            self.finish_load(&path, outcome);
        }

        if let Some(pending) = &self.pending_load {
            let name = pending
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            egui::Window::new("Loading")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label(format!("Loading {name}..."));
                    });
                });
            ctx.request_repaint();
        }

        // Import dialog
        let mut finished_import = None;
        if let Some(dialog) = self.import_dialog.as_mut() {
            match import_dialog::show_import_dialog(ctx, dialog) {
                Some(DialogResult::Ok(selection)) => finished_import = Some(Some(selection)),
                Some(DialogResult::Cancel) => finished_import = Some(None),
                None => {}
            }
        }
        if let Some(selection) = finished_import {
            if let Some(dialog) = self.import_dialog.take() {
                if let Some(selection) = selection {
                    self.process_import(&dialog.loaded_data, selection);
                }
            }
        }

        if let Some(message) = self.error_message.clone() {
            let mut open = true;
            let mut dismissed = false;
            egui::Window::new("Error")
                .open(&mut open)
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.colored_label(egui::Color32::from_rgb(255, 80, 80), message);
                    ui.add_space(8.0);
                    if ui.button("OK").clicked() {
                        dismissed = true;
                    }
                });
            if !open || dismissed {
                self.error_message = None;
            }
        }

        if self.show_about {
            egui::Window::new("About ESG Lens")
                .open(&mut self.show_about)
                .collapsible(false)
                .resizable(false)
                .default_width(340.0)
                .show(ctx, |ui| {
                    ui.heading("ESG Lens");
                    ui.label(format!("Version: {VERSION}"));
                    ui.add_space(4.0);
                    ui.label("Sustainability reporting dashboard.");
                    ui.add_space(10.0);
                    ui.label("Features:");
                    ui.label("  \u{2022} GHG, waste and workforce payloads (JSON)");
                    ui.label("  \u{2022} Metric sheets from CSV and Excel");
                    ui.label("  \u{2022} Summary statistics per series");
                    ui.label("  \u{2022} Z-score anomaly flags");
                    ui.label("  \u{2022} Correlation strength labels");
                    ui.label("  \u{2022} CSV report export and saved sessions");
                });
        }
    }
}
