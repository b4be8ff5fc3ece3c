use crate::data::loader::{self, LoadedData};
use crate::data::periods;
use crate::data::unit_inference;

/// State for the import dialog, created when the user loads a sheet and
/// needs to choose the period column and which metrics to analyse.
pub struct ImportDialogState {
    pub loaded_data: LoadedData,
    pub period_col: usize,
    /// Parallel to `metric_columns`.
    pub selected: Vec<bool>,
    /// Columns that are mostly numeric.
    pub metric_columns: Vec<usize>,
}

impl ImportDialogState {
    pub fn new(loaded_data: LoadedData) -> Self {
        let period_col = guess_period_column(&loaded_data);
        let metric_columns: Vec<usize> = (0..loaded_data.columns.len())
            .filter(|&i| i != period_col)
            .filter(|&i| loader::column_to_f64(&loaded_data.column_data[i]).1 >= 0.5)
            .collect();
        let selected = vec![true; metric_columns.len()];
        Self {
            loaded_data,
            period_col,
            selected,
            metric_columns,
        }
    }

    pub fn selected_columns(&self) -> Vec<usize> {
        self.metric_columns
            .iter()
            .zip(&self.selected)
            .filter(|(&col, &on)| on && col != self.period_col)
            .map(|(&col, _)| col)
            .collect()
    }
}

/// First column whose non-blank cells all read as reporting periods,
/// falling back to the first column.
pub fn guess_period_column(data: &LoadedData) -> usize {
    data.column_data
        .iter()
        .position(|col| {
            let labels: Vec<String> = col
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            !labels.is_empty() && periods::all_periods(&labels)
        })
        .unwrap_or(0)
}

pub struct ImportSelection {
    pub period_col: usize,
    pub metric_cols: Vec<usize>,
}

pub enum DialogResult {
    Ok(ImportSelection),
    Cancel,
}

/// Returns `Some` once the user confirms or cancels, `None` while open.
pub fn show_import_dialog(ctx: &egui::Context, state: &mut ImportDialogState) -> Option<DialogResult> {
    let mut result = None;

    egui::Window::new(format!("Import {}", state.loaded_data.source_name))
        .collapsible(false)
        .resizable(true)
        .default_width(480.0)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label(
                egui::RichText::new(format!(
                    "{} columns, {} rows.",
                    state.loaded_data.columns.len(),
                    state.loaded_data.row_count,
                ))
                .weak(),
            );

            ui.add_space(12.0);

            ui.label(egui::RichText::new("Period column").strong());
            ui.add_space(2.0);
            let columns = &state.loaded_data.columns;
            egui::ComboBox::from_id_salt("period_selector")
                .selected_text(columns.get(state.period_col).map(String::as_str).unwrap_or(""))
                .width(300.0)
                .show_ui(ui, |ui| {
                    for (i, name) in columns.iter().enumerate() {
                        ui.selectable_value(&mut state.period_col, i, name);
                    }
                });

            ui.add_space(12.0);

            ui.label(egui::RichText::new("Metrics").strong());
            ui.add_space(2.0);
            egui::Frame::group(ui.style())
                .inner_margin(egui::Margin::same(8))
                .show(ui, |ui| {
                    egui::ScrollArea::vertical().max_height(220.0).show(ui, |ui| {
                        if state.metric_columns.is_empty() {
                            ui.label(egui::RichText::new("No numeric columns found.").weak());
                        }
                        for (i, &col) in state.metric_columns.iter().enumerate() {
                            let name = &columns[col];
                            ui.add_enabled_ui(col != state.period_col, |ui| {
                                ui.checkbox(
                                    &mut state.selected[i],
                                    format!("{name}  ({})", unit_inference::infer_unit(name)),
                                );
                            });
                        }
                    });
                });

            ui.add_space(16.0);

            let chosen = state.selected_columns();
            ui.horizontal(|ui| {
                let ok = ui.add_enabled(
                    !chosen.is_empty(),
                    egui::Button::new(egui::RichText::new("Import").strong()).min_size(egui::vec2(100.0, 32.0)),
                );
                if ok.clicked() {
                    result = Some(DialogResult::Ok(ImportSelection {
                        period_col: state.period_col,
                        metric_cols: chosen.clone(),
                    }));
                }
                if ui.add(egui::Button::new("Cancel").min_size(egui::vec2(100.0, 32.0))).clicked() {
                    result = Some(DialogResult::Cancel);
                }
                if chosen.is_empty() {
                    ui.label(egui::RichText::new("Select at least one metric").weak());
                }
            });
        });

    result
}
