mod analytics;
mod app;
mod data;
mod processing;
mod state;
mod ui;

use std::ffi::OsString;
use std::path::PathBuf;

use app::{EsgLensApp, FileKind};
use eframe::egui;

/// A payload, sheet or session named on the command line.
fn startup_file(arg: Option<OsString>) -> Option<PathBuf> {
    let path = PathBuf::from(arg?);
    match FileKind::from_path(&path) {
        Some(kind) => {
            tracing::info!("Opening {:?} as {kind:?}", path);
            Some(path)
        }
        None => {
            tracing::warn!("Ignoring {:?}: expected .json, .csv, .xls, .xlsx or .esglens", path);
            None
        }
    }
}

fn native_options() -> eframe::NativeOptions {
    eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("ESG Lens")
            .with_app_id("esglens")
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([900.0, 600.0])
            .with_drag_and_drop(true),
        renderer: eframe::Renderer::Wgpu,
        ..Default::default()
    }
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt::init();

    let initial_file = startup_file(std::env::args_os().nth(1));
    eframe::run_native(
        "ESG Lens",
        native_options(),
        Box::new(move |cc| Ok(Box::new(EsgLensApp::new(cc, initial_file)))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_file_accepts_known_kinds_only() {
        assert_eq!(startup_file(Some("report.json".into())), Some(PathBuf::from("report.json")));
        assert_eq!(startup_file(Some("q3.XLSX".into())), Some(PathBuf::from("q3.XLSX")));
        assert_eq!(startup_file(Some("notes.txt".into())), None);
        assert_eq!(startup_file(None), None);
    }
}
