use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use eframe::egui;
use note_digitizer::app::DigitizerApp;
use note_digitizer::config::{settings_path, Settings};
use note_digitizer::ocr::TesseractRecognizer;
use note_digitizer::Controller;

// ── Main ────────────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let initial: Option<PathBuf> = std::env::args_os().nth(1).map(PathBuf::from);
    if let Some(path) = &initial {
        if !path.exists() {
            anyhow::bail!("File not found: {}", path.display());
        }
    }

    let settings = Settings::load();
    log::debug!(
        "settings file: {:?}, dispatch: {:?}",
        settings_path(),
        settings.dispatch
    );

    let title = match &initial {
        Some(path) => format!(
            "Note digitizer - {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        ),
        None => "Note digitizer".to_string(),
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title(&title)
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options,
        Box::new(move |_cc| {
            let controller = Controller::new(settings, Arc::new(TesseractRecognizer));
            let mut app = DigitizerApp::new(controller);
            if let Some(path) = initial {
                app.open_path(path);
            }
            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
    .context("failed to run eframe")
}
