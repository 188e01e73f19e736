//! Read-only application settings.
//!
//! Looked up in `$NOTE_DIGITIZER_CONFIG` or
//! `<config dir>/note-digitizer/settings.json`. A missing file means defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const CONFIG_ENV: &str = "NOTE_DIGITIZER_CONFIG";

/// Options handed to the OCR engine along with the image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrOptions {
    /// Tesseract language code.
    pub language: String,
    /// OCR engine mode (1 = LSTM only).
    pub oem: i32,
    /// Page segmentation mode (6 = single uniform block of text).
    pub psm: i32,
    pub dpi: Option<i32>,
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            language: "spa".to_string(),
            oem: 1,
            psm: 6,
            dpi: None,
        }
    }
}

impl OcrOptions {
    /// The engine options in tesseract command-line form.
    pub fn as_config_string(&self) -> String {
        let mut s = format!("--oem {} --psm {}", self.oem, self.psm);
        if let Some(dpi) = self.dpi {
            s.push_str(&format!(" --dpi {dpi}"));
        }
        s
    }
}

/// Where book-text recognition runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// Block the UI thread for the duration of the call.
    Inline,
    /// One worker thread, one request in flight.
    #[default]
    Background,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub ocr: OcrOptions,
    pub dispatch: DispatchMode,
    /// Fraction of the view that zoom-to-fit fills.
    pub fit_margin: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ocr: OcrOptions::default(),
            dispatch: DispatchMode::default(),
            fit_margin: 0.9,
        }
    }
}

impl Settings {
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let mut settings: Settings = serde_json::from_str(&data)?;
        if !(settings.fit_margin > 0.0 && settings.fit_margin <= 1.0) {
            log::warn!("fit_margin {} out of range, using 0.9", settings.fit_margin);
            settings.fit_margin = 0.9;
        }
        Ok(settings)
    }

    /// Load settings from the default location, falling back to defaults on
    /// any problem.
    pub fn load() -> Self {
        let Some(path) = settings_path() else {
            return Self::default();
        };
        if !path.exists() {
            log::debug!("no settings at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::from_file(&path) {
            Ok(settings) => {
                log::info!("loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("ignoring {}: {e}", path.display());
                Self::default()
            }
        }
    }
}

pub fn settings_path() -> Option<PathBuf> {
    if let Some(p) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(p));
    }
    dirs::config_dir().map(|d| d.join("note-digitizer").join("settings.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_book_text_engine_setup() {
        let s = Settings::default();
        assert_eq!(s.ocr.language, "spa");
        assert_eq!(s.ocr.as_config_string(), "--oem 1 --psm 6");
        assert_eq!(s.dispatch, DispatchMode::Background);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{ "ocr": {{ "language": "eng" }}, "dispatch": "inline" }}"#).unwrap();
        let s = Settings::from_file(f.path()).unwrap();
        assert_eq!(s.ocr.language, "eng");
        assert_eq!(s.ocr.psm, 6);
        assert_eq!(s.dispatch, DispatchMode::Inline);
        assert_eq!(s.fit_margin, 0.9);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "not json").unwrap();
        assert!(Settings::from_file(f.path()).is_err());
    }

    #[test]
    fn dpi_shows_up_in_config_string() {
        let opts = OcrOptions {
            dpi: Some(300),
            ..Default::default()
        };
        assert_eq!(opts.as_config_string(), "--oem 1 --psm 6 --dpi 300");
    }
}
