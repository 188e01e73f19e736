//! Scanned-note digitizer: pan and zoom a page image, select a region, crop
//! it, and run OCR on it.

pub mod app;
pub mod config;
pub mod controller;
pub mod error;
pub mod geometry;
pub mod io;
pub mod mode;
pub mod ocr;
pub mod viewport;

pub use controller::{Controller, CropResult};
pub use error::{DigitizerError, Result};
pub use mode::Mode;
