//! Image sources and sinks: files, drag-and-drop, the system clipboard, and
//! PNG encoding.

use std::borrow::Cow;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};

use crate::error::{DigitizerError, Result};

pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Where a document image comes from.
#[derive(Debug)]
pub enum ImageSource {
    Path(PathBuf),
    Pixels(RgbaImage),
}

pub fn is_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}

pub fn load_from_path(path: &Path) -> Result<RgbaImage> {
    if !is_supported_extension(path) {
        return Err(DigitizerError::UnsupportedFormat(path.to_path_buf()));
    }
    let img = image::open(path)?;
    Ok(img.to_rgba8())
}

impl ImageSource {
    /// Decode the source into pixels. Zero-sized images are rejected.
    pub fn decode(self) -> Result<RgbaImage> {
        let img = match self {
            ImageSource::Path(path) => load_from_path(&path)?,
            ImageSource::Pixels(img) => img,
        };
        if img.width() == 0 || img.height() == 0 {
            return Err(DigitizerError::InvalidSource("image has no pixels".into()));
        }
        Ok(img)
    }
}

/// First dropped path with a supported extension. Anything else is ignored.
pub fn first_droppable<'a, I>(paths: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = &'a Path>,
{
    paths
        .into_iter()
        .find(|p| is_supported_extension(p))
        .map(Path::to_path_buf)
}

/// Lossless encoding used for both export and the OCR payload.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}

pub fn export_png(img: &RgbaImage, path: &Path) -> Result<()> {
    let path = if path.extension().is_none() {
        path.with_extension("png")
    } else {
        path.to_path_buf()
    };
    img.save_with_format(&path, ImageFormat::Png)?;
    log::info!("exported {}x{} crop to {}", img.width(), img.height(), path.display());
    Ok(())
}

// ── System clipboard ────────────────────────────────────────────────────────

pub fn copy_to_clipboard(img: &RgbaImage) -> Result<()> {
    let mut clip = arboard::Clipboard::new()?;
    clip.set_image(arboard::ImageData {
        width: img.width() as usize,
        height: img.height() as usize,
        bytes: Cow::Borrowed(img.as_raw()),
    })?;
    log::info!("copied {}x{} crop to clipboard", img.width(), img.height());
    Ok(())
}

/// The clipboard image, if there is one.
pub fn load_from_clipboard() -> Result<Option<RgbaImage>> {
    let mut clip = arboard::Clipboard::new()?;
    let data = match clip.get_image() {
        Ok(data) => data,
        Err(arboard::Error::ContentNotAvailable) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    RgbaImage::from_raw(data.width as u32, data.height as u32, data.bytes.into_owned())
        .map(Some)
        .ok_or_else(|| DigitizerError::InvalidSource("clipboard image has a bad size".into()))
}
