//! Owns the document image and turns finished selections into crops and
//! recognized text.

use std::sync::Arc;
use std::time::Duration;

use image::{imageops, RgbaImage};

use crate::config::{DispatchMode, Settings};
use crate::error::{DigitizerError, Result};
use crate::geometry::{fit_to_view, screen_to_image, IRect, IVec};
use crate::io::{self, ImageSource};
use crate::mode::Mode;
use crate::ocr::{OcrError, RecognitionQueue, Recognizer};
use crate::viewport::{SelectionEvent, ViewState, Viewport, MAX_SCALE, MIN_SCALE};

pub const MIN_ZOOM_PERCENT: f32 = 10.0;
pub const MAX_ZOOM_PERCENT: f32 = 200.0;

/// Pixels cut out of the document, and where they came from.
#[derive(Clone, Debug, PartialEq)]
pub struct CropResult {
    /// Image-space rectangle, always inside the document bounds.
    pub rect: IRect,
    pub pixels: RgbaImage,
}

pub struct Controller {
    settings: Settings,
    viewport: Viewport,
    viewport_size: Option<egui::Vec2>,
    fit_pending: bool,

    image: Option<RgbaImage>,
    image_revision: u64,
    crop: Option<CropResult>,
    crop_revision: u64,

    mode: Mode,
    recognized_text: String,
    status: Option<String>,

    recognizer: Arc<dyn Recognizer>,
    queue: Option<RecognitionQueue>,
}

impl Controller {
    pub fn new(settings: Settings, recognizer: Arc<dyn Recognizer>) -> Self {
        let queue = match settings.dispatch {
            DispatchMode::Background => Some(RecognitionQueue::spawn(recognizer.clone())),
            DispatchMode::Inline => None,
        };
        Self {
            settings,
            viewport: Viewport::new(),
            viewport_size: None,
            fit_pending: false,
            image: None,
            image_revision: 0,
            crop: None,
            crop_revision: 0,
            mode: Mode::Move,
            recognized_text: String::new(),
            status: None,
            recognizer,
            queue,
        }
    }

    // ── Accessors ──────────────────────────────────────────────────────────

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn view(&self) -> ViewState {
        self.viewport.view()
    }

    pub fn image(&self) -> Option<&RgbaImage> {
        self.image.as_ref()
    }

    /// Bumped every time the document image is replaced.
    pub fn image_revision(&self) -> u64 {
        self.image_revision
    }

    pub fn crop(&self) -> Option<&CropResult> {
        self.crop.as_ref()
    }

    pub fn crop_revision(&self) -> u64 {
        self.crop_revision
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn recognized_text(&self) -> &str {
        &self.recognized_text
    }

    /// The text sink is user-editable.
    pub fn recognized_text_mut(&mut self) -> &mut String {
        &mut self.recognized_text
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status = Some(msg.into());
    }

    pub fn is_recognizing(&self) -> bool {
        self.queue.as_ref().is_some_and(|q| q.is_pending())
    }

    pub fn zoom_percent(&self) -> f32 {
        self.viewport.view().scale * 100.0
    }

    // ── Document commands ──────────────────────────────────────────────────

    /// Replace the document. On error nothing changes.
    pub fn load_image(&mut self, source: ImageSource) -> Result<()> {
        let img = source.decode()?;
        log::info!("loaded {}x{} image", img.width(), img.height());
        self.replace_image(img);
        self.crop = None;
        self.crop_revision += 1;
        self.recognized_text.clear();
        self.status = None;
        if let Some(queue) = &mut self.queue {
            queue.abandon();
        }
        self.zoom_to_fit();
        Ok(())
    }

    /// Rotate the document by a multiple of 90 degrees, clockwise positive.
    pub fn rotate(&mut self, angle_degrees: i32) -> Result<()> {
        let Some(img) = &self.image else {
            return Ok(());
        };
        if angle_degrees % 90 != 0 {
            return Err(DigitizerError::UnsupportedRotation(angle_degrees));
        }
        let rotated = match angle_degrees.rem_euclid(360) {
            90 => Some(imageops::rotate90(img)),
            180 => Some(imageops::rotate180(img)),
            270 => Some(imageops::rotate270(img)),
            _ => None,
        };
        if let Some(rotated) = rotated {
            log::info!("rotated document by {angle_degrees} degrees");
            self.replace_image(rotated);
        }
        // a full turn leaves the pixels alone but still refits the view
        self.zoom_to_fit();
        Ok(())
    }

    pub fn set_zoom(&mut self, percent: f32) {
        let percent = percent.clamp(MIN_ZOOM_PERCENT, MAX_ZOOM_PERCENT);
        self.viewport.set_scale(percent / 100.0);
    }

    pub fn set_mode(&mut self, mode: Mode) {
        if mode != self.mode {
            log::debug!("mode {:?} -> {:?}", self.mode, mode);
        }
        self.mode = mode;
        self.viewport.set_mode(mode);
    }

    /// Tell the controller how big the on-screen canvas is. A fit requested
    /// before the size was known is applied now.
    pub fn set_viewport_size(&mut self, size: egui::Vec2) {
        self.viewport_size = Some(size);
        if self.fit_pending {
            self.zoom_to_fit();
        }
    }

    pub fn zoom_to_fit(&mut self) {
        let Some(img) = &self.image else {
            return;
        };
        let Some(view_size) = self.viewport_size.filter(|s| s.x > 0.0 && s.y > 0.0) else {
            self.fit_pending = true;
            return;
        };
        self.fit_pending = false;
        let (scale, _) = fit_to_view(
            [img.width(), img.height()],
            view_size,
            self.settings.fit_margin,
            (MIN_SCALE, MAX_SCALE),
        );
        self.viewport.set_scale(scale);
        self.viewport.center_image(view_size);
    }

    fn replace_image(&mut self, img: RgbaImage) {
        self.viewport.set_image_size(Some([img.width(), img.height()]));
        self.image = Some(img);
        self.image_revision += 1;
    }

    // ── Pointer input ──────────────────────────────────────────────────────

    pub fn pointer_down(&mut self, point: IVec) {
        self.viewport.on_pointer_down(point);
    }

    pub fn pointer_move(&mut self, point: IVec) -> bool {
        self.viewport.on_pointer_move(point)
    }

    pub fn pointer_up(&mut self, point: IVec) -> Option<IRect> {
        let event = self.viewport.on_pointer_up(point)?;
        self.finalize_selection(event)
    }

    // ── Selection and recognition ──────────────────────────────────────────

    /// Crop the document under a finished selection and recognize it.
    ///
    /// Returns the image-space rectangle that was cropped, or `None` when the
    /// selection was discarded.
    pub fn finalize_selection(&mut self, event: SelectionEvent) -> Option<IRect> {
        if !self.mode.selects() || event.rect.is_empty() {
            return None;
        }
        let img = self.image.as_ref()?;
        let mapped = screen_to_image(&event.rect, event.offset, event.scale);
        let Some(rect) = mapped.intersect(&IRect::from_size(img.width(), img.height())) else {
            log::debug!("selection {mapped:?} lies outside the image");
            return None;
        };
        let pixels = imageops::crop_imm(
            img,
            rect.x0 as u32,
            rect.y0 as u32,
            rect.width() as u32,
            rect.height() as u32,
        )
        .to_image();
        log::info!("cropped {}x{} at ({}, {})", rect.width(), rect.height(), rect.x0, rect.y0);
        self.crop = Some(CropResult { rect, pixels });
        self.crop_revision += 1;
        self.recognize(self.mode);
        Some(rect)
    }

    pub fn recognize(&mut self, mode: Mode) {
        if mode != Mode::BookText {
            if let Some(queue) = &mut self.queue {
                queue.abandon();
            }
            self.status = None;
            self.recognized_text = mode.placeholder_message();
            return;
        }
        let Some(crop) = &self.crop else {
            return;
        };
        let png = match io::encode_png(&crop.pixels) {
            Ok(png) => png,
            Err(e) => {
                self.publish(Err(OcrError::Decode(e.to_string())));
                return;
            }
        };
        let options = self.settings.ocr.clone();
        match &mut self.queue {
            Some(queue) => match queue.submit(png, options) {
                Ok(id) => {
                    log::debug!("queued ocr request {id}");
                    self.status = Some("Recognizing...".into());
                }
                Err(e) => self.publish(Err(e)),
            },
            None => {
                let outcome = self.recognizer.recognize(&png, &options);
                self.publish(outcome);
            }
        }
    }

    /// Publish a finished background recognition, if any. Call once a frame.
    pub fn poll_recognition(&mut self) -> bool {
        match self.queue.as_mut().and_then(|q| q.poll()) {
            Some(outcome) => {
                self.publish(outcome);
                true
            }
            None => false,
        }
    }

    /// Block until the pending background recognition is published.
    pub fn wait_for_recognition(&mut self, timeout: Duration) -> bool {
        match self.queue.as_mut().and_then(|q| q.wait(timeout)) {
            Some(outcome) => {
                self.publish(outcome);
                true
            }
            None => false,
        }
    }

    fn publish(&mut self, outcome: std::result::Result<String, OcrError>) {
        match outcome {
            Ok(text) => {
                let text = text.trim();
                self.status = text.is_empty().then(|| "No text detected".to_string());
                log::info!("recognized {} characters", text.chars().count());
                self.recognized_text = text.to_string();
            }
            Err(e) => {
                log::warn!("recognition failed: {e}");
                self.status = Some(format!("Recognition failed: {e}"));
                self.recognized_text.clear();
            }
        }
    }
}
