use std::sync::{Arc, Mutex};

use image::{Rgba, RgbaImage};
use note_digitizer::config::{DispatchMode, OcrOptions, Settings};
use note_digitizer::geometry::{IRect, IVec};
use note_digitizer::io::{self, ImageSource};
use note_digitizer::ocr::{OcrError, Recognizer};
use note_digitizer::viewport::SelectionEvent;
use note_digitizer::{Controller, Mode};

/// Replies with fixed text and remembers every payload it saw.
struct Canned {
    text: &'static str,
    seen: Mutex<Vec<Vec<u8>>>,
}

impl Recognizer for Canned {
    fn recognize(&self, png: &[u8], _options: &OcrOptions) -> Result<String, OcrError> {
        self.seen.lock().unwrap().push(png.to_vec());
        Ok(self.text.to_string())
    }
}

fn page(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_fn(w, h, |x, y| Rgba([(x % 251) as u8, (y % 241) as u8, 7, 255]))
}

fn controller(text: &'static str) -> (Controller, Arc<Canned>) {
    let ocr = Arc::new(Canned {
        text,
        seen: Mutex::new(Vec::new()),
    });
    let settings = Settings {
        dispatch: DispatchMode::Inline,
        ..Settings::default()
    };
    let mut c = Controller::new(settings, ocr.clone());
    c.set_viewport_size(egui::vec2(800.0, 600.0));
    (c, ocr)
}

#[test]
fn page_from_disk_fits_the_view() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("page.png");
    page(1000, 800).save(&path).unwrap();

    let (mut c, _) = controller("");
    c.load_image(ImageSource::Path(path)).unwrap();
    let view = c.view();
    assert!((view.scale - 0.675).abs() < 1e-6);
    assert_eq!(view.offset, IVec::new(62, 30));
    assert_eq!(view.mode, Mode::Move);
}

#[test]
fn book_text_selection_sends_the_crop_as_png() {
    let (mut c, ocr) = controller(" hello \n");
    c.load_image(ImageSource::Pixels(page(400, 300))).unwrap();
    c.set_mode(Mode::BookText);

    let event = SelectionEvent {
        rect: IRect::new(10, 10, 110, 60),
        offset: IVec::new(5, 5),
        scale: 0.5,
    };
    assert_eq!(c.finalize_selection(event), Some(IRect::new(10, 10, 210, 110)));
    assert_eq!(c.recognized_text(), "hello");

    let seen = ocr.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let decoded = image::load_from_memory(&seen[0]).unwrap().to_rgba8();
    assert_eq!(&decoded, &c.crop().unwrap().pixels);
}

#[test]
fn panning_then_selecting_uses_the_new_offset() {
    let (mut c, _) = controller("");
    c.load_image(ImageSource::Pixels(page(200, 200))).unwrap();
    c.set_zoom(100.0);
    let start = c.view().offset;

    c.pointer_down(IVec::new(0, 0));
    c.pointer_move(IVec::new(-30, -20));
    assert_eq!(c.pointer_up(IVec::new(-30, -20)), None);
    assert_eq!(c.view().offset, start + IVec::new(-30, -20));

    c.set_mode(Mode::Image);
    let off = c.view().offset;
    c.pointer_down(off + IVec::new(20, 20));
    let rect = c.pointer_up(off + IVec::new(70, 50)).unwrap();
    assert_eq!(rect, IRect::new(20, 20, 70, 50));
    assert_eq!(c.recognized_text(), Mode::Image.placeholder_message());
}

#[test]
fn exported_crop_reloads_identically() {
    let (mut c, _) = controller("");
    c.load_image(ImageSource::Pixels(page(120, 90))).unwrap();
    c.set_mode(Mode::Image);
    c.finalize_selection(SelectionEvent {
        rect: IRect::new(0, 0, 120, 90),
        offset: IVec::ZERO,
        scale: 1.0,
    });
    let crop = c.crop().unwrap().pixels.clone();
    assert_eq!(&crop, c.image().unwrap());

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("crop.png");
    io::export_png(&crop, &out).unwrap();
    c.load_image(ImageSource::Path(out)).unwrap();
    assert_eq!(c.image().unwrap(), &crop);
    assert!(c.crop().is_none());
}
