use std::path::PathBuf;
use std::time::Duration;

use eframe::egui;
use image::RgbaImage;

use crate::controller::{Controller, MAX_ZOOM_PERCENT, MIN_ZOOM_PERCENT};
use crate::error::DigitizerError;
use crate::geometry::IVec;
use crate::io::{self, ImageSource, SUPPORTED_EXTENSIONS};
use crate::mode::Mode;

const CANVAS_BACKGROUND: egui::Color32 = egui::Color32::LIGHT_GRAY;
const SELECTION_STROKE: egui::Stroke = egui::Stroke {
    width: 2.0,
    color: egui::Color32::from_rgb(255, 0, 0),
};

// ── App ─────────────────────────────────────────────────────────────────────

pub struct DigitizerApp {
    controller: Controller,
    // (revision, texture) so a stale upload is noticed
    page_texture: Option<(u64, egui::TextureHandle)>,
    crop_texture: Option<(u64, egui::TextureHandle)>,
}

impl DigitizerApp {
    pub fn new(controller: Controller) -> Self {
        Self {
            controller,
            page_texture: None,
            crop_texture: None,
        }
    }

    pub fn open_path(&mut self, path: PathBuf) {
        let shown = path.display().to_string();
        match self.controller.load_image(ImageSource::Path(path)) {
            Ok(()) => {}
            Err(DigitizerError::UnsupportedFormat(_)) => {
                self.controller.set_status(format!("Unsupported format: {shown}"));
            }
            Err(e) => {
                log::warn!("could not open {shown}: {e}");
                self.controller.set_status(format!("Could not open {shown}: {e}"));
            }
        }
    }

    fn open_dialog(&mut self) {
        let picked = rfd::FileDialog::new()
            .set_title("Open file")
            .add_filter("Images", &SUPPORTED_EXTENSIONS)
            .pick_file();
        if let Some(path) = picked {
            self.open_path(path);
        }
    }

    fn paste_from_clipboard(&mut self) {
        match io::load_from_clipboard() {
            Ok(Some(img)) => {
                if let Err(e) = self.controller.load_image(ImageSource::Pixels(img)) {
                    self.controller.set_status(e.to_string());
                }
            }
            Ok(None) => log::debug!("paste ignored: no image on the clipboard"),
            Err(e) => {
                log::warn!("paste failed: {e}");
                self.controller.set_status(e.to_string());
            }
        }
    }

    fn export_crop(&mut self) {
        let Some(crop) = self.controller.crop() else {
            return;
        };
        let Some(path) = rfd::FileDialog::new()
            .set_title("Save image")
            .add_filter("PNG images", &["png"])
            .save_file()
        else {
            return;
        };
        let result = io::export_png(&crop.pixels, &path);
        match result {
            Ok(()) => self.controller.set_status(format!("Saved {}", path.display())),
            Err(e) => {
                log::error!("export failed: {e}");
                self.controller.set_status(format!("Export failed: {e}"));
            }
        }
    }

    fn copy_crop(&mut self) {
        let Some(crop) = self.controller.crop() else {
            return;
        };
        if let Err(e) = io::copy_to_clipboard(&crop.pixels) {
            log::warn!("copy failed: {e}");
            self.controller.set_status(e.to_string());
        }
    }

    fn rotate(&mut self, angle: i32) {
        if let Err(e) = self.controller.rotate(angle) {
            self.controller.set_status(e.to_string());
        }
    }

    fn sync_textures(&mut self, ctx: &egui::Context) {
        let rev = self.controller.image_revision();
        if self.page_texture.as_ref().map(|(r, _)| *r) != Some(rev) {
            self.page_texture = self
                .controller
                .image()
                .map(|img| (rev, upload(ctx, "page", img)));
        }
        let rev = self.controller.crop_revision();
        if self.crop_texture.as_ref().map(|(r, _)| *r) != Some(rev) {
            self.crop_texture = self
                .controller
                .crop()
                .map(|crop| (rev, upload(ctx, "crop", &crop.pixels)));
        }
    }

    // ── Input handled before any widget ────────────────────────────────────

    fn handle_global_input(&mut self, ctx: &egui::Context) {
        let paste = !ctx.wants_keyboard_input()
            && ctx.input(|i| {
                i.events.iter().any(|e| match e {
                    egui::Event::Paste(_) => true,
                    egui::Event::Key {
                        key: egui::Key::V,
                        pressed: true,
                        modifiers,
                        ..
                    } => modifiers.command,
                    _ => false,
                })
            });
        if paste {
            self.paste_from_clipboard();
        }

        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|f| f.path.clone())
                .collect()
        });
        if let Some(path) = io::first_droppable(dropped.iter().map(PathBuf::as_path)) {
            self.open_path(path);
        }
    }

    // ── Panels ─────────────────────────────────────────────────────────────

    fn controls_panel(&mut self, ui: &mut egui::Ui) {
        if ui.button("Open file...").clicked() {
            self.open_dialog();
        }
        ui.separator();

        ui.horizontal(|ui| {
            ui.group(|ui| {
                ui.vertical(|ui| {
                    ui.label("Selection mode");
                    let mut mode = self.controller.mode();
                    for m in Mode::ALL {
                        ui.radio_value(&mut mode, m, m.label());
                    }
                    if mode != self.controller.mode() {
                        self.controller.set_mode(mode);
                    }
                });
            });
            ui.group(|ui| {
                ui.vertical(|ui| {
                    ui.label("Rotate image");
                    if ui.button("Rotate right").clicked() {
                        self.rotate(90);
                    }
                    if ui.button("Rotate left").clicked() {
                        self.rotate(-90);
                    }
                });
            });
        });
        ui.separator();

        ui.horizontal(|ui| {
            ui.label("Zoom:");
            let mut percent = self.controller.zoom_percent().round();
            let slider = egui::Slider::new(&mut percent, MIN_ZOOM_PERCENT..=MAX_ZOOM_PERCENT)
                .suffix("%")
                .integer();
            let has_image = self.controller.image().is_some();
            if ui.add_enabled(has_image, slider).changed() {
                self.controller.set_zoom(percent);
            }
            if ui.add_enabled(has_image, egui::Button::new("Fit")).clicked() {
                self.controller.zoom_to_fit();
            }
        });
    }

    fn results_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Crop preview");
        let preview_height = (ui.available_height() * 0.45).max(200.0);
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.set_min_height(preview_height);
            ui.set_max_height(preview_height);
            ui.centered_and_justified(|ui| match &self.crop_texture {
                Some((_, tex)) => {
                    ui.add(egui::Image::new(tex).shrink_to_fit());
                }
                None => {
                    ui.weak("No selection");
                }
            });
        });
        let has_crop = self.controller.crop().is_some();
        ui.horizontal(|ui| {
            if ui.add_enabled(has_crop, egui::Button::new("Export image...")).clicked() {
                self.export_crop();
            }
            if ui.add_enabled(has_crop, egui::Button::new("Copy to clipboard")).clicked() {
                self.copy_crop();
            }
        });
        ui.separator();

        ui.horizontal(|ui| {
            ui.heading("Recognized text");
            if self.controller.is_recognizing() {
                ui.spinner();
            }
        });
        egui::ScrollArea::vertical().show(ui, |ui| {
            ui.add_sized(
                ui.available_size(),
                egui::TextEdit::multiline(self.controller.recognized_text_mut()),
            );
        });
    }

    fn canvas(&mut self, ui: &mut egui::Ui) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        let canvas_rect = response.rect;
        let painter = painter.with_clip_rect(canvas_rect);
        self.controller.set_viewport_size(canvas_rect.size());

        painter.rect_filled(canvas_rect, 0.0, CANVAS_BACKGROUND);

        let origin = canvas_rect.min.to_vec2();
        if let (Some(plan), Some((_, tex))) =
            (self.controller.viewport().render_plan(), &self.page_texture)
        {
            painter.image(
                tex.id(),
                plan.image_rect.translate(origin),
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
            if let Some(sel) = plan.selection {
                painter.rect_stroke(
                    sel.to_egui().translate(origin),
                    0.0,
                    SELECTION_STROKE,
                    egui::StrokeKind::Middle,
                );
            }
        }

        let to_local = |p: egui::Pos2| IVec::from_pos(p - origin);
        if response.drag_started_by(egui::PointerButton::Primary) {
            let start = ui
                .input(|i| i.pointer.press_origin())
                .or(response.interact_pointer_pos());
            if let Some(pos) = start {
                self.controller.pointer_down(to_local(pos));
            }
        }
        if response.dragged_by(egui::PointerButton::Primary) {
            if let Some(pos) = response.interact_pointer_pos() {
                self.controller.pointer_move(to_local(pos));
            }
        }
        if response.drag_stopped_by(egui::PointerButton::Primary) {
            let end = response
                .interact_pointer_pos()
                .or(ui.input(|i| i.pointer.latest_pos()));
            if let Some(pos) = end {
                self.controller.pointer_up(to_local(pos));
            }
        }
    }
}

fn upload(ctx: &egui::Context, name: &str, img: &RgbaImage) -> egui::TextureHandle {
    let size = [img.width() as usize, img.height() as usize];
    let pixels = img.as_flat_samples();
    let color_image = egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice());
    ctx.load_texture(name, color_image, egui::TextureOptions::LINEAR)
}

// ── eframe App impl ────────────────────────────────────────────────────────

impl eframe::App for DigitizerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_global_input(ctx);

        if self.controller.poll_recognition() {
            ctx.request_repaint();
        }
        if self.controller.is_recognizing() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
        self.sync_textures(ctx);

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            let status = self.controller.status().unwrap_or("Ready");
            ui.label(status);
        });

        egui::SidePanel::right("results")
            .resizable(true)
            .default_width(520.0)
            .show(ctx, |ui| self.results_panel(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            self.controls_panel(ui);
            ui.separator();
            self.canvas(ui);
        });
    }
}
