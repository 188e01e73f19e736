//! The document view: pan/zoom state and pointer handling.
//!
//! All coordinates here are screen coordinates relative to the canvas origin.
//! The viewport never touches pixels; it only knows the size of the image it
//! shows, and hands finished selections back to the caller.

use crate::geometry::{centering_offset, IRect, IVec};
use crate::mode::Mode;

pub const MIN_SCALE: f32 = 0.1;
pub const MAX_SCALE: f32 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewState {
    pub scale: f32,
    pub offset: IVec,
    pub mode: Mode,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: IVec::ZERO,
            mode: Mode::Move,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum DragState {
    None,
    Panning { anchor: IVec },
    Selecting { rect: IRect },
}

/// A selection finished by releasing the pointer.
///
/// Carries the view transform that was active at release time so the
/// receiver can map the rectangle back into image space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SelectionEvent {
    pub rect: IRect,
    pub offset: IVec,
    pub scale: f32,
}

/// What the drawing surface should paint this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderPlan {
    /// Screen placement of the image after translate and scale.
    pub image_rect: egui::Rect,
    pub scale: f32,
    pub offset: IVec,
    /// Selection outline in raw screen space, drawn without the transform.
    pub selection: Option<IRect>,
}

#[derive(Debug)]
pub struct Viewport {
    view: ViewState,
    image_size: Option<[u32; 2]>,
    drag: DragState,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}

impl Viewport {
    pub fn new() -> Self {
        Self {
            view: ViewState::default(),
            image_size: None,
            drag: DragState::None,
        }
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn image_size(&self) -> Option<[u32; 2]> {
        self.image_size
    }

    /// Show a new image (or none). The pan offset goes back to zero.
    pub fn set_image_size(&mut self, size: Option<[u32; 2]>) {
        self.image_size = size;
        self.view.offset = IVec::ZERO;
        self.drag = DragState::None;
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.view.mode = mode;
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.view.scale = scale.clamp(MIN_SCALE, MAX_SCALE);
    }

    pub fn set_offset(&mut self, offset: IVec) {
        self.view.offset = offset;
    }

    /// Centre the image in a view of the given size at the current scale.
    pub fn center_image(&mut self, view_size: egui::Vec2) {
        if let Some(size) = self.image_size {
            self.view.offset = centering_offset(size, view_size, self.view.scale);
        }
    }

    pub fn is_selecting(&self) -> bool {
        matches!(self.drag, DragState::Selecting { .. })
    }

    // ── Pointer events ─────────────────────────────────────────────────────

    pub fn on_pointer_down(&mut self, point: IVec) {
        if self.image_size.is_none() {
            return;
        }
        self.drag = if self.view.mode.selects() {
            DragState::Selecting {
                rect: IRect::from_point(point),
            }
        } else {
            DragState::Panning { anchor: point }
        };
    }

    /// Returns true when the view changed and needs a repaint.
    pub fn on_pointer_move(&mut self, point: IVec) -> bool {
        if self.image_size.is_none() {
            return false;
        }
        match (&mut self.drag, self.view.mode) {
            (DragState::Panning { anchor }, Mode::Move) => {
                let delta = point - *anchor;
                self.view.offset += delta;
                *anchor = point;
                true
            }
            (DragState::Selecting { rect }, _) => {
                rect.set_max(point);
                true
            }
            _ => false,
        }
    }

    /// Ends the gesture. A non-empty selection is returned, normalized.
    pub fn on_pointer_up(&mut self, point: IVec) -> Option<SelectionEvent> {
        if self.image_size.is_none() {
            return None;
        }
        let drag = std::mem::replace(&mut self.drag, DragState::None);
        let DragState::Selecting { mut rect } = drag else {
            return None;
        };
        if !self.view.mode.selects() {
            return None;
        }
        rect.set_max(point);
        let rect = rect.normalized();
        if rect.is_empty() {
            log::debug!("discarding empty selection at {:?}", rect.min());
            return None;
        }
        Some(SelectionEvent {
            rect,
            offset: self.view.offset,
            scale: self.view.scale,
        })
    }

    // ── Rendering ──────────────────────────────────────────────────────────

    pub fn render_plan(&self) -> Option<RenderPlan> {
        let [w, h] = self.image_size?;
        let min = self.view.offset.to_vec2().to_pos2();
        let size = egui::vec2(w as f32, h as f32) * self.view.scale;
        let selection = match self.drag {
            DragState::Selecting { rect } if self.view.mode.selects() => Some(rect.normalized()),
            _ => None,
        };
        Some(RenderPlan {
            image_rect: egui::Rect::from_min_size(min, size),
            scale: self.view.scale,
            offset: self.view.offset,
            selection,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport_with_image(mode: Mode) -> Viewport {
        let mut vp = Viewport::new();
        vp.set_image_size(Some([400, 300]));
        vp.set_mode(mode);
        vp
    }

    #[test]
    fn events_without_image_are_ignored() {
        let mut vp = Viewport::new();
        vp.set_mode(Mode::BookText);
        vp.on_pointer_down(IVec::new(1, 1));
        assert!(!vp.on_pointer_move(IVec::new(50, 50)));
        assert_eq!(vp.on_pointer_up(IVec::new(50, 50)), None);
        assert!(vp.render_plan().is_none());
    }

    #[test]
    fn move_mode_pans_by_pointer_delta() {
        let mut vp = viewport_with_image(Mode::Move);
        vp.on_pointer_down(IVec::new(10, 10));
        assert!(vp.on_pointer_move(IVec::new(15, 20)));
        assert!(vp.on_pointer_move(IVec::new(25, 20)));
        assert_eq!(vp.on_pointer_up(IVec::new(25, 20)), None);
        assert_eq!(vp.view().offset, IVec::new(15, 10));
        // anchor cleared: further moves do nothing
        assert!(!vp.on_pointer_move(IVec::new(100, 100)));
        assert_eq!(vp.view().offset, IVec::new(15, 10));
    }

    #[test]
    fn selection_is_normalized_and_carries_transform() {
        let mut vp = viewport_with_image(Mode::BookText);
        vp.set_offset(IVec::new(5, 5));
        vp.set_scale(0.5);
        vp.on_pointer_down(IVec::new(110, 60));
        vp.on_pointer_move(IVec::new(50, 30));
        let ev = vp.on_pointer_up(IVec::new(10, 10)).expect("selection");
        assert_eq!(ev.rect, IRect::new(10, 10, 110, 60));
        assert_eq!(ev.offset, IVec::new(5, 5));
        assert_eq!(ev.scale, 0.5);
        assert!(!vp.is_selecting());
    }

    #[test]
    fn click_without_drag_emits_nothing() {
        let mut vp = viewport_with_image(Mode::Image);
        vp.on_pointer_down(IVec::new(30, 30));
        assert_eq!(vp.on_pointer_up(IVec::new(30, 30)), None);
        vp.on_pointer_down(IVec::new(30, 30));
        assert_eq!(vp.on_pointer_up(IVec::new(90, 30)), None);
    }

    #[test]
    fn render_plan_shows_selection_only_while_selecting() {
        let mut vp = viewport_with_image(Mode::HandText);
        vp.set_offset(IVec::new(20, 10));
        vp.set_scale(0.5);
        let plan = vp.render_plan().unwrap();
        assert_eq!(plan.image_rect, egui::Rect::from_min_size(egui::pos2(20.0, 10.0), egui::vec2(200.0, 150.0)));
        assert_eq!(plan.selection, None);

        vp.on_pointer_down(IVec::new(40, 40));
        vp.on_pointer_move(IVec::new(10, 60));
        assert_eq!(vp.render_plan().unwrap().selection, Some(IRect::new(10, 40, 40, 60)));

        vp.set_mode(Mode::Move);
        assert_eq!(vp.render_plan().unwrap().selection, None);
    }

    #[test]
    fn scale_is_clamped() {
        let mut vp = Viewport::new();
        vp.set_scale(5.0);
        assert_eq!(vp.view().scale, MAX_SCALE);
        vp.set_scale(0.0);
        assert_eq!(vp.view().scale, MIN_SCALE);
    }

    #[test]
    fn new_image_resets_offset() {
        let mut vp = viewport_with_image(Mode::Move);
        vp.set_offset(IVec::new(7, 9));
        vp.set_image_size(Some([10, 10]));
        assert_eq!(vp.view().offset, IVec::ZERO);
    }
}
