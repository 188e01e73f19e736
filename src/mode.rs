/// Interaction mode of the document view. Exactly one is active at a time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Dragging pans the page.
    #[default]
    Move,
    BookText,
    BookEquation,
    HandText,
    HandEquation,
    Image,
}

impl Mode {
    pub const ALL: [Mode; 6] = [
        Mode::Move,
        Mode::BookText,
        Mode::BookEquation,
        Mode::HandText,
        Mode::HandEquation,
        Mode::Image,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Mode::Move => "Move",
            Mode::BookText => "Book text",
            Mode::BookEquation => "Book equation",
            Mode::HandText => "Handwritten text",
            Mode::HandEquation => "Handwritten equation",
            Mode::Image => "Image",
        }
    }

    /// Whether a drag in this mode draws a selection instead of panning.
    pub fn selects(self) -> bool {
        !matches!(self, Mode::Move)
    }

    /// Stub text shown for modes that have no recognizer yet.
    pub fn placeholder(self) -> &'static str {
        match self {
            Mode::Move | Mode::BookText => "",
            Mode::BookEquation => "A printed equation would be recognized here...",
            Mode::HandText => "Handwritten text would be recognized here...",
            Mode::HandEquation => "A handwritten equation would be recognized here...",
            Mode::Image => "Image selected for saving.",
        }
    }

    pub fn placeholder_message(self) -> String {
        format!("Mode: {}\n\n{}", self.label(), self.placeholder())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_move_pans() {
        for mode in Mode::ALL {
            assert_eq!(mode.selects(), mode != Mode::Move, "{mode:?}");
        }
    }

    #[test]
    fn every_stub_mode_has_a_placeholder() {
        for mode in [Mode::BookEquation, Mode::HandText, Mode::HandEquation, Mode::Image] {
            let msg = mode.placeholder_message();
            assert!(msg.starts_with(&format!("Mode: {}", mode.label())));
            assert!(msg.ends_with(mode.placeholder()));
            assert!(!mode.placeholder().is_empty());
        }
    }
}
