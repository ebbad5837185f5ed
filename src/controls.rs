//! Keyboard controls for the two mode actions.
//!
//! | Key | Action |
//! |-----|--------|
//! | `A`, `Enter` | assemble |
//! | `S`, `Backspace` | scatter |
//! | `Space` | toggle |

use crate::mode::{Mode, ModeController};
use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Assemble,
    Scatter,
    Toggle,
}

impl ControlAction {
    pub fn from_key(key: KeyCode) -> Option<Self> {
        match key {
            KeyCode::KeyA | KeyCode::Enter => Some(ControlAction::Assemble),
            KeyCode::KeyS | KeyCode::Backspace => Some(ControlAction::Scatter),
            KeyCode::Space => Some(ControlAction::Toggle),
            _ => None,
        }
    }

    /// Action for a fresh key press. Releases and auto-repeats are ignored.
    pub fn from_key_event(event: &KeyEvent) -> Option<Self> {
        if event.state != ElementState::Pressed || event.repeat {
            return None;
        }
        match event.physical_key {
            PhysicalKey::Code(code) => Self::from_key(code),
            PhysicalKey::Unidentified(_) => None,
        }
    }

    /// Apply to the controller, returning the resulting mode.
    pub fn apply(self, controller: &ModeController) -> Mode {
        match self {
            ControlAction::Assemble => controller.set_mode(true),
            ControlAction::Scatter => controller.set_mode(false),
            ControlAction::Toggle => {
                controller.toggle();
            }
        }
        controller.mode()
    }
}
