//! The assembled/scattered switch.
//!
//! A [`ModeController`] owns the single mode value. Fields never hold the
//! controller itself; they get a [`ModeWatch`], a read-only handle onto the
//! same cell, and read it once at the start of each frame. Everything runs on
//! the frame thread, so the value is a plain shared [`Cell`].

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Which layout the fields are heading towards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Spiral tree layout (progress target 1.0).
    #[default]
    Assembled,
    /// Random sphere layout (progress target 0.0).
    Scattered,
}

impl Mode {
    #[inline]
    pub fn is_assembled(self) -> bool {
        self == Mode::Assembled
    }

    /// Interpolation target for scalar progress: 1.0 assembled, 0.0 scattered.
    #[inline]
    pub fn target(self) -> f32 {
        match self {
            Mode::Assembled => 1.0,
            Mode::Scattered => 0.0,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Mode::Assembled => Mode::Scattered,
            Mode::Scattered => Mode::Assembled,
        }
    }
}

impl From<bool> for Mode {
    fn from(assembled: bool) -> Self {
        if assembled {
            Mode::Assembled
        } else {
            Mode::Scattered
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Assembled => write!(f, "ASSEMBLE"),
            Mode::Scattered => write!(f, "SCATTER"),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct ModeState {
    mode: Mode,
    generation: u64,
}

/// Holds the current [`Mode`] and hands out watches onto it.
#[derive(Debug, Default)]
pub struct ModeController {
    state: Rc<Cell<ModeState>>,
}

impl Default for ModeState {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            generation: 0,
        }
    }
}

impl ModeController {
    pub fn new(initial: Mode) -> Self {
        Self {
            state: Rc::new(Cell::new(ModeState {
                mode: initial,
                generation: 0,
            })),
        }
    }

    /// `true` selects the assembled tree, `false` the scattered sphere.
    pub fn set_mode(&self, assembled: bool) {
        self.set(Mode::from(assembled));
    }

    /// `true` while assembled.
    pub fn get_mode(&self) -> bool {
        self.mode().is_assembled()
    }

    pub fn mode(&self) -> Mode {
        self.state.get().mode
    }

    pub fn set(&self, mode: Mode) {
        let mut state = self.state.get();
        if state.mode != mode {
            state.mode = mode;
            state.generation += 1;
            self.state.set(state);
            tracing::info!(%mode, "mode changed");
        }
    }

    pub fn toggle(&self) -> Mode {
        let next = self.mode().toggled();
        self.set(next);
        next
    }

    /// Read-only handle onto this controller's mode.
    pub fn watch(&self) -> ModeWatch {
        ModeWatch {
            state: Rc::clone(&self.state),
            seen: self.state.get().generation,
        }
    }
}

/// Read-only view of a [`ModeController`], with change detection.
#[derive(Debug, Clone)]
pub struct ModeWatch {
    state: Rc<Cell<ModeState>>,
    seen: u64,
}

impl ModeWatch {
    pub fn get(&self) -> Mode {
        self.state.get().mode
    }

    /// Returns the new mode if it changed since the last call.
    pub fn changed(&mut self) -> Option<Mode> {
        let state = self.state.get();
        if state.generation != self.seen {
            self.seen = state.generation;
            Some(state.mode)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_assembled() {
        let controller = ModeController::default();
        assert!(controller.get_mode());
        assert_eq!(controller.mode(), Mode::Assembled);
    }

    #[test]
    fn test_set_mode_round_trip() {
        let controller = ModeController::new(Mode::Assembled);
        controller.set_mode(false);
        assert!(!controller.get_mode());
        controller.set_mode(true);
        assert!(controller.get_mode());
    }

    #[test]
    fn test_watch_sees_updates() {
        let controller = ModeController::new(Mode::Scattered);
        let watch = controller.watch();
        assert_eq!(watch.get(), Mode::Scattered);
        controller.set_mode(true);
        assert_eq!(watch.get(), Mode::Assembled);
    }

    #[test]
    fn test_watch_change_detection() {
        let controller = ModeController::new(Mode::Assembled);
        let mut watch = controller.watch();
        assert_eq!(watch.changed(), None);

        // Setting the same value is not a change.
        controller.set_mode(true);
        assert_eq!(watch.changed(), None);

        controller.set_mode(false);
        assert_eq!(watch.changed(), Some(Mode::Scattered));
        assert_eq!(watch.changed(), None);
    }

    #[test]
    fn test_toggle() {
        let controller = ModeController::new(Mode::Assembled);
        assert_eq!(controller.toggle(), Mode::Scattered);
        assert_eq!(controller.toggle(), Mode::Assembled);
    }

    #[test]
    fn test_targets() {
        assert_eq!(Mode::Assembled.target(), 1.0);
        assert_eq!(Mode::Scattered.target(), 0.0);
        assert_eq!(Mode::Scattered.to_string(), "SCATTER");
    }

    #[test]
    fn test_mode_deserializes_lowercase() {
        let mode: Mode = serde_json::from_str("\"scattered\"").unwrap();
        assert_eq!(mode, Mode::Scattered);
    }
}
