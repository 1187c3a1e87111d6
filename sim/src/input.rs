//! Held-key movement intent.
//!
//! Key codes use the DOM `KeyboardEvent.code` naming (`"KeyW"`, `"Space"`, ...), which is
//! also what Bevy's `KeyCode` prints as. Only currently held keys are reflected; there is
//! no press buffering.

/// One of the six tracked intents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MoveAction {
    Forward,
    Backward,
    Left,
    Right,
    /// Jump request.
    Up,
    Down,
}

/// Maps a key code to the intent it drives. Unbound codes return `None`.
pub fn action_for_code(code: &str) -> Option<MoveAction> {
    match code {
        "KeyW" | "ArrowUp" => Some(MoveAction::Forward),
        "KeyS" | "ArrowDown" => Some(MoveAction::Backward),
        "KeyA" | "ArrowLeft" => Some(MoveAction::Left),
        "KeyD" | "ArrowRight" => Some(MoveAction::Right),
        "Space" => Some(MoveAction::Up),
        "ShiftLeft" | "ShiftRight" => Some(MoveAction::Down),
        _ => None,
    }
}

/// Copy of the intent booleans handed to the character controller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    pub move_forward: bool,
    pub move_backward: bool,
    pub move_left: bool,
    pub move_right: bool,
    pub move_up: bool,
    /// Tracked for completeness; the grounded controller has no downward flight.
    pub move_down: bool,
}

#[derive(Clone, Debug, Default)]
pub struct InputState {
    held: InputSnapshot,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_key_down(&mut self, code: &str) {
        if let Some(action) = action_for_code(code) {
            self.set(action, true);
        }
    }

    pub fn on_key_up(&mut self, code: &str) {
        if let Some(action) = action_for_code(code) {
            self.set(action, false);
        }
    }

    pub fn set(&mut self, action: MoveAction, held: bool) {
        let slot = match action {
            MoveAction::Forward => &mut self.held.move_forward,
            MoveAction::Backward => &mut self.held.move_backward,
            MoveAction::Left => &mut self.held.move_left,
            MoveAction::Right => &mut self.held.move_right,
            MoveAction::Up => &mut self.held.move_up,
            MoveAction::Down => &mut self.held.move_down,
        };
        *slot = held;
    }

    /// Releases every intent, e.g. when control capture is lost and key-ups will never arrive.
    pub fn clear(&mut self) {
        self.held = InputSnapshot::default();
    }

    #[inline]
    pub fn snapshot(&self) -> InputSnapshot {
        self.held
    }
}
