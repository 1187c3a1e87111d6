//! Timed jump arc.
//!
//! A jump is a fixed-length window during which the character is pushed up by a force that
//! decays linearly from `force` to zero, followed by a cooldown. All timestamps are
//! simulated-clock instants, so the transition points depend only on the summed deltas and
//! not on how the time was sliced into ticks.
//!
//! NOTE: the push is front-loaded *force*, not front-loaded velocity. That is unusual for a
//! jump and is kept as tuned; revisit if jumps feel floaty.

use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JumpState {
    Idle,
    Rising { start: Duration, end: Duration },
    CoolingDown { ready_at: Duration },
}

impl JumpState {
    /// Whether a new jump may start from this state.
    #[inline]
    pub fn can_jump(&self) -> bool {
        matches!(self, JumpState::Idle)
    }

    #[inline]
    pub fn is_rising(&self) -> bool {
        matches!(self, JumpState::Rising { .. })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JumpArc {
    pub force: f32,
    pub duration: Duration,
    pub cooldown: Duration,
}

impl JumpArc {
    /// Expires finished phases at `now`.
    ///
    /// Rising ends exactly at `end` and cooldown is measured from `end`, not from the tick
    /// that noticed it, so coarse ticks do not stretch the cycle.
    pub fn advance(&self, state: JumpState, now: Duration) -> JumpState {
        let mut state = state;
        if let JumpState::Rising { end, .. } = state
            && now >= end
        {
            state = JumpState::CoolingDown {
                ready_at: end + self.cooldown,
            };
        }
        if let JumpState::CoolingDown { ready_at } = state
            && now >= ready_at
        {
            state = JumpState::Idle;
        }
        state
    }

    /// Starts a jump when requested, grounded and not gated.
    pub fn try_start(
        &self,
        state: JumpState,
        requested: bool,
        grounded: bool,
        now: Duration,
    ) -> JumpState {
        if requested && grounded && state.can_jump() {
            log::debug!("jump started at {:?}", now);
            return JumpState::Rising {
                start: now,
                end: now + self.duration,
            };
        }
        state
    }

    /// Vertical displacement for a tick of length `dt` ending at `now`.
    ///
    /// Rising pushes up with `force * (1 - progress)`; every other state descends at the
    /// constant `gravity` speed.
    pub fn vertical_displacement(
        &self,
        state: JumpState,
        now: Duration,
        gravity: f32,
        dt: f32,
    ) -> f32 {
        match state {
            JumpState::Rising { start, .. } => {
                let elapsed = now.saturating_sub(start).as_secs_f32();
                let progress = (elapsed / self.duration.as_secs_f32()).clamp(0.0, 1.0);
                self.force * (1.0 - progress) * dt
            }
            JumpState::Idle | JumpState::CoolingDown { .. } => -gravity * dt,
        }
    }
}
