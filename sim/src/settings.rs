//! Owned, validated configuration for a sandbox run.
//!
//! Every tunable of the simulation lives here. Defaults come from [`crate::constants`];
//! callers override fields with struct-update syntax and the result is checked once by
//! [`SimSettings::validate`] when the simulation is built.

use std::time::Duration;

use nalgebra::Vector3;
use rapier3d::control::{CharacterAutostep, CharacterLength, KinematicCharacterController};

use crate::constants::{
    CAPSULE_HALF_HEIGHT, CAPSULE_RADIUS, CHARACTER_GRAVITY_MPS, EYE_HEIGHT, GROUND_HALF_EXTENTS,
    GROUND_PROBE_DISTANCE, JUMP_COOLDOWN, JUMP_DURATION, JUMP_INITIAL_FORCE, KILL_PLANE_Y,
    MAX_TICK_DT, PICK_MAX_DISTANCE, PLANAR_SPEED_MPS, PROP_CLICK_IMPULSE, PROP_COUNT,
    PROP_HALF_EXTENTS, PROP_SPAWN_HALF_EXTENT, PROP_SPAWN_HEIGHT, SPAWN_POINT, WORLD_GRAVITY,
};
use crate::scene::Color;

/// Kinematic Character Controller (KCC) settings.
///
/// Values are expressed in world units and degrees (converted to radians at runtime).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KccSettings {
    /// Small gap preserved between the character and its surroundings.
    /// Keep `offset` small but non-zero for numerical stability.
    pub offset: f32,

    /// Maximum climbable slope angle (degrees).
    pub max_slope_climb_deg: f32,

    /// Minimum slope angle (degrees) before automatic sliding starts.
    pub min_slope_slide_deg: f32,

    /// Autostep maximum height.
    pub autostep_max_height: f32,

    /// Autostep minimum width.
    pub autostep_min_width: f32,

    /// Distance the controller may snap down to stay glued to the ground.
    pub snap_to_ground: f32,

    /// Whether the controller should slide against obstacles.
    pub slide: bool,

    /// Increase if the character gets stuck when sliding.
    pub normal_nudge_factor: f32,
}

impl Default for KccSettings {
    fn default() -> Self {
        Self {
            offset: 0.05,
            max_slope_climb_deg: 52.0,
            min_slope_slide_deg: 45.0,
            autostep_max_height: 0.325,
            autostep_min_width: 0.2,
            snap_to_ground: 0.3,
            slide: true,
            normal_nudge_factor: 0.05,
        }
    }
}

impl KccSettings {
    /// Build the Rapier controller described by these settings.
    pub fn controller(&self) -> KinematicCharacterController {
        KinematicCharacterController {
            offset: CharacterLength::Absolute(self.offset),
            max_slope_climb_angle: self.max_slope_climb_deg.to_radians(),
            min_slope_slide_angle: self.min_slope_slide_deg.to_radians(),
            snap_to_ground: Some(CharacterLength::Absolute(self.snap_to_ground)),
            autostep: Some(CharacterAutostep {
                max_height: CharacterLength::Absolute(self.autostep_max_height),
                min_width: CharacterLength::Absolute(self.autostep_min_width),
                include_dynamic_bodies: false,
            }),
            slide: self.slide,
            normal_nudge_factor: self.normal_nudge_factor,
            ..KinematicCharacterController::default()
        }
    }
}

/// Full configuration of a sandbox run.
#[derive(Clone, Debug, PartialEq)]
pub struct SimSettings {
    /// Planar walking speed (units/second).
    pub planar_speed: f32,
    /// Constant descent speed of the character while not rising (units/second).
    pub character_gravity: f32,
    /// Upward speed at jump start, decaying linearly to zero.
    pub jump_force: f32,
    pub jump_duration: Duration,
    pub jump_cooldown: Duration,

    /// Out-of-bounds height for both props and the character.
    pub kill_plane_y: f32,
    pub spawn_point: Vector3<f32>,

    pub capsule_radius: f32,
    pub capsule_half_height: f32,
    /// Viewpoint offset above the capsule center.
    pub eye_height: f32,
    /// How far below the capsule feet the pre-move support probe reaches.
    pub ground_probe_distance: f32,
    pub kcc: KccSettings,

    /// Gravity of the rigid-body world (props).
    pub world_gravity: Vector3<f32>,
    pub ground_half_extents: Vector3<f32>,

    pub prop_count: usize,
    pub prop_spawn_height: f32,
    pub prop_spawn_half_extent: f32,
    pub prop_half_extents: Vector3<f32>,
    pub prop_color: Color,
    /// Seed for prop placement. `None` draws a seed from the OS.
    pub prop_seed: Option<u64>,

    pub click_impulse: Vector3<f32>,
    pub pick_max_distance: f32,
    pub highlight_color: Color,
    pub ground_color: Color,

    /// Longest delta integrated by a single tick (seconds).
    pub max_tick_dt: f32,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            planar_speed: PLANAR_SPEED_MPS,
            character_gravity: CHARACTER_GRAVITY_MPS,
            jump_force: JUMP_INITIAL_FORCE,
            jump_duration: JUMP_DURATION,
            jump_cooldown: JUMP_COOLDOWN,
            kill_plane_y: KILL_PLANE_Y,
            spawn_point: Vector3::from(SPAWN_POINT),
            capsule_radius: CAPSULE_RADIUS,
            capsule_half_height: CAPSULE_HALF_HEIGHT,
            eye_height: EYE_HEIGHT,
            ground_probe_distance: GROUND_PROBE_DISTANCE,
            kcc: KccSettings::default(),
            world_gravity: Vector3::from(WORLD_GRAVITY),
            ground_half_extents: Vector3::from(GROUND_HALF_EXTENTS),
            prop_count: PROP_COUNT,
            prop_spawn_height: PROP_SPAWN_HEIGHT,
            prop_spawn_half_extent: PROP_SPAWN_HALF_EXTENT,
            prop_half_extents: Vector3::from(PROP_HALF_EXTENTS),
            prop_color: Color::PROP,
            prop_seed: None,
            click_impulse: Vector3::from(PROP_CLICK_IMPULSE),
            pick_max_distance: PICK_MAX_DISTANCE,
            highlight_color: Color::HIGHLIGHT,
            ground_color: Color::GROUND,
            max_tick_dt: MAX_TICK_DT,
        }
    }
}

impl SimSettings {
    /// Checks that every tunable is usable.
    ///
    /// Use this at the boundary (before building a world) to fail fast on bad overrides.
    pub fn validate(&self) -> Result<(), &'static str> {
        let positive = [
            self.planar_speed,
            self.character_gravity,
            self.jump_force,
            self.capsule_radius,
            self.capsule_half_height,
            self.prop_spawn_half_extent,
            self.pick_max_distance,
            self.max_tick_dt,
            self.kcc.offset,
        ];
        if positive.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err("Settings contain a non-positive or non-finite tunable");
        }
        if self.jump_duration.is_zero() {
            return Err("Jump duration must be non-zero");
        }
        if !self.kill_plane_y.is_finite() || !self.prop_spawn_height.is_finite() {
            return Err("Heights must be finite");
        }
        if !all_finite(&self.spawn_point) || !all_finite(&self.world_gravity) {
            return Err("Vectors must be finite");
        }
        if !all_positive(&self.ground_half_extents) || !all_positive(&self.prop_half_extents) {
            return Err("Half extents must be positive");
        }
        if self.spawn_point.y <= self.kill_plane_y {
            return Err("Spawn point is below the kill plane");
        }
        if self.highlight_color == self.prop_color {
            return Err("Highlight color must differ from the prop color");
        }
        Ok(())
    }
}

fn all_finite(v: &Vector3<f32>) -> bool {
    v.iter().all(|c| c.is_finite())
}

fn all_positive(v: &Vector3<f32>) -> bool {
    v.iter().all(|c| c.is_finite() && *c > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(SimSettings::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_non_finite_speed() {
        let settings = SimSettings {
            planar_speed: f32::NAN,
            ..SimSettings::default()
        };
        assert_eq!(
            settings.validate(),
            Err("Settings contain a non-positive or non-finite tunable")
        );
    }

    #[test]
    fn rejects_spawn_below_kill_plane() {
        let settings = SimSettings {
            spawn_point: Vector3::new(0.0, -30.0, 0.0),
            ..SimSettings::default()
        };
        assert_eq!(settings.validate(), Err("Spawn point is below the kill plane"));
    }

    #[test]
    fn rejects_flat_props() {
        let settings = SimSettings {
            prop_half_extents: Vector3::new(1.0, 0.0, 1.0),
            ..SimSettings::default()
        };
        assert_eq!(settings.validate(), Err("Half extents must be positive"));
    }

    #[test]
    fn controller_converts_degrees() {
        let kcc = KccSettings::default().controller();
        assert!((kcc.max_slope_climb_angle - 52.0_f32.to_radians()).abs() < 1.0e-6);
        assert!(kcc.autostep.is_some());
        assert!(kcc.snap_to_ground.is_some());
    }
}
