//! First-person kinematic character.
//!
//! Each tick the controller assembles a *desired* displacement (planar intent, constant
//! descent or jump push) and hands it to Rapier's `KinematicCharacterController`, which
//! resolves it against the world. Collision response is never computed here.

use std::time::Duration;

use nalgebra::{UnitQuaternion, Vector2, Vector3};
use rapier3d::control::KinematicCharacterController;
use rapier3d::prelude::{ColliderHandle, RigidBodyHandle};

use crate::input::InputSnapshot;
use crate::jump::{JumpArc, JumpState};
use crate::scene::Viewpoint;
use crate::settings::SimSettings;
use crate::world::PhysicsWorld;

const DIR_EPS: f32 = 1.0e-6;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CharacterState {
    /// Capsule center, world space.
    pub position: Vector3<f32>,
    /// Support as reported by the last movement query. Recomputed every tick.
    pub grounded: bool,
    pub jump: JumpState,
}

/// What happened to the character during one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CharacterTick {
    /// Movement the world allowed this tick.
    pub resolved: Vector3<f32>,
    pub respawned: bool,
}

/// Horizontal forward/right unit vectors for a view orientation.
///
/// The vertical component is dropped, so pitching the camera never changes walking speed.
/// Looking straight up or down falls back to deriving forward from the right vector.
pub fn planar_basis(orientation: &UnitQuaternion<f32>) -> (Vector3<f32>, Vector3<f32>) {
    let flatten = |v: Vector3<f32>| Vector3::new(v.x, 0.0, v.z).try_normalize(DIR_EPS);
    let up = Vector3::y();

    let forward = flatten(orientation * -Vector3::z());
    let right = flatten(orientation * Vector3::x());

    match (forward, right) {
        (Some(f), Some(r)) => (f, r),
        (None, Some(r)) => (up.cross(&r), r),
        (Some(f), None) => (f, f.cross(&up)),
        (None, None) => (-Vector3::z(), Vector3::x()),
    }
}

/// Planar intent from the four directional keys: `x` is right, `y` is forward.
///
/// Keys are summed as vectors and the result normalized, so diagonals are not faster.
/// Opposing keys cancel; no keys (or a cancelled pair) yields zero.
pub fn planar_intent(input: &InputSnapshot) -> Vector2<f32> {
    let axis = |pos: bool, neg: bool| (pos as i8 - neg as i8) as f32;
    let intent = Vector2::new(
        axis(input.move_right, input.move_left),
        axis(input.move_forward, input.move_backward),
    );
    intent.try_normalize(DIR_EPS).unwrap_or_else(Vector2::zeros)
}

pub struct CharacterController {
    body: RigidBodyHandle,
    collider: ColliderHandle,
    kcc: KinematicCharacterController,
    arc: JumpArc,
    planar_speed: f32,
    gravity: f32,
    kill_plane_y: f32,
    spawn_point: Vector3<f32>,
    eye_offset: Vector3<f32>,
    /// Capsule center to feet.
    feet_offset: f32,
    probe_distance: f32,
    state: CharacterState,
}

impl CharacterController {
    /// Inserts the player capsule at the spawn point.
    pub fn spawn(world: &mut PhysicsWorld, settings: &SimSettings) -> Self {
        let (body, collider) = world.insert_kinematic_capsule(
            settings.spawn_point,
            settings.capsule_half_height,
            settings.capsule_radius,
        );

        Self {
            body,
            collider,
            kcc: settings.kcc.controller(),
            arc: JumpArc {
                force: settings.jump_force,
                duration: settings.jump_duration,
                cooldown: settings.jump_cooldown,
            },
            planar_speed: settings.planar_speed,
            gravity: settings.character_gravity,
            kill_plane_y: settings.kill_plane_y,
            spawn_point: settings.spawn_point,
            eye_offset: Vector3::new(0.0, settings.eye_height, 0.0),
            feet_offset: settings.capsule_half_height + settings.capsule_radius,
            probe_distance: settings.ground_probe_distance + settings.kcc.offset,
            state: CharacterState {
                position: settings.spawn_point,
                grounded: false,
                jump: JumpState::Idle,
            },
        }
    }

    #[inline]
    pub fn state(&self) -> &CharacterState {
        &self.state
    }

    #[inline]
    pub fn body(&self) -> RigidBodyHandle {
        self.body
    }

    #[inline]
    pub fn collider(&self) -> ColliderHandle {
        self.collider
    }

    /// Runs one controller tick ending at simulated time `now`.
    ///
    /// While `captured` is false no displacement is computed and the character holds
    /// position; the viewpoint is still mirrored.
    pub fn tick(
        &mut self,
        world: &mut PhysicsWorld,
        input: &InputSnapshot,
        view: &mut impl Viewpoint,
        captured: bool,
        now: Duration,
        dt: f32,
    ) -> CharacterTick {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let position = world.translation(self.body).unwrap_or(self.state.position);

        let mut jump = self.arc.advance(self.state.jump, now);

        // Support is probed fresh before the jump decision; it is never carried over.
        let feet = position - Vector3::new(0.0, self.feet_offset, 0.0);
        let supported = world.has_support_within(feet, self.probe_distance, self.body);

        if !captured {
            self.state = CharacterState {
                position,
                grounded: supported,
                jump,
            };
            view.set_position(position + self.eye_offset);
            return CharacterTick::default();
        }

        jump = self.arc.try_start(jump, input.move_up, supported, now);

        let (forward, right) = planar_basis(&view.orientation());
        let intent = planar_intent(input);
        let horizontal = (forward * intent.y + right * intent.x) * self.planar_speed * dt;
        let vertical = self.arc.vertical_displacement(jump, now, self.gravity, dt);
        let desired = horizontal + Vector3::new(0.0, vertical, 0.0);

        let resolved = world.move_character(&self.kcc, self.collider, position, desired, dt);

        let mut next = position + resolved.translation;
        let mut grounded = resolved.grounded;
        let mut respawned = false;

        if next.y < self.kill_plane_y {
            log::info!(
                "character fell below kill plane (y={:.2}), respawning at {:?}",
                next.y,
                self.spawn_point
            );
            next = self.spawn_point;
            grounded = false;
            jump = JumpState::Idle;
            respawned = true;
        }

        world.set_next_kinematic_translation(self.body, next);
        self.state = CharacterState {
            position: next,
            grounded,
            jump,
        };
        view.set_position(next + self.eye_offset);

        CharacterTick {
            resolved: resolved.translation,
            respawned,
        }
    }
}
