//! The per-frame sandbox loop.
//!
//! [`Simulation`] owns every piece of mutable state (world, character, props, picking,
//! input, clock). The host pushes key and click events between ticks and calls
//! [`Simulation::tick`] once per frame with the frame delta.
//!
//! Tick order:
//! 1. character (input, jump arc, KCC move, kill-plane respawn, viewpoint mirror)
//! 2. physics step
//! 3. props (visual sync, kill-plane cull)
//! 4. picking (restore, ray, highlight), then queued clicks

use nalgebra::{UnitQuaternion, Vector3};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::character::{CharacterController, CharacterState};
use crate::clock::SimClock;
use crate::input::InputState;
use crate::jump::JumpState;
use crate::picking::{Interaction, PickTarget};
use crate::props::{PropRegistry, PropSpawn};
use crate::scene::{Scene, VisualDesc, VisualId, VisualShape, Viewpoint};
use crate::settings::SimSettings;
use crate::world::{ColliderShapeDef, PhysicsWorld, WorldStaticDef};

const INITIAL_STEP_DT: f32 = 1.0 / 60.0;

/// Summary of one tick, for hosts and tests.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickReport {
    pub grounded: bool,
    pub jump: JumpState,
    pub respawned: bool,
    pub props_culled: usize,
    pub pick_target: Option<PickTarget>,
    pub clicks_applied: usize,
}

pub struct Simulation {
    settings: SimSettings,
    world: PhysicsWorld,
    character: CharacterController,
    props: PropRegistry,
    interaction: Interaction,
    input: InputState,
    clock: SimClock,
    ground_visual: VisualId,
    queued_clicks: usize,
}

impl Simulation {
    /// Builds the world: baseplate, player capsule at the spawn point, and the prop population.
    pub fn new(settings: SimSettings, scene: &mut impl Scene) -> Result<Self, &'static str> {
        settings.validate()?;

        let mut world = PhysicsWorld::new(settings.world_gravity);

        let ground_visual = scene.add_visual(VisualDesc {
            shape: VisualShape::Cuboid {
                half_extents: settings.ground_half_extents,
            },
            color: settings.ground_color,
            translation: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
        });
        world.insert_static(&WorldStaticDef {
            translation: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            shape: ColliderShapeDef::Cuboid {
                half_extents: settings.ground_half_extents,
            },
            visual: Some(ground_visual),
        });

        let character = CharacterController::spawn(&mut world, &settings);

        let mut rng = match settings.prop_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        };
        let mut props = PropRegistry::new(settings.kill_plane_y);
        props.spawn(
            settings.prop_count,
            &PropSpawn {
                planar_half_extent: settings.prop_spawn_half_extent,
                height: settings.prop_spawn_height,
                half_extents: settings.prop_half_extents,
                color: settings.prop_color,
            },
            &mut world,
            scene,
            &mut rng,
        );

        // Populate the broad phase so the first tick's queries see the ground.
        world.step(INITIAL_STEP_DT.min(settings.max_tick_dt));

        let interaction = Interaction::new(
            settings.highlight_color,
            settings.click_impulse,
            settings.pick_max_distance,
        );

        log::info!(
            "sandbox ready: {} props, player at {:?}",
            props.len(),
            settings.spawn_point
        );

        Ok(Self {
            settings,
            world,
            character,
            props,
            interaction,
            input: InputState::new(),
            clock: SimClock::default(),
            ground_visual,
            queued_clicks: 0,
        })
    }

    pub fn key_down(&mut self, code: &str) {
        self.input.on_key_down(code);
    }

    pub fn key_up(&mut self, code: &str) {
        self.input.on_key_up(code);
    }

    /// Drops all held keys, e.g. when capture is released and key-ups may be lost.
    pub fn release_keys(&mut self) {
        self.input.clear();
    }

    /// Records a click to be resolved against the pick target at the end of the next tick.
    pub fn queue_click(&mut self) {
        self.queued_clicks += 1;
    }

    /// Advances the sandbox by `raw_dt` seconds of wall-clock frame time, capped at
    /// `max_tick_dt`.
    ///
    /// `captured` is the host's control-capture gate: without it the character holds still
    /// and queued clicks are discarded. Props and picking run either way.
    pub fn tick(
        &mut self,
        raw_dt: f32,
        captured: bool,
        view: &mut impl Viewpoint,
        scene: &mut impl Scene,
    ) -> TickReport {
        let max_dt = self.settings.max_tick_dt;
        let dt = if !raw_dt.is_finite() {
            log::debug!("ignoring non-finite tick delta {raw_dt}");
            0.0
        } else if raw_dt > max_dt {
            log::debug!("tick delta {raw_dt:.3}s clamped to {max_dt:.3}s; simulated time falls behind");
            max_dt
        } else {
            raw_dt.max(0.0)
        };
        let now = self.clock.advance(dt);

        let snapshot = self.input.snapshot();
        let moved = self
            .character
            .tick(&mut self.world, &snapshot, view, captured, now, dt);

        self.world.step(dt);

        let props_culled = self.props.tick(&mut self.world, scene);

        let pick_target = self
            .interaction
            .tick(&self.world, view, scene, Some(self.character.body()));

        let clicks = std::mem::take(&mut self.queued_clicks);
        let mut clicks_applied = 0;
        if captured {
            for _ in 0..clicks {
                if self.interaction.click(&self.props, &mut self.world) {
                    clicks_applied += 1;
                }
            }
        }

        let state = self.character.state();
        TickReport {
            grounded: state.grounded,
            jump: state.jump,
            respawned: moved.respawned,
            props_culled,
            pick_target,
            clicks_applied,
        }
    }

    pub fn settings(&self) -> &SimSettings {
        &self.settings
    }

    pub fn character(&self) -> &CharacterState {
        self.character.state()
    }

    pub fn props(&self) -> &PropRegistry {
        &self.props
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn ground_visual(&self) -> VisualId {
        self.ground_visual
    }

    pub fn now(&self) -> std::time::Duration {
        self.clock.now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FixedViewpoint, RecordingScene};
    use std::time::Duration;

    const DT: f32 = 1.0 / 60.0;

    /// Ground top is at y = 2.5; capsule center rests at 2.5 + 1.5 + 1.0 + offset.
    fn standing_settings() -> SimSettings {
        SimSettings {
            prop_count: 0,
            spawn_point: Vector3::new(0.0, 5.1, 0.0),
            prop_seed: Some(1),
            ..SimSettings::default()
        }
    }

    fn settled(settings: SimSettings) -> (Simulation, RecordingScene, FixedViewpoint) {
        let mut scene = RecordingScene::default();
        let mut view = FixedViewpoint::new();
        let mut sim = Simulation::new(settings, &mut scene).unwrap();
        for _ in 0..30 {
            sim.tick(DT, true, &mut view, &mut scene);
        }
        assert!(sim.character().grounded);
        (sim, scene, view)
    }

    #[test]
    fn rejects_invalid_settings() {
        let mut scene = RecordingScene::default();
        let settings = SimSettings {
            max_tick_dt: 0.0,
            ..SimSettings::default()
        };
        assert!(Simulation::new(settings, &mut scene).is_err());
        assert_eq!(scene.len(), 0);
    }

    #[test]
    fn walking_forward_for_one_second_covers_sixteen_units() {
        let (mut sim, mut scene, mut view) = settled(standing_settings());
        let start = sim.character().position;

        sim.key_down("KeyW");
        for _ in 0..60 {
            let report = sim.tick(DT, true, &mut view, &mut scene);
            assert!(report.grounded);
        }
        let moved = sim.character().position - start;

        // Identity view walks down -Z.
        assert!((-moved.z - 16.0).abs() < 0.1, "moved {moved:?}");
        assert!(moved.x.abs() < 1.0e-3);
        assert!(moved.y.abs() < 0.05);
    }

    #[test]
    fn viewpoint_mirrors_the_body_every_tick() {
        let (mut sim, mut scene, mut view) = settled(standing_settings());
        sim.key_down("KeyD");
        for _ in 0..10 {
            sim.tick(DT, true, &mut view, &mut scene);
            let eye = sim.character().position + Vector3::new(0.0, sim.settings().eye_height, 0.0);
            assert!((view.position - eye).norm() < 1.0e-6);
        }
    }

    #[test]
    fn uncaptured_character_holds_position() {
        let (mut sim, mut scene, mut view) = settled(standing_settings());
        let start = sim.character().position;
        sim.key_down("KeyW");
        sim.key_down("Space");
        for _ in 0..30 {
            let report = sim.tick(DT, false, &mut view, &mut scene);
            assert_eq!(report.jump, JumpState::Idle);
        }
        assert!((sim.character().position - start).norm() < 1.0e-4);
    }

    #[test]
    fn jump_rises_then_cools_down_exactly_once() {
        let (mut sim, mut scene, mut view) = settled(standing_settings());
        let ground_y = sim.character().position.y;

        sim.key_down("Space");
        let first = sim.tick(DT, true, &mut view, &mut scene);
        let JumpState::Rising { start, end } = first.jump else {
            panic!("expected a jump, got {:?}", first.jump);
        };
        assert_eq!(end - start, Duration::from_millis(350));

        let mut cooldowns = 0;
        let mut previous = first.jump;
        let mut peak = ground_y;
        // Holding jump through the rise must not restart it.
        while sim.now() < start + Duration::from_millis(300) {
            let report = sim.tick(DT, true, &mut view, &mut scene);
            assert_eq!(report.jump, first.jump);
            peak = peak.max(sim.character().position.y);
            previous = report.jump;
        }
        sim.key_up("Space");
        while sim.now() < start + Duration::from_millis(500) {
            let report = sim.tick(DT, true, &mut view, &mut scene);
            if previous.is_rising() && matches!(report.jump, JumpState::CoolingDown { .. }) {
                cooldowns += 1;
                assert!(sim.now() >= end);
                assert!(sim.now() < end + Duration::from_secs_f32(DT) + Duration::from_millis(1));
            }
            previous = report.jump;
        }
        assert_eq!(cooldowns, 1);
        assert!(peak > ground_y + 1.0, "peak {peak} ground {ground_y}");
    }

    #[test]
    fn jump_pressed_during_cooldown_is_ignored() {
        let (mut sim, mut scene, mut view) = settled(standing_settings());
        sim.key_down("Space");
        let first = sim.tick(DT, true, &mut view, &mut scene).jump;
        let JumpState::Rising { end, .. } = first else {
            panic!("expected a jump");
        };
        // Keep holding space; during cooldown no new jump may start.
        let ready_at = end + Duration::from_millis(200);
        while sim.now() < ready_at - Duration::from_millis(20) {
            let report = sim.tick(DT, true, &mut view, &mut scene);
            assert!(!matches!(report.jump, JumpState::Rising { start, .. } if start > end));
        }
    }

    #[test]
    fn falling_off_the_world_respawns_at_the_spawn_point() {
        let settings = SimSettings {
            prop_count: 0,
            spawn_point: Vector3::new(0.0, 25.0, 0.0),
            ground_half_extents: Vector3::new(2.0, 2.5, 2.0),
            character_gravity: 50.0,
            ..SimSettings::default()
        };
        let mut scene = RecordingScene::default();
        let mut view = FixedViewpoint::new();
        let mut sim = Simulation::new(settings, &mut scene).unwrap();

        // Walk off the small baseplate and fall.
        sim.key_down("KeyW");
        let mut respawned = false;
        for _ in 0..600 {
            let report = sim.tick(DT, true, &mut view, &mut scene);
            if report.respawned {
                respawned = true;
                assert_eq!(sim.character().position, Vector3::new(0.0, 25.0, 0.0));
                assert_eq!(report.jump, JumpState::Idle);
                break;
            }
        }
        assert!(respawned);
    }

    #[test]
    fn props_settle_on_the_ground_and_none_are_culled() {
        // Player parked outside the drop zone so no prop can come to rest on it.
        let settings = SimSettings {
            prop_seed: Some(42),
            spawn_point: Vector3::new(46.0, 25.0, 46.0),
            ..SimSettings::default()
        };
        let mut scene = RecordingScene::default();
        let mut view = FixedViewpoint::new();
        let mut sim = Simulation::new(settings, &mut scene).unwrap();
        assert_eq!(sim.props().len(), 25);

        let mut culled = 0;
        for _ in 0..900 {
            culled += sim.tick(DT, true, &mut view, &mut scene).props_culled;
        }
        assert_eq!(culled, 0);
        assert_eq!(sim.props().len(), 25);

        let ground_top = sim.settings().ground_half_extents.y;
        for prop in sim.props().iter() {
            let t = sim.world().translation(prop.body).unwrap();
            let v = sim.world().linvel(prop.body).unwrap();
            // Resting on the baseplate (allowing for a tumbled or stacked cube).
            assert!(t.y > ground_top && t.y < ground_top + 6.0, "prop at {t:?}");
            assert!(v.norm() < 0.5, "prop still moving: {v:?}");
            let visual = scene.visual(prop.visual).unwrap();
            assert_eq!(visual.translation, t);
        }
    }

    #[test]
    fn click_launches_the_prop_under_the_crosshair() {
        let settings = SimSettings {
            prop_count: 1,
            prop_spawn_half_extent: 1.0e-3,
            prop_spawn_height: 4.0,
            spawn_point: Vector3::new(0.0, 5.1, 12.0),
            prop_seed: Some(3),
            ..SimSettings::default()
        };
        let (mut sim, mut scene, _) = settled(settings);
        let prop = *sim.props().iter().next().unwrap();

        // Camera at the player's eye, aimed at the cube near the origin.
        let eye = sim.character().position + Vector3::new(0.0, sim.settings().eye_height, 0.0);
        let cube = sim.world().translation(prop.body).unwrap();
        let mut view = FixedViewpoint::looking(eye, cube - eye);

        let report = sim.tick(DT, true, &mut view, &mut scene);
        assert_eq!(report.pick_target.map(|t| t.visual), Some(prop.visual));

        sim.queue_click();
        let report = sim.tick(DT, true, &mut view, &mut scene);
        assert_eq!(report.clicks_applied, 1);
        assert!(sim.world().linvel(prop.body).unwrap().y > 100.0);
    }

    #[test]
    fn clicks_while_uncaptured_are_discarded() {
        let (mut sim, mut scene, mut view) = settled(standing_settings());
        sim.queue_click();
        let report = sim.tick(DT, false, &mut view, &mut scene);
        assert_eq!(report.clicks_applied, 0);
        // Not carried over to the next captured tick either.
        let report = sim.tick(DT, true, &mut view, &mut scene);
        assert_eq!(report.clicks_applied, 0);
    }

    #[test]
    fn oversized_deltas_are_clamped() {
        let (mut sim, mut scene, mut view) = settled(standing_settings());
        let before = sim.now();
        sim.tick(5.0, true, &mut view, &mut scene);
        let advanced = sim.now() - before;
        assert!((advanced.as_secs_f32() - sim.settings().max_tick_dt).abs() < 1.0e-6);

        let before = sim.now();
        sim.tick(f32::NAN, true, &mut view, &mut scene);
        sim.tick(-1.0, true, &mut view, &mut scene);
        assert_eq!(sim.now(), before);
    }

    #[test]
    fn walking_into_a_wall_stops_short_of_it() {
        let (mut sim, mut scene, mut view) = settled(standing_settings());
        // Wall face at z = -5, spanning well past the capsule on every side.
        sim.world.insert_static(&WorldStaticDef {
            translation: Vector3::new(0.0, 5.0, -5.5),
            rotation: UnitQuaternion::identity(),
            shape: ColliderShapeDef::Cuboid {
                half_extents: Vector3::new(10.0, 10.0, 0.5),
            },
            visual: None,
        });
        sim.world.step(DT);

        sim.key_down("KeyW");
        let mut last_z = sim.character().position.z;
        let mut step_z = f32::MAX;
        for _ in 0..60 {
            let report = sim.tick(DT, true, &mut view, &mut scene);
            assert!(report.grounded);
            let z = sim.character().position.z;
            step_z = (z - last_z).abs();
            last_z = z;
        }

        let radius = sim.settings().capsule_radius;
        // Blocked: no forward progress on the last tick, capsule still in front of the wall.
        assert!(step_z < 1.0e-3, "still moving {step_z}");
        assert!(last_z > -5.0 + radius - 1.0e-3, "capsule at z={last_z}");
        assert!(last_z < -5.0 + radius + 0.2, "stopped early at z={last_z}");
    }
}
