//! Dynamic props: spawn once, mirror physics onto visuals, cull below the kill-plane.

use nalgebra::{UnitQuaternion, Vector3};
use rand::Rng;
use rapier3d::prelude::{ColliderHandle, RigidBodyHandle};

use crate::scene::{Color, Scene, VisualDesc, VisualId, VisualShape};
use crate::world::PhysicsWorld;

/// One live prop. The physics body is the source of truth; the visual is a mirror.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Prop {
    pub body: RigidBodyHandle,
    pub collider: ColliderHandle,
    pub visual: VisualId,
}

/// Placement parameters for the population pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PropSpawn {
    /// Props land uniformly in `[-half_extent, half_extent)` on X and Z.
    pub planar_half_extent: f32,
    pub height: f32,
    pub half_extents: Vector3<f32>,
    pub color: Color,
}

#[derive(Debug, Default)]
pub struct PropRegistry {
    props: Vec<Prop>,
    kill_plane_y: f32,
}

impl PropRegistry {
    pub fn new(kill_plane_y: f32) -> Self {
        Self {
            props: Vec::new(),
            kill_plane_y,
        }
    }

    /// Creates `count` props at random planar positions.
    pub fn spawn(
        &mut self,
        count: usize,
        spawn: &PropSpawn,
        world: &mut PhysicsWorld,
        scene: &mut impl Scene,
        rng: &mut impl Rng,
    ) {
        let extent = spawn.planar_half_extent.abs();
        self.props.reserve(count);

        for _ in 0..count {
            let (x, z) = if extent > 0.0 {
                (
                    rng.random_range(-extent..extent),
                    rng.random_range(-extent..extent),
                )
            } else {
                (0.0, 0.0)
            };
            let translation = Vector3::new(x, spawn.height, z);

            let visual = scene.add_visual(VisualDesc {
                shape: VisualShape::Cuboid {
                    half_extents: spawn.half_extents,
                },
                color: spawn.color,
                translation,
                rotation: UnitQuaternion::identity(),
            });
            let (body, collider) = world.insert_dynamic_cuboid(translation, spawn.half_extents, visual);

            self.props.push(Prop {
                body,
                collider,
                visual,
            });
        }

        log::info!("spawned {count} props ({} live)", self.props.len());
    }

    /// Mirrors every prop's physics pose onto its visual and culls props below the kill-plane.
    ///
    /// Returns the number of props removed this tick.
    pub fn tick(&mut self, world: &mut PhysicsWorld, scene: &mut impl Scene) -> usize {
        let before = self.props.len();
        let kill_plane_y = self.kill_plane_y;

        self.props.retain(|prop| {
            let (Some(translation), Some(rotation)) =
                (world.translation(prop.body), world.rotation(prop.body))
            else {
                // Body vanished underneath us; drop the mirror too.
                scene.remove_visual(prop.visual);
                return false;
            };

            if translation.y < kill_plane_y {
                log::debug!("culling prop {:?} at y={:.2}", prop.visual, translation.y);
                world.remove_body(prop.body);
                scene.remove_visual(prop.visual);
                return false;
            }

            scene.set_transform(prop.visual, translation, rotation);
            true
        });

        before - self.props.len()
    }

    pub fn find_by_visual(&self, visual: VisualId) -> Option<&Prop> {
        self.props.iter().find(|p| p.visual == visual)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Prop> {
        self.props.iter()
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }
}
