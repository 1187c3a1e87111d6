//! Rapier physics world for the sandbox.
//!
//! This module owns every Rapier structure the sandbox needs:
//! - `RigidBodySet`/`ColliderSet` holding the static baseplate, the kinematic player and the
//!   dynamic props.
//! - The pipeline state (`PhysicsPipeline`, `IslandManager`, `BroadPhaseBvh`, `NarrowPhase`,
//!   joint sets, `CCDSolver`) needed to step dynamics.
//!
//! Scene queries (ray casts and the built-in `KinematicCharacterController`) go through a
//! borrowed `QueryPipeline` created from the broad phase, so they always see the state left
//! by the last [`PhysicsWorld::step`].
//!
//! Handles passed back in may refer to bodies that were already removed; those calls are
//! no-ops returning `None`/`false`.

// Re-export Rapier so the client can name Rapier types without depending on `rapier3d`.
pub use rapier3d;

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3, point, vector};
use rapier3d::control::KinematicCharacterController;
use rapier3d::prelude::*;

use crate::scene::VisualId;

/// Definition of an immutable world collider. The pose lives on the fixed parent body.
#[derive(Clone, Debug)]
pub struct WorldStaticDef {
    /// World-space translation.
    pub translation: Vector3<f32>,
    /// World-space rotation (unit quaternion).
    pub rotation: UnitQuaternion<f32>,
    /// Collider shape parameters.
    pub shape: ColliderShapeDef,
    /// Visual mirrored by this collider, if any. Only colliders with a visual can be picked.
    pub visual: Option<VisualId>,
}

/// Supported static collider shapes.
#[derive(Clone, Debug)]
pub enum ColliderShapeDef {
    /// Oriented cuboid with given half-extents.
    Cuboid { half_extents: Vector3<f32> },
}

/// Build a Rapier collider from a `WorldStaticDef`, tagged with its visual if it has one.
fn collider_from_def(def: &WorldStaticDef) -> Collider {
    let builder = match &def.shape {
        ColliderShapeDef::Cuboid { half_extents } => {
            ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
        }
    };

    let user_data = def.visual.map(VisualId::to_user_data).unwrap_or(0);
    builder.user_data(user_data).build()
}

/// Result of a kinematic-controller movement query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedMove {
    /// Movement actually allowed by the world (slid/clipped against obstructions).
    pub translation: Vector3<f32>,
    pub grounded: bool,
}

/// Nearest ray hit on a collider that carries a visual.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub collider: ColliderHandle,
    pub visual: VisualId,
    pub distance: f32,
}

pub struct PhysicsWorld {
    pub gravity: Vector3<f32>,
    pub integration_parameters: IntegrationParameters,
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    pub islands: IslandManager,
    pub broad_phase: BroadPhaseBvh,
    pub narrow_phase: NarrowPhase,
    pub impulse_joints: ImpulseJointSet,
    pub multibody_joints: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pipeline: PhysicsPipeline,
}

impl PhysicsWorld {
    pub fn new(gravity: Vector3<f32>) -> Self {
        Self {
            gravity,
            integration_parameters: IntegrationParameters::default(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            pipeline: PhysicsPipeline::new(),
        }
    }

    /// Insert an immutable collider as a fixed body + attached collider.
    pub fn insert_static(&mut self, def: &WorldStaticDef) -> (RigidBodyHandle, ColliderHandle) {
        let body = RigidBodyBuilder::fixed()
            .translation(def.translation)
            .rotation(def.rotation.scaled_axis())
            .build();
        let body = self.bodies.insert(body);
        let collider =
            self.colliders
                .insert_with_parent(collider_from_def(def), body, &mut self.bodies);
        (body, collider)
    }

    /// Insert the player: a position-based kinematic body with a Y-aligned capsule.
    ///
    /// The capsule carries no visual so picking rays pass through it.
    pub fn insert_kinematic_capsule(
        &mut self,
        translation: Vector3<f32>,
        half_height: f32,
        radius: f32,
    ) -> (RigidBodyHandle, ColliderHandle) {
        let body = RigidBodyBuilder::kinematic_position_based()
            .translation(translation)
            .build();
        let body = self.bodies.insert(body);
        let collider = ColliderBuilder::capsule_y(half_height, radius).build();
        let collider = self
            .colliders
            .insert_with_parent(collider, body, &mut self.bodies);
        (body, collider)
    }

    /// Insert a dynamic cuboid mirrored by `visual`.
    pub fn insert_dynamic_cuboid(
        &mut self,
        translation: Vector3<f32>,
        half_extents: Vector3<f32>,
        visual: VisualId,
    ) -> (RigidBodyHandle, ColliderHandle) {
        let body = RigidBodyBuilder::dynamic().translation(translation).build();
        let body = self.bodies.insert(body);
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .user_data(visual.to_user_data())
            .build();
        let collider = self
            .colliders
            .insert_with_parent(collider, body, &mut self.bodies);
        (body, collider)
    }

    /// Remove a body and every collider attached to it.
    pub fn remove_body(&mut self, handle: RigidBodyHandle) -> bool {
        self.bodies
            .remove(
                handle,
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            )
            .is_some()
    }

    /// Advance the simulation by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        if !(dt.is_finite() && dt > 0.0) {
            return;
        }
        self.integration_parameters.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &(),
        );
    }

    /// Create a borrowed `QueryPipeline` view suitable for scene queries and KCC.
    pub fn query_pipeline<'a>(&'a self, filter: QueryFilter<'a>) -> QueryPipeline<'a> {
        self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            filter,
        )
    }

    /// Resolve a desired displacement of `collider` through the kinematic character controller.
    ///
    /// The collider's own body is excluded from the query. A missing collider resolves to no
    /// movement and not grounded.
    pub fn move_character(
        &self,
        controller: &KinematicCharacterController,
        collider: ColliderHandle,
        position: Vector3<f32>,
        desired: Vector3<f32>,
        dt: f32,
    ) -> ResolvedMove {
        let Some(co) = self.colliders.get(collider) else {
            return ResolvedMove {
                translation: Vector3::zeros(),
                grounded: false,
            };
        };

        let mut filter = QueryFilter::default().exclude_collider(collider);
        if let Some(parent) = co.parent() {
            filter = filter.exclude_rigid_body(parent);
        }
        let query_pipeline = self.query_pipeline(filter);

        let corrected = controller.move_shape(
            dt,
            &query_pipeline,
            co.shape(),
            &Isometry3::from_parts(Translation3::from(position), UnitQuaternion::identity()),
            desired,
            |_| {},
        );

        ResolvedMove {
            translation: corrected.translation,
            grounded: corrected.grounded,
        }
    }

    /// Returns whether there is supporting geometry within `max_dist` below `feet`.
    ///
    /// The probe starts slightly above the feet to avoid starting inside the ground.
    pub fn has_support_within(
        &self,
        feet: Vector3<f32>,
        max_dist: f32,
        exclude: RigidBodyHandle,
    ) -> bool {
        let ray = Ray::new(
            point![feet.x, feet.y + 0.02, feet.z],
            vector![0.0, -1.0, 0.0],
        );
        let query_pipeline = self.query_pipeline(QueryFilter::default().exclude_rigid_body(exclude));
        query_pipeline
            .cast_ray(&ray, (max_dist + 0.02).max(0.0), true)
            .is_some()
    }

    /// Nearest collider carrying a visual along the ray, ignoring `exclude`.
    pub fn cast_pick_ray(
        &self,
        origin: Vector3<f32>,
        dir: Vector3<f32>,
        max_dist: f32,
        exclude: Option<RigidBodyHandle>,
    ) -> Option<RayHit> {
        let dir = dir.try_normalize(1.0e-6)?;
        let ray = Ray::new(point![origin.x, origin.y, origin.z], dir);

        let has_visual =
            |_: ColliderHandle, co: &Collider| VisualId::from_user_data(co.user_data).is_some();
        let mut filter = QueryFilter::default().predicate(&has_visual);
        if let Some(body) = exclude {
            filter = filter.exclude_rigid_body(body);
        }
        let query_pipeline = self.query_pipeline(filter);

        let (collider, distance) = query_pipeline.cast_ray(&ray, max_dist, true)?;
        let visual = VisualId::from_user_data(self.colliders.get(collider)?.user_data)?;
        Some(RayHit {
            collider,
            visual,
            distance,
        })
    }

    pub fn apply_impulse(&mut self, handle: RigidBodyHandle, impulse: Vector3<f32>) -> bool {
        let Some(body) = self.bodies.get_mut(handle) else {
            return false;
        };
        body.apply_impulse(impulse, true);
        true
    }

    pub fn translation(&self, handle: RigidBodyHandle) -> Option<Vector3<f32>> {
        self.bodies.get(handle).map(|b| *b.translation())
    }

    pub fn rotation(&self, handle: RigidBodyHandle) -> Option<UnitQuaternion<f32>> {
        self.bodies.get(handle).map(|b| *b.rotation())
    }

    #[cfg(test)]
    pub fn linvel(&self, handle: RigidBodyHandle) -> Option<Vector3<f32>> {
        self.bodies.get(handle).map(|b| *b.linvel())
    }

    /// Schedule the kinematic body's translation for the next step.
    pub fn set_next_kinematic_translation(
        &mut self,
        handle: RigidBodyHandle,
        translation: Vector3<f32>,
    ) -> bool {
        let Some(body) = self.bodies.get_mut(handle) else {
            return false;
        };
        body.set_next_kinematic_translation(translation);
        true
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }
}
