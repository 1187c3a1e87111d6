//! Bevy host for the sandbox simulation.
//!
//! The simulation owns all gameplay state; this plugin renders it. [`BevyScene`] backs the
//! sandbox's visuals with mesh entities (one material per visual so colors can change
//! independently) and [`CameraView`] lends it the player camera as the viewpoint.

use std::collections::HashMap;

use bevy::{ecs::system::SystemParam, prelude::*};
use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use sandbox_sim::{Scene, SimSettings, Simulation, Viewpoint, VisualDesc, VisualId, VisualShape};

use crate::AppSystems;
use crate::camera::{PlayerCamera, PointerCapture};

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<VisualEntities>();
    app.add_systems(Startup, start_sandbox);
    app.add_systems(
        Update,
        tick_sandbox
            .in_set(AppSystems::Tick)
            .run_if(resource_exists::<SandboxSim>),
    );
}

#[derive(Resource)]
pub struct SandboxSim(pub Simulation);

/// Entity rendering a sandbox visual.
#[derive(Component)]
struct SandboxVisual;

struct VisualEntry {
    entity: Entity,
    material: Handle<StandardMaterial>,
    color: sandbox_sim::Color,
}

#[derive(Resource, Default)]
struct VisualEntities {
    next_id: u64,
    entries: HashMap<VisualId, VisualEntry>,
}

#[derive(SystemParam)]
struct BevyScene<'w, 's> {
    commands: Commands<'w, 's>,
    meshes: ResMut<'w, Assets<Mesh>>,
    materials: ResMut<'w, Assets<StandardMaterial>>,
    visuals: ResMut<'w, VisualEntities>,
    transforms: Query<'w, 's, &'static mut Transform, (With<SandboxVisual>, Without<PlayerCamera>)>,
}

impl Scene for BevyScene<'_, '_> {
    fn add_visual(&mut self, desc: VisualDesc) -> VisualId {
        let id = VisualId(self.visuals.next_id);
        self.visuals.next_id += 1;

        let mesh = match desc.shape {
            VisualShape::Cuboid { half_extents } => {
                self.meshes.add(Cuboid::from_size(to_vec3(half_extents) * 2.0))
            }
        };
        let material = self.materials.add(StandardMaterial {
            base_color: to_bevy_color(desc.color),
            perceptual_roughness: 0.9,
            ..default()
        });
        let entity = self
            .commands
            .spawn((
                SandboxVisual,
                Mesh3d(mesh),
                MeshMaterial3d(material.clone()),
                Transform::from_translation(to_vec3(desc.translation))
                    .with_rotation(to_quat(desc.rotation)),
            ))
            .id();

        self.visuals.entries.insert(
            id,
            VisualEntry {
                entity,
                material,
                color: desc.color,
            },
        );
        id
    }

    fn remove_visual(&mut self, id: VisualId) {
        let Some(entry) = self.visuals.entries.remove(&id) else {
            return;
        };
        self.commands.entity(entry.entity).despawn();
        self.materials.remove(&entry.material);
    }

    fn set_transform(&mut self, id: VisualId, translation: Vector3<f32>, rotation: UnitQuaternion<f32>) {
        let Some(entry) = self.visuals.entries.get(&id) else {
            return;
        };
        let next = Transform::from_translation(to_vec3(translation)).with_rotation(to_quat(rotation));
        match self.transforms.get_mut(entry.entity) {
            Ok(mut transform) => *transform = next,
            // Spawned this frame; the command has not been applied yet.
            Err(_) => {
                self.commands.entity(entry.entity).insert(next);
            }
        }
    }

    fn color(&self, id: VisualId) -> Option<sandbox_sim::Color> {
        self.visuals.entries.get(&id).map(|entry| entry.color)
    }

    fn set_color(&mut self, id: VisualId, color: sandbox_sim::Color) {
        let Some(entry) = self.visuals.entries.get_mut(&id) else {
            return;
        };
        entry.color = color;
        if let Some(material) = self.materials.get_mut(&entry.material) {
            material.base_color = to_bevy_color(color);
        }
    }
}

/// The player camera transform as the sandbox sees it.
struct CameraView(Transform);

impl Viewpoint for CameraView {
    fn position(&self) -> Vector3<f32> {
        let t = self.0.translation;
        Vector3::new(t.x, t.y, t.z)
    }

    fn set_position(&mut self, position: Vector3<f32>) {
        self.0.translation = to_vec3(position);
    }

    fn orientation(&self) -> UnitQuaternion<f32> {
        let q = self.0.rotation;
        UnitQuaternion::new_normalize(Quaternion::new(q.w, q.x, q.y, q.z))
    }
}

fn start_sandbox(mut commands: Commands, mut scene: BevyScene, mut exit: MessageWriter<AppExit>) {
    match Simulation::new(SimSettings::default(), &mut scene) {
        Ok(sim) => {
            commands.insert_resource(SandboxSim(sim));
        }
        Err(err) => {
            error!("failed to start sandbox: {err}");
            exit.write(AppExit::error());
        }
    }
}

fn tick_sandbox(
    time: Res<Time>,
    capture: Res<PointerCapture>,
    mut sim: ResMut<SandboxSim>,
    mut scene: BevyScene,
    mut camera: Single<&mut Transform, (With<PlayerCamera>, Without<SandboxVisual>)>,
) {
    let mut view = CameraView(**camera);
    let report = sim
        .0
        .tick(time.delta_secs(), capture.captured, &mut view, &mut scene);
    camera.translation = view.0.translation;

    if report.respawned {
        info!("player respawned");
    }
    if report.props_culled > 0 {
        debug!("{} props fell out of the world", report.props_culled);
    }
}

fn to_vec3(v: Vector3<f32>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

fn to_quat(q: UnitQuaternion<f32>) -> Quat {
    Quat::from_xyzw(q.i, q.j, q.k, q.w)
}

fn to_bevy_color(color: sandbox_sim::Color) -> Color {
    let [r, g, b] = color.rgb_u8();
    Color::srgb_u8(r, g, b)
}
