use std::f32::consts::FRAC_PI_2;

use bevy::{
    core_pipeline::tonemapping::Tonemapping,
    input::mouse::AccumulatedMouseMotion,
    prelude::*,
    window::{CursorGrabMode, CursorOptions, PrimaryWindow, WindowFocused},
};
use leafwing_input_manager::prelude::*;
use sandbox_sim::constants::{EYE_HEIGHT, SPAWN_POINT};

use crate::AppSystems;
use crate::input::InputAction;
use crate::sandbox::SandboxSim;

/// Radians per pixel of mouse motion.
const LOOK_SENSITIVITY: f32 = 0.002;
const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.01;

/// Marks the first-person camera. Its transform is the sandbox viewpoint.
#[derive(Component)]
pub struct PlayerCamera;

#[derive(Component, Default)]
struct LookAngles {
    yaw: f32,
    pitch: f32,
}

/// Whether the pointer is locked to the window and the sandbox accepts control input.
#[derive(Resource, Default)]
pub struct PointerCapture {
    pub captured: bool,
}

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<PointerCapture>();
    app.add_systems(Startup, (add_camera, add_crosshair));
    app.add_systems(
        Update,
        (update_capture, mouse_look).chain().in_set(AppSystems::Capture),
    );
}

fn add_camera(mut commands: Commands) {
    let [x, y, z] = SPAWN_POINT;
    commands.spawn((
        PlayerCamera,
        LookAngles::default(),
        Camera3d::default(),
        Tonemapping::AcesFitted,
        Projection::from(PerspectiveProjection {
            fov: 75.0_f32.to_radians(),
            ..default()
        }),
        Transform::from_xyz(x, y + EYE_HEIGHT, z),
        DistanceFog {
            color: Color::srgba(0.35, 0.48, 0.66, 1.0),
            falloff: FogFalloff::Linear {
                start: 80.0,
                end: 400.0,
            },
            ..default()
        },
    ));
}

/// A small dot at the screen center; picking rays go through it.
fn add_crosshair(mut commands: Commands) {
    commands
        .spawn(Node {
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            justify_content: JustifyContent::Center,
            align_items: AlignItems::Center,
            ..default()
        })
        .with_child((
            Node {
                width: Val::Px(6.0),
                height: Val::Px(6.0),
                ..default()
            },
            BackgroundColor(Color::WHITE.with_alpha(0.8)),
            BorderRadius::MAX,
        ));
}

fn update_capture(
    actions: Res<ActionState<InputAction>>,
    mut focus: MessageReader<WindowFocused>,
    mut capture: ResMut<PointerCapture>,
    mut cursor: Single<&mut CursorOptions, With<PrimaryWindow>>,
    sim: Option<ResMut<SandboxSim>>,
) {
    let lost_focus = focus.read().any(|message| !message.focused);

    let wanted = if capture.captured {
        !(lost_focus || actions.just_pressed(&InputAction::ReleaseCapture))
    } else {
        actions.just_pressed(&InputAction::LeftClick)
    };
    if wanted == capture.captured {
        return;
    }

    capture.captured = wanted;
    if wanted {
        cursor.grab_mode = CursorGrabMode::Locked;
        cursor.visible = false;
        info!("pointer captured");
    } else {
        cursor.grab_mode = CursorGrabMode::None;
        cursor.visible = true;
        // Key-ups are not delivered while unfocused.
        if let Some(mut sim) = sim {
            sim.0.release_keys();
        }
        info!("pointer released");
    }
}

fn mouse_look(
    motion: Res<AccumulatedMouseMotion>,
    capture: Res<PointerCapture>,
    camera: Single<(&mut Transform, &mut LookAngles), With<PlayerCamera>>,
) {
    if !capture.captured || motion.delta == Vec2::ZERO {
        return;
    }
    let (mut transform, mut angles) = camera.into_inner();
    angles.yaw -= motion.delta.x * LOOK_SENSITIVITY;
    angles.pitch = (angles.pitch - motion.delta.y * LOOK_SENSITIVITY).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    transform.rotation = Quat::from_euler(EulerRot::YXZ, angles.yaw, angles.pitch, 0.0);
}
