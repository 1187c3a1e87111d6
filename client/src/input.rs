use bevy::input::ButtonState;
use bevy::input::keyboard::KeyboardInput;
use bevy::prelude::*;
use leafwing_input_manager::prelude::*;

use crate::AppSystems;
use crate::camera::PointerCapture;
use crate::sandbox::SandboxSim;

#[derive(Reflect, Actionlike, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputAction {
    LeftClick,
    ReleaseCapture,
}

pub(super) fn plugin(app: &mut App) {
    app.add_plugins(InputManagerPlugin::<InputAction>::default());

    app.register_type::<InputAction>();

    let mut input_map = InputMap::<InputAction>::default();
    input_map.insert(InputAction::LeftClick, MouseButton::Left);
    input_map.insert(InputAction::ReleaseCapture, KeyCode::Escape);
    app.insert_resource(input_map);
    app.insert_resource(ActionState::<InputAction>::default());

    app.add_systems(
        Update,
        (forward_keys, forward_clicks).in_set(AppSystems::Input),
    );
}

/// Forwards raw key transitions to the sandbox.
///
/// Bevy's `KeyCode` debug names follow the W3C `code` values ("KeyW", "ArrowUp", "Space"),
/// which is what the sandbox binds against.
fn forward_keys(mut keys: MessageReader<KeyboardInput>, sim: Option<ResMut<SandboxSim>>) {
    let Some(mut sim) = sim else {
        keys.clear();
        return;
    };
    for key in keys.read() {
        if key.repeat {
            continue;
        }
        let code = format!("{:?}", key.key_code);
        match key.state {
            ButtonState::Pressed => sim.0.key_down(&code),
            ButtonState::Released => sim.0.key_up(&code),
        }
    }
}

/// A click only reaches the sandbox while the pointer is already captured; the click that
/// captures it is consumed by the capture system.
fn forward_clicks(
    actions: Res<ActionState<InputAction>>,
    capture: Res<PointerCapture>,
    sim: Option<ResMut<SandboxSim>>,
) {
    if !capture.captured || !actions.just_pressed(&InputAction::LeftClick) {
        return;
    }
    if let Some(mut sim) = sim {
        sim.0.queue_click();
    }
}
