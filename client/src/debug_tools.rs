//! Debug/performance tooling for native dev builds.
//!
//! Besides Bevy's stock diagnostics this records the live prop count and the physics body
//! and collider counts, so props falling out of the world (and whether their physics handles
//! were released) show up next to frame time and entity count.

use bevy::diagnostic::{
    Diagnostic, DiagnosticPath, Diagnostics, EntityCountDiagnosticsPlugin,
    FrameTimeDiagnosticsPlugin, RegisterDiagnostic, SystemInformationDiagnosticsPlugin,
};
use bevy::prelude::*;
use bevy::render::diagnostic::RenderDiagnosticsPlugin;
use iyes_perf_ui::prelude::*;

use crate::sandbox::SandboxSim;

const LIVE_PROPS: DiagnosticPath = DiagnosticPath::const_new("sandbox/live_props");
const PHYSICS_BODIES: DiagnosticPath = DiagnosticPath::const_new("sandbox/physics_bodies");
const PHYSICS_COLLIDERS: DiagnosticPath = DiagnosticPath::const_new("sandbox/physics_colliders");

pub(super) fn plugin(app: &mut App) {
    app.add_plugins((
        FrameTimeDiagnosticsPlugin::default(),
        EntityCountDiagnosticsPlugin::default(),
        SystemInformationDiagnosticsPlugin::default(),
        RenderDiagnosticsPlugin,
        PerfUiPlugin,
    ));
    for path in [LIVE_PROPS, PHYSICS_BODIES, PHYSICS_COLLIDERS] {
        app.register_diagnostic(Diagnostic::new(path).with_max_history_length(1));
    }

    app.add_systems(Startup, spawn_perf_ui);
    app.add_systems(
        Update,
        measure_sandbox.run_if(resource_exists::<SandboxSim>),
    );
}

fn spawn_perf_ui(mut commands: Commands) {
    commands.spawn(PerfUiAllEntries::default());
}

fn measure_sandbox(mut diagnostics: Diagnostics, sim: Res<SandboxSim>) {
    let world = sim.0.world();
    diagnostics.add_measurement(&LIVE_PROPS, || sim.0.props().len() as f64);
    diagnostics.add_measurement(&PHYSICS_BODIES, || world.body_count() as f64);
    diagnostics.add_measurement(&PHYSICS_COLLIDERS, || world.collider_count() as f64);
}
