use std::time::Duration;

/// Planar (XZ) walking speed in world units per second.
pub const PLANAR_SPEED_MPS: f32 = 16.0;

/// Constant downward speed applied to the character while not rising (units/second).
///
/// This is a flat descent, not an integrated acceleration: there is no fall momentum.
pub const CHARACTER_GRAVITY_MPS: f32 = 9.81;

/// Upward speed applied at the very start of a jump (units/second).
///
/// The force decays linearly to zero over [`JUMP_DURATION`].
pub const JUMP_INITIAL_FORCE: f32 = 30.0;

/// How long a jump keeps pushing the character up.
pub const JUMP_DURATION: Duration = Duration::from_millis(350);

/// Delay after a jump ends before another one may start.
pub const JUMP_COOLDOWN: Duration = Duration::from_millis(200);

/// Anything below this height is out of bounds: props are culled, the character respawns.
pub const KILL_PLANE_Y: f32 = -25.0;

/// Where the character is placed at startup and after falling out of the world.
pub const SPAWN_POINT: [f32; 3] = [0.0, 25.0, 0.0];

/// Player capsule radius (units).
pub const CAPSULE_RADIUS: f32 = 1.0;

/// Player capsule half height, excluding the hemispherical caps (units).
pub const CAPSULE_HALF_HEIGHT: f32 = 1.5;

/// Camera height above the capsule center.
pub const EYE_HEIGHT: f32 = 1.5;

/// Gravity used by the rigid-body simulation of props (units/second^2).
pub const WORLD_GRAVITY: [f32; 3] = [0.0, -9.81, 0.0];

/// Baseplate half extents. The baseplate is centered at the origin.
pub const GROUND_HALF_EXTENTS: [f32; 3] = [50.0, 2.5, 50.0];

/// Number of props created by the one-time population pass.
pub const PROP_COUNT: usize = 25;

/// Height at which props are dropped.
pub const PROP_SPAWN_HEIGHT: f32 = 50.0;

/// Props are placed uniformly in `[-PROP_SPAWN_HALF_EXTENT, PROP_SPAWN_HALF_EXTENT)` on X and Z.
pub const PROP_SPAWN_HALF_EXTENT: f32 = 40.0;

/// Half extents of every prop cuboid.
pub const PROP_HALF_EXTENTS: [f32; 3] = [1.0, 1.0, 1.0];

/// Impulse applied to a prop when it is clicked.
pub const PROP_CLICK_IMPULSE: [f32; 3] = [0.0, 5000.0, 0.0];

/// Maximum distance of the picking ray.
pub const PICK_MAX_DISTANCE: f32 = 1000.0;

/// Largest delta a single tick integrates. Longer frames are clamped.
pub const MAX_TICK_DT: f32 = 0.1;

/// Distance below the capsule feet that still counts as ground support.
pub const GROUND_PROBE_DISTANCE: f32 = 0.2;
