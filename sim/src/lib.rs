pub mod character;
pub mod clock;
pub mod constants;
pub mod input;
pub mod jump;
pub mod picking;
pub mod props;
pub mod scene;
pub mod settings;
pub mod simulation;
pub mod world;

#[cfg(test)]
mod test_support;

pub use character::{CharacterController, CharacterState, planar_basis, planar_intent};
pub use clock::SimClock;
pub use constants::{
    JUMP_COOLDOWN, JUMP_DURATION, KILL_PLANE_Y, PLANAR_SPEED_MPS, PROP_CLICK_IMPULSE, SPAWN_POINT,
};
pub use input::{InputSnapshot, InputState, MoveAction, action_for_code};
pub use jump::{JumpArc, JumpState};
pub use picking::{Interaction, PickTarget};
pub use props::{Prop, PropRegistry, PropSpawn};
pub use scene::{Color, Scene, Viewpoint, VisualDesc, VisualId, VisualShape};
pub use settings::{KccSettings, SimSettings};
pub use simulation::{Simulation, TickReport};
pub use world::{ColliderShapeDef, PhysicsWorld, RayHit, ResolvedMove, WorldStaticDef};
