pub mod api;
pub mod core;
pub mod components;
pub mod systems;
pub mod renderer;
pub mod input;

// Re-export key types at crate root for convenience
pub use api::effect::{Effect, EffectConfig, EngineContext};
pub use api::types::{EntityId, Viewport};
pub use components::entity::Entity;
pub use components::fill::Fill;
pub use core::clock::StepClock;
pub use core::physics::{
    BodyDesc, ColliderDesc, ColliderMaterial, PhysicsBody, PhysicsWorld,
};
pub use core::scene::Scene;
pub use input::pointer::{Grasp, PointerConstraint, DEFAULT_POINTER_STIFFNESS};
pub use input::queue::{InputEvent, InputQueue};
pub use renderer::instance::{RectInstance, RenderBuffer};
pub use systems::render::build_render_buffer;
