use glam::Vec2;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::api::types::{EntityId, Viewport};
use crate::components::entity::Entity;
use crate::core::physics::{BodyDesc, ColliderMaterial, PhysicsBody, PhysicsWorld};
use crate::core::scene::Scene;
use crate::input::pointer::PointerConstraint;
use crate::input::queue::{InputEvent, InputQueue};

/// Engine settings an effect asks for. Read once when the runner is built.
#[derive(Debug, Clone)]
pub struct EffectConfig {
    /// Fixed physics timestep in seconds (default: 1/60).
    pub fixed_dt: f32,
    /// Gravity in pixels per second squared, y down (default: 900 down).
    pub gravity: Vec2,
    /// Maximum number of rectangles drawn per frame (default: 1024).
    pub max_instances: usize,
    /// Cap on fixed steps per displayed frame (default: 10).
    pub max_steps_per_frame: u32,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            gravity: Vec2::new(0.0, 900.0),
            max_instances: 1024,
            max_steps_per_frame: 10,
        }
    }
}

/// The contract every effect fulfills. One instance per mounted container.
pub trait Effect {
    /// Engine configuration. Called once before the first `init`.
    fn config(&self) -> EffectConfig {
        EffectConfig::default()
    }

    /// Populate the world for the context's current viewport.
    /// Only called with a non-empty viewport.
    fn init(&mut self, ctx: &mut EngineContext);

    /// Once per fixed step, before physics runs.
    fn update(&mut self, _ctx: &mut EngineContext, _input: &InputQueue) {}

    /// Once per displayed frame, after the frame was drawn.
    fn after_render(&mut self, _ctx: &mut EngineContext) {}

    /// The context was just cleared; drop anything that refers to it.
    fn reset(&mut self) {}
}

/// Mutable access to the simulation, passed to every `Effect` hook.
pub struct EngineContext {
    pub scene: Scene,
    pub physics: PhysicsWorld,
    pub pointer: PointerConstraint,
    viewport: Viewport,
    rng: SmallRng,
    next_id: u32,
}

impl EngineContext {
    pub fn new(config: &EffectConfig, viewport: Viewport, seed: u64) -> Self {
        let mut physics = PhysicsWorld::new(config.gravity);
        physics.set_dt(config.fixed_dt);
        Self {
            scene: Scene::new(),
            physics,
            pointer: PointerConstraint::default(),
            viewport,
            rng: SmallRng::seed_from_u64(seed),
            next_id: 1,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// The effect's random source. Seeded once per context so a given seed
    /// replays the same field.
    pub fn rng(&mut self) -> &mut SmallRng {
        &mut self.rng
    }

    /// Generate the next unique entity ID.
    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Spawn an entity with a physics body. The entity takes its position
    /// and rotation from the BodyDesc. The returned handles reach the body
    /// without a scene lookup.
    pub fn spawn_with_body(
        &mut self,
        entity: Entity,
        desc: BodyDesc,
        material: ColliderMaterial,
    ) -> PhysicsBody {
        let body = self.physics.create_body(entity.id, &desc, material);
        let entity = entity
            .with_pos(desc.position)
            .with_rotation(desc.rotation)
            .with_body(body);
        self.scene.spawn(entity);
        body
    }

    /// Remove every entity, every body and the pointer grasp.
    /// Gravity, timestep and the random stream carry on.
    pub fn clear(&mut self) {
        let removed = self.scene.len();
        self.scene.clear();
        self.physics.clear();
        self.pointer.release();
        log::debug!("context cleared ({} entities)", removed);
    }

    /// Move an entity (and its body) to `pos` without simulating the path.
    pub fn teleport(&mut self, id: EntityId, pos: Vec2) {
        if let Some(entity) = self.scene.get_mut(id) {
            entity.pos = pos;
            if let Some(body) = &entity.body {
                self.physics.set_position(body, pos);
            }
        }
    }

    /// Feed a pointer event to the pointer constraint.
    pub fn handle_pointer(&mut self, event: &InputEvent) {
        let (x, y) = event.position();
        let point = Vec2::new(x, y);
        match event {
            InputEvent::PointerDown { .. } => {
                self.pointer.press(&mut self.physics, point);
            }
            InputEvent::PointerMove { .. } => self.pointer.drag(point),
            InputEvent::PointerUp { .. } => {
                self.pointer.drag(point);
                self.pointer.release();
            }
        }
    }

    /// Apply the pointer spring, step the simulation and copy body
    /// transforms back onto their entities.
    pub fn step_physics(&mut self) {
        let dt = self.physics.dt();
        self.pointer.solve(&mut self.physics, dt);
        self.physics.step();

        for entity in self.scene.iter_mut() {
            if let Some(body) = &entity.body {
                let (pos, rot) = self.physics.body_position(body);
                entity.pos = pos;
                entity.rotation = rot;
            }
        }
    }
}
