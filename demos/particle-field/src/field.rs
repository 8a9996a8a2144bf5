use confetti_engine::{
    BodyDesc, ColliderDesc, ColliderMaterial, Effect, EffectConfig, EngineContext, Entity,
    EntityId, Fill, PhysicsBody, PointerConstraint,
};
use confetti_web::MountableEffect;
use glam::Vec2;

use crate::config::{ConfigError, FieldConfig, FieldPreset, TICKS_PER_SECOND};
use crate::metrics::FieldMetrics;
use crate::sampling::{sample_recycle, sample_spawn};

/// Surface friction between squares; air friction does most of the slowing.
const CONTACT_FRICTION: f32 = 0.1;
/// Only used when the config leaves `mass` unset.
const DENSITY: f32 = 0.001;
const MAX_INSTANCES: usize = 4096;

/// One falling square. `position` and `velocity` are refreshed on every
/// recycle pass, in px and px/s.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub id: EntityId,
    pub body: PhysicsBody,
    pub size: f32,
    pub color: Fill,
    pub air_friction: f32,
    pub restitution: f32,
    pub mass: Option<f32>,
    pub position: Vec2,
    pub velocity: Vec2,
}

/// Colored squares raining through the container, recycled to the top once
/// they drop past the bottom edge.
pub struct ParticleField {
    config: FieldConfig,
    particles: Vec<Particle>,
    metrics: FieldMetrics,
}

impl ParticleField {
    pub fn new(config: FieldConfig) -> Self {
        Self {
            config,
            particles: Vec::new(),
            metrics: FieldMetrics::default(),
        }
    }

    pub fn with_preset(preset: FieldPreset) -> Self {
        Self::new(preset.config())
    }

    pub fn field_config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Count and size range of the last build.
    pub fn metrics(&self) -> FieldMetrics {
        self.metrics
    }

    fn spawn_particle(&mut self, ctx: &mut EngineContext) {
        let viewport = ctx.viewport();
        let tick_rate = 1.0 / ctx.physics.dt();

        let placement = sample_spawn(ctx.rng(), viewport, &self.config);
        let size = self.metrics.size.sample(ctx.rng());
        let color = self.config.color.sample(ctx.rng());
        let air_friction = self.config.air_friction.sample(ctx.rng());
        let velocity = placement.velocity * tick_rate;

        let id = ctx.next_id();
        let body = ctx.spawn_with_body(
            Entity::new(id).with_scale(Vec2::splat(size)).with_fill(color),
            BodyDesc::dynamic(ColliderDesc::square(size))
                .with_position(placement.position)
                .with_velocity(velocity)
                .with_linear_damping(air_friction_to_damping(air_friction, tick_rate)),
            ColliderMaterial {
                restitution: self.config.bounce,
                friction: CONTACT_FRICTION,
                density: DENSITY,
                mass: self.config.mass,
            },
        );

        self.particles.push(Particle {
            id,
            body,
            size,
            color,
            air_friction,
            restitution: self.config.bounce,
            mass: self.config.mass,
            position: placement.position,
            velocity,
        });
    }

    /// Send every particle below the bottom edge back into the recycle
    /// region with a fresh downward speed. Returns how many moved.
    fn recycle(&mut self, ctx: &mut EngineContext) -> usize {
        let viewport = ctx.viewport();
        let tick_rate = 1.0 / ctx.physics.dt();
        let mut recycled = 0;

        for particle in &mut self.particles {
            let (position, _) = ctx.physics.body_position(&particle.body);
            particle.position = position;
            particle.velocity = ctx.physics.velocity(&particle.body);

            if position.y > viewport.height {
                let placement = sample_recycle(ctx.rng(), viewport, &self.config);
                let velocity = placement.velocity * tick_rate;
                ctx.physics.set_velocity(&particle.body, velocity);
                ctx.teleport(particle.id, placement.position);
                particle.position = placement.position;
                particle.velocity = velocity;
                recycled += 1;
            }
        }

        if recycled > 0 {
            log::trace!("recycled {} particles", recycled);
        }
        recycled
    }
}

impl Default for ParticleField {
    fn default() -> Self {
        Self::new(FieldConfig::default())
    }
}

/// Per-tick velocity loss `f` as the per-second damping rapier applies,
/// `v / (1 + dt·d)` per step.
fn air_friction_to_damping(air_friction: f32, tick_rate: f32) -> f32 {
    tick_rate * air_friction / (1.0 - air_friction)
}

impl Effect for ParticleField {
    fn config(&self) -> EffectConfig {
        EffectConfig {
            fixed_dt: 1.0 / TICKS_PER_SECOND,
            gravity: Vec2::new(0.0, self.config.gravity),
            max_instances: MAX_INSTANCES,
            ..EffectConfig::default()
        }
    }

    fn init(&mut self, ctx: &mut EngineContext) {
        self.particles.clear();
        self.metrics = FieldMetrics::derive(ctx.viewport(), &self.config);
        ctx.pointer = PointerConstraint::new(self.config.pointer_stiffness)
            .with_visible(self.config.pointer_visible);

        self.particles.reserve(self.metrics.count);
        for _ in 0..self.metrics.count {
            self.spawn_particle(ctx);
        }
        log::info!(
            "particle field: {} squares, {:.1}..{:.1}px",
            self.metrics.count,
            self.metrics.size.min,
            self.metrics.size.max
        );
    }

    fn after_render(&mut self, ctx: &mut EngineContext) {
        self.recycle(ctx);
    }

    fn reset(&mut self) {
        self.particles.clear();
        self.metrics = FieldMetrics::default();
    }
}

impl MountableEffect for ParticleField {
    type Error = ConfigError;

    fn from_config(json: Option<&str>) -> Result<Self, ConfigError> {
        let config = match json {
            Some(json) => FieldConfig::from_json(json)?,
            None => FieldConfig::default(),
        };
        Ok(Self::new(config))
    }

    fn seed(&self) -> Option<u64> {
        self.config.seed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confetti_engine::{InputEvent, Viewport};
    use confetti_web::EffectRunner;

    fn entity_pos(ctx: &EngineContext, id: EntityId) -> Option<Vec2> {
        ctx.scene.get(id).map(|e| e.pos)
    }

    fn built(field: &mut ParticleField, width: f32, height: f32) -> EngineContext {
        let mut ctx = EngineContext::new(&field.config(), Viewport::new(width, height), 42);
        field.init(&mut ctx);
        ctx
    }

    #[test]
    fn cascade_populates_800x600() {
        let mut field = ParticleField::default();
        let ctx = built(&mut field, 800.0, 600.0);

        assert_eq!(field.particles().len(), 124);
        assert_eq!(ctx.scene.len(), 124);
        assert_eq!(ctx.physics.body_count(), 124);
        let size = field.metrics().size;
        for p in field.particles() {
            assert!(p.position.y >= -600.0 && p.position.y <= 120.0, "{:?}", p.position);
            assert!(p.position.x >= -800.0 && p.position.x <= 800.0, "{:?}", p.position);
            assert!(size.contains(p.size));
            assert!(p.air_friction >= 0.003 && p.air_friction < 0.1);
            let per_tick = p.velocity.y / TICKS_PER_SECOND;
            assert!(per_tick >= 1.0 - 1e-3 && per_tick <= 10.0 + 1e-3, "{}", per_tick);
            assert_eq!(p.velocity.x, 0.0);
            assert_eq!(p.restitution, 1.1);
            assert_eq!(p.mass, Some(0.01));
        }
    }

    #[test]
    fn bodies_use_the_fixed_mass() {
        let mut field = ParticleField::default();
        let ctx = built(&mut field, 800.0, 600.0);
        let p = &field.particles()[0];
        let body = ctx.scene.get(p.id).and_then(|e| e.body).unwrap();
        assert!((ctx.physics.mass(&body) - 0.01).abs() < 1e-5);
    }

    #[test]
    fn pointer_is_soft_and_hidden() {
        let mut field = ParticleField::default();
        let ctx = built(&mut field, 800.0, 600.0);
        assert_eq!(ctx.pointer.stiffness, 0.01);
        assert!(!ctx.pointer.visible);
    }

    #[test]
    fn particle_below_bottom_is_recycled() {
        let mut field = ParticleField::default();
        let mut ctx = built(&mut field, 800.0, 600.0);
        let Particle { id, body, .. } = field.particles()[0].clone();
        ctx.teleport(id, Vec2::new(100.0, 601.0));

        field.after_render(&mut ctx);

        let pos = entity_pos(&ctx, id).unwrap();
        assert!(pos.y >= -600.0 && pos.y <= 120.0, "{:?}", pos);
        assert!(pos.x >= -800.0 && pos.x <= 800.0, "{:?}", pos);
        let velocity = ctx.physics.velocity(&body);
        let per_tick = velocity.y / TICKS_PER_SECOND;
        assert!(per_tick >= 1.0 - 1e-3 && per_tick <= 30.0 + 1e-3, "{}", per_tick);
        assert_eq!(velocity.x, 0.0);
        assert_eq!(field.particles()[0].position, pos);
    }

    #[test]
    fn recycle_reads_the_body_directly() {
        let mut field = ParticleField::default();
        let mut ctx = built(&mut field, 800.0, 600.0);
        let p = field.particles()[5].clone();
        assert_eq!(ctx.scene.get(p.id).and_then(|e| e.body), Some(p.body));

        // Only the body moves; the scene entity keeps its spawn position
        // until the next step.
        ctx.physics.set_position(&p.body, Vec2::new(10.0, 650.0));
        assert_eq!(field.recycle(&mut ctx), 1);

        let (pos, _) = ctx.physics.body_position(&p.body);
        assert!(pos.y <= 120.0, "{:?}", pos);
        assert_eq!(entity_pos(&ctx, p.id), Some(pos));
        assert_eq!(field.particles()[5].position, pos);
    }

    #[test]
    fn particle_on_screen_is_left_alone() {
        let mut field = ParticleField::default();
        let mut ctx = built(&mut field, 800.0, 600.0);
        let Particle { id, body, .. } = field.particles()[0].clone();
        ctx.teleport(id, Vec2::new(100.0, 599.0));
        let before = ctx.physics.velocity(&body);

        assert_eq!(field.recycle(&mut ctx), 0);
        assert_eq!(entity_pos(&ctx, id), Some(Vec2::new(100.0, 599.0)));
        assert_eq!(ctx.physics.velocity(&body), before);
    }

    #[test]
    fn recycled_particles_stay_on_screen_for_a_frame() {
        let mut field = ParticleField::default();
        let mut ctx = built(&mut field, 800.0, 600.0);
        let ids: Vec<EntityId> = field.particles().iter().map(|p| p.id).collect();
        for id in &ids {
            ctx.teleport(*id, Vec2::new(0.0, 700.0));
        }
        assert_eq!(field.recycle(&mut ctx), ids.len());
        assert_eq!(field.recycle(&mut ctx), 0);
    }

    #[test]
    fn drift_recycles_into_the_centered_band() {
        let mut field = ParticleField::with_preset(FieldPreset::Drift);
        let mut ctx = built(&mut field, 800.0, 600.0);
        assert_eq!(field.particles().len(), 75);
        for p in field.particles() {
            assert!(p.position.y >= -600.0 && p.position.y <= 200.0 + 1e-3);
        }

        let ids: Vec<EntityId> = field.particles().iter().map(|p| p.id).collect();
        for id in &ids {
            ctx.teleport(*id, Vec2::new(0.0, 650.0));
        }
        field.after_render(&mut ctx);
        for p in field.particles() {
            assert!(p.position.x >= 160.0 - 1e-3 && p.position.x <= 640.0 + 1e-3);
            assert!(p.position.y >= -600.0 && p.position.y <= -120.0 + 1e-3);
        }
    }

    #[test]
    fn same_seed_same_field() {
        let mut a = ParticleField::default();
        let mut b = ParticleField::default();
        built(&mut a, 640.0, 480.0);
        built(&mut b, 640.0, 480.0);
        assert_eq!(a.particles(), b.particles());
    }

    #[test]
    fn empty_container_gets_nothing() {
        let mut runner = EffectRunner::new(ParticleField::default(), Viewport::new(0.0, 600.0), 3);
        assert!(!runner.init());
        runner.tick(1.0 / 60.0);
        runner.after_render();
        assert!(runner.effect().particles().is_empty());
        assert_eq!(runner.context().scene.len(), 0);
        assert_eq!(runner.builds(), 0);
    }

    #[test]
    fn resize_rebuilds_for_the_new_size() {
        let mut runner = EffectRunner::new(ParticleField::default(), Viewport::new(800.0, 600.0), 3);
        assert!(runner.init());
        runner.tick(1.0 / 60.0);
        runner.after_render();
        let old: Vec<EntityId> = runner.effect().particles().iter().map(|p| p.id).collect();
        assert_eq!(old.len(), 124);

        assert!(runner.resize(Viewport::new(400.0, 300.0)));

        let field = runner.effect();
        assert_eq!(field.particles().len(), 106);
        assert_eq!(runner.context().scene.len(), 106);
        assert_eq!(runner.context().physics.body_count(), 106);
        assert!(field.particles().iter().all(|p| !old.contains(&p.id)));
        assert!(runner.is_initialized());
        assert_eq!(runner.builds(), 2);
    }

    #[test]
    fn resize_to_nothing_then_back() {
        let mut runner = EffectRunner::new(ParticleField::default(), Viewport::new(800.0, 600.0), 3);
        runner.init();
        assert!(!runner.resize(Viewport::new(800.0, 0.0)));
        assert!(runner.effect().particles().is_empty());
        assert_eq!(runner.context().physics.body_count(), 0);

        assert!(runner.resize(Viewport::new(800.0, 600.0)));
        assert_eq!(runner.effect().particles().len(), 124);
    }

    #[test]
    fn pointer_grabs_a_particle() {
        let mut field = ParticleField::default();
        let mut ctx = built(&mut field, 800.0, 600.0);
        let p = field.particles()[0].clone();
        let at = entity_pos(&ctx, p.id).unwrap();

        ctx.handle_pointer(&InputEvent::PointerDown { x: at.x, y: at.y });
        assert!(ctx.pointer.is_dragging());
        ctx.handle_pointer(&InputEvent::PointerUp { x: at.x, y: at.y });
        assert!(!ctx.pointer.is_dragging());
    }

    #[test]
    fn mounts_from_json() {
        let field = ParticleField::from_config(Some(r#"{ "preset": "drift", "seed": 9 }"#)).unwrap();
        assert_eq!(field.seed(), Some(9));
        assert_eq!(field.field_config().base_count, 60.0);

        assert!(ParticleField::from_config(Some("{")).is_err());
        assert_eq!(ParticleField::from_config(None).unwrap().seed(), None);
    }
}
