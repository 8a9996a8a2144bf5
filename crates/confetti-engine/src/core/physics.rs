use glam::Vec2;
use rapier2d::prelude::*;

use crate::api::types::EntityId;

// ---------------------------------------------------------------------------
// Conversion helpers (private): glam ↔ nalgebra
// ---------------------------------------------------------------------------

fn vec2_to_na(v: Vec2) -> nalgebra::Vector2<f32> {
    nalgebra::Vector2::new(v.x, v.y)
}

fn vec2_to_point(v: Vec2) -> nalgebra::Point2<f32> {
    nalgebra::Point2::new(v.x, v.y)
}

fn na_to_vec2(v: &nalgebra::Vector2<f32>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

fn na_iso_to_pos_rot(iso: &nalgebra::Isometry2<f32>) -> (Vec2, f32) {
    let pos = Vec2::new(iso.translation.x, iso.translation.y);
    let rot = iso.rotation.angle();
    (pos, rot)
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Axis-aligned box collider, described by its half extents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColliderDesc {
    pub half_width: f32,
    pub half_height: f32,
}

impl ColliderDesc {
    pub fn cuboid(half_width: f32, half_height: f32) -> Self {
        Self { half_width, half_height }
    }

    /// A square with the given side length.
    pub fn square(size: f32) -> Self {
        Self::cuboid(size / 2.0, size / 2.0)
    }

    fn build_collider(&self) -> ColliderBuilder {
        ColliderBuilder::cuboid(self.half_width, self.half_height)
    }
}

/// Physical material properties for a collider.
///
/// When `mass` is set it overrides the density-derived mass, so bodies of
/// different sizes share the same inertia against the pointer spring.
#[derive(Debug, Clone, Copy)]
pub struct ColliderMaterial {
    pub restitution: f32,
    pub friction: f32,
    pub density: f32,
    pub mass: Option<f32>,
}

impl Default for ColliderMaterial {
    fn default() -> Self {
        Self {
            restitution: 0.3,
            friction: 0.5,
            density: 1.0,
            mass: None,
        }
    }
}

/// Builder for describing a dynamic rigid body before creation.
#[derive(Debug, Clone)]
pub struct BodyDesc {
    pub position: Vec2,
    pub rotation: f32,
    pub velocity: Vec2,
    pub collider: ColliderDesc,
    pub linear_damping: f32,
}

impl BodyDesc {
    /// Create a dynamic body description with the given collider shape.
    pub fn dynamic(collider: ColliderDesc) -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            velocity: Vec2::ZERO,
            collider,
            linear_damping: 0.0,
        }
    }

    pub fn with_position(mut self, pos: Vec2) -> Self {
        self.position = pos;
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.velocity = vel;
        self
    }

    /// Set the linear damping (velocity decay per second). This is what
    /// the particle "air friction" maps onto.
    pub fn with_linear_damping(mut self, damping: f32) -> Self {
        self.linear_damping = damping;
        self
    }
}

/// Handle pair stored on an Entity, referencing Rapier internals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicsBody {
    pub body_handle: RigidBodyHandle,
    pub collider_handle: ColliderHandle,
}

// ---------------------------------------------------------------------------
// PhysicsWorld
// ---------------------------------------------------------------------------

/// Wraps all Rapier2D boilerplate into a single struct.
/// One world per mounted effect; `clear` empties it without touching gravity
/// or the integration parameters.
pub struct PhysicsWorld {
    gravity: nalgebra::Vector2<f32>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
}

impl PhysicsWorld {
    /// Create a new physics world with the given gravity vector.
    /// Y points down, so a falling field uses positive Y gravity.
    pub fn new(gravity: Vec2) -> Self {
        Self {
            gravity: vec2_to_na(gravity),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    /// Set the integration timestep.
    pub fn set_dt(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
    }

    pub fn dt(&self) -> f32 {
        self.integration_parameters.dt
    }

    /// Create a rigid body + collider and return handles.
    /// The EntityId is stored in the body's `user_data` for point queries.
    pub fn create_body(
        &mut self,
        entity_id: EntityId,
        desc: &BodyDesc,
        material: ColliderMaterial,
    ) -> PhysicsBody {
        let rb = RigidBodyBuilder::dynamic()
            .translation(vec2_to_na(desc.position))
            .rotation(desc.rotation)
            .linvel(vec2_to_na(desc.velocity))
            .linear_damping(desc.linear_damping)
            .user_data(entity_id.0 as u128)
            .build();

        let body_handle = self.bodies.insert(rb);

        let mut collider = desc
            .collider
            .build_collider()
            .restitution(material.restitution)
            .restitution_combine_rule(CoefficientCombineRule::Max)
            .friction(material.friction);
        collider = match material.mass {
            Some(mass) => collider.mass(mass),
            None => collider.density(material.density),
        };

        let collider_handle =
            self.colliders
                .insert_with_parent(collider.build(), body_handle, &mut self.bodies);

        PhysicsBody {
            body_handle,
            collider_handle,
        }
    }

    /// Drop every body, collider and cached contact. Gravity and the
    /// timestep survive.
    pub fn clear(&mut self) {
        self.island_manager = IslandManager::new();
        self.broad_phase = DefaultBroadPhase::new();
        self.narrow_phase = NarrowPhase::new();
        self.bodies = RigidBodySet::new();
        self.colliders = ColliderSet::new();
        self.impulse_joints = ImpulseJointSet::new();
        self.multibody_joints = MultibodyJointSet::new();
        self.ccd_solver = CCDSolver::new();
        self.query_pipeline = QueryPipeline::new();
    }

    /// Advance the simulation by one timestep.
    pub fn step(&mut self) {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Apply an instantaneous impulse at a world-space point.
    pub fn apply_impulse_at(&mut self, body: &PhysicsBody, impulse: Vec2, point: Vec2) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.apply_impulse_at_point(vec2_to_na(impulse), vec2_to_point(point), true);
        }
    }

    /// Set the linear velocity of a body directly.
    pub fn set_velocity(&mut self, body: &PhysicsBody, vel: Vec2) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.set_linvel(vec2_to_na(vel), true);
        }
    }

    /// Get the current linear velocity of a body.
    pub fn velocity(&self, body: &PhysicsBody) -> Vec2 {
        self.bodies
            .get(body.body_handle)
            .map(|rb| na_to_vec2(rb.linvel()))
            .unwrap_or(Vec2::ZERO)
    }

    /// Teleport a body. Rotation and velocities are left as they are.
    pub fn set_position(&mut self, body: &PhysicsBody, pos: Vec2) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.set_translation(vec2_to_na(pos), true);
        }
    }

    /// Get the current position and rotation of a body.
    pub fn body_position(&self, body: &PhysicsBody) -> (Vec2, f32) {
        self.bodies
            .get(body.body_handle)
            .map(|rb| na_iso_to_pos_rot(rb.position()))
            .unwrap_or((Vec2::ZERO, 0.0))
    }

    /// Mass of a body, zero if it no longer exists.
    pub fn mass(&self, body: &PhysicsBody) -> f32 {
        self.bodies
            .get(body.body_handle)
            .map(|rb| rb.mass())
            .unwrap_or(0.0)
    }

    /// Convert a world-space point into the body's local frame.
    pub fn world_point_to_local(&self, body: &PhysicsBody, point: Vec2) -> Vec2 {
        self.bodies
            .get(body.body_handle)
            .map(|rb| {
                let local = rb.position().inverse_transform_point(&vec2_to_point(point));
                Vec2::new(local.x, local.y)
            })
            .unwrap_or(Vec2::ZERO)
    }

    /// Convert a point in the body's local frame into world space.
    pub fn local_point_to_world(&self, body: &PhysicsBody, local: Vec2) -> Vec2 {
        self.bodies
            .get(body.body_handle)
            .map(|rb| {
                let world = rb.position() * vec2_to_point(local);
                Vec2::new(world.x, world.y)
            })
            .unwrap_or(Vec2::ZERO)
    }

    /// Find a dynamic body whose collider contains `point`.
    /// Returns the owning entity and its handles.
    pub fn body_at_point(&mut self, point: Vec2) -> Option<(EntityId, PhysicsBody)> {
        self.query_pipeline.update(&self.colliders);

        let mut found = None;
        let filter = QueryFilter::exclude_fixed();
        self.query_pipeline.intersections_with_point(
            &self.bodies,
            &self.colliders,
            &vec2_to_point(point),
            filter,
            |collider_handle| {
                found = Some(collider_handle);
                false
            },
        );

        let collider_handle = found?;
        let body_handle = self.colliders.get(collider_handle)?.parent()?;
        let rb = self.bodies.get(body_handle)?;
        Some((
            EntityId(rb.user_data as u32),
            PhysicsBody {
                body_handle,
                collider_handle,
            },
        ))
    }

    /// Number of rigid bodies in the simulation.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn square(world: &mut PhysicsWorld, id: u32, pos: Vec2) -> PhysicsBody {
        world.create_body(
            EntityId(id),
            &BodyDesc::dynamic(ColliderDesc::square(20.0)).with_position(pos),
            ColliderMaterial::default(),
        )
    }

    #[test]
    fn gravity_pulls_bodies_down() {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, 900.0));
        world.set_dt(1.0 / 60.0);
        let body = square(&mut world, 1, Vec2::ZERO);

        for _ in 0..10 {
            world.step();
        }

        let (pos, _) = world.body_position(&body);
        assert!(pos.y > 0.0, "body should fall (y-down): y={}", pos.y);
    }

    #[test]
    fn linear_damping_slows_the_fall() {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, 900.0));
        world.set_dt(1.0 / 60.0);
        let free = square(&mut world, 1, Vec2::new(0.0, 0.0));
        let dragged = world.create_body(
            EntityId(2),
            &BodyDesc::dynamic(ColliderDesc::square(20.0))
                .with_position(Vec2::new(500.0, 0.0))
                .with_linear_damping(6.0),
            ColliderMaterial::default(),
        );

        for _ in 0..30 {
            world.step();
        }

        assert!(world.velocity(&dragged).y < world.velocity(&free).y);
    }

    #[test]
    fn set_velocity_and_position() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let body = square(&mut world, 1, Vec2::ZERO);

        world.set_velocity(&body, Vec2::new(0.0, 120.0));
        world.set_position(&body, Vec2::new(-40.0, -300.0));

        let vel = world.velocity(&body);
        let (pos, _) = world.body_position(&body);
        assert!((vel.y - 120.0).abs() < 0.001);
        assert!((pos.x + 40.0).abs() < 0.001);
        assert!((pos.y + 300.0).abs() < 0.001);
    }

    #[test]
    fn explicit_mass_overrides_density() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let body = world.create_body(
            EntityId(1),
            &BodyDesc::dynamic(ColliderDesc::square(80.0)),
            ColliderMaterial {
                mass: Some(0.01),
                ..ColliderMaterial::default()
            },
        );
        assert!((world.mass(&body) - 0.01).abs() < 1e-6);
    }

    #[test]
    fn clear_removes_everything_but_keeps_gravity() {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, 900.0));
        for i in 0..5 {
            square(&mut world, i, Vec2::new(i as f32 * 50.0, 0.0));
        }
        world.step();
        world.clear();
        assert_eq!(world.body_count(), 0);

        // The world is still usable after a clear.
        let body = square(&mut world, 9, Vec2::ZERO);
        world.step();
        assert!(world.body_position(&body).0.y > 0.0);
    }

    #[test]
    fn point_query_finds_the_body_underneath() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        square(&mut world, 7, Vec2::new(100.0, 100.0));

        let hit = world.body_at_point(Vec2::new(105.0, 95.0));
        assert_eq!(hit.map(|(id, _)| id), Some(EntityId(7)));
        assert!(world.body_at_point(Vec2::new(300.0, 300.0)).is_none());
    }

    #[test]
    fn point_query_tracks_falling_bodies() {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, 900.0));
        world.set_dt(1.0 / 60.0);
        let body = square(&mut world, 4, Vec2::new(100.0, 100.0));
        for _ in 0..40 {
            world.step();
        }

        let (pos, _) = world.body_position(&body);
        assert!(pos.y > 200.0, "y={}", pos.y);
        assert!(world.body_at_point(Vec2::new(100.0, 100.0)).is_none());
        let (id, hit) = world.body_at_point(pos + Vec2::new(3.0, -3.0)).unwrap();
        assert_eq!(id, EntityId(4));
        assert_eq!(hit, body);
    }

    #[test]
    fn local_and_world_points_round_trip() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let body = world.create_body(
            EntityId(1),
            &BodyDesc::dynamic(ColliderDesc::square(20.0))
                .with_position(Vec2::new(10.0, 20.0))
                .with_rotation(0.7),
            ColliderMaterial::default(),
        );

        let local = world.world_point_to_local(&body, Vec2::new(14.0, 22.0));
        let back = world.local_point_to_world(&body, local);
        assert!((back - Vec2::new(14.0, 22.0)).length() < 1e-3);
    }

    #[test]
    fn off_center_impulse_spins_the_body() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        world.set_dt(1.0 / 60.0);
        let body = square(&mut world, 1, Vec2::ZERO);

        world.apply_impulse_at(&body, Vec2::new(0.0, 50.0), Vec2::new(10.0, 0.0));
        for _ in 0..10 {
            world.step();
        }

        let (_, rot) = world.body_position(&body);
        assert!(rot.abs() > 0.0, "expected rotation, got {}", rot);
        assert!(world.velocity(&body).y > 0.0);
    }
}
