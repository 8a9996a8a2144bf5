use glam::Vec2;

use crate::api::types::EntityId;
use crate::core::physics::{PhysicsBody, PhysicsWorld};

/// Stiffness used when nothing else is configured: a very soft spring.
pub const DEFAULT_POINTER_STIFFNESS: f32 = 0.01;

/// The body currently held by the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grasp {
    pub entity: EntityId,
    pub body: PhysicsBody,
    /// Grab point in the body's local frame.
    pub anchor: Vec2,
}

/// Soft coupling between the pointer and whichever body it grabbed.
///
/// Each physics step the grabbed point is pulled `stiffness` of the way to the
/// pointer; the correction is applied as an impulse at the grab point, so an
/// off-center grab also swings the body around.
#[derive(Debug, Clone)]
pub struct PointerConstraint {
    pub stiffness: f32,
    /// Whether the host should draw the pointer-to-body line.
    pub visible: bool,
    position: Vec2,
    grasp: Option<Grasp>,
}

impl PointerConstraint {
    pub fn new(stiffness: f32) -> Self {
        Self {
            stiffness,
            visible: false,
            position: Vec2::ZERO,
            grasp: None,
        }
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn grasp(&self) -> Option<&Grasp> {
        self.grasp.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.grasp.is_some()
    }

    /// Press at `point`: grab the body underneath, if any.
    pub fn press(&mut self, physics: &mut PhysicsWorld, point: Vec2) -> Option<EntityId> {
        self.position = point;
        let (entity, body) = physics.body_at_point(point)?;
        let anchor = physics.world_point_to_local(&body, point);
        self.grasp = Some(Grasp { entity, body, anchor });
        log::debug!("pointer grabbed entity {}", entity.0);
        Some(entity)
    }

    pub fn drag(&mut self, point: Vec2) {
        self.position = point;
    }

    pub fn release(&mut self) {
        if let Some(grasp) = self.grasp.take() {
            log::debug!("pointer released entity {}", grasp.entity.0);
        }
    }

    /// World-space segment from the grab point to the pointer, for drawing.
    pub fn line(&self, physics: &PhysicsWorld) -> Option<(Vec2, Vec2)> {
        let grasp = self.grasp?;
        Some((physics.local_point_to_world(&grasp.body, grasp.anchor), self.position))
    }

    /// Pull the held body toward the pointer. Call once per physics step,
    /// before the world is stepped.
    pub fn solve(&self, physics: &mut PhysicsWorld, dt: f32) {
        let Some(grasp) = self.grasp else {
            return;
        };
        if dt <= 0.0 {
            return;
        }
        let grabbed = physics.local_point_to_world(&grasp.body, grasp.anchor);
        let offset = self.position - grabbed;
        let impulse = offset * (self.stiffness / dt) * physics.mass(&grasp.body);
        physics.apply_impulse_at(&grasp.body, impulse, grabbed);
    }
}

impl Default for PointerConstraint {
    fn default() -> Self {
        Self::new(DEFAULT_POINTER_STIFFNESS)
    }
}
