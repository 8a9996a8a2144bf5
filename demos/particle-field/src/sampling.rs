//! Random placement of particles inside regions derived from the viewport.

use confetti_engine::{Fill, Viewport};
use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::FieldConfig;

/// Closed numeric range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub min: f32,
    pub max: f32,
}

impl Span {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Uniform draw from `[min, max)`. A degenerate span yields `min`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.max > self.min {
            rng.gen_range(self.min..self.max)
        } else {
            self.min
        }
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn scaled(&self, factor: f32) -> Span {
        Span::new(self.min * factor, self.max * factor)
    }

    pub fn is_ordered(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

/// Rectangle expressed in fractions of the viewport: `x` in widths, `y` in
/// heights. `{ x: [-1, 1], y: [-1, 0.2] }` on 800×600 covers
/// x ∈ [-800, 800], y ∈ [-600, 120].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub x: Span,
    pub y: Span,
}

impl Region {
    pub const fn new(x: Span, y: Span) -> Self {
        Self { x, y }
    }

    /// Absolute pixel ranges for this viewport.
    pub fn resolve(&self, viewport: Viewport) -> (Span, Span) {
        (self.x.scaled(viewport.width), self.y.scaled(viewport.height))
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, viewport: Viewport) -> Vec2 {
        let (xs, ys) = self.resolve(viewport);
        Vec2::new(xs.sample(rng), ys.sample(rng))
    }

    pub fn contains(&self, viewport: Viewport, point: Vec2) -> bool {
        let (xs, ys) = self.resolve(viewport);
        xs.contains(point.x) && ys.contains(point.y)
    }
}

/// HSL ranges for particle colors, in CSS units (degrees, percent).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorRanges {
    pub hue: Span,
    pub saturation: Span,
    pub lightness: Span,
}

impl ColorRanges {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Fill {
        let h = self.hue.sample(rng);
        let s = self.saturation.sample(rng);
        let l = self.lightness.sample(rng);
        Fill::from_hsl(h, s, l)
    }
}

/// Where a particle goes and how fast it starts falling, in px and px/tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Vec2,
    pub velocity: Vec2,
}

/// Initial placement: anywhere in the spawn region, falling straight down.
pub fn sample_spawn<R: Rng + ?Sized>(rng: &mut R, viewport: Viewport, config: &FieldConfig) -> Placement {
    Placement {
        position: config.spawn.sample(rng, viewport),
        velocity: Vec2::new(0.0, config.spawn_speed.sample(rng)),
    }
}

/// Placement for a particle that fell out of view.
pub fn sample_recycle<R: Rng + ?Sized>(rng: &mut R, viewport: Viewport, config: &FieldConfig) -> Placement {
    Placement {
        position: config.recycle.sample(rng, viewport),
        velocity: Vec2::new(0.0, config.recycle_speed.sample(rng)),
    }
}
