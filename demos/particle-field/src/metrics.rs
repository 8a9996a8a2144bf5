use confetti_engine::Viewport;

use crate::config::FieldConfig;
use crate::sampling::Span;

/// Smallest square side ever produced, in px.
const MIN_PARTICLE_SIZE: f32 = 1.0;

/// How many particles a container gets and how big they may be.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldMetrics {
    pub count: usize,
    pub size: Span,
}

impl Default for FieldMetrics {
    fn default() -> Self {
        Self { count: 0, size: Span::new(0.0, 0.0) }
    }
}

impl FieldMetrics {
    /// Pure function of the container size and the tuning.
    pub fn derive(viewport: Viewport, config: &FieldConfig) -> Self {
        if viewport.is_empty() {
            return Self::default();
        }
        let w = viewport.width as f64;
        let h = viewport.height as f64;
        let count = (w * h * config.density + config.base_count).ceil() as usize;

        let width = viewport.width;
        let cap = if width * (1.0 + config.size_cap_fraction) <= config.size_breakpoint {
            config.size_cap_narrow
        } else {
            config.size_cap_wide
        };
        // On wide containers the width-proportional bound overtakes the cap;
        // the range then runs from the cap up to it.
        let scaled = (width * config.size_min_fraction).max(MIN_PARTICLE_SIZE);

        Self { count, size: Span::new(scaled.min(cap), scaled.max(cap)) }
    }
}
