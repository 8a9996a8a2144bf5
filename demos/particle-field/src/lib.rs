//! Falling confetti squares that can be dragged around, mounted onto any
//! page element by id.
//!
//! ```js
//! import init, { effect_mount, effect_mount_with_config } from './particle_field.js';
//! await init();
//! effect_mount('app');
//! effect_mount_with_config('sidebar', '{"preset": "drift"}');
//! ```

use wasm_bindgen::prelude::*;

pub mod config;
pub mod field;
pub mod metrics;
pub mod sampling;

pub use config::{ConfigError, FieldConfig, FieldPreset};
pub use field::{Particle, ParticleField};
pub use metrics::FieldMetrics;

confetti_web::export_effect!(ParticleField, "particle-field");
