//! Tuning for the particle field, loadable from the JSON string a page passes
//! to `effect_mount_with_config`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::sampling::{ColorRanges, Region, Span};

/// Configured speeds are in px per tick of a 60 Hz simulation.
pub const TICKS_PER_SECOND: f32 = 60.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldPreset {
    /// Dense field spawning across twice the width, most of it above the top edge.
    #[default]
    Cascade,
    /// Sparser, smaller squares that recycle into a centered band above the view.
    Drift,
}

impl FieldPreset {
    pub fn config(self) -> FieldConfig {
        match self {
            FieldPreset::Cascade => FieldConfig::cascade(),
            FieldPreset::Drift => FieldConfig::drift(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldConfig {
    /// Particles per square pixel of container.
    pub density: f64,
    /// Particles added regardless of area.
    pub base_count: f64,
    /// Width-proportional size bound; sizes range between it and the cap.
    pub size_min_fraction: f32,
    /// Headroom fraction of the width checked against `size_breakpoint`.
    pub size_cap_fraction: f32,
    pub size_breakpoint: f32,
    /// Size cap on containers at or under the breakpoint.
    pub size_cap_narrow: f32,
    /// Size cap on containers past the breakpoint.
    pub size_cap_wide: f32,
    pub spawn: Region,
    pub recycle: Region,
    pub spawn_speed: Span,
    pub recycle_speed: Span,
    /// Fraction of velocity lost per tick to air.
    pub air_friction: Span,
    pub color: ColorRanges,
    pub bounce: f32,
    /// Fixed body mass; `None` derives it from the square's area.
    pub mass: Option<f32>,
    pub pointer_stiffness: f32,
    pub pointer_visible: bool,
    /// Downward acceleration in px/s².
    pub gravity: f32,
    pub seed: Option<u64>,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self::cascade()
    }
}

impl FieldConfig {
    pub fn cascade() -> Self {
        Self {
            density: 0.00005,
            base_count: 100.0,
            size_min_fraction: 0.055,
            size_cap_fraction: 0.09,
            size_breakpoint: 1024.0,
            size_cap_narrow: 100.0,
            size_cap_wide: 50.0,
            spawn: Region::new(Span::new(-1.0, 1.0), Span::new(-1.0, 0.2)),
            recycle: Region::new(Span::new(-1.0, 1.0), Span::new(-1.0, 0.2)),
            spawn_speed: Span::new(1.0, 10.0),
            recycle_speed: Span::new(1.0, 30.0),
            air_friction: Span::new(0.003, 0.1),
            color: ColorRanges {
                hue: Span::new(1.0, 360.0),
                saturation: Span::new(0.0, 100.0),
                lightness: Span::new(0.0, 100.0),
            },
            bounce: 1.1,
            mass: Some(0.01),
            pointer_stiffness: 0.01,
            pointer_visible: false,
            gravity: 900.0,
            seed: None,
        }
    }

    pub fn drift() -> Self {
        Self {
            density: 0.00003,
            base_count: 60.0,
            size_min_fraction: 0.03,
            size_cap_fraction: 0.08,
            size_cap_narrow: 60.0,
            size_cap_wide: 40.0,
            spawn: Region::new(Span::new(-1.0, 1.0), Span::new(-1.0, 1.0 / 3.0)),
            recycle: Region::new(Span::new(0.2, 0.8), Span::new(-1.0, -0.2)),
            air_friction: Span::new(0.01, 0.08),
            bounce: 0.9,
            ..Self::cascade()
        }
    }

    /// Parse a page-supplied JSON object. An optional `"preset"` key picks the
    /// base values; every other key overrides a single field.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(json)?;
        let Value::Object(mut overrides) = value else {
            return Err(ConfigError::Invalid("config must be a JSON object".into()));
        };

        let preset = match overrides.remove("preset") {
            Some(name) => serde_json::from_value::<FieldPreset>(name)?,
            None => FieldPreset::default(),
        };
        let mut merged = match serde_json::to_value(preset.config())? {
            Value::Object(map) => map,
            _ => return Err(ConfigError::Invalid("preset did not serialize to an object".into())),
        };
        merged.extend(overrides);

        let config: FieldConfig = serde_json::from_value(Value::Object(merged))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.density.is_finite() && self.density > 0.0) {
            return invalid(format!("density must be positive, got {}", self.density));
        }
        if !(self.base_count.is_finite() && self.base_count >= 0.0) {
            return invalid(format!("base_count must be >= 0, got {}", self.base_count));
        }
        if !(self.size_min_fraction.is_finite() && self.size_min_fraction > 0.0) {
            return invalid("size_min_fraction must be positive".into());
        }
        if !(self.size_cap_fraction.is_finite() && self.size_cap_fraction >= 0.0) {
            return invalid("size_cap_fraction must be >= 0".into());
        }
        if !(self.size_breakpoint.is_finite() && self.size_breakpoint > 0.0) {
            return invalid("size_breakpoint must be positive".into());
        }
        for (name, cap) in [("size_cap_narrow", self.size_cap_narrow), ("size_cap_wide", self.size_cap_wide)] {
            if !(cap.is_finite() && cap >= 1.0) {
                return invalid(format!("{} must be at least 1px, got {}", name, cap));
            }
        }

        let spans = [
            ("spawn.x", self.spawn.x),
            ("spawn.y", self.spawn.y),
            ("recycle.x", self.recycle.x),
            ("recycle.y", self.recycle.y),
            ("spawn_speed", self.spawn_speed),
            ("recycle_speed", self.recycle_speed),
            ("air_friction", self.air_friction),
            ("color.hue", self.color.hue),
            ("color.saturation", self.color.saturation),
            ("color.lightness", self.color.lightness),
        ];
        for (name, span) in spans {
            if !span.is_ordered() {
                return invalid(format!("{} range is inverted: [{}, {}]", name, span.min, span.max));
            }
        }
        if self.recycle_speed.min <= 0.0 {
            return invalid("recycle_speed must be strictly positive".into());
        }
        if self.air_friction.min < 0.0 || self.air_friction.max >= 1.0 {
            return invalid("air_friction must lie in [0, 1)".into());
        }
        if !self.bounce.is_finite() || self.bounce < 0.0 {
            return invalid("bounce must be >= 0".into());
        }
        if let Some(mass) = self.mass {
            if !(mass.is_finite() && mass > 0.0) {
                return invalid(format!("mass must be positive, got {}", mass));
            }
        }
        if !(self.pointer_stiffness > 0.0 && self.pointer_stiffness <= 1.0) {
            return invalid("pointer_stiffness must lie in (0, 1]".into());
        }
        if !self.gravity.is_finite() {
            return invalid("gravity must be finite".into());
        }
        Ok(())
    }
}

fn invalid(message: String) -> Result<(), ConfigError> {
    Err(ConfigError::Invalid(message))
}

#[derive(Debug)]
pub enum ConfigError {
    Json(serde_json::Error),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Json(err) => write!(f, "config JSON: {}", err),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Json(err) => Some(err),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Json(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        assert!(FieldConfig::cascade().validate().is_ok());
        assert!(FieldConfig::drift().validate().is_ok());
    }

    #[test]
    fn empty_object_is_cascade() {
        let config = FieldConfig::from_json("{}").unwrap();
        assert_eq!(config, FieldConfig::cascade());
    }

    #[test]
    fn preset_with_overrides() {
        let config = FieldConfig::from_json(
            r#"{ "preset": "drift", "bounce": 0.5, "seed": 7, "pointer_visible": true }"#,
        )
        .unwrap();
        assert_eq!(config.base_count, 60.0);
        assert_eq!(config.recycle, FieldConfig::drift().recycle);
        assert_eq!(config.bounce, 0.5);
        assert_eq!(config.seed, Some(7));
        assert!(config.pointer_visible);
    }

    #[test]
    fn null_mass_falls_back_to_density() {
        let config = FieldConfig::from_json(r#"{ "mass": null }"#).unwrap();
        assert_eq!(config.mass, None);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(FieldConfig::from_json("not json"), Err(ConfigError::Json(_))));
        assert!(matches!(FieldConfig::from_json("[1, 2]"), Err(ConfigError::Invalid(_))));
        assert!(matches!(
            FieldConfig::from_json(r#"{ "preset": "blizzard" }"#),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            FieldConfig::from_json(r#"{ "densty": 0.1 }"#),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn rejects_inverted_ranges_and_zero_density() {
        let err = FieldConfig::from_json(r#"{ "recycle_speed": { "min": 30, "max": 1 } }"#)
            .unwrap_err();
        assert!(err.to_string().contains("recycle_speed"), "{}", err);

        let err = FieldConfig::from_json(r#"{ "density": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
