use palette::{FromColor, Hsl, Srgb};

/// Solid fill color for a rectangle, stored as gamma-encoded sRGB components
/// in 0.0..=1.0 so it can go straight into the render buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Fill {
    pub const WHITE: Fill = Fill::rgb(1.0, 1.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Build an opaque fill from CSS-style HSL: hue in degrees,
    /// saturation and lightness in percent.
    pub fn from_hsl(hue: f32, saturation: f32, lightness: f32) -> Self {
        let hsl: Hsl = Hsl::new(
            hue,
            (saturation / 100.0).clamp(0.0, 1.0),
            (lightness / 100.0).clamp(0.0, 1.0),
        );
        let rgb = Srgb::from_color(hsl);
        Self::rgb(
            rgb.red.clamp(0.0, 1.0),
            rgb.green.clamp(0.0, 1.0),
            rgb.blue.clamp(0.0, 1.0),
        )
    }

    /// `rgba(...)` string for a 2D canvas `fillStyle`.
    pub fn to_css(&self) -> String {
        format!(
            "rgba({},{},{},{})",
            (self.r * 255.0).round() as u8,
            (self.g * 255.0).round() as u8,
            (self.b * 255.0).round() as u8,
            self.a
        )
    }
}

impl Default for Fill {
    fn default() -> Self {
        Self::WHITE
    }
}
