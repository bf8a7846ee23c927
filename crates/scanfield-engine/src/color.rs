//! Color values as the shaders consume them.
//!
//! Straight (non-premultiplied) RGB in `[0, 1]`. The renderers feed these
//! directly into uniform blocks; blending modes are chosen per pipeline, so
//! premultiplication is not baked into the value.

use crate::error::EngineError;

/// Straight RGB color.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Parses a `#rrggbb` hex literal.
    ///
    /// The leading `#` is required; shorthand (`#rgb`) and alpha channels are
    /// not accepted.
    pub fn from_hex(hex: &str) -> Result<Self, EngineError> {
        let digits = hex
            .strip_prefix('#')
            .ok_or_else(|| EngineError::InvalidConfig(format!("color '{hex}' must start with '#'")))?;

        if digits.len() != 6 || !digits.is_ascii() {
            return Err(EngineError::InvalidConfig(format!(
                "color '{hex}' must be #rrggbb"
            )));
        }

        let byte = |range: std::ops::Range<usize>| -> Result<f32, EngineError> {
            u8::from_str_radix(&digits[range], 16)
                .map(|v| v as f32 / 255.0)
                .map_err(|_| EngineError::InvalidConfig(format!("color '{hex}' has non-hex digits")))
        };

        Ok(Self {
            r: byte(0..2)?,
            g: byte(2..4)?,
            b: byte(4..6)?,
        })
    }

    /// Returns the color as a shader-ready triple.
    #[inline]
    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lowercase_hex() {
        let c = Color::from_hex("#6b5b95").unwrap();
        assert!((c.r - 0x6b as f32 / 255.0).abs() < 1e-6);
        assert!((c.g - 0x5b as f32 / 255.0).abs() < 1e-6);
        assert!((c.b - 0x95 as f32 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn parses_uppercase_hex() {
        let c = Color::from_hex("#FF9FFC").unwrap();
        assert!((c.r - 1.0).abs() < 1e-6);
    }

    #[test]
    fn rejects_missing_hash() {
        assert!(Color::from_hex("6b5b95").is_err());
    }

    #[test]
    fn rejects_short_and_long_forms() {
        assert!(Color::from_hex("#fff").is_err());
        assert!(Color::from_hex("#ffffff00").is_err());
    }

    #[test]
    fn rejects_non_hex_digits() {
        assert!(Color::from_hex("#zzzzzz").is_err());
    }

    #[test]
    fn white_and_black_round_trip() {
        assert_eq!(Color::from_hex("#ffffff").unwrap(), Color::new(1.0, 1.0, 1.0));
        assert_eq!(Color::from_hex("#000000").unwrap(), Color::new(0.0, 0.0, 0.0));
    }
}
