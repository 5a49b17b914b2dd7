// ── Color helpers ─────────────────────────────────────────────────────────────
//
// Colors are `glam::Vec4` in (r, g, b, a) order, each channel normalized to
// [0, 1].  Source sprites do not store colors at all: red is the foreground
// weight, green the accent weight and blue the palette index.

use glam::Vec4;

use crate::error::{RemapError, Result};

/// Number of palette columns the game ships with (one per zone kind).
pub const DEFAULT_PALETTE_WIDTH: u32 = 32;

// ── mix ───────────────────────────────────────────────────────────────────────

/// Componentwise linear interpolation, `a * (1 - t) + b * t`.
///
/// Written in the two-product form rather than `a + (b - a) * t` so that
/// `t = 0` yields `a` and `t = 1` yields `b` bit for bit.
#[inline]
pub fn mix(a: Vec4, b: Vec4, t: f32) -> Vec4 {
    a * (1.0 - t) + b * t
}

// ── RemapColors ───────────────────────────────────────────────────────────────

/// Colors that are remappable to the palette.  Draw sprites with these and
/// the remap filter replaces them with the palette's colors.
pub struct RemapColors;

impl RemapColors {
    pub const BACKGROUND: Vec4 = Vec4::new(0.0, 0.0, 0.0, 1.0);
    pub const FOREGROUND: Vec4 = Vec4::new(1.0, 0.0, 0.0, 1.0);
    pub const ACCENT: Vec4 = Vec4::new(0.0, 1.0, 0.0, 1.0);
}

// ── Source texel encoding ─────────────────────────────────────────────────────

/// Horizontal palette coordinate that selects `column` in a palette
/// `width` columns wide.
///
/// Returns the column centre so the index survives 8-bit storage: the
/// quantization error of an 8-bit channel is at most `0.5 / 255`, which
/// stays well inside half a column for any width up to 255.
pub fn encode_palette_index(column: u32, width: u32) -> f32 {
    if width == 0 {
        return 0.0;
    }
    (column.min(width - 1) as f32 + 0.5) / width as f32
}

/// Builds a source texel from blend weights and a palette coordinate.
///
/// Weights are clamped to [0, 1]; alpha is opaque.
pub fn encode_texel(foreground_weight: f32, accent_weight: f32, palette_index: f32) -> Vec4 {
    Vec4::new(
        foreground_weight.clamp(0.0, 1.0),
        accent_weight.clamp(0.0, 1.0),
        palette_index.clamp(0.0, 1.0),
        1.0,
    )
}

/// Puts `palette_index` into the blue channel of an authoring color
/// (e.g. [`RemapColors::FOREGROUND`]).
pub fn with_palette_index(color: Vec4, palette_index: f32) -> Vec4 {
    Vec4::new(color.x, color.y, palette_index, color.w)
}

// ── 8-bit conversion ──────────────────────────────────────────────────────────

pub fn from_rgba8(px: [u8; 4]) -> Vec4 {
    Vec4::new(
        px[0] as f32 / 255.0,
        px[1] as f32 / 255.0,
        px[2] as f32 / 255.0,
        px[3] as f32 / 255.0,
    )
}

/// Clamps to [0, 1] and rounds to the nearest 8-bit step.  NaN maps to 0.
pub fn to_rgba8(color: Vec4) -> [u8; 4] {
    let q = |c: f32| {
        if c.is_nan() {
            0
        } else {
            (c.clamp(0.0, 1.0) * 255.0).round() as u8
        }
    };
    [q(color.x), q(color.y), q(color.z), q(color.w)]
}

// ── Hex parsing ───────────────────────────────────────────────────────────────

/// Parses `#RRGGBB` or `#RRGGBBAA` (the leading `#` is optional).
pub fn parse_hex(s: &str) -> Result<Vec4> {
    let digits = s.trim().trim_start_matches('#');
    if !(digits.len() == 6 || digits.len() == 8) || !digits.is_ascii() {
        return Err(RemapError::InvalidColor(s.to_string()));
    }

    let byte = |i: usize| {
        u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| RemapError::InvalidColor(s.to_string()))
    };
    let alpha = if digits.len() == 8 { byte(6)? } else { 255 };
    Ok(from_rgba8([byte(0)?, byte(2)?, byte(4)?, alpha]))
}

/// Formats a color as `#rrggbbaa`.
pub fn to_hex(color: Vec4) -> String {
    let [r, g, b, a] = to_rgba8(color);
    format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mix_endpoints_are_exact() {
        let a = Vec4::new(0.1, 0.7, 0.3, 0.9);
        let b = Vec4::new(0.6, 0.2, 0.8, 0.4);
        assert_eq!(mix(a, b, 0.0), a);
        assert_eq!(mix(a, b, 1.0), b);
    }

    #[test]
    fn parse_hex_rgb_and_rgba() {
        assert_eq!(parse_hex("#ff0000").unwrap(), Vec4::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(parse_hex("00ff0080").unwrap(), Vec4::new(0.0, 1.0, 0.0, 128.0 / 255.0));
    }

    #[test]
    fn parse_hex_rejects_garbage() {
        assert!(parse_hex("#fff").is_err());
        assert!(parse_hex("#gg0000").is_err());
        assert!(parse_hex("#ffé000").is_err());
    }

    #[test]
    fn hex_survives_formatting() {
        let c = parse_hex("#12abef7f").unwrap();
        assert_eq!(to_hex(c), "#12abef7f");
    }

    #[test]
    fn to_rgba8_clamps_and_rounds() {
        assert_eq!(to_rgba8(Vec4::new(-1.0, 2.0, 0.5, f32::NAN)), [0, 255, 128, 0]);
    }

    #[test]
    fn palette_index_is_column_centre() {
        assert_eq!(encode_palette_index(0, 4), 0.125);
        assert_eq!(encode_palette_index(3, 4), 0.875);
        // Out-of-range columns clamp to the last one.
        assert_eq!(encode_palette_index(9, 4), 0.875);
        assert_eq!(encode_palette_index(0, 0), 0.0);
    }
}
