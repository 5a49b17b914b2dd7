//! The palette remap filter.
//!
//! A source texel does not carry a color.  Its blue channel picks a palette
//! column, and its red and green channels say how much foreground and then
//! how much accent to blend over that column's background:
//!
//! ```text
//! base   = mix(background, foreground, r)
//! result = mix(base,       accent,     g)
//! ```
//!
//! Accent is blended last, so `g = 1` gives the accent whatever `r` is.
//! Every output texel depends only on its own inputs.

use glam::{Vec2, Vec4};
use image::RgbaImage;
use rayon::prelude::*;

use crate::color::mix;
use crate::config::RemapConfig;
use crate::palette::{Palette, PaletteRow};
use crate::texture::{Sampler, Texture};

/// Blends one texel against already sampled palette colors.
#[inline]
pub fn remap_texel(texel: Vec4, background: Vec4, foreground: Vec4, accent: Vec4) -> Vec4 {
    let base = mix(background, foreground, texel.x);
    mix(base, accent, texel.y)
}

// ── PaletteRemap ──────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct PaletteRemap {
    palette: Palette,
    source_sampler: Sampler,
    palette_sampler: Sampler,
    /// Accepted for parity with the sprite draw call; never applied.
    tint: Vec4,
}

impl PaletteRemap {
    /// Nearest, clamped sampling for both images and a white tint.
    pub fn new(palette: Palette) -> Self {
        Self {
            palette,
            source_sampler: Sampler::NEAREST_CLAMP,
            palette_sampler: Sampler::NEAREST_CLAMP,
            tint: Vec4::ONE,
        }
    }

    pub fn from_config(palette: Palette, config: &RemapConfig) -> Self {
        Self {
            palette,
            source_sampler: config.source_sampler,
            palette_sampler: config.palette_sampler,
            tint: Vec4::from_array(config.tint),
        }
    }

    pub fn with_source_sampler(mut self, sampler: Sampler) -> Self {
        self.source_sampler = sampler;
        self
    }

    pub fn with_palette_sampler(mut self, sampler: Sampler) -> Self {
        self.palette_sampler = sampler;
        self
    }

    pub fn with_tint(mut self, tint: Vec4) -> Self {
        self.tint = tint;
        self
    }

    pub fn set_palette(&mut self, palette: Palette) {
        self.palette = palette;
    }

    pub fn palette(&self) -> &Palette { &self.palette }
    pub fn source_sampler(&self) -> Sampler { self.source_sampler }
    pub fn palette_sampler(&self) -> Sampler { self.palette_sampler }
    pub fn tint(&self) -> Vec4 { self.tint }

    /// Remaps an already sampled source texel.
    pub fn remap(&self, texel: Vec4) -> Vec4 {
        let index = texel.z;
        let s = &self.palette_sampler;
        remap_texel(
            texel,
            self.palette.sample(s, index, PaletteRow::Background),
            self.palette.sample(s, index, PaletteRow::Foreground),
            self.palette.sample(s, index, PaletteRow::Accent),
        )
    }

    /// Output color for one pixel: samples `source` at `uv`, then remaps.
    pub fn shade(&self, source: &Texture, uv: Vec2) -> Vec4 {
        self.remap(self.source_sampler.sample(source, uv))
    }

    /// Shades every texel centre of `source`.  Rows run in parallel.
    pub fn apply(&self, source: &Texture) -> Texture {
        let (w, h) = source.dimensions();
        let mut out = Texture::new(w, h, Vec4::ZERO);

        if w > 0 {
            out.texels_mut().par_chunks_mut(w as usize).enumerate().for_each(|(y, row)| {
                for (x, px) in row.iter_mut().enumerate() {
                    *px = self.shade(source, source.texel_center(x as u32, y as u32));
                }
            });
        }
        out
    }

    pub fn apply_rgba8(&self, source: &RgbaImage) -> RgbaImage {
        self.apply(&Texture::from_rgba8(source)).to_rgba8()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
