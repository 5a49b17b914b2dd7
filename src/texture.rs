// ── CPU texture sampling ──────────────────────────────────────────────────────
//
// Reproduces the sampling conventions of the GPU pass so the CPU and wgpu
// paths agree: normalized coordinates, texel centres at (i + 0.5) / size,
// nearest = floor(u * size), linear = bilinear around u * size - 0.5.

use std::path::Path;

use glam::{Vec2, Vec4};
use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::color::{from_rgba8, mix, to_rgba8};
use crate::error::Result;

// ── Texture ───────────────────────────────────────────────────────────────────

/// Row-major RGBA float image.
#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
    width: u32,
    height: u32,
    texels: Vec<Vec4>,
}

impl Texture {
    /// A `width x height` texture filled with `fill`.
    pub fn new(width: u32, height: u32, fill: Vec4) -> Self {
        Self { width, height, texels: vec![fill; width as usize * height as usize] }
    }

    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> Vec4) -> Self {
        let mut texels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                texels.push(f(x, y));
            }
        }
        Self { width, height, texels }
    }

    pub fn from_rgba8(img: &RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        let texels = img.pixels().map(|p| from_rgba8(p.0)).collect();
        Self { width, height, texels }
    }

    pub fn to_rgba8(&self) -> RgbaImage {
        let mut img = RgbaImage::new(self.width, self.height);
        for (px, texel) in img.pixels_mut().zip(&self.texels) {
            px.0 = to_rgba8(*texel);
        }
        img
    }

    pub fn load_png(path: impl AsRef<Path>) -> Result<Self> {
        let img = image::open(path.as_ref())?.to_rgba8();
        Ok(Self::from_rgba8(&img))
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        self.to_rgba8().save(path.as_ref())?;
        Ok(())
    }

    pub fn width(&self) -> u32 { self.width }
    pub fn height(&self) -> u32 { self.height }
    pub fn dimensions(&self) -> (u32, u32) { (self.width, self.height) }
    pub fn is_empty(&self) -> bool { self.texels.is_empty() }
    pub fn texels(&self) -> &[Vec4] { &self.texels }
    pub fn texels_mut(&mut self) -> &mut [Vec4] { &mut self.texels }

    /// The texel at integer coordinates.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the texture.
    pub fn texel(&self, x: u32, y: u32) -> Vec4 {
        assert!(x < self.width && y < self.height, "texel ({x}, {y}) outside {}x{}", self.width, self.height);
        self.texels[y as usize * self.width as usize + x as usize]
    }

    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the texture.
    pub fn set_texel(&mut self, x: u32, y: u32, value: Vec4) {
        assert!(x < self.width && y < self.height, "texel ({x}, {y}) outside {}x{}", self.width, self.height);
        self.texels[y as usize * self.width as usize + x as usize] = value;
    }

    /// Normalized coordinate of the centre of texel `(x, y)`.
    pub fn texel_center(&self, x: u32, y: u32) -> Vec2 {
        Vec2::new(
            (x as f32 + 0.5) / self.width as f32,
            (y as f32 + 0.5) / self.height as f32,
        )
    }
}

// ── Sampler ───────────────────────────────────────────────────────────────────

/// Bound on texel-space coordinates for linear filtering.  Keeps the
/// neighbour index inside `i64` and the blend weight finite.
const LINEAR_LIMIT: f32 = 1.0e18;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    #[default]
    Nearest,
    Linear,
}

/// What happens to coordinates outside [0, 1].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressMode {
    #[default]
    ClampToEdge,
    Repeat,
    MirrorRepeat,
}

impl AddressMode {
    /// Resolves an integer texel index against a dimension of `size` texels.
    pub fn resolve(self, i: i64, size: u32) -> u32 {
        let n = size.max(1) as i64;
        let r = match self {
            AddressMode::ClampToEdge => i.clamp(0, n - 1),
            AddressMode::Repeat => i.rem_euclid(n),
            AddressMode::MirrorRepeat => {
                let period = i.rem_euclid(2 * n);
                if period < n { period } else { 2 * n - 1 - period }
            }
        };
        r as u32
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sampler {
    pub filter: FilterMode,
    pub address_u: AddressMode,
    pub address_v: AddressMode,
}

impl Sampler {
    pub const NEAREST_CLAMP: Sampler = Sampler {
        filter: FilterMode::Nearest,
        address_u: AddressMode::ClampToEdge,
        address_v: AddressMode::ClampToEdge,
    };

    pub const LINEAR_CLAMP: Sampler = Sampler {
        filter: FilterMode::Linear,
        address_u: AddressMode::ClampToEdge,
        address_v: AddressMode::ClampToEdge,
    };

    /// Samples `texture` at normalized coordinate `uv`.
    ///
    /// An empty texture samples as transparent black.  Non-finite
    /// coordinates are treated as 0.
    pub fn sample(&self, texture: &Texture, uv: Vec2) -> Vec4 {
        if texture.is_empty() {
            return Vec4::ZERO;
        }
        let u = if uv.x.is_finite() { uv.x } else { 0.0 };
        let v = if uv.y.is_finite() { uv.y } else { 0.0 };
        let (w, h) = texture.dimensions();

        match self.filter {
            FilterMode::Nearest => {
                let x = self.address_u.resolve((u * w as f32).floor() as i64, w);
                let y = self.address_v.resolve((v * h as f32).floor() as i64, h);
                texture.texel(x, y)
            }
            FilterMode::Linear => {
                let fx = (u * w as f32 - 0.5).clamp(-LINEAR_LIMIT, LINEAR_LIMIT);
                let fy = (v * h as f32 - 0.5).clamp(-LINEAR_LIMIT, LINEAR_LIMIT);
                let x0 = fx.floor();
                let y0 = fy.floor();
                let tx = fx - x0;
                let ty = fy - y0;
                let (x0, y0) = (x0 as i64, y0 as i64);
                let (x1, y1) = (x0 + 1, y0 + 1);

                let fetch = |x: i64, y: i64| {
                    texture.texel(self.address_u.resolve(x, w), self.address_v.resolve(y, h))
                };
                let top = mix(fetch(x0, y0), fetch(x1, y0), tx);
                let bottom = mix(fetch(x0, y1), fetch(x1, y1), tx);
                mix(top, bottom, ty)
            }
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
