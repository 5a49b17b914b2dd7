// ── RemapConfig ───────────────────────────────────────────────────────────────
//
// Loaded from JSON.  Every field is optional in the file; missing fields take
// the defaults below:
//
// ```json
// {
//   "backend": "cpu",
//   "palette_width": 32,
//   "source_sampler":  { "filter": "nearest", "address_u": "clamp_to_edge", "address_v": "clamp_to_edge" },
//   "palette_sampler": { "filter": "nearest" },
//   "tint": [1.0, 1.0, 1.0, 1.0]
// }
// ```

use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::color::DEFAULT_PALETTE_WIDTH;
use crate::error::Result;
use crate::texture::Sampler;

/// Where the filter runs.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Rayon-parallel CPU evaluation.
    #[default]
    Cpu,
    /// Headless wgpu render pass.
    Gpu,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemapConfig {
    pub backend: Backend,
    /// Columns to lay out when building a palette from a JSON definition.
    pub palette_width: u32,
    pub source_sampler: Sampler,
    /// Keep this `nearest`: a linear filter blends adjacent palette rows.
    pub palette_sampler: Sampler,
    /// Diffuse tint.  Carried through to the shader uniforms but not applied.
    pub tint: [f32; 4],
}

impl Default for RemapConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Cpu,
            palette_width: DEFAULT_PALETTE_WIDTH,
            source_sampler: Sampler::NEAREST_CLAMP,
            palette_sampler: Sampler::NEAREST_CLAMP,
            tint: [1.0; 4],
        }
    }
}

impl RemapConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = Self::from_json(&std::fs::read_to_string(path)?)?;
        info!("config: loaded {:?} (backend {:?})", path, config.backend);
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
