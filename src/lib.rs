pub mod color;
pub mod config;
pub mod error;
pub mod palette;
pub mod remap;
pub mod renderer;
pub mod texture;

pub use color::{RemapColors, DEFAULT_PALETTE_WIDTH};
pub use config::{Backend, RemapConfig};
pub use error::{RemapError, Result};
pub use palette::{Palette, PaletteDef, PaletteEntry, PaletteLibrary, PaletteRow};
pub use remap::{remap_texel, PaletteRemap};
pub use texture::{AddressMode, FilterMode, Sampler, Texture};
