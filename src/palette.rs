use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use glam::{Vec2, Vec4};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::color::{parse_hex, to_hex};
use crate::error::{RemapError, Result};
use crate::texture::{Sampler, Texture};

/// Rows in the canonical palette image.  Three are sampled; the fourth
/// repeats the accent so that v = 0.5 never sits on an undefined row.
pub const PALETTE_ROWS: u32 = 4;

// ── PaletteRow ────────────────────────────────────────────────────────────────

/// One of the three palette rows, addressed by a fixed vertical coordinate.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PaletteRow {
    Background,
    Foreground,
    Accent,
}

impl PaletteRow {
    pub const ALL: [PaletteRow; 3] = [PaletteRow::Background, PaletteRow::Foreground, PaletteRow::Accent];

    /// Vertical sampling coordinate of the row.
    pub const fn v(self) -> f32 {
        match self {
            PaletteRow::Background => 0.0,
            PaletteRow::Foreground => 0.25,
            PaletteRow::Accent => 0.5,
        }
    }

    /// Image row that holds this color in the canonical 4-row layout.
    pub const fn image_row(self) -> u32 {
        match self {
            PaletteRow::Background => 0,
            PaletteRow::Foreground => 1,
            PaletteRow::Accent => 2,
        }
    }
}

// ── PaletteEntry ──────────────────────────────────────────────────────────────

/// The three colors of one palette column.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PaletteEntry {
    pub background: Vec4,
    pub foreground: Vec4,
    pub accent: Vec4,
}

impl PaletteEntry {
    pub fn get(&self, row: PaletteRow) -> Vec4 {
        match row {
            PaletteRow::Background => self.background,
            PaletteRow::Foreground => self.foreground,
            PaletteRow::Accent => self.accent,
        }
    }
}

// ── Palette ───────────────────────────────────────────────────────────────────

/// The palette lookup image.
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    texture: Texture,
}

impl Palette {
    /// Lays `entries` out one per column in a `width x 4` image.  Columns
    /// past the last entry repeat it.
    pub fn from_entries(entries: &[PaletteEntry], width: u32) -> Result<Self> {
        let Some(last) = entries.last() else {
            return Err(RemapError::invalid_palette("palette has no entries"));
        };
        if (width as usize) < entries.len() {
            return Err(RemapError::invalid_palette(format!(
                "{} entries do not fit in {width} columns",
                entries.len()
            )));
        }

        let texture = Texture::from_fn(width, PALETTE_ROWS, |x, y| {
            let entry = entries.get(x as usize).unwrap_or(last);
            match y {
                0 => entry.background,
                1 => entry.foreground,
                _ => entry.accent,
            }
        });
        Ok(Self { texture })
    }

    /// Uses an arbitrary image as the palette.  Only its rows at v = 0.0,
    /// 0.25 and 0.5 are ever read.
    pub fn from_texture(texture: Texture) -> Result<Self> {
        if texture.is_empty() {
            return Err(RemapError::invalid_palette(format!(
                "palette image is {}x{}",
                texture.width(),
                texture.height()
            )));
        }
        if texture.height() != PALETTE_ROWS {
            warn!(
                "palette: image is {} rows high (expected {PALETTE_ROWS}); rows are picked at v = 0, 0.25, 0.5",
                texture.height()
            );
        }
        Ok(Self { texture })
    }

    pub fn load_png(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let palette = Self::from_texture(Texture::load_png(path)?)?;
        debug!("palette: loaded {:?} ({}x{})", path, palette.width(), palette.height());
        Ok(palette)
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        self.texture.save_png(path)
    }

    /// Loads a palette from whatever `path` points at:
    ///
    /// - a directory of JSON definitions, picking `name` from it;
    /// - a `.json` definition, laid out `width` columns wide;
    /// - anything else, read as a palette image.
    pub fn load(path: impl AsRef<Path>, name: Option<&str>, width: u32) -> Result<Self> {
        let path = path.as_ref();
        if path.is_dir() {
            let Some(name) = name else {
                return Err(RemapError::invalid_palette(format!(
                    "{:?} is a directory; a palette name is required",
                    path
                )));
            };
            return PaletteLibrary::load_folder(path)?.build(name, width);
        }

        match path.extension().and_then(|s| s.to_str()) {
            Some("json") => PaletteDef::load(path)?.build(width),
            _ => Self::load_png(path),
        }
    }

    pub fn texture(&self) -> &Texture { &self.texture }
    pub fn width(&self) -> u32 { self.texture.width() }
    pub fn height(&self) -> u32 { self.texture.height() }

    /// Samples one row at horizontal coordinate `index`.
    pub fn sample(&self, sampler: &Sampler, index: f32, row: PaletteRow) -> Vec4 {
        sampler.sample(&self.texture, Vec2::new(index, row.v()))
    }

    /// Reads the three colors of `column` the way a nearest sampler sees them.
    pub fn entry(&self, column: u32) -> PaletteEntry {
        let u = (column.min(self.width() - 1) as f32 + 0.5) / self.width() as f32;
        let s = Sampler::NEAREST_CLAMP;
        PaletteEntry {
            background: self.sample(&s, u, PaletteRow::Background),
            foreground: self.sample(&s, u, PaletteRow::Foreground),
            accent: self.sample(&s, u, PaletteRow::Accent),
        }
    }
}

// ── PaletteDef (JSON) ─────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaletteDefEntry {
    pub background: String,
    pub foreground: String,
    pub accent: String,
}

/// A named palette as written by hand:
///
/// ```json
/// { "name": "dusk",
///   "entries": [ { "background": "#1a1c2c", "foreground": "#f4f4f4", "accent": "#ef7d57" } ] }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaletteDef {
    pub name: String,
    pub entries: Vec<PaletteDefEntry>,
}

impl PaletteDef {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn from_entries(name: impl Into<String>, entries: &[PaletteEntry]) -> Self {
        Self {
            name: name.into(),
            entries: entries
                .iter()
                .map(|e| PaletteDefEntry {
                    background: to_hex(e.background),
                    foreground: to_hex(e.foreground),
                    accent: to_hex(e.accent),
                })
                .collect(),
        }
    }

    pub fn to_entries(&self) -> Result<Vec<PaletteEntry>> {
        self.entries
            .iter()
            .map(|e| {
                Ok(PaletteEntry {
                    background: parse_hex(&e.background)?,
                    foreground: parse_hex(&e.foreground)?,
                    accent: parse_hex(&e.accent)?,
                })
            })
            .collect()
    }

    pub fn build(&self, width: u32) -> Result<Palette> {
        Palette::from_entries(&self.to_entries()?, width)
    }
}

// ── PaletteLibrary ────────────────────────────────────────────────────────────

/// Palette definitions found in a directory, keyed by name.
#[derive(Clone, Debug, Default)]
pub struct PaletteLibrary {
    root: PathBuf,
    defs: BTreeMap<String, PaletteDef>,
}

impl PaletteLibrary {
    /// Scan `path` recursively for `.json` palette definitions.
    ///
    /// Files that fail to parse are skipped with a warning.  When two files
    /// share a name, the first one found (in sorted path order) wins.
    pub fn load_folder(path: impl AsRef<Path>) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(RemapError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("palette directory {:?} does not exist", root),
            )));
        }

        let mut defs = BTreeMap::new();
        for entry in walkdir::WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let file_path = entry.path();
            if file_path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            match PaletteDef::load(file_path) {
                Ok(def) => {
                    if defs.contains_key(&def.name) {
                        warn!("palette: duplicate name '{}' from {:?}; skipping", def.name, file_path);
                        continue;
                    }
                    debug!("palette: found '{}' in {:?}", def.name, file_path);
                    defs.insert(def.name.clone(), def);
                }
                Err(e) => warn!("palette: failed to load {:?}: {e}", file_path),
            }
        }

        Ok(Self { root, defs })
    }

    pub fn get(&self, name: &str) -> Option<&PaletteDef> {
        self.defs.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.defs.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize { self.defs.len() }
    pub fn is_empty(&self) -> bool { self.defs.is_empty() }

    pub fn build(&self, name: &str, width: u32) -> Result<Palette> {
        self.get(name)
            .ok_or_else(|| RemapError::UnknownPalette { name: name.to_string(), dir: self.root.clone() })?
            .build(width)
    }
}
