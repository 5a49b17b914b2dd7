use std::path::PathBuf;

use glam::Vec4;

use palswap::color::parse_hex;
use palswap::palette::PALETTE_ROWS;
use palswap::{Palette, PaletteDef, PaletteEntry, PaletteLibrary, PaletteRow, RemapError, Texture};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("palswap-{}-{name}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn hex(s: &str) -> Vec4 {
    parse_hex(s).unwrap()
}

fn dusk() -> PaletteEntry {
    PaletteEntry { background: hex("#1a1c2c"), foreground: hex("#f4f4f4"), accent: hex("#ef7d57") }
}

fn moss() -> PaletteEntry {
    PaletteEntry { background: hex("#38b764"), foreground: hex("#257179"), accent: hex("#ffcd75") }
}

const DUSK_JSON: &str = r##"{
    "name": "dusk",
    "entries": [
        { "background": "#1a1c2c", "foreground": "#f4f4f4", "accent": "#ef7d57" },
        { "background": "#38b764", "foreground": "#257179", "accent": "#ffcd75" }
    ]
}"##;

// ── Layout ────────────────────────────────────────────────────────────────────

#[test]
fn from_entries_lays_out_one_column_per_entry() {
    let palette = Palette::from_entries(&[dusk(), moss()], 2).unwrap();
    assert_eq!((palette.width(), palette.height()), (2, PALETTE_ROWS));

    let t = palette.texture();
    assert_eq!(t.texel(0, 0), dusk().background);
    assert_eq!(t.texel(0, 1), dusk().foreground);
    assert_eq!(t.texel(0, 2), dusk().accent);
    assert_eq!(t.texel(1, 1), moss().foreground);
}

#[test]
fn last_row_repeats_accent() {
    let palette = Palette::from_entries(&[dusk()], 1).unwrap();
    assert_eq!(palette.texture().texel(0, 3), dusk().accent);
}

#[test]
fn extra_columns_repeat_last_entry() {
    let palette = Palette::from_entries(&[dusk(), moss()], 8).unwrap();
    assert_eq!(palette.width(), 8);
    assert_eq!(palette.entry(7), moss());
}

#[test]
fn entry_reads_back_what_was_laid_out() {
    let palette = Palette::from_entries(&[dusk(), moss()], 32).unwrap();
    assert_eq!(palette.entry(0), dusk());
    assert_eq!(palette.entry(1), moss());
    for row in PaletteRow::ALL {
        assert_eq!(palette.entry(0).get(row), dusk().get(row));
    }
}

#[test]
fn empty_entries_are_rejected() {
    assert!(matches!(Palette::from_entries(&[], 4), Err(RemapError::InvalidPalette(_))));
}

#[test]
fn too_narrow_width_is_rejected() {
    assert!(matches!(Palette::from_entries(&[dusk(), moss()], 1), Err(RemapError::InvalidPalette(_))));
}

#[test]
fn empty_texture_is_rejected() {
    let t = Texture::new(0, 4, Vec4::ZERO);
    assert!(matches!(Palette::from_texture(t), Err(RemapError::InvalidPalette(_))));
}

#[test]
fn any_height_is_accepted() {
    let t = Texture::new(3, 8, Vec4::ONE);
    assert_eq!(Palette::from_texture(t).unwrap().height(), 8);
}

#[test]
fn png_save_and_load_keeps_colors() {
    let dir = scratch_dir("png");
    let path = dir.join("palette.png");
    let palette = Palette::from_entries(&[dusk(), moss()], 4).unwrap();
    palette.save_png(&path).unwrap();

    let loaded = Palette::load_png(&path).unwrap();
    assert_eq!(loaded.width(), 4);
    assert_eq!(loaded.entry(0), dusk());
    assert_eq!(loaded.entry(1), moss());
}

// ── JSON definitions ──────────────────────────────────────────────────────────

#[test]
fn definition_parses_and_builds() {
    let def: PaletteDef = serde_json::from_str(DUSK_JSON).unwrap();
    assert_eq!(def.name, "dusk");
    assert_eq!(def.to_entries().unwrap(), vec![dusk(), moss()]);

    let palette = def.build(32).unwrap();
    assert_eq!(palette.width(), 32);
    assert_eq!(palette.entry(1), moss());
}

#[test]
fn definition_with_bad_color_fails() {
    let def: PaletteDef = serde_json::from_str(
        r##"{ "name": "x", "entries": [ { "background": "#12", "foreground": "#000000", "accent": "#000000" } ] }"##,
    )
    .unwrap();
    assert!(matches!(def.to_entries(), Err(RemapError::InvalidColor(_))));
}

#[test]
fn definition_from_entries_uses_hex() {
    let def = PaletteDef::from_entries("dusk", &[dusk()]);
    assert_eq!(def.entries[0].background, "#1a1c2cff");
    assert_eq!(def.to_entries().unwrap(), vec![dusk()]);
}

// ── Loading by path ───────────────────────────────────────────────────────────

#[test]
fn load_reads_png_palettes() {
    let dir = scratch_dir("load-png");
    let path = dir.join("dusk.png");
    Palette::from_entries(&[dusk(), moss()], 2).unwrap().save_png(&path).unwrap();

    let palette = Palette::load(&path, None, 32).unwrap();
    assert_eq!(palette.width(), 2);
    assert_eq!(palette.entry(1), moss());
}

#[test]
fn load_builds_json_definitions_at_the_given_width() {
    let dir = scratch_dir("load-json");
    let path = dir.join("dusk.json");
    std::fs::write(&path, DUSK_JSON).unwrap();

    let palette = Palette::load(&path, None, 16).unwrap();
    assert_eq!(palette.width(), 16);
    assert_eq!(palette.entry(0), dusk());
}

#[test]
fn load_picks_named_palette_from_directory() {
    let dir = scratch_dir("load-dir");
    std::fs::write(dir.join("dusk.json"), DUSK_JSON).unwrap();

    let palette = Palette::load(&dir, Some("dusk"), 8).unwrap();
    assert_eq!(palette.entry(1), moss());
    assert!(matches!(Palette::load(&dir, Some("mono"), 8), Err(RemapError::UnknownPalette { .. })));
}

#[test]
fn load_from_directory_needs_a_name() {
    let dir = scratch_dir("load-dir-unnamed");
    std::fs::write(dir.join("dusk.json"), DUSK_JSON).unwrap();
    assert!(matches!(Palette::load(&dir, None, 8), Err(RemapError::InvalidPalette(_))));
}

#[test]
fn load_reports_missing_files() {
    let dir = scratch_dir("load-missing");
    assert!(Palette::load(dir.join("nope.png"), None, 8).is_err());
    assert!(Palette::load(dir.join("nope.json"), None, 8).is_err());
}

// ── Library ───────────────────────────────────────────────────────────────────

#[test]
fn library_finds_definitions_recursively() {
    let dir = scratch_dir("library");
    std::fs::write(dir.join("dusk.json"), DUSK_JSON).unwrap();
    std::fs::create_dir_all(dir.join("nested")).unwrap();
    std::fs::write(
        dir.join("nested/mono.json"),
        r##"{ "name": "mono", "entries": [ { "background": "#000000", "foreground": "#ffffff", "accent": "#808080" } ] }"##,
    )
    .unwrap();
    std::fs::write(dir.join("notes.txt"), "not a palette").unwrap();
    std::fs::write(dir.join("broken.json"), "{ nope").unwrap();

    let library = PaletteLibrary::load_folder(&dir).unwrap();
    assert_eq!(library.len(), 2);
    assert_eq!(library.names().collect::<Vec<_>>(), vec!["dusk", "mono"]);
    assert_eq!(library.build("mono", 4).unwrap().entry(0).accent, hex("#808080"));
}

#[test]
fn library_keeps_first_of_duplicate_names() {
    let dir = scratch_dir("dupes");
    std::fs::write(dir.join("a.json"), DUSK_JSON).unwrap();
    std::fs::write(
        dir.join("b.json"),
        r##"{ "name": "dusk", "entries": [ { "background": "#ffffff", "foreground": "#ffffff", "accent": "#ffffff" } ] }"##,
    )
    .unwrap();

    let library = PaletteLibrary::load_folder(&dir).unwrap();
    assert_eq!(library.len(), 1);
    assert_eq!(library.get("dusk").unwrap().entries.len(), 2);
}

#[test]
fn library_reports_unknown_palette() {
    let dir = scratch_dir("unknown");
    let library = PaletteLibrary::load_folder(&dir).unwrap();
    assert!(library.is_empty());
    assert!(matches!(library.build("dusk", 4), Err(RemapError::UnknownPalette { .. })));
}

#[test]
fn library_rejects_missing_directory() {
    let dir = std::env::temp_dir().join(format!("palswap-{}-missing-dir", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    assert!(PaletteLibrary::load_folder(&dir).is_err());
}
