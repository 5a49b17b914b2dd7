use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use palswap::renderer::{GpuContext, GpuRemapper};
use palswap::{Backend, Palette, PaletteDef, PaletteLibrary, PaletteRemap, RemapConfig};

#[derive(Parser)]
#[command(version, about = "Recolor palette-indexed sprites with a three-row palette image")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply a palette to a source image.
    Remap {
        /// Source PNG: red = foreground weight, green = accent weight, blue = palette index.
        #[arg(long, value_name = "PATH")]
        source: PathBuf,

        /// Palette PNG, palette JSON definition, or a directory of definitions.
        #[arg(long, value_name = "PATH")]
        palette: PathBuf,

        /// Palette to pick when --palette is a directory.
        #[arg(long, value_name = "NAME")]
        palette_name: Option<String>,

        /// Output PNG.
        #[arg(long, value_name = "PATH")]
        output: PathBuf,

        /// JSON config (samplers, tint, backend).
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Run on the GPU regardless of the configured backend.
        #[arg(long, default_value_t = false)]
        gpu: bool,
    },
    /// Build a palette PNG from a JSON definition.
    Palette {
        #[arg(long, value_name = "PATH")]
        definition: PathBuf,

        #[arg(long, value_name = "PATH")]
        output: PathBuf,

        /// Palette columns (defaults to the config default, 32).
        #[arg(long)]
        width: Option<u32>,
    },
    /// List palette definitions found in a directory.
    Palettes {
        #[arg(long, value_name = "PATH")]
        dir: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match args.command {
        Command::Remap { source, palette, palette_name, output, config, gpu } => {
            let mut config = match config {
                Some(path) => RemapConfig::load(&path).with_context(|| format!("could not load config {:?}", path))?,
                None => RemapConfig::default(),
            };
            if gpu {
                config.backend = Backend::Gpu;
            }

            let palette = Palette::load(&palette, palette_name.as_deref(), config.palette_width)
                .with_context(|| format!("could not load palette {:?}", palette))?;
            let image = image::open(&source)
                .with_context(|| format!("could not open source {:?}", source))?
                .to_rgba8();
            info!("remap: {:?} ({}x{}) on {:?}", source, image.width(), image.height(), config.backend);

            let remapped = match config.backend {
                Backend::Cpu => PaletteRemap::from_config(palette, &config).apply_rgba8(&image),
                Backend::Gpu => {
                    let ctx = GpuContext::new_blocking().context("could not create GPU context")?;
                    GpuRemapper::new(ctx, &palette, &config).remap_image(&image)?
                }
            };

            remapped.save(&output).with_context(|| format!("could not write {:?}", output))?;
            info!("remap: wrote {:?}", output);
        }
        Command::Palette { definition, output, width } => {
            let def = PaletteDef::load(&definition)
                .with_context(|| format!("could not load palette definition {:?}", definition))?;
            let width = width.unwrap_or(RemapConfig::default().palette_width);
            def.build(width)?.save_png(&output)?;
            info!("palette: wrote '{}' ({} entries, {width} columns) to {:?}", def.name, def.entries.len(), output);
        }
        Command::Palettes { dir } => {
            let library = PaletteLibrary::load_folder(&dir)?;
            for name in library.names() {
                println!("{name}");
            }
        }
    }

    Ok(())
}
