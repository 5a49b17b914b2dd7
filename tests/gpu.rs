// GPU tests need an adapter.  On machines without one they log and return.

use glam::Vec4;
use image::{Rgba, RgbaImage};

use palswap::color::{encode_palette_index, from_rgba8, to_rgba8};
use palswap::renderer::post_process::{PaletteRemapEffect, PostProcessStack};
use palswap::renderer::{GpuContext, GpuRemapper, TEXTURE_FORMAT};
use palswap::{Palette, PaletteEntry, PaletteRemap, RemapConfig};

fn context() -> Option<GpuContext> {
    match GpuContext::new_blocking() {
        Ok(ctx) => Some(ctx),
        Err(e) => {
            eprintln!("skipping GPU test: {e}");
            None
        }
    }
}

fn palette(seed: u8) -> Palette {
    let entries: Vec<PaletteEntry> = (0..8u8)
        .map(|i| PaletteEntry {
            background: from_rgba8([i * 30, seed, 40, 255]),
            foreground: from_rgba8([200, i * 20, seed, 255]),
            accent: from_rgba8([seed, 90, i * 25, 128]),
        })
        .collect();
    Palette::from_entries(&entries, 8).unwrap()
}

/// Odd width so the readback has row padding to strip.
fn source(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let index = to_rgba8(Vec4::splat(encode_palette_index((x + 3 * y) % 8, 8)))[0];
        Rgba([(x * 7 % 256) as u8, (y * 53 % 256) as u8, index, 255])
    })
}

fn assert_close(gpu: &RgbaImage, cpu: &RgbaImage) {
    assert_eq!(gpu.dimensions(), cpu.dimensions());
    for (x, y, g) in gpu.enumerate_pixels() {
        let c = cpu.get_pixel(x, y);
        for ch in 0..4 {
            let diff = (g.0[ch] as i16 - c.0[ch] as i16).abs();
            assert!(diff <= 1, "pixel ({x}, {y}) channel {ch}: gpu {:?} cpu {:?}", g.0, c.0);
        }
    }
}

#[test]
fn gpu_matches_cpu() {
    let Some(ctx) = context() else { return };
    let config = RemapConfig::default();
    let src = source(37, 5);

    let mut gpu = GpuRemapper::new(ctx, &palette(11), &config);
    let out = gpu.remap_image(&src).unwrap();
    let expected = PaletteRemap::from_config(palette(11), &config).apply_rgba8(&src);
    assert_close(&out, &expected);
}

#[test]
fn gpu_handles_resize_and_palette_swap() {
    let Some(ctx) = context() else { return };
    let config = RemapConfig::default();
    let mut gpu = GpuRemapper::new(ctx, &palette(11), &config);

    let small = source(3, 2);
    assert_close(&gpu.remap_image(&small).unwrap(), &PaletteRemap::new(palette(11)).apply_rgba8(&small));

    gpu.set_palette(&palette(99));
    let large = source(70, 33);
    assert_close(&gpu.remap_image(&large).unwrap(), &PaletteRemap::new(palette(99)).apply_rgba8(&large));
}

#[test]
fn gpu_empty_image_is_empty() {
    let Some(ctx) = context() else { return };
    let mut gpu = GpuRemapper::new(ctx, &palette(1), &RemapConfig::default());
    assert_eq!(gpu.remap_image(&RgbaImage::new(0, 0)).unwrap().dimensions(), (0, 0));
}

#[test]
fn stack_replaces_effects_by_name() {
    let Some(ctx) = context() else { return };
    let config = RemapConfig::default();
    let mut stack = PostProcessStack::new(&ctx.device, 4, 4, TEXTURE_FORMAT);
    assert!(stack.is_empty());

    for seed in [1, 2] {
        let effect = PaletteRemapEffect::new(&ctx.device, &ctx.queue, TEXTURE_FORMAT, &palette(seed), &config);
        stack.add_effect(Box::new(effect));
    }
    assert_eq!(stack.len(), 1);
    assert_eq!(stack.effect_names(), vec![PaletteRemapEffect::NAME]);

    stack.remove_effect(PaletteRemapEffect::NAME);
    assert!(stack.is_empty());
}

#[test]
fn upload_rejects_mismatched_scene() {
    let Some(ctx) = context() else { return };
    let stack = PostProcessStack::new(&ctx.device, 4, 4, TEXTURE_FORMAT);
    assert!(stack.upload_scene(&ctx.queue, &RgbaImage::new(5, 4)).is_err());
}
