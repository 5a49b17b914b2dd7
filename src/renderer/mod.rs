pub mod post_process;
pub mod readback;

use image::RgbaImage;
use log::{debug, info};

use crate::config::RemapConfig;
use crate::error::{RemapError, Result};
use crate::palette::Palette;

use post_process::{PaletteRemapEffect, PostProcessStack};
use readback::read_texture_tight;

/// Format of every texture the remapper touches.  Plain unorm, not sRGB, so
/// the GPU sees the stored bytes exactly like the CPU path does.
pub const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

// ── GpuContext ────────────────────────────────────────────────────────────────

/// Headless device and queue.
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GpuContext {
    pub async fn new() -> Result<Self> {
        let instance = wgpu::Instance::default();

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                compatible_surface: None,
                ..Default::default()
            })
            .await
            .map_err(RemapError::gpu)?;
        info!("gpu: using adapter '{}' ({:?})", adapter.get_info().name, adapter.get_info().backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("palswap_device"),
                ..Default::default()
            })
            .await
            .map_err(RemapError::gpu)?;

        Ok(Self { device, queue })
    }

    /// Blocks on [`GpuContext::new`].
    pub fn new_blocking() -> Result<Self> {
        pollster::block_on(Self::new())
    }
}

// ── GpuRemapper ───────────────────────────────────────────────────────────────

/// Runs the palette remap as a post-process pass and reads the result back.
pub struct GpuRemapper {
    ctx: GpuContext,
    config: RemapConfig,
    stack: PostProcessStack,
    output: wgpu::Texture,
    output_view: wgpu::TextureView,
}

impl GpuRemapper {
    pub fn new(ctx: GpuContext, palette: &Palette, config: &RemapConfig) -> Self {
        let effect = PaletteRemapEffect::new(&ctx.device, &ctx.queue, TEXTURE_FORMAT, palette, config);
        let mut stack = PostProcessStack::new(&ctx.device, 1, 1, TEXTURE_FORMAT);
        stack.add_effect(Box::new(effect));
        let (output, output_view) = create_output_texture(&ctx.device, 1, 1);

        Self { ctx, config: config.clone(), stack, output, output_view }
    }

    /// Swaps the palette.  The pass is rebuilt; same-name replacement in the
    /// stack drops the old one.
    pub fn set_palette(&mut self, palette: &Palette) {
        let effect = PaletteRemapEffect::new(&self.ctx.device, &self.ctx.queue, TEXTURE_FORMAT, palette, &self.config);
        self.stack.add_effect(Box::new(effect));
    }

    /// Remaps `source` on the GPU.  Output has the source's dimensions.
    pub fn remap_image(&mut self, source: &RgbaImage) -> Result<RgbaImage> {
        let (w, h) = source.dimensions();
        if w == 0 || h == 0 {
            return Ok(RgbaImage::new(w, h));
        }
        let max = self.ctx.device.limits().max_texture_dimension_2d;
        if w > max || h > max {
            return Err(RemapError::gpu(format!("{w}x{h} exceeds the device texture limit of {max}")));
        }

        if self.stack.size() != (w, h) {
            debug!("gpu: resizing targets to {w}x{h}");
            self.stack.resize(&self.ctx.device, &self.ctx.queue, w, h);
            let (output, output_view) = create_output_texture(&self.ctx.device, w, h);
            self.output = output;
            self.output_view = output_view;
        }

        self.stack.upload_scene(&self.ctx.queue, source)?;

        let mut encoder = self.ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("palette_remap_encoder"),
        });
        self.stack.run(&self.ctx.device, &self.ctx.queue, &mut encoder, &self.output_view);
        self.ctx.queue.submit(std::iter::once(encoder.finish()));

        let pixels = read_texture_tight(&self.ctx.device, &self.ctx.queue, &self.output, (w, h))?;
        RgbaImage::from_raw(w, h, pixels).ok_or_else(|| RemapError::gpu("readback returned a short buffer"))
    }
}

fn create_output_texture(device: &wgpu::Device, width: u32, height: u32) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("palette_remap_output"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TEXTURE_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}
