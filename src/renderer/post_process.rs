use image::RgbaImage;
use wgpu::util::DeviceExt;

use crate::config::RemapConfig;
use crate::error::{RemapError, Result};
use crate::palette::Palette;
use crate::texture::{AddressMode, FilterMode, Sampler};

// ── PostProcessEffect ─────────────────────────────────────────────────────────

pub trait PostProcessEffect {
    /// Unique name used to identify the effect type (e.g. "palette_remap").
    fn effect_name(&self) -> &'static str;

    fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        source_view: &wgpu::TextureView,
        target_view: &wgpu::TextureView,
    );

    fn resize(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, width: u32, height: u32);
}

// ── PostProcessStack ──────────────────────────────────────────────────────────

pub struct PostProcessStack {
    effects: Vec<Box<dyn PostProcessEffect>>,
    /// Ping-pong textures for chaining multiple effects.
    textures: [wgpu::Texture; 2],
    views: [wgpu::TextureView; 2],
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
}

impl PostProcessStack {
    pub fn new(device: &wgpu::Device, width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        let (texture_a, view_a) = create_intermediate_texture(device, width, height, format, "post_process_a");
        let (texture_b, view_b) = create_intermediate_texture(device, width, height, format, "post_process_b");

        Self {
            effects: Vec::new(),
            textures: [texture_a, texture_b],
            views: [view_a, view_b],
            format,
            width,
            height,
        }
    }

    /// Add an effect, replacing any existing effect with the same name.
    pub fn add_effect(&mut self, effect: Box<dyn PostProcessEffect>) {
        let name = effect.effect_name();
        self.effects.retain(|e| e.effect_name() != name);
        self.effects.push(effect);
    }

    /// Remove the effect with the given name, if present.
    pub fn remove_effect(&mut self, name: &str) {
        self.effects.retain(|e| e.effect_name() != name);
    }

    pub fn clear_effects(&mut self) {
        self.effects.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn effect_names(&self) -> Vec<&'static str> {
        self.effects.iter().map(|e| e.effect_name()).collect()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn resize(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, width: u32, height: u32) {
        if width == 0 || height == 0 { return; }

        self.width = width;
        self.height = height;

        let (texture_a, view_a) = create_intermediate_texture(device, width, height, self.format, "post_process_a");
        let (texture_b, view_b) = create_intermediate_texture(device, width, height, self.format, "post_process_b");
        self.textures = [texture_a, texture_b];
        self.views = [view_a, view_b];

        for effect in &mut self.effects {
            effect.resize(device, queue, width, height);
        }
    }

    /// The view that the scene should render into.
    pub fn main_render_target(&self) -> &wgpu::TextureView {
        &self.views[0]
    }

    /// Copies an RGBA8 image into the main render target in place of a
    /// scene pass.
    pub fn upload_scene(&self, queue: &wgpu::Queue, image: &RgbaImage) -> Result<()> {
        if !matches!(self.format, wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb) {
            return Err(RemapError::gpu(format!("cannot upload RGBA8 pixels into a {:?} target", self.format)));
        }
        let (w, h) = image.dimensions();
        if (w, h) != (self.width, self.height) {
            return Err(RemapError::gpu(format!(
                "scene is {w}x{h} but the post-process targets are {}x{}",
                self.width, self.height
            )));
        }

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.textures[0],
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * w),
                rows_per_image: Some(h),
            },
            wgpu::Extent3d { width: w, height: h, depth_or_array_layers: 1 },
        );
        Ok(())
    }

    pub fn run(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        final_target_view: &wgpu::TextureView,
    ) {
        if self.effects.is_empty() {
            return;
        }

        let n = self.effects.len();
        let views = &self.views;
        let mut source = 0usize;

        for (i, effect) in self.effects.iter_mut().enumerate() {
            let is_last = i == n - 1;
            let target = if is_last { final_target_view } else { &views[1 - source] };

            effect.render(device, queue, encoder, &views[source], target);

            // Only flip the ping-pong for the next (non-last) effect.
            if !is_last {
                source = 1 - source;
            }
        }
    }
}

fn create_intermediate_texture(
    device: &wgpu::Device,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    label: &str,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

// ── Fullscreen Quad Helper ──────────────────────────────────────────────────

pub fn create_fullscreen_pipeline(
    device: &wgpu::Device,
    label: &str,
    shader_source: &str,
    bind_group_layouts: &[&wgpu::BindGroupLayout],
    output_format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(shader_source.into()),
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("{}_layout", label)),
        bind_group_layouts,
        ..Default::default()
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: output_format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

// ── Common Shader Utils ─────────────────────────────────────────────────────

/// Fullscreen triangle pair.  uv (0, 0) is the top-left of the target, so
/// texture row 0 lands on the first output row.
pub const FULLSCREEN_VS: &str = "
struct VertexOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(@builtin(vertex_index) vi: u32) -> VertexOut {
    var positions = array<vec2<f32>, 6>(
        vec2<f32>(-1.0,  1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
        vec2<f32>( 1.0,  1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0, -1.0),
    );
    var uvs = array<vec2<f32>, 6>(
        vec2<f32>(0.0, 0.0),
        vec2<f32>(0.0, 1.0),
        vec2<f32>(1.0, 0.0),
        vec2<f32>(1.0, 0.0),
        vec2<f32>(0.0, 1.0),
        vec2<f32>(1.0, 1.0),
    );
    var out: VertexOut;
    out.pos = vec4<f32>(positions[vi], 0.0, 1.0);
    out.uv  = uvs[vi];
    return out;
}
";

fn texture_sampler_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

fn address_mode(mode: AddressMode) -> wgpu::AddressMode {
    match mode {
        AddressMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        AddressMode::Repeat => wgpu::AddressMode::Repeat,
        AddressMode::MirrorRepeat => wgpu::AddressMode::MirrorRepeat,
    }
}

fn filter_mode(mode: FilterMode) -> wgpu::FilterMode {
    match mode {
        FilterMode::Nearest => wgpu::FilterMode::Nearest,
        FilterMode::Linear => wgpu::FilterMode::Linear,
    }
}

fn create_sampler(device: &wgpu::Device, label: &str, sampler: Sampler) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: address_mode(sampler.address_u),
        address_mode_v: address_mode(sampler.address_v),
        mag_filter: filter_mode(sampler.filter),
        min_filter: filter_mode(sampler.filter),
        ..Default::default()
    })
}

// ── PaletteRemapEffect ──────────────────────────────────────────────────────

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct RemapUniforms {
    tint: [f32; 4],
}

pub struct PaletteRemapEffect {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    palette_bind_group: wgpu::BindGroup,
    uniform_bind_group: wgpu::BindGroup,
    cached_bg: Option<wgpu::BindGroup>,
    last_source: usize,
}

impl PaletteRemapEffect {
    pub const NAME: &'static str = "palette_remap";

    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        palette: &Palette,
        config: &RemapConfig,
    ) -> Self {
        let bgl = texture_sampler_layout(device, "palette_remap_source_bgl");
        let palette_bgl = texture_sampler_layout(device, "palette_remap_palette_bgl");

        let u_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("palette_remap_uniform_bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let shader = format!("{}\n{}", FULLSCREEN_VS, include_str!("shaders/palette_remap.wgsl"));

        // Unblended: the remapped color replaces the target pixel as is.
        let pipeline = create_fullscreen_pipeline(
            device,
            "palette_remap",
            &shader,
            &[&bgl, &palette_bgl, &u_bgl],
            format,
            None,
        );

        let sampler = create_sampler(device, "palette_remap_source_sampler", config.source_sampler);
        let palette_sampler = create_sampler(device, "palette_remap_palette_sampler", config.palette_sampler);

        let palette_view = upload_palette(device, queue, palette);
        let palette_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("palette_remap_palette_bg"),
            layout: &palette_bgl,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(&palette_view) },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(&palette_sampler) },
            ],
        });

        let uniforms = RemapUniforms { tint: config.tint };
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("palette_remap_uniform"),
            contents: bytemuck::cast_slice(&[uniforms]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("palette_remap_uniform_bg"),
            layout: &u_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Self {
            pipeline,
            bind_group_layout: bgl,
            sampler,
            palette_bind_group,
            uniform_bind_group,
            cached_bg: None,
            last_source: 0,
        }
    }
}

/// Uploads the palette as an `Rgba8Unorm` texture (no sRGB decode, so the
/// shader sees the same values as the CPU path).
fn upload_palette(device: &wgpu::Device, queue: &wgpu::Queue, palette: &Palette) -> wgpu::TextureView {
    let img = palette.texture().to_rgba8();
    let (width, height) = img.dimensions();

    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some("palette"),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        &img,
    );
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

impl PostProcessEffect for PaletteRemapEffect {
    fn effect_name(&self) -> &'static str { Self::NAME }

    fn render(&mut self, device: &wgpu::Device, _queue: &wgpu::Queue, encoder: &mut wgpu::CommandEncoder, source_view: &wgpu::TextureView, target_view: &wgpu::TextureView) {
        let src_addr = source_view as *const _ as usize;
        if self.cached_bg.is_none() || self.last_source != src_addr {
            self.cached_bg = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
                layout: &self.bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(source_view) },
                    wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(&self.sampler) },
                ],
                label: Some("palette_remap_source_bg"),
            }));
            self.last_source = src_addr;
        }
        let Some(bind_group) = self.cached_bg.as_ref() else { return };

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("palette_remap_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.set_bind_group(1, &self.palette_bind_group, &[]);
        pass.set_bind_group(2, &self.uniform_bind_group, &[]);
        pass.draw(0..6, 0..1);
    }

    fn resize(&mut self, _device: &wgpu::Device, _queue: &wgpu::Queue, _width: u32, _height: u32) {
        self.cached_bg = None; // Invalidate: texture views are recreated on resize.
    }
}
