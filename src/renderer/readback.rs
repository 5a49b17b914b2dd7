// ── Texture readback ──────────────────────────────────────────────────────────
//
// GPU copies pad every row to COPY_BYTES_PER_ROW_ALIGNMENT (256 bytes).  The
// helper below strips that padding so callers get a tight `width * 4` stride.

use std::sync::mpsc;

use crate::error::{RemapError, Result};

/// Rounds `value` up to WebGPU's copy row alignment.
pub fn align_bytes_per_row(value: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    value.div_ceil(align) * align
}

/// Reads an RGBA8 texture back into a tightly packed buffer.
pub fn read_texture_tight(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    src: &wgpu::Texture,
    size: (u32, u32),
) -> Result<Vec<u8>> {
    let (width, height) = size;
    if width == 0 || height == 0 {
        return Err(RemapError::gpu("readback size must be positive"));
    }
    if src.sample_count() != 1 {
        return Err(RemapError::gpu(format!(
            "readback requires a single-sample texture, got {} samples",
            src.sample_count()
        )));
    }
    if !matches!(src.format(), wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb) {
        return Err(RemapError::gpu(format!("readback only supports RGBA8, got {:?}", src.format())));
    }

    let tight_bpr = 4 * width;
    let padded_bpr = align_bytes_per_row(tight_bpr);
    let buffer_size = padded_bpr as wgpu::BufferAddress * height as wgpu::BufferAddress;

    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("readback_staging"),
        size: buffer_size,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("readback_encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture: src,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &staging,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_bpr),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let slice = staging.slice(..);
    let (sender, receiver) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });
    device
        .poll(wgpu::PollType::wait_indefinitely())
        .map_err(RemapError::gpu)?;

    receiver
        .recv()
        .map_err(|_| RemapError::gpu("map_async callback channel dropped"))?
        .map_err(RemapError::gpu)?;

    let data = slice.get_mapped_range();
    let mut tight = vec![0u8; (tight_bpr * height) as usize];

    // Depad rows: copy tight_bpr bytes from each padded row.
    for (dst, src) in tight
        .chunks_exact_mut(tight_bpr as usize)
        .zip(data.chunks_exact(padded_bpr as usize))
    {
        dst.copy_from_slice(&src[..tight_bpr as usize]);
    }
    drop(data);
    staging.unmap();

    Ok(tight)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligned_rows_are_unchanged() {
        assert_eq!(align_bytes_per_row(256), 256);
        assert_eq!(align_bytes_per_row(1024), 1024);
    }

    #[test]
    fn odd_rows_round_up() {
        assert_eq!(align_bytes_per_row(4), 256);
        assert_eq!(align_bytes_per_row(4 * 65), 512);
    }
}
