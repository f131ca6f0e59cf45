// Strided gather of client streams into packed vertices.

use super::format::{AttributeSlot, VertexFormat, VertexLayout};
use super::stream::{Stream, VertexStreams};
use crate::error::{RasterError, Result};

/// Diffuse written when no colour stream is bound: opaque white.
pub const DEFAULT_DIFFUSE: u32 = 0xFFFF_FFFF;
/// Specular written when no specular stream is bound.
pub const DEFAULT_SPECULAR: u32 = 0;
/// Point size written when no point-size stream is bound.
pub const DEFAULT_POINT_SIZE: f32 = 1.0;

/// Gather every attribute of `format` from `streams` into `dst`.
///
/// Each vertex occupies `vertex_size` bytes; attributes land at their
/// [`VertexLayout`] sub-offsets. Returns the end offset of the written data,
/// `vertex_size * streams.vertex_count`.
pub fn pack_vertices(
    dst: &mut [u8],
    format: VertexFormat,
    vertex_size: usize,
    streams: &VertexStreams<'_>,
) -> Result<usize> {
    let count = streams.vertex_count;
    let layout = VertexLayout::new(format);
    if layout.size > vertex_size {
        return Err(RasterError::InvalidDescriptor(format!(
            "vertex size {} cannot hold format {:#x} ({} bytes)",
            vertex_size,
            format.bits(),
            layout.size
        )));
    }

    let end = vertex_size * count;
    if dst.len() < end {
        return Err(RasterError::stream_too_short("destination", end, dst.len()));
    }
    if count == 0 {
        return Ok(0);
    }

    if let Some(source) = interleaved_source(format, vertex_size, streams) {
        dst[..end].copy_from_slice(&source[..end]);
        return Ok(end);
    }

    let dst = &mut dst[..end];

    if let Some(slot) = layout.position {
        let position = streams.position.ok_or(RasterError::MissingInput("position"))?;
        gather(dst, vertex_size, slot, &position, "position", count)?;
    }
    if let Some(slot) = layout.weights {
        copy_or_fill(dst, vertex_size, slot, streams.weights, "weights", count, &[0; 20])?;
    }
    if let Some(slot) = layout.normal {
        copy_or_fill(dst, vertex_size, slot, streams.normal, "normal", count, &[0; 12])?;
    }
    if let Some(slot) = layout.point_size {
        let fill = DEFAULT_POINT_SIZE.to_le_bytes();
        copy_or_fill(dst, vertex_size, slot, streams.point_size, "point size", count, &fill)?;
    }
    if let Some(slot) = layout.diffuse {
        let fill = DEFAULT_DIFFUSE.to_le_bytes();
        copy_or_fill(dst, vertex_size, slot, streams.diffuse, "diffuse", count, &fill)?;
    }
    if let Some(slot) = layout.specular {
        let fill = DEFAULT_SPECULAR.to_le_bytes();
        copy_or_fill(dst, vertex_size, slot, streams.specular, "specular", count, &fill)?;
    }
    for (stage, &slot) in layout.tex_coords.iter().enumerate() {
        let source = streams.tex_coords[stage];
        copy_or_fill(dst, vertex_size, slot, source, "texcoord", count, &[0; 16])?;
    }

    Ok(end)
}

/// The whole batch when it is already laid out as standard 32-byte vertices.
fn interleaved_source<'a>(
    format: VertexFormat,
    vertex_size: usize,
    streams: &VertexStreams<'a>,
) -> Option<&'a [u8]> {
    if format != VertexFormat::VERTEX || vertex_size != 32 {
        return None;
    }
    let position = streams.position?;
    let normal = streams.normal?;
    let tex = streams.tex_coords[0]?;

    let base = position.data.as_ptr();
    let contiguous = position.stride == 32
        && normal.stride == 32
        && tex.stride == 32
        && normal.data.as_ptr() == base.wrapping_add(12)
        && tex.data.as_ptr() == base.wrapping_add(24)
        && position.data.len() >= 32 * streams.vertex_count;

    contiguous.then_some(position.data)
}

fn copy_or_fill(
    dst: &mut [u8],
    vertex_size: usize,
    slot: AttributeSlot,
    source: Option<Stream<'_>>,
    attribute: &'static str,
    count: usize,
    fill: &[u8],
) -> Result<()> {
    match source {
        Some(source) => gather(dst, vertex_size, slot, &source, attribute, count),
        None => {
            for vertex in dst.chunks_exact_mut(vertex_size).take(count) {
                vertex[slot.offset..slot.offset + slot.size].copy_from_slice(&fill[..slot.size]);
            }
            Ok(())
        }
    }
}

fn gather(
    dst: &mut [u8],
    vertex_size: usize,
    slot: AttributeSlot,
    source: &Stream<'_>,
    attribute: &'static str,
    count: usize,
) -> Result<()> {
    source.check(attribute, count, slot.size)?;
    for (i, vertex) in dst.chunks_exact_mut(vertex_size).take(count).enumerate() {
        vertex[slot.offset..slot.offset + slot.size].copy_from_slice(source.element(i, slot.size));
    }
    Ok(())
}
