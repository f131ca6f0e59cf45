// Strided attribute streams
//
// A stream is a borrowed byte slice plus the distance between consecutive
// elements. Client arrays, interleaved buffers and packed vertex buffers are
// all read through the same type.

use super::format::{AttributeSlot, VertexFormat, VertexLayout, MAX_STAGES};
use crate::error::{RasterError, Result};
use bytemuck::Pod;

/// Borrowed strided view over one vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stream<'a> {
    pub data: &'a [u8],
    /// Bytes between consecutive elements. 0 repeats the first element.
    pub stride: usize,
}

impl<'a> Stream<'a> {
    pub fn new(data: &'a [u8], stride: usize) -> Self {
        Self { data, stride }
    }

    /// Tightly packed stream over a typed slice.
    pub fn from_slice<T: Pod>(items: &'a [T]) -> Self {
        Self {
            data: bytemuck::cast_slice(items),
            stride: std::mem::size_of::<T>(),
        }
    }

    /// View starting `offset` bytes into this stream, same stride.
    pub fn offset(self, offset: usize) -> Self {
        Self {
            data: self.data.get(offset..).unwrap_or(&[]),
            stride: self.stride,
        }
    }

    /// Bytes needed to read `count` elements of `size` bytes.
    pub fn required_len(&self, count: usize, size: usize) -> usize {
        match count {
            0 => 0,
            n => (n - 1) * self.stride + size,
        }
    }

    pub fn check(&self, attribute: &'static str, count: usize, size: usize) -> Result<()> {
        let required = self.required_len(count, size);
        if self.data.len() < required {
            return Err(RasterError::stream_too_short(attribute, required, self.data.len()));
        }
        Ok(())
    }

    /// Raw bytes of element `index`. The stream must have been checked.
    pub fn element(&self, index: usize, size: usize) -> &'a [u8] {
        let start = index * self.stride;
        &self.data[start..start + size]
    }

    /// Read element `index` as `T`, regardless of alignment.
    pub fn read<T: Pod>(&self, index: usize) -> T {
        bytemuck::pod_read_unaligned(self.element(index, std::mem::size_of::<T>()))
    }
}

/// Strided sources for every attribute of one draw call.
///
/// Absent streams are filled with defaults when packing.
#[derive(Debug, Clone, Default)]
pub struct VertexStreams<'a> {
    pub vertex_count: usize,
    pub position: Option<Stream<'a>>,
    pub weights: Option<Stream<'a>>,
    pub normal: Option<Stream<'a>>,
    pub point_size: Option<Stream<'a>>,
    pub diffuse: Option<Stream<'a>>,
    pub specular: Option<Stream<'a>>,
    pub tex_coords: [Option<Stream<'a>>; MAX_STAGES],
}

impl<'a> VertexStreams<'a> {
    pub fn new(vertex_count: usize) -> Self {
        Self {
            vertex_count,
            ..Self::default()
        }
    }
}

/// Describe a packed buffer as strided streams.
///
/// Every attribute present in `format` gets a stream of stride
/// `vertex_size` starting at its sub-offset; the others stay `None`.
pub fn unpack_layout(
    packed: &[u8],
    format: VertexFormat,
    vertex_size: usize,
    count: usize,
) -> Result<VertexStreams<'_>> {
    let layout = VertexLayout::new(format);
    if layout.size > vertex_size {
        return Err(RasterError::InvalidDescriptor(format!(
            "vertex size {} is smaller than format {:#x} ({} bytes)",
            vertex_size,
            format.bits(),
            layout.size
        )));
    }
    let required = vertex_size * count;
    if packed.len() < required {
        return Err(RasterError::stream_too_short("packed", required, packed.len()));
    }

    let whole = Stream::new(packed, vertex_size);
    let at = |slot: Option<AttributeSlot>| slot.map(|s| whole.offset(s.offset));

    let mut streams = VertexStreams::new(count);
    streams.position = at(layout.position);
    streams.weights = at(layout.weights);
    streams.normal = at(layout.normal);
    streams.point_size = at(layout.point_size);
    streams.diffuse = at(layout.diffuse);
    streams.specular = at(layout.specular);
    for (stage, slot) in layout.tex_coords.iter().enumerate() {
        streams.tex_coords[stage] = Some(whole.offset(slot.offset));
    }
    Ok(streams)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_stride_repeats_first_element() {
        let colour = [0x11223344u32];
        let stream = Stream::new(bytemuck::cast_slice(&colour), 0);
        assert!(stream.check("diffuse", 100, 4).is_ok());
        assert_eq!(stream.read::<u32>(57), 0x11223344);
    }

    #[test]
    fn short_stream_reports_lengths() {
        let data = [0u8; 30];
        let stream = Stream::new(&data, 12);
        assert_eq!(
            stream.check("normal", 3, 12),
            Err(RasterError::stream_too_short("normal", 36, 30))
        );
        assert!(stream.check("normal", 2, 12).is_ok());
    }

    #[test]
    fn unaligned_reads() {
        let data: Vec<u8> = (0..16).collect();
        let stream = Stream::new(&data[1..], 4);
        let value: [u8; 4] = stream.read(1);
        assert_eq!(value, [5, 6, 7, 8]);
    }

    #[test]
    fn unpack_places_attributes_at_sub_offsets() {
        let packed = vec![0u8; 32 * 4];
        let streams = unpack_layout(&packed, VertexFormat::VERTEX, 32, 4).unwrap();
        let base = packed.as_ptr();
        assert_eq!(streams.position.unwrap().data.as_ptr(), base);
        assert_eq!(streams.normal.unwrap().data.as_ptr(), base.wrapping_add(12));
        assert_eq!(streams.tex_coords[0].unwrap().data.as_ptr(), base.wrapping_add(24));
        assert!(streams.diffuse.is_none());
        assert!(streams.tex_coords[1].is_none());
    }

    #[test]
    fn unpack_rejects_undersized_vertices() {
        let packed = vec![0u8; 64];
        assert!(matches!(
            unpack_layout(&packed, VertexFormat::VERTEX, 16, 2),
            Err(RasterError::InvalidDescriptor(_))
        ));
    }
}
