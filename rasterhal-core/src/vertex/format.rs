// Vertex format words and draw flags
//
// A format word describes one packed vertex: a position kind in the low
// nibble, optional attribute bits, a texture stage count and a 2-bit width
// code per stage in the upper half.

use bitflags::bitflags;
use smallvec::SmallVec;

/// Maximum number of texture coordinate sets per vertex.
pub const MAX_STAGES: usize = 8;

/// Bytes per texture coordinate set, indexed by the 2-bit width code.
const TEX_COORD_SIZES: [u32; 4] = [8, 12, 16, 4];

bitflags! {
    /// Packed vertex layout descriptor.
    ///
    /// The position kinds overlap: test them with [`VertexFormat::position_kind`]
    /// rather than `contains`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct VertexFormat: u32 {
        const POSITION = 0x0002;
        const RASTERPOS = 0x0004;
        const POSITION1W = 0x0006;
        const POSITION2W = 0x0008;
        const POSITION3W = 0x000A;
        const POSITION4W = 0x000C;
        const POSITION5W = 0x000E;
        const POSITION_MASK = 0x000E;
        const NORMAL = 0x0010;
        const PSIZE = 0x0020;
        const DIFFUSE = 0x0040;
        const SPECULAR = 0x0080;
        const TEXMASK = 0x0F00;
        const TEX1 = 0x0100;
        /// The last blend weight carries matrix-palette indices.
        const PALETTE_INDICES = 0x1000;

        /// Interleaved position, normal and one 2D texture coordinate.
        const VERTEX = Self::POSITION.bits() | Self::NORMAL.bits() | Self::TEX1.bits();

        const _ = !0;
    }
}

/// Position representation selected by the low nibble of a format word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionKind {
    None,
    /// Untransformed `x, y, z`.
    Model,
    /// Pre-transformed `x, y, z, rhw`.
    Raster,
    /// Model position followed by 1 to 5 blend weights.
    Weighted(u32),
}

impl PositionKind {
    /// Bytes taken by the position and its blend weights.
    pub fn size(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Model => 12,
            Self::Raster => 16,
            Self::Weighted(n) => 12 + 4 * n,
        }
    }
}

impl VertexFormat {
    pub fn position_kind(self) -> PositionKind {
        match self.bits() & Self::POSITION_MASK.bits() {
            0 => PositionKind::None,
            0x2 => PositionKind::Model,
            0x4 => PositionKind::Raster,
            bits => PositionKind::Weighted((bits >> 1) - 2),
        }
    }

    pub fn weight_count(self) -> u32 {
        match self.position_kind() {
            PositionKind::Weighted(n) => n,
            _ => 0,
        }
    }

    /// Number of texture coordinate sets, capped at [`MAX_STAGES`].
    pub fn tex_count(self) -> usize {
        (((self.bits() & Self::TEXMASK.bits()) >> 8) as usize).min(MAX_STAGES)
    }

    /// Width code of `stage` (0: 2D, 1: 3D, 2: 4D, 3: 1D).
    fn tex_code(self, stage: usize) -> u32 {
        (self.bits() >> (16 + 2 * stage)) & 3
    }

    /// Bytes taken by the coordinates of `stage`.
    pub fn tex_coord_size(self, stage: usize) -> u32 {
        TEX_COORD_SIZES[self.tex_code(stage) as usize]
    }

    /// Number of float components in the coordinates of `stage`.
    pub fn tex_coord_dims(self, stage: usize) -> u32 {
        self.tex_coord_size(stage) / 4
    }
}

bitflags! {
    /// Draw-call flags from which a vertex format is derived.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DrawFlags: u32 {
        /// Vertices are in model space and go through the transform pipeline.
        const TRANSFORM = 0x0000_0001;
        /// Vertices are lit: they carry a normal instead of a diffuse colour.
        const LIGHT = 0x0000_0002;
        const DIFFUSE = 0x0000_0010;
        const SPECULAR = 0x0000_0020;
        const STAGE_MASK = 0x0000_1E00;
        const WEIGHTS1 = 0x0100_0000;
        const WEIGHTS2 = 0x0200_0000;
        const WEIGHTS3 = 0x0400_0000;
        const WEIGHTS4 = 0x0800_0000;
        const WEIGHTS5 = 0x1000_0000;
        const WEIGHT_MASK = 0x1F00_0000;
        const MATRIX_PAL = 0x2000_0000;

        const _ = !0;
    }
}

impl DrawFlags {
    /// Set the texture stage count.
    pub fn with_stages(self, stages: usize) -> Self {
        let stages = stages.min(MAX_STAGES) as u32;
        Self::from_bits_retain((self.bits() & !Self::STAGE_MASK.bits()) | (stages << 9))
    }

    pub fn stage_count(self) -> usize {
        (((self.bits() & Self::STAGE_MASK.bits()) >> 9) as usize).min(MAX_STAGES)
    }

    /// Blend weight count: the lowest `WEIGHTSn` bit wins.
    pub fn weight_count(self) -> u32 {
        let weights = (self & Self::WEIGHT_MASK).bits() >> 24;
        if weights == 0 {
            0
        } else {
            weights.trailing_zeros() + 1
        }
    }
}

/// Component count (1 to 4) of each texture stage. Defaults to 2D.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TexCoordDims(pub [u8; MAX_STAGES]);

impl Default for TexCoordDims {
    fn default() -> Self {
        Self([2; MAX_STAGES])
    }
}

impl TexCoordDims {
    pub fn with(mut self, stage: usize, dims: u8) -> Self {
        if let Some(d) = self.0.get_mut(stage) {
            *d = dims;
        }
        self
    }

    fn code(&self, stage: usize) -> u32 {
        match self.0[stage] {
            1 => 3,
            3 => 1,
            4 => 2,
            _ => 0,
        }
    }
}

/// Derive the format word and packed vertex size from draw flags.
pub fn encode_format(flags: DrawFlags, tex_dims: TexCoordDims) -> (VertexFormat, u32) {
    let mut format;
    let mut size;

    if flags.contains(DrawFlags::TRANSFORM) {
        let weights = flags.weight_count();
        if weights > 0 {
            format = VertexFormat::from_bits_retain(2 * weights + 4);
            size = 12 + 4 * weights;
            if flags.contains(DrawFlags::MATRIX_PAL) {
                format |= VertexFormat::PALETTE_INDICES;
            }
        } else {
            format = VertexFormat::POSITION;
            size = 12;
        }

        if flags.contains(DrawFlags::LIGHT) {
            format |= VertexFormat::NORMAL;
            size += 12;
        } else if flags.contains(DrawFlags::DIFFUSE) {
            format |= VertexFormat::DIFFUSE;
            size += 4;
        }
    } else {
        format = VertexFormat::RASTERPOS;
        size = 16;
        if flags.contains(DrawFlags::DIFFUSE) {
            format |= VertexFormat::DIFFUSE;
            size += 4;
        }
        if flags.contains(DrawFlags::SPECULAR) {
            format |= VertexFormat::SPECULAR;
            size += 4;
        }
    }

    let stages = flags.stage_count();
    let mut bits = format.bits() | ((stages as u32) << 8);
    for stage in 0..stages {
        let code = tex_dims.code(stage);
        bits |= code << (16 + 2 * stage);
        size += TEX_COORD_SIZES[code as usize];
    }

    (VertexFormat::from_bits_retain(bits), size)
}

/// Packed byte size of one vertex of `format`.
pub fn size_of(format: VertexFormat) -> u32 {
    let mut size = format.position_kind().size();
    if format.contains(VertexFormat::NORMAL) {
        size += 12;
    }
    if format.contains(VertexFormat::PSIZE) {
        size += 4;
    }
    if format.contains(VertexFormat::DIFFUSE) {
        size += 4;
    }
    if format.contains(VertexFormat::SPECULAR) {
        size += 4;
    }
    size + (0..format.tex_count())
        .map(|stage| format.tex_coord_size(stage))
        .sum::<u32>()
}

/// Byte offset and width of one attribute inside a packed vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSlot {
    pub offset: usize,
    pub size: usize,
}

/// Sub-offsets of every attribute of a format.
///
/// Attributes are laid out in a fixed order: position, weights, normal,
/// point size, diffuse, specular, texture coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VertexLayout {
    pub position: Option<AttributeSlot>,
    pub weights: Option<AttributeSlot>,
    pub normal: Option<AttributeSlot>,
    pub point_size: Option<AttributeSlot>,
    pub diffuse: Option<AttributeSlot>,
    pub specular: Option<AttributeSlot>,
    pub tex_coords: SmallVec<[AttributeSlot; MAX_STAGES]>,
    /// Sum of all attribute sizes.
    pub size: usize,
}

impl VertexLayout {
    pub fn new(format: VertexFormat) -> Self {
        let mut layout = Self::default();
        let mut offset = 0;
        let mut take = |size: usize| {
            let slot = AttributeSlot { offset, size };
            offset += size;
            slot
        };

        match format.position_kind() {
            PositionKind::None => {}
            PositionKind::Model => layout.position = Some(take(12)),
            PositionKind::Raster => layout.position = Some(take(16)),
            PositionKind::Weighted(n) => {
                layout.position = Some(take(12));
                layout.weights = Some(take(4 * n as usize));
            }
        }
        if format.contains(VertexFormat::NORMAL) {
            layout.normal = Some(take(12));
        }
        if format.contains(VertexFormat::PSIZE) {
            layout.point_size = Some(take(4));
        }
        if format.contains(VertexFormat::DIFFUSE) {
            layout.diffuse = Some(take(4));
        }
        if format.contains(VertexFormat::SPECULAR) {
            layout.specular = Some(take(4));
        }
        for stage in 0..format.tex_count() {
            let size = format.tex_coord_size(stage) as usize;
            layout.tex_coords.push(take(size));
        }

        layout.size = offset;
        layout
    }
}
