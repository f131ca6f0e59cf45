use rasterhal_core::vertex::{
    encode_format, pack_vertices, size_of, unpack_layout, DrawFlags, PositionKind, Stream,
    TexCoordDims, VertexFormat, VertexStreams,
};

#[test]
fn interleaved_vertices_round_trip() {
    let vertices: Vec<[f32; 8]> = (0..5)
        .map(|i| {
            let f = i as f32;
            [f, f + 0.25, -f, 0.0, 1.0, 0.0, f * 0.1, 1.0 - f * 0.1]
        })
        .collect();
    let bytes: &[u8] = bytemuck::cast_slice(&vertices);
    let whole = Stream::new(bytes, 32);

    let mut streams = VertexStreams::new(5);
    streams.position = Some(whole);
    streams.normal = Some(whole.offset(12));
    streams.tex_coords[0] = Some(whole.offset(24));

    let (format, size) = encode_format(
        DrawFlags::TRANSFORM | DrawFlags::LIGHT | DrawFlags::empty().with_stages(1),
        TexCoordDims::default(),
    );
    assert_eq!(format, VertexFormat::VERTEX);
    assert_eq!(size, 32);

    let mut packed = vec![0u8; 5 * 32];
    assert_eq!(pack_vertices(&mut packed, format, 32, &streams), Ok(160));
    assert_eq!(packed, bytes);

    let unpacked = unpack_layout(&packed, format, 32, 5).unwrap();
    for i in 0..5 {
        let [x, y, z, nx, ny, nz, u, v] = vertices[i];
        assert_eq!(unpacked.position.unwrap().read::<[f32; 3]>(i), [x, y, z]);
        assert_eq!(unpacked.normal.unwrap().read::<[f32; 3]>(i), [nx, ny, nz]);
        assert_eq!(unpacked.tex_coords[0].unwrap().read::<[f32; 2]>(i), [u, v]);
    }
}

#[test]
fn separate_streams_round_trip() {
    let flags = DrawFlags::TRANSFORM | DrawFlags::LIGHT | DrawFlags::WEIGHTS2;
    let dims = TexCoordDims::default().with(1, 3);
    let (format, size) = encode_format(flags.with_stages(2), dims);
    assert_eq!(format.position_kind(), PositionKind::Weighted(2));
    assert_eq!(format.tex_count(), 2);
    assert_eq!(size, 12 + 8 + 12 + 8 + 12);
    assert_eq!(size_of(format), size);

    let count = 3;
    let positions: Vec<[f32; 3]> = (0..count).map(|i| [i as f32, 1.0, 2.0]).collect();
    let weights: Vec<[f32; 2]> = (0..count).map(|i| [0.5, i as f32 / 4.0]).collect();
    let normals: Vec<[f32; 3]> = (0..count).map(|_| [0.0, 0.0, 1.0]).collect();
    let uv: Vec<[f32; 2]> = (0..count).map(|i| [i as f32, -(i as f32)]).collect();
    let uvw: Vec<[f32; 3]> = (0..count).map(|i| [0.1, 0.2, i as f32]).collect();

    let mut streams = VertexStreams::new(count);
    streams.position = Some(Stream::from_slice(&positions));
    streams.weights = Some(Stream::from_slice(&weights));
    streams.normal = Some(Stream::from_slice(&normals));
    streams.tex_coords[0] = Some(Stream::from_slice(&uv));
    streams.tex_coords[1] = Some(Stream::from_slice(&uvw));

    // Padding past the layout is left alone.
    let vertex_size = size as usize + 4;
    let mut packed = vec![0xEEu8; vertex_size * count];
    pack_vertices(&mut packed, format, vertex_size, &streams).unwrap();
    assert_eq!(&packed[size as usize..vertex_size], &[0xEE; 4]);

    let unpacked = unpack_layout(&packed, format, vertex_size, count).unwrap();
    for i in 0..count {
        assert_eq!(unpacked.position.unwrap().read::<[f32; 3]>(i), positions[i]);
        assert_eq!(unpacked.weights.unwrap().read::<[f32; 2]>(i), weights[i]);
        assert_eq!(unpacked.normal.unwrap().read::<[f32; 3]>(i), normals[i]);
        assert_eq!(unpacked.tex_coords[0].unwrap().read::<[f32; 2]>(i), uv[i]);
        assert_eq!(unpacked.tex_coords[1].unwrap().read::<[f32; 3]>(i), uvw[i]);
    }
    assert!(unpacked.diffuse.is_none());
}

#[test]
fn short_destination_is_an_error() {
    let positions = [[0.0f32; 3]; 4];
    let mut streams = VertexStreams::new(4);
    streams.position = Some(Stream::from_slice(&positions));
    let mut packed = vec![0u8; 12 * 3];
    assert!(pack_vertices(&mut packed, VertexFormat::POSITION, 12, &streams).is_err());
}
