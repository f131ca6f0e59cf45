mod common;

use common::{count, Call, RecordingBackend};
use glam::{Mat4, Vec3, Vec4};
use rasterhal_core::context::dynamic_vb_slot;
use rasterhal_core::state::RenderState;
use rasterhal_core::transform::{
    BoundingBox, BoxVisibility, ClipFlags, Rect, TransformData, TransformKind, Viewport,
};
use rasterhal_core::vertex::{Stream, VertexFormat};
use rasterhal_core::{
    ContextId, DriverCaps, DriverInfo, Rasterizer, RasterizerConfig, RasterizerDriver, Slot,
};

fn driver_with_context(
    rasterizer: &mut Rasterizer,
) -> (&mut RasterizerDriver, ContextId, common::CallLog) {
    let (backend, log) = RecordingBackend::new();
    let driver = rasterizer.driver_mut(0).unwrap();
    let id = driver.create_context(Box::new(backend));
    (driver, id, log)
}

#[test]
fn clip_codes_through_a_context() {
    let mut rasterizer = Rasterizer::start(RasterizerConfig::default());
    let (driver, id, _log) = driver_with_context(&mut rasterizer);
    let ctx = driver.context_mut(id).unwrap();

    let points = [[2.0f32, 0.0, 0.5], [0.0, 0.0, -1.0], [0.0, 0.0, 0.5]];
    let mut flags = [ClipFlags::empty(); 3];
    let mut data = TransformData {
        input: Some(Stream::from_slice(&points)),
        clip_flags: Some(&mut flags),
        ..Default::default()
    };
    assert_eq!(ctx.transform_vertices(3, &mut data), Ok(ClipFlags::empty()));
    assert_eq!(flags[0], ClipFlags::RIGHT);
    assert!(flags[1].contains(ClipFlags::FRONT));

    let offscreen = [[2.0f32, 0.0, 0.5], [5.0, 0.0, 0.5]];
    let mut data = TransformData {
        input: Some(Stream::from_slice(&offscreen)),
        clip_flags: Some(&mut flags[..2]),
        ..Default::default()
    };
    assert_eq!(ctx.transform_vertices(2, &mut data), Ok(ClipFlags::RIGHT));
}

#[test]
fn screen_projection_follows_the_viewport() {
    let mut rasterizer = Rasterizer::start(RasterizerConfig::default());
    let (driver, id, _log) = driver_with_context(&mut rasterizer);
    let ctx = driver.context_mut(id).unwrap();
    ctx.set_viewport(Viewport::new(0, 0, 200, 100));
    ctx.set_transform(TransformKind::World, Mat4::from_scale(Vec3::splat(0.5)));

    let points = [[1.0f32, 1.0, 1.0]];
    let mut screen = [Vec4::ZERO];
    let mut data = TransformData {
        input: Some(Stream::from_slice(&points)),
        screen: Some(&mut screen),
        ..Default::default()
    };
    ctx.transform_vertices(1, &mut data).unwrap();
    assert_eq!(screen[0], Vec4::new(150.0, 25.0, 0.5, 1.0));

    let bbox = BoundingBox::new(Vec3::splat(-1.0), Vec3::splat(1.0));
    let mut extents = Rect::inverted();
    let visibility = ctx.compute_box_visibility(&bbox, false, Some(&mut extents));
    assert_eq!(visibility, BoxVisibility::Intersecting);
    assert_eq!(extents.left, 50.0);
    assert_eq!(extents.right, 150.0);

    let far = BoundingBox::new(Vec3::new(10.0, 0.0, 0.0), Vec3::new(12.0, 1.0, 0.5));
    assert_eq!(ctx.compute_box_visibility(&far, true, None), BoxVisibility::Outside);
}

#[test]
fn render_state_misses_reach_the_backend() {
    let mut rasterizer = Rasterizer::start(RasterizerConfig::default());
    let (driver, id, log) = driver_with_context(&mut rasterizer);
    let ctx = driver.context_mut(id).unwrap();

    ctx.set_render_state(RenderState::CullMode, 1);
    ctx.set_render_state(RenderState::CullMode, 1);
    ctx.set_render_state(RenderState::CullMode, 3);
    ctx.flush_render_state_cache();
    ctx.set_render_state(RenderState::CullMode, 3);

    let forwarded = count(&log, |c| matches!(c, Call::RenderState { .. }));
    assert_eq!(forwarded, 3);
    assert_eq!(ctx.render_states().hits(), 1);
    assert_eq!(ctx.render_state(RenderState::CullMode), 3);
}

#[test]
fn dynamic_vertex_buffers_are_reused() {
    let mut rasterizer = Rasterizer::start(RasterizerConfig::default());
    let (driver, id, log) = driver_with_context(&mut rasterizer);
    let ctx = driver.context_mut(id).unwrap();
    let format = VertexFormat::from_bits_retain(0x142);
    let created = |log: &common::CallLog| {
        count(log, |c| matches!(c, Call::CreateVertexBuffer { .. }))
    };

    let slot = ctx.get_dynamic_vertex_buffer(format, 100, 0, 0);
    assert_eq!(slot, Slot(81));
    assert_eq!(slot, dynamic_vb_slot(format, 0, 256));
    assert_eq!(created(&log), 1);
    assert_eq!(ctx.vertex_buffer_data(slot).unwrap().max_vertex_count, 4096);

    assert_eq!(ctx.get_dynamic_vertex_buffer(format, 100, 0, 0), slot);
    assert_eq!(created(&log), 1);

    assert_eq!(ctx.get_dynamic_vertex_buffer(format, 5000, 0, 0), slot);
    assert_eq!(created(&log), 2);
    assert_eq!(ctx.vertex_buffer_data(slot).unwrap().max_vertex_count, 5100);

    // A different key lands elsewhere in the reserved range.
    let other = ctx.get_dynamic_vertex_buffer(format, 10, 0, 1);
    assert_eq!(other, Slot(58));
    assert_eq!(created(&log), 3);
}

#[test]
fn dynamic_vertex_buffers_need_device_support() {
    let mut rasterizer = Rasterizer::start(RasterizerConfig::default());
    let caps = DriverCaps {
        vertex_buffers: false,
        ..Default::default()
    };
    let index = rasterizer.add_driver(rasterizer.new_driver(DriverInfo::default(), caps));
    let (backend, log) = RecordingBackend::new();
    let driver = rasterizer.driver_mut(index).unwrap();
    let id = driver.create_context(Box::new(backend));
    let ctx = driver.context_mut(id).unwrap();

    assert_eq!(
        ctx.get_dynamic_vertex_buffer(VertexFormat::VERTEX, 10, 32, 0),
        Slot::NULL
    );
    assert!(log.borrow().is_empty());
}
