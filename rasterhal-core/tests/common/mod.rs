// Shared helpers for the integration tests.
#![allow(dead_code)]

use rasterhal_core::backend::RasterBackend;
use rasterhal_core::error::{RasterError, Result};
use rasterhal_core::object::{
    ImageView, IndexBufferDesc, ObjectKind, ShaderDesc, Slot, TextureDesc, VertexBufferDesc,
};
use rasterhal_core::state::RenderState;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateTexture { slot: Slot, width: u32, height: u32 },
    LoadTexture { slot: Slot, pixels: Vec<u8> },
    CreateVertexBuffer { slot: Slot, capacity: u32 },
    CreateIndexBuffer { slot: Slot },
    CreateShader { slot: Slot, kind: ObjectKind },
    Delete { slot: Slot, kind: ObjectKind },
    RenderState { state: RenderState, value: u32 },
}

pub type CallLog = Rc<RefCell<Vec<Call>>>;

/// Backend that records every call into a shared log.
pub struct RecordingBackend {
    log: CallLog,
    /// Refuse texture creation after this many successes.
    texture_budget: Option<usize>,
}

impl RecordingBackend {
    pub fn new() -> (Self, CallLog) {
        let log = CallLog::default();
        let backend = Self {
            log: log.clone(),
            texture_budget: None,
        };
        (backend, log)
    }

    pub fn with_texture_budget(budget: usize) -> (Self, CallLog) {
        let (mut backend, log) = Self::new();
        backend.texture_budget = Some(budget);
        (backend, log)
    }

    fn record(&self, call: Call) {
        self.log.borrow_mut().push(call);
    }
}

impl RasterBackend for RecordingBackend {
    fn create_texture(&mut self, slot: Slot, desc: &TextureDesc) -> Result<()> {
        if let Some(budget) = self.texture_budget.as_mut() {
            if *budget == 0 {
                return Err(RasterError::BackendRejected {
                    kind: ObjectKind::Texture,
                    slot,
                });
            }
            *budget -= 1;
        }
        self.record(Call::CreateTexture {
            slot,
            width: desc.format.width,
            height: desc.format.height,
        });
        Ok(())
    }

    fn load_texture(&mut self, slot: Slot, image: &ImageView<'_>) -> Result<()> {
        self.record(Call::LoadTexture {
            slot,
            pixels: image.data.to_vec(),
        });
        Ok(())
    }

    fn create_vertex_buffer(&mut self, slot: Slot, desc: &VertexBufferDesc) -> Result<()> {
        self.record(Call::CreateVertexBuffer {
            slot,
            capacity: desc.max_vertex_count,
        });
        Ok(())
    }

    fn create_index_buffer(&mut self, slot: Slot, _desc: &IndexBufferDesc) -> Result<()> {
        self.record(Call::CreateIndexBuffer { slot });
        Ok(())
    }

    fn create_shader(&mut self, slot: Slot, kind: ObjectKind, _desc: &ShaderDesc) -> Result<()> {
        self.record(Call::CreateShader { slot, kind });
        Ok(())
    }

    fn delete_object(&mut self, slot: Slot, kind: ObjectKind) {
        self.record(Call::Delete { slot, kind });
    }

    fn set_render_state(&mut self, state: RenderState, value: u32) {
        self.record(Call::RenderState { state, value });
    }
}

pub fn count(log: &CallLog, pred: impl Fn(&Call) -> bool) -> usize {
    log.borrow().iter().filter(|c| pred(c)).count()
}
