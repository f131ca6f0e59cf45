//! Rasterizer hardware-abstraction core.
//!
//! Sits between a scene layer and a concrete graphics backend:
//!
//! - [`object`]: the slot registry shared by every context, plus per-context
//!   descriptor tables
//! - [`vertex`]: flag-described vertex layouts, packing and unpacking
//! - [`sprite`]: power-of-two tiling of arbitrary bitmaps
//! - [`transform`]: matrices, bulk vertex transform, clip codes, projection
//! - [`state`]: the render-state cache
//! - [`quirks`]: known driver defects
//!
//! [`Rasterizer`] owns the registry and the drivers; a [`RasterizerDriver`]
//! owns its [`RasterizerContext`]s. Backends plug in through
//! [`RasterBackend`].

pub mod backend;
mod bits;
pub mod config;
pub mod context;
pub mod driver;
pub mod error;
pub mod material;
pub mod object;
pub mod pixel;
pub mod quirks;
pub mod rasterizer;
pub mod sprite;
pub mod state;
pub mod transform;
pub mod vertex;

pub use backend::{NullBackend, RasterBackend};
pub use config::RasterizerConfig;
pub use context::{ContextId, RasterizerContext};
pub use driver::{DisplayMode, DriverCaps, DriverInfo, RasterizerDriver};
pub use error::{RasterError, Result};
pub use object::{ObjectKind, ObjectRegistry, ObjectType, SharedRegistry, Slot};
pub use pixel::PixelFormat;
pub use quirks::{DriverProblem, DriverQuirkTable, OsKind};
pub use rasterizer::Rasterizer;
