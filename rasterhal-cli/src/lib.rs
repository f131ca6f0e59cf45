//! Diagnostics commands over `rasterhal-core`.

pub mod commands;
