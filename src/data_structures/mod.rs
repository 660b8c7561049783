//! GPU resource handles produced by the wgpu backend.
//!
//! - `texture` wraps a WGPU texture, its view and sampler
//! - `program` holds a validated vertex/fragment shader pair and its attribute bindings

pub mod program;
pub mod texture;
