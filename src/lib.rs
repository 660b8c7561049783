//! flow-loader
//!
//! Asynchronous task combinators and a batch asset loader for wgpu applications, usable
//! natively and on the web. Assets (raw or JSON data, textures, shader programs) are queued on
//! a [`Loader`](loader::Loader), loaded concurrently, and handed back as a disposable
//! [`Assets`](loader::Assets) snapshot.
//!
//! High-level modules
//! - `task`: one-shot tasks and the `from_fn`, `serial` and `parallel` combinators
//! - `loader`: queue builder, batch executor and assets snapshot
//! - `resources`: fetching raw asset bytes and decoding data payloads
//! - `backend`: the boundary to the graphics context (texture/program creation, disposal)
//! - `context`: the wgpu backend
//! - `data_structures`: wgpu texture and program handles
//! - `runtime`: executors for native/WASM and logger setup
//!

pub mod backend;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod loader;
pub mod resources;
pub mod runtime;
pub mod task;

pub use error::{Error, Result};
pub use loader::{Assets, Loader, LoaderConfig};
