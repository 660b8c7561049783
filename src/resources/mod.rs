/**
 * This module contains all logic for getting raw bytes of an asset from wherever it lives
 * (asset folder, web server, memory) and for decoding non-GPU payloads.
 */
pub mod data;
pub mod fetch;

pub use data::{Data, DataKind};
pub use fetch::{Fetch, FileFetcher, MemoryFetcher, Params};
#[cfg(target_arch = "wasm32")]
pub use fetch::HttpFetcher;
