//! Platform glue: where loader futures run and where log output goes.
//!
//! The loader only needs a [`LocalSpawn`]; any single-threaded executor works, e.g.
//! `futures::executor::LocalPool`. For the platforms flow-ngin targets this module provides:
//!
//! - [`TokioSpawner`] spawns onto a shared `tokio::task::LocalSet` (native)
//! - [`WasmSpawner`] spawns onto the browser's microtask queue (wasm32)

#[cfg(not(target_arch = "wasm32"))]
use std::rc::Rc;

use futures::task::{LocalFutureObj, LocalSpawn, SpawnError};

/// Spawns loader futures onto a `tokio::task::LocalSet`.
///
/// Futures run whenever the set is driven, e.g. through `LocalSet::run_until` inside a tokio
/// runtime, which is also what lets [`FileFetcher`](crate::resources::FileFetcher) reach the
/// tokio file system API. Spawning is refused when no tokio runtime is current.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Clone, Debug)]
pub struct TokioSpawner {
    local: Rc<tokio::task::LocalSet>,
}

#[cfg(not(target_arch = "wasm32"))]
impl TokioSpawner {
    pub fn new(local: Rc<tokio::task::LocalSet>) -> Self {
        Self { local }
    }

    pub fn local_set(&self) -> &tokio::task::LocalSet {
        &self.local
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl LocalSpawn for TokioSpawner {
    fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
        self.status_local()?;
        let _ = self.local.spawn_local(future);
        Ok(())
    }

    fn status_local(&self) -> Result<(), SpawnError> {
        match tokio::runtime::Handle::try_current() {
            Ok(_) => Ok(()),
            Err(_) => Err(SpawnError::shutdown()),
        }
    }
}

/// Spawns loader futures with `wasm_bindgen_futures::spawn_local`.
#[cfg(target_arch = "wasm32")]
#[derive(Clone, Copy, Debug, Default)]
pub struct WasmSpawner;

#[cfg(target_arch = "wasm32")]
impl LocalSpawn for WasmSpawner {
    fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
        wasm_bindgen_futures::spawn_local(future);
        Ok(())
    }
}

/// Installs a logger for the current platform. Calling it more than once is harmless.
pub fn init_logging() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            log::debug!("Logger already initialised: {}", e);
        }
    }

    #[cfg(target_arch = "wasm32")]
    {
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            log::debug!("Logger already initialised: {}", e);
        }
    }
}
