use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    rc::Rc,
};

use anyhow::anyhow;
use futures::{FutureExt, future::LocalBoxFuture};

/// Query parameters passed along with a fetch, in order.
pub type Params = Vec<(String, String)>;

/// Fetches the raw bytes of an asset.
///
/// Implementations report every failure through the returned future; there is no side channel.
pub trait Fetch {
    fn fetch(&self, id: &str, params: Option<&Params>)
    -> LocalBoxFuture<'static, anyhow::Result<Vec<u8>>>;
}

impl<F: Fetch + ?Sized> Fetch for Rc<F> {
    fn fetch(
        &self,
        id: &str,
        params: Option<&Params>,
    ) -> LocalBoxFuture<'static, anyhow::Result<Vec<u8>>> {
        (**self).fetch(id, params)
    }
}

/// Reads assets from a directory on disk.
///
/// Reads go through `tokio::fs`, so the fetch futures must be polled inside a tokio runtime
/// (see [`TokioSpawner`](crate::runtime::TokioSpawner)).
#[derive(Clone, Debug)]
pub struct FileFetcher {
    root: PathBuf,
}

impl FileFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Default for FileFetcher {
    fn default() -> Self {
        Self::new(Path::new("./").join("assets"))
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Fetch for FileFetcher {
    fn fetch(
        &self,
        id: &str,
        params: Option<&Params>,
    ) -> LocalBoxFuture<'static, anyhow::Result<Vec<u8>>> {
        if params.is_some_and(|params| !params.is_empty()) {
            log::debug!("Ignoring query parameters for file asset {}", id);
        }
        let path = self.root.join(id);
        async move {
            tokio::fs::read(&path)
                .await
                .map_err(|e| anyhow!("could not read {}: {}", path.display(), e))
        }
        .boxed_local()
    }
}

/// Requests assets over HTTP relative to a base URL.
#[cfg(target_arch = "wasm32")]
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    base: reqwest::Url,
}

#[cfg(target_arch = "wasm32")]
impl HttpFetcher {
    pub fn new(base: reqwest::Url) -> Self {
        Self { base }
    }

    /// Resolves assets against `<page origin>/assets/`.
    pub fn from_origin() -> anyhow::Result<Self> {
        let window = web_sys::window().ok_or_else(|| anyhow!("no window available"))?;
        let origin = window
            .location()
            .origin()
            .map_err(|_| anyhow!("page origin is not readable"))?;
        let base = reqwest::Url::parse(&format!("{}/assets/", origin))?;
        Ok(Self::new(base))
    }
}

#[cfg(target_arch = "wasm32")]
impl Fetch for HttpFetcher {
    fn fetch(
        &self,
        id: &str,
        params: Option<&Params>,
    ) -> LocalBoxFuture<'static, anyhow::Result<Vec<u8>>> {
        let url = self.base.join(id).map(|mut url| {
            if let Some(params) = params {
                url.query_pairs_mut().extend_pairs(params.iter());
            }
            url
        });
        async move {
            let response = reqwest::get(url?).await?.error_for_status()?;
            Ok::<_, anyhow::Error>(response.bytes().await?.to_vec())
        }
        .boxed_local()
    }
}

/// Serves assets from memory, e.g. files bundled with `include_bytes!`.
#[derive(Clone, Debug, Default)]
pub struct MemoryFetcher {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, bytes: impl Into<Vec<u8>>) -> &mut Self {
        self.entries.insert(id.into(), bytes.into());
        self
    }

    pub fn with(mut self, id: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(id, bytes);
        self
    }
}

impl Fetch for MemoryFetcher {
    fn fetch(
        &self,
        id: &str,
        _: Option<&Params>,
    ) -> LocalBoxFuture<'static, anyhow::Result<Vec<u8>>> {
        let result = self
            .entries
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow!("no asset named `{}`", id));
        futures::future::ready(result).boxed_local()
    }
}
