//! Batch loading of data, textures and shader programs.
//!
//! A [`Loader`] collects what should be loaded through its fluent `queue_*` methods. Nothing is
//! fetched until [`Loader::load_assets`] runs: it drains the queue into a [`Batch`], loads every
//! queued asset concurrently, reports progress and finally hands back an [`Assets`] snapshot.
//!
//! ```rust,no_run
//! # use flow_loader::{backend::Backend, loader::Loader};
//! # fn wrapper<B: Backend>(loader: &mut Loader<B>) {
//! loader
//!     .queue_json("levels/one.json", None)
//!     .queue_textures(["grass.png", "rock.png"], None, None)
//!     .queue_program("shaders/basic", ["position", "tex_coords"]);
//!
//! loader.load_assets_with_progress(
//!     |assets| {
//!         let assets = assets.expect("assets failed to load");
//!         let grass = assets.get_texture("grass.png");
//!     },
//!     |percent| log::info!("{}%", percent),
//! );
//! # }
//! ```
//!
//! The queue moves through `Idle → Draining → Executing → Idle`: [`Loader::take_batch`] moves
//! the queued factories out (the loader is idle and reusable right away) and
//! [`Batch::execute`] consumes them. Assets queued after a drain belong to the next batch.

use std::{cell::RefCell, future::Future, rc::Rc};

use futures::{FutureExt, future::LocalBoxFuture, task::LocalSpawn};

use crate::{
    backend::{Backend, Sampling, TextureFilter},
    error::{Error, Result},
    resources::{Data, DataKind, Fetch, Params},
    task::Outcome,
};

mod assets;
mod batch;

pub use assets::Assets;
pub use batch::Batch;

/// Loader settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Appended to a program id to name its vertex shader source.
    pub vertex_suffix: String,
    /// Appended to a program id to name its fragment shader source.
    pub fragment_suffix: String,
    /// Used when a texture is queued without a magnification filter.
    pub mag_filter: TextureFilter,
    /// Used when a texture is queued without a minification filter.
    pub min_filter: TextureFilter,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            vertex_suffix: ".vert.wgsl".to_string(),
            fragment_suffix: ".frag.wgsl".to_string(),
            mag_filter: TextureFilter::Linear,
            min_filter: TextureFilter::Linear,
        }
    }
}

/// What a factory needs while it loads: the collaborators and the shared result maps.
pub(crate) struct LoadContext<B: Backend> {
    backend: Rc<B>,
    fetcher: Rc<dyn Fetch>,
    results: Rc<RefCell<Assets<B>>>,
}

impl<B: Backend> Clone for LoadContext<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Rc::clone(&self.backend),
            fetcher: Rc::clone(&self.fetcher),
            results: Rc::clone(&self.results),
        }
    }
}

impl<B: Backend> LoadContext<B> {
    async fn fetch(&self, id: &str, params: Option<&Params>) -> Result<Vec<u8>> {
        self.fetcher
            .fetch(id, params)
            .await
            .map_err(|source| Error::Fetch {
                id: id.to_string(),
                source,
            })
    }

    async fn fetch_text(&self, id: &str) -> Result<String> {
        let bytes = self.fetch(id, None).await?;
        String::from_utf8(bytes).map_err(|e| Error::Decode {
            id: id.to_string(),
            source: e.into(),
        })
    }
}

type LoadFn<B> = Box<dyn FnOnce(LoadContext<B>) -> LocalBoxFuture<'static, Outcome>>;

/// One queued load: given the shared context, produces the future that performs it.
pub(crate) struct Factory<B: Backend> {
    id: String,
    kind: &'static str,
    load: LoadFn<B>,
}

/// Fluent builder for asset batches. See the [module docs](self).
pub struct Loader<B: Backend> {
    backend: Rc<B>,
    fetcher: Rc<dyn Fetch>,
    spawner: Rc<dyn LocalSpawn>,
    config: LoaderConfig,
    queue: Vec<Factory<B>>,
}

impl<B: Backend> Loader<B> {
    pub fn new<F, S>(backend: B, fetcher: F, spawner: S) -> Self
    where
        F: Fetch + 'static,
        S: LocalSpawn + 'static,
    {
        Self::with_config(backend, fetcher, spawner, LoaderConfig::default())
    }

    pub fn with_config<F, S>(backend: B, fetcher: F, spawner: S, config: LoaderConfig) -> Self
    where
        F: Fetch + 'static,
        S: LocalSpawn + 'static,
    {
        Self {
            backend: Rc::new(backend),
            fetcher: Rc::new(fetcher),
            spawner: Rc::new(spawner),
            config,
            queue: Vec::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Number of queued loads.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    fn push<L, Fut>(&mut self, id: String, kind: &'static str, load: L) -> &mut Self
    where
        L: FnOnce(LoadContext<B>) -> Fut + 'static,
        Fut: Future<Output = Outcome> + 'static,
    {
        log::debug!("Queued {} {}", kind, id);
        self.queue.push(Factory {
            id,
            kind,
            load: Box::new(move |ctx: LoadContext<B>| load(ctx).boxed_local()),
        });
        self
    }

    /// Queues a data asset, decoded according to `kind`.
    pub fn queue_data(
        &mut self,
        id: impl Into<String>,
        params: Option<Params>,
        kind: DataKind,
    ) -> &mut Self {
        let id = id.into();
        self.push(id.clone(), "data", move |ctx| async move {
            let bytes = ctx.fetch(&id, params.as_ref()).await?;
            let data = Data::decode(kind, bytes).map_err(|source| Error::Decode {
                id: id.clone(),
                source,
            })?;
            ctx.results.borrow_mut().insert_data(id, data);
            Ok::<(), Error>(())
        })
    }

    pub fn queue_json(&mut self, id: impl Into<String>, params: Option<Params>) -> &mut Self {
        self.queue_data(id, params, DataKind::Json)
    }

    /// Queues an image to be uploaded as a texture. Missing filters fall back to the
    /// [`LoaderConfig`] defaults.
    pub fn queue_texture(
        &mut self,
        id: impl Into<String>,
        mag_filter: Option<TextureFilter>,
        min_filter: Option<TextureFilter>,
    ) -> &mut Self {
        let id = id.into();
        let sampling = Sampling {
            mag_filter: mag_filter.unwrap_or(self.config.mag_filter),
            min_filter: min_filter.unwrap_or(self.config.min_filter),
        };
        self.push(id.clone(), "texture", move |ctx| async move {
            let bytes = ctx.fetch(&id, None).await?;
            let image = image::load_from_memory(&bytes).map_err(|e| Error::Decode {
                id: id.clone(),
                source: e.into(),
            })?;
            let texture = ctx
                .backend
                .create_texture(&id, &image, sampling)
                .map_err(|source| Error::Texture {
                    id: id.clone(),
                    source,
                })?;
            ctx.results.borrow_mut().insert_texture(id, texture);
            Ok::<(), Error>(())
        })
    }

    pub fn queue_textures<I, S>(
        &mut self,
        ids: I,
        mag_filter: Option<TextureFilter>,
        min_filter: Option<TextureFilter>,
    ) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for id in ids {
            self.queue_texture(id, mag_filter, min_filter);
        }
        self
    }

    /// Queues a shader program. Its sources are fetched from `id` plus the configured vertex
    /// and fragment suffixes; attribute `i` is bound to vertex input location `i`.
    pub fn queue_program<I, S>(&mut self, id: impl Into<String>, attributes: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let id = id.into();
        let attributes: Vec<String> = attributes.into_iter().map(Into::into).collect();
        let vertex_id = format!("{}{}", id, self.config.vertex_suffix);
        let fragment_id = format!("{}{}", id, self.config.fragment_suffix);
        self.push(id.clone(), "program", move |ctx| async move {
            let (vertex, fragment) =
                futures::future::try_join(ctx.fetch_text(&vertex_id), ctx.fetch_text(&fragment_id))
                    .await?;
            let program = ctx
                .backend
                .link_program(&id, &vertex, &fragment, &attributes)
                .map_err(|source| Error::Program {
                    id: id.clone(),
                    source,
                })?;
            ctx.results.borrow_mut().insert_program(id, program);
            Ok::<(), Error>(())
        })
    }

    /// Queues several programs, each with its own attribute names.
    pub fn queue_programs<M, K, I, S>(&mut self, programs: M) -> &mut Self
    where
        M: IntoIterator<Item = (K, I)>,
        K: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for (id, attributes) in programs {
            self.queue_program(id, attributes);
        }
        self
    }

    /// Drains the queue. The loader is empty afterwards and can queue the next batch.
    pub fn take_batch(&mut self) -> Batch<B> {
        Batch {
            factories: std::mem::take(&mut self.queue),
            backend: Rc::clone(&self.backend),
            fetcher: Rc::clone(&self.fetcher),
            spawner: Rc::clone(&self.spawner),
        }
    }

    /// Drains the queue and loads everything in it. See [`Batch::execute`].
    pub fn load_assets<F>(&mut self, on_done: F)
    where
        F: FnOnce(Result<Assets<B>>) + 'static,
    {
        self.take_batch().execute(on_done);
    }

    /// Drains the queue and loads everything in it, reporting progress.
    /// See [`Batch::execute_with_progress`].
    pub fn load_assets_with_progress<F, P>(&mut self, on_done: F, on_progress: P)
    where
        F: FnOnce(Result<Assets<B>>) + 'static,
        P: FnMut(f32) + 'static,
    {
        self.take_batch().execute_with_progress(on_done, on_progress);
    }

    /// Drains the queue right away and returns a future of the loaded snapshot.
    pub fn load(&mut self) -> impl Future<Output = Result<Assets<B>>> + 'static {
        let (sender, receiver) = futures::channel::oneshot::channel();
        self.load_assets(move |result| {
            // An unwanted snapshot is dropped here, which discards it.
            let _ = sender.send(result);
        });
        async move {
            receiver
                .await
                .unwrap_or_else(|_| Err(Error::Abandoned("batch".to_string())))
        }
    }
}

impl<B: Backend> std::fmt::Debug for Loader<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader")
            .field("config", &self.config)
            .field(
                "queue",
                &self.queue.iter().map(|factory| &factory.id).collect::<Vec<_>>(),
            )
            .finish()
    }
}
