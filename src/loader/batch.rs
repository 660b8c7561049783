use std::{cell::RefCell, rc::Rc};

use futures::task::LocalSpawn;
use instant::Instant;

use super::{Assets, Factory, LoadContext};
use crate::{
    backend::Backend,
    error::Result,
    resources::Fetch,
    task::{self, BoxTask, Completion},
};

/// Progress callback, called with a percentage in `0.0..=100.0`.
type OnProgress = Box<dyn FnMut(f32)>;

/// A drained loader queue, ready to run exactly once.
///
/// Created by [`Loader::take_batch`](super::Loader::take_batch). Executing consumes the batch,
/// so the same queued factories can never run twice.
pub struct Batch<B: Backend> {
    pub(super) factories: Vec<Factory<B>>,
    pub(super) backend: Rc<B>,
    pub(super) fetcher: Rc<dyn Fetch>,
    pub(super) spawner: Rc<dyn LocalSpawn>,
}

struct Progress {
    done: usize,
    total: usize,
    on_progress: Option<OnProgress>,
}

impl Progress {
    fn advance(&mut self, id: &str) {
        self.done += 1;
        let percent = self.done as f32 * 100.0 / self.total as f32;
        log::debug!("Finished {} ({}/{})", id, self.done, self.total);
        if let Some(on_progress) = self.on_progress.as_mut() {
            on_progress(percent);
        }
    }
}

impl<B: Backend> Batch<B> {
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Identifiers in the order they were queued.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.factories.iter().map(|factory| factory.id.as_str())
    }

    /// Loads everything in the batch concurrently and hands the snapshot to `on_done`.
    ///
    /// If any asset fails, whatever did load is discarded and `on_done` receives the first
    /// error instead; no snapshot is produced for a failed batch.
    pub fn execute<F>(self, on_done: F)
    where
        F: FnOnce(Result<Assets<B>>) + 'static,
    {
        self.run(on_done, None);
    }

    /// Like [`execute`](Self::execute), additionally reporting progress after every finished
    /// asset. The last report is exactly `100.0` and arrives before `on_done`.
    pub fn execute_with_progress<F, P>(self, on_done: F, on_progress: P)
    where
        F: FnOnce(Result<Assets<B>>) + 'static,
        P: FnMut(f32) + 'static,
    {
        self.run(on_done, Some(Box::new(on_progress)));
    }

    fn run<F>(self, on_done: F, on_progress: Option<OnProgress>)
    where
        F: FnOnce(Result<Assets<B>>) + 'static,
    {
        let Batch {
            factories,
            backend,
            fetcher,
            spawner,
        } = self;

        let total = factories.len();
        let started = Instant::now();
        log::info!("Loading {} asset(s)", total);

        let results = Rc::new(RefCell::new(Assets::<B>::default()));
        let progress = Rc::new(RefCell::new(Progress {
            done: 0,
            total,
            on_progress,
        }));
        let ctx = LoadContext {
            backend,
            fetcher,
            results: Rc::clone(&results),
        };

        let tasks: Vec<BoxTask> = factories
            .into_iter()
            .map(|factory| {
                log::trace!("Starting {} {}", factory.kind, factory.id);
                let id = factory.id;
                let load = task::from_future(
                    Rc::clone(&spawner),
                    id.clone(),
                    (factory.load)(ctx.clone()),
                );
                let progress = Rc::clone(&progress);
                task::boxed(move |done: Completion| {
                    task::boxed(load).start(Completion::new(id.clone(), move |outcome| {
                        progress.borrow_mut().advance(&id);
                        done.complete(outcome);
                    }));
                })
            })
            .collect();

        task::boxed(task::parallel(tasks)).start(Completion::new("batch", move |outcome| {
            let mut assets = std::mem::take(&mut *results.borrow_mut());
            match outcome {
                Ok(()) => {
                    log::info!(
                        "Loaded {} asset(s) in {} ms",
                        total,
                        started.elapsed().as_millis()
                    );
                    on_done(Ok(assets));
                }
                Err(error) => {
                    log::error!("Asset batch failed: {}", error);
                    assets.discard();
                    on_done(Err(error));
                }
            }
        }));
    }
}
