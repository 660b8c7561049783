//! One-shot asynchronous tasks and the combinators that compose them.
//!
//! A [`Task`] is a unit of work that is started with a [`Completion`] handle and signals that
//! handle exactly once when it has finished. Tasks are composed with:
//!
//! - [`from_fn`] lifts a synchronous closure into a task
//! - [`serial`] (or the [`serial!`](crate::serial) macro) runs tasks one after another
//! - [`parallel`] (or the [`parallel!`](crate::parallel) macro) starts all tasks at once and
//!   completes when every one of them has completed
//!
//! Combinators return tasks again, so they nest freely:
//!
//! ```rust
//! use flow_loader::{parallel, serial, task};
//!
//! let upload = serial![
//!     parallel![
//!         task::from_fn(|| Ok(())),
//!         task::from_fn(|| Ok(())),
//!     ],
//!     task::from_fn(|| Ok(())),
//! ];
//! task::run(task::boxed(upload), |outcome| assert!(outcome.is_ok()));
//! ```
//!
//! # Execution model
//!
//! Everything runs on a single logical thread. Sub-tasks may complete immediately (from inside
//! their own `start`) or later from an executor; combinators handle both. Shared combinator
//! state is therefore kept in `Rc<RefCell<_>>` and tasks are not `Send`.
//!
//! # Outcomes
//!
//! Completions carry an [`Outcome`]. [`serial`] stops at the first error; [`parallel`] still
//! waits for all sub-tasks and then reports the first error it observed.

use std::{future::Future, rc::Rc};

use futures::task::{LocalSpawn, LocalSpawnExt};

use crate::error::Error;

mod parallel;
mod serial;

pub use self::parallel::parallel;
pub use self::serial::serial;

/// What a task reports when it finishes.
pub type Outcome = Result<(), Error>;

/// A type-erased task, as accepted by [`serial`] and [`parallel`].
pub type BoxTask = Box<dyn Task>;

/// A unit of work that signals its [`Completion`] exactly once.
///
/// Any `FnOnce(Completion) + 'static` closure is a task.
pub trait Task: 'static {
    fn start(self: Box<Self>, done: Completion);
}

impl<F> Task for F
where
    F: FnOnce(Completion) + 'static,
{
    fn start(self: Box<Self>, done: Completion) {
        (*self)(done)
    }
}

/// The completion handle handed to a started task.
///
/// Signalling consumes the handle, so a task cannot complete twice. A handle that is dropped
/// without being signalled completes with [`Error::Abandoned`] instead, so a task cannot
/// silently fail to complete either.
pub struct Completion {
    label: String,
    callback: Option<Box<dyn FnOnce(Outcome)>>,
}

impl Completion {
    pub fn new<F>(label: impl Into<String>, callback: F) -> Self
    where
        F: FnOnce(Outcome) + 'static,
    {
        Self {
            label: label.into(),
            callback: Some(Box::new(callback)),
        }
    }

    /// Name used in diagnostics, e.g. `batch/3` for the fourth sub-task of a batch.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn complete(mut self, outcome: Outcome) {
        if let Some(callback) = self.callback.take() {
            callback(outcome);
        }
    }

    pub fn ok(self) {
        self.complete(Ok(()))
    }

    pub fn fail(self, error: Error) {
        self.complete(Err(error))
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        // Never call back into user code while unwinding.
        if std::thread::panicking() {
            return;
        }
        if let Some(callback) = self.callback.take() {
            log::warn!(
                "Task `{}` dropped its completion without signalling it",
                self.label
            );
            callback(Err(Error::Abandoned(std::mem::take(&mut self.label))));
        }
    }
}

impl std::fmt::Debug for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion")
            .field("label", &self.label)
            .field("signalled", &self.callback.is_none())
            .finish()
    }
}

/// Boxes a task so it can be passed to [`serial`] or [`parallel`].
pub fn boxed<T: Task>(task: T) -> BoxTask {
    Box::new(task)
}

/// Starts `task` and calls `on_done` with its outcome.
pub fn run<F>(task: BoxTask, on_done: F)
where
    F: FnOnce(Outcome) + 'static,
{
    task.start(Completion::new("root", on_done));
}

/// Lifts a synchronous closure into a task.
///
/// The closure runs when the task is started and the task completes immediately afterwards
/// with the closure's result.
pub fn from_fn<F>(work: F) -> impl Task
where
    F: FnOnce() -> Outcome + 'static,
{
    move |done: Completion| done.complete(work())
}

/// Lifts a future into a task that is spawned on `spawner` when started.
pub fn from_future<Fut>(
    spawner: Rc<dyn LocalSpawn>,
    label: impl Into<String>,
    future: Fut,
) -> impl Task
where
    Fut: Future<Output = Outcome> + 'static,
{
    let label = label.into();
    move |done: Completion| {
        if spawner.status_local().is_err() {
            done.fail(Error::Spawn(label));
            return;
        }
        // If spawning fails after all, the future is dropped and `done` reports it abandoned.
        if spawner
            .spawn_local(async move { done.complete(future.await) })
            .is_err()
        {
            log::error!("Executor rejected task `{}`", label);
        }
    }
}

/// Starts `task` right away and returns a future that resolves to its outcome.
pub fn into_future(task: BoxTask) -> impl Future<Output = Outcome> {
    let (sender, receiver) = futures_intrusive::channel::shared::oneshot_channel();
    task.start(Completion::new("future", move |outcome| {
        // The receiver may already be gone if the caller dropped the future.
        let _ = sender.send(outcome);
    }));
    async move {
        receiver
            .receive()
            .await
            .unwrap_or_else(|| Err(Error::Abandoned("future".to_string())))
    }
}

/// Runs any number of tasks one after another. See [`serial`].
#[macro_export]
macro_rules! serial {
    ($($task:expr),* $(,)?) => {
        $crate::task::serial(::std::vec![$($crate::task::boxed($task)),*])
    };
}

/// Runs any number of tasks concurrently and joins them. See [`parallel`].
#[macro_export]
macro_rules! parallel {
    ($($task:expr),* $(,)?) => {
        $crate::task::parallel(::std::vec![$($crate::task::boxed($task)),*])
    };
}
