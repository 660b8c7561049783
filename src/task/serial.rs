use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use super::{BoxTask, Completion, Task};
use crate::error::Error;

struct Chain {
    tasks: VecDeque<BoxTask>,
    done: Option<Completion>,
    started: usize,
    // Set while `drive` is looping; completions arriving meanwhile only raise `ready`.
    driving: bool,
    ready: bool,
}

/// Combines `tasks` into a task that runs them in order.
///
/// Task `i + 1` is started only after task `i` has completed successfully. The combined task
/// completes after the last task, or with the first error, in which case the remaining tasks
/// are dropped without being started. With no tasks it completes as soon as it is started.
pub fn serial<I>(tasks: I) -> impl Task
where
    I: IntoIterator<Item = BoxTask>,
{
    let tasks: VecDeque<BoxTask> = tasks.into_iter().collect();
    move |done: Completion| {
        let chain = Rc::new(RefCell::new(Chain {
            tasks,
            done: Some(done),
            started: 0,
            driving: false,
            ready: false,
        }));
        drive(&chain);
    }
}

/// Starts the next task. Sub-tasks that complete from inside their own `start` are picked up by
/// the running loop instead of recursing.
fn drive(chain: &Rc<RefCell<Chain>>) {
    {
        let mut state = chain.borrow_mut();
        state.ready = true;
        if state.driving {
            return;
        }
        state.driving = true;
    }

    loop {
        let (task, label) = {
            let mut state = chain.borrow_mut();
            if !state.ready {
                state.driving = false;
                return;
            }
            state.ready = false;

            let next = state.tasks.pop_front();
            match next {
                Some(task) => {
                    let label = match &state.done {
                        Some(done) => format!("{}/{}", done.label(), state.started),
                        None => state.started.to_string(),
                    };
                    state.started += 1;
                    (task, label)
                }
                None => {
                    state.driving = false;
                    let done = state.done.take();
                    drop(state);
                    if let Some(done) = done {
                        done.ok();
                    }
                    return;
                }
            }
        };

        let link = Rc::clone(chain);
        task.start(Completion::new(label, move |outcome| match outcome {
            Ok(()) => drive(&link),
            Err(error) => fail(&link, error),
        }));
    }
}

fn fail(chain: &Rc<RefCell<Chain>>, error: Error) {
    let (done, skipped) = {
        let mut state = chain.borrow_mut();
        (state.done.take(), std::mem::take(&mut state.tasks))
    };
    if !skipped.is_empty() {
        log::debug!(
            "Serial task stopped at `{}`, skipping {} remaining task(s)",
            error.id(),
            skipped.len()
        );
    }
    drop(skipped);
    if let Some(done) = done {
        done.fail(error);
    }
}
