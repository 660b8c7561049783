use std::{cell::RefCell, rc::Rc};

use super::{BoxTask, Completion, Outcome, Task};
use crate::error::Error;

/// Join state shared by all sub-tasks of one [`parallel`] run.
struct Join {
    remaining: usize,
    error: Option<Error>,
    done: Option<Completion>,
}

/// Combines `tasks` into a task that starts all of them without waiting on each other.
///
/// The combined task completes exactly once, after every sub-task has completed. Its outcome is
/// `Ok(())` if all sub-tasks succeeded and otherwise the first error that arrived. No order of
/// starts or completions among the sub-tasks is guaranteed. With no tasks it completes as soon
/// as it is started.
pub fn parallel<I>(tasks: I) -> impl Task
where
    I: IntoIterator<Item = BoxTask>,
{
    let tasks: Vec<BoxTask> = tasks.into_iter().collect();
    move |done: Completion| {
        if tasks.is_empty() {
            done.ok();
            return;
        }

        let label = done.label().to_string();
        // The counter is primed before the first start: sub-tasks may complete immediately.
        let join = Rc::new(RefCell::new(Join {
            remaining: tasks.len(),
            error: None,
            done: Some(done),
        }));

        for (index, task) in tasks.into_iter().enumerate() {
            let join = Rc::clone(&join);
            task.start(Completion::new(
                format!("{}/{}", label, index),
                move |outcome| arrive(&join, outcome),
            ));
        }
    }
}

fn arrive(join: &RefCell<Join>, outcome: Outcome) {
    let finished = {
        let mut state = join.borrow_mut();
        debug_assert!(state.remaining > 0, "join counter decremented past zero");
        state.remaining = state.remaining.saturating_sub(1);

        if let Err(error) = outcome {
            match state.error {
                None => state.error = Some(error),
                Some(_) => log::debug!("Discarding additional parallel failure: {}", error),
            }
        }

        if state.remaining == 0 {
            let error = state.error.take();
            state.done.take().map(|done| (done, error))
        } else {
            None
        }
    };

    if let Some((done, error)) = finished {
        match error {
            None => done.ok(),
            Some(error) => done.fail(error),
        }
    }
}
