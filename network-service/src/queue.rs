//! Posted-callback task queue
//!
//! The fake service never calls back synchronously. Responses and change
//! notifications are posted here and run, in FIFO order, when the owner drains
//! the queue. Tasks may post further tasks while running.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

type Task = Box<dyn FnOnce() + Send>;

/// FIFO queue of deferred callbacks
///
/// Clones share the same queue.
#[derive(Clone, Default)]
pub struct TaskQueue {
    tasks: Arc<Mutex<VecDeque<Task>>>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a task to the back of the queue
    pub fn post<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.tasks.lock().push_back(Box::new(task));
    }

    /// Run the task at the front of the queue, if any
    ///
    /// The queue lock is released before the task runs.
    pub fn run_one(&self) -> bool {
        let task = self.tasks.lock().pop_front();
        match task {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Run tasks until the queue is empty, including tasks posted meanwhile
    ///
    /// Returns the number of tasks run.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while self.run_one() {
            ran += 1;
        }
        trace!(ran, "task queue idle");
        ran
    }

    /// Number of tasks waiting
    pub fn pending(&self) -> usize {
        self.tasks.lock().len()
    }

    pub fn is_idle(&self) -> bool {
        self.tasks.lock().is_empty()
    }
}

impl std::fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskQueue")
            .field("pending", &self.pending())
            .finish()
    }
}
