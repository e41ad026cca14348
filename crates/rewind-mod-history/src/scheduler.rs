/// Deferred work on the owning thread.
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// A continuation posted to a `Scheduler`.
pub type Task = Box<dyn FnOnce()>;

/// Single-consumer task queue owned by the thread that owns the engine.
///
/// `post` must not run the task inline: it runs later, after the caller's
/// stack has unwound back to the owner's loop.
pub trait Scheduler {
    /// Queues `task` to run exactly once.
    fn post(&self, task: Task);
}

/// FIFO queue drained explicitly by its owner.
///
/// Clones share the same queue, so one clone can be handed to an
/// `UndoSystem` while the host keeps another to drain.
#[derive(Clone, Default)]
pub struct LocalQueue {
    tasks: Rc<RefCell<VecDeque<Task>>>,
}

impl std::fmt::Debug for LocalQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalQueue")
            .field("pending", &self.len())
            .finish()
    }
}

impl LocalQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks waiting to run.
    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Whether no task is waiting.
    pub fn is_empty(&self) -> bool {
        self.tasks.borrow().is_empty()
    }

    /// Runs queued tasks in order until the queue is empty.
    ///
    /// Tasks posted while draining run in the same call. Returns how many
    /// tasks ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            // The borrow must end before the task runs; tasks may post more.
            let next = self.tasks.borrow_mut().pop_front();
            let Some(task) = next else {
                break;
            };
            task();
            ran += 1;
        }
        ran
    }
}

impl Scheduler for LocalQueue {
    fn post(&self, task: Task) {
        self.tasks.borrow_mut().push_back(task);
    }
}
