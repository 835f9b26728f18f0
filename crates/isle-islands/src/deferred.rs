//! Deferred task scheduling.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

/// A unit of deferred work.
pub type DeferredTask = Box<dyn FnOnce()>;

/// Runs work after the current task, preferably when the host is idle.
pub trait DeferredScheduler {
    /// Whether the host can report idle periods.
    fn idle_available(&self) -> bool;

    /// Run `task` during the next idle period.
    fn request_idle(&self, task: DeferredTask);

    /// Run `task` on the next turn of the event loop.
    fn set_zero_timeout(&self, task: DeferredTask);
}

/// Schedule `task` on idle, falling back to a zero-delay timer when the
/// host has no idle callback.
pub fn schedule_deferred(scheduler: &dyn DeferredScheduler, task: DeferredTask) {
    if scheduler.idle_available() {
        scheduler.request_idle(task);
    } else {
        scheduler.set_zero_timeout(task);
    }
}

/// Explicit task queues, drained by the host loop.
pub struct TaskQueueScheduler {
    idle_available: Cell<bool>,
    idle: RefCell<VecDeque<DeferredTask>>,
    timers: RefCell<VecDeque<DeferredTask>>,
}

impl TaskQueueScheduler {
    /// Create a scheduler; `idle_available` says whether idle callbacks exist.
    pub fn new(idle_available: bool) -> Self {
        Self {
            idle_available: Cell::new(idle_available),
            idle: RefCell::new(VecDeque::new()),
            timers: RefCell::new(VecDeque::new()),
        }
    }

    /// Toggle idle callback support.
    pub fn set_idle_available(&self, available: bool) {
        self.idle_available.set(available);
    }

    /// Tasks waiting for an idle period.
    pub fn pending_idle(&self) -> usize {
        self.idle.borrow().len()
    }

    /// Tasks waiting on a zero-delay timer.
    pub fn pending_timers(&self) -> usize {
        self.timers.borrow().len()
    }

    /// Run queued timer tasks. Returns the number run.
    pub fn run_timers(&self) -> usize {
        drain(&self.timers)
    }

    /// Run queued idle tasks. Returns the number run.
    pub fn run_idle(&self) -> usize {
        drain(&self.idle)
    }

    /// Run everything, including tasks queued by tasks.
    pub fn run_all(&self) -> usize {
        let mut ran = 0;
        loop {
            let n = self.run_timers() + self.run_idle();
            if n == 0 {
                return ran;
            }
            ran += n;
        }
    }
}

impl Default for TaskQueueScheduler {
    fn default() -> Self {
        Self::new(true)
    }
}

fn drain(queue: &RefCell<VecDeque<DeferredTask>>) -> usize {
    let mut ran = 0;
    loop {
        // The borrow must end before the task runs; tasks may enqueue more.
        let task = queue.borrow_mut().pop_front();
        match task {
            Some(task) => {
                task();
                ran += 1;
            }
            None => return ran,
        }
    }
}

impl DeferredScheduler for TaskQueueScheduler {
    fn idle_available(&self) -> bool {
        self.idle_available.get()
    }

    fn request_idle(&self, task: DeferredTask) {
        self.idle.borrow_mut().push_back(task);
    }

    fn set_zero_timeout(&self, task: DeferredTask) {
        self.timers.borrow_mut().push_back(task);
    }
}
