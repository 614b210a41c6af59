//! Cancellation of superseded jobs
//!
//! A job is one logical async operation (a page navigation). Starting a new job
//! cancels whatever job was current before it. Cancellation is cooperative: the
//! canceled job keeps running until it next checks its token, then bails out.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Cancellation flag shared between a job and the manager that started it
#[derive(Debug, Clone, Default)]
pub struct JobToken {
    canceled: Rc<Cell<bool>>,
}

impl JobToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.get()
    }

    pub fn cancel(&self) {
        self.canceled.set(true);
    }

    /// Whether two handles refer to the same job
    pub fn same_job(&self, other: &JobToken) -> bool {
        Rc::ptr_eq(&self.canceled, &other.canceled)
    }
}

/// Tracks the current job and how many jobs are still on the stack
///
/// Jobs are expected to nest: loading a page may itself trigger a navigation.
/// The nested job becomes current and every outer job is canceled. Once all
/// started jobs have ended the manager forgets the current token.
#[derive(Debug, Default)]
pub struct JobManager {
    concurrent_jobs: Cell<usize>,
    current: RefCell<Option<JobToken>>,
}

impl JobManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the start of a job and hand out its token
    ///
    /// Every call must be paired with [`end_job`](Self::end_job) on every exit
    /// path. Prefer [`begin`](Self::begin), which does that on drop.
    pub fn start_job(&self) -> JobToken {
        self.concurrent_jobs.set(self.concurrent_jobs.get() + 1);

        let token = JobToken::new();
        if let Some(previous) = self.current.borrow_mut().replace(token.clone()) {
            previous.cancel();
        }

        log::trace!("Job started ({} running)", self.concurrent_jobs.get());
        token
    }

    /// Record the end of a job
    pub fn end_job(&self) {
        let remaining = self.concurrent_jobs.get().saturating_sub(1);
        self.concurrent_jobs.set(remaining);
        log::trace!("Job ended ({} running)", remaining);

        if remaining == 0 {
            self.reset();
        }
    }

    /// Start a job whose end is recorded when the returned guard drops
    pub fn begin(&self) -> JobGuard<'_> {
        let token = self.start_job();
        JobGuard { manager: self, token }
    }

    pub fn current(&self) -> Option<JobToken> {
        self.current.borrow().clone()
    }

    pub fn running_jobs(&self) -> usize {
        self.concurrent_jobs.get()
    }

    fn reset(&self) {
        self.concurrent_jobs.set(0);
        *self.current.borrow_mut() = None;
    }
}

/// Ends its job on drop, including early returns, `?` and dropped futures
#[derive(Debug)]
pub struct JobGuard<'a> {
    manager: &'a JobManager,
    token: JobToken,
}

impl JobGuard<'_> {
    pub fn token(&self) -> &JobToken {
        &self.token
    }

    pub fn is_canceled(&self) -> bool {
        self.token.is_canceled()
    }
}

impl Drop for JobGuard<'_> {
    fn drop(&mut self) {
        self.manager.end_job();
    }
}
