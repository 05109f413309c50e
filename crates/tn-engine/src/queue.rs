//! Pending-request queue shared between submitters and the scheduler.
//!
//! Normal requests go to the back.  Urgent requests go in front of every
//! normal request but behind earlier urgent ones, so ordering stays FIFO
//! within each class.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

use tn_core::RequestId;

use crate::request::Job;

struct Inner {
    jobs:     VecDeque<Job>,
    /// Number of urgent jobs at the front of `jobs`.
    urgent:   usize,
    shutdown: bool,
}

pub(crate) struct RequestQueue {
    inner: Mutex<Inner>,
    ready: Condvar,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner { jobs: VecDeque::new(), urgent: 0, shutdown: false }),
            ready: Condvar::new(),
        }
    }

    pub fn push(&self, job: Job) {
        let mut inner = self.inner.lock();
        if job.request.urgent {
            let at = inner.urgent;
            inner.jobs.insert(at, job);
            inner.urgent += 1;
        } else {
            inner.jobs.push_back(job);
        }
        drop(inner);
        self.ready.notify_one();
    }

    pub fn try_pop(&self) -> Option<Job> {
        let mut inner = self.inner.lock();
        let job = inner.jobs.pop_front()?;
        if inner.urgent > 0 {
            inner.urgent -= 1;
        }
        Some(job)
    }

    /// Remove a still-queued job.
    pub fn remove(&self, id: RequestId) -> Option<Job> {
        let mut inner = self.inner.lock();
        let at = inner.jobs.iter().position(|j| j.id() == id)?;
        if at < inner.urgent {
            inner.urgent -= 1;
        }
        inner.jobs.remove(at)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Block until a job is queued or the queue shuts down.  Returns `false`
    /// on shutdown.
    pub fn wait_for_work(&self) -> bool {
        let mut inner = self.inner.lock();
        while inner.jobs.is_empty() && !inner.shutdown {
            self.ready.wait(&mut inner);
        }
        !inner.shutdown
    }

    pub fn is_shutdown(&self) -> bool {
        self.inner.lock().shutdown
    }

    /// Wake every waiter and make `wait_for_work` return `false` from now on.
    pub fn shutdown(&self) {
        self.inner.lock().shutdown = true;
        self.ready.notify_all();
    }
}
