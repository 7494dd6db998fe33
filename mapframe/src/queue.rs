//! Blocking job queue between the render path and the worker pool.
//!
//! Jobs are ordered by priority (higher values first), then by enqueue order
//! (FIFO within the same priority level). Everything submitted through
//! [`JobQueue::push`] shares [`Priority::NORMAL`], so the default behaviour
//! is plain FIFO; [`JobQueue::push_with_priority`] is the extension point
//! for orderings such as distance from the view centre.
//!
//! # Lifecycle of a job
//!
//! ```text
//! push ──► queued ──► pop ──► in flight ──► complete
//! ```
//!
//! A job that is queued or in flight is not accepted a second time, so
//! repeated redraws of the same view do not pile up duplicate work.
//!
//! # Shutdown
//!
//! [`JobQueue::close`] wakes every blocked [`JobQueue::pop`], which then
//! returns `None` without taking a job. Jobs still queued stay in the queue
//! and can be recovered with [`JobQueue::drain`].

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::job::Job;

/// Scheduling priority of a queued job. Higher runs first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(pub i32);

impl Priority {
    /// Priority of every job submitted without an explicit one.
    pub const NORMAL: Priority = Priority(0);

    /// Priority decreasing with the distance of a tile from the view centre,
    /// measured in tiles.
    pub fn from_distance(distance: f64) -> Self {
        Priority(-(distance.abs().min(i32::MAX as f64) as i32))
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::NORMAL
    }
}

struct QueuedJob {
    job: Job,
    priority: Priority,
    /// Monotonic per-queue counter for FIFO ordering within a priority.
    sequence: u64,
}

// Ordering for BinaryHeap: higher priority first, then lower sequence (older) first
impl PartialEq for QueuedJob {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.sequence == other.sequence
    }
}

impl Eq for QueuedJob {}

impl PartialOrd for QueuedJob {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedJob {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.priority.cmp(&other.priority) {
            Ordering::Equal => other.sequence.cmp(&self.sequence),
            other_ordering => other_ordering,
        }
    }
}

#[derive(Default)]
struct QueueState {
    heap: BinaryHeap<QueuedJob>,
    queued: HashSet<Job>,
    in_flight: HashSet<Job>,
    next_sequence: u64,
    closed: bool,
}

/// Blocking multi-producer, multi-consumer job handoff.
#[derive(Default)]
pub struct JobQueue {
    state: Mutex<QueueState>,
    available: Condvar,
    idle: Condvar,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `job` at normal priority.
    ///
    /// Returns `false` if the job was not accepted because it is already
    /// queued or in flight, or because the queue is closed.
    pub fn push(&self, job: Job) -> bool {
        self.push_with_priority(job, Priority::NORMAL)
    }

    /// Appends `job` with an explicit priority.
    pub fn push_with_priority(&self, job: Job, priority: Priority) -> bool {
        let mut state = self.state.lock();
        if state.closed || state.queued.contains(&job) || state.in_flight.contains(&job) {
            return false;
        }

        let sequence = state.next_sequence;
        state.next_sequence += 1;
        state.queued.insert(job.clone());
        state.heap.push(QueuedJob {
            job,
            priority,
            sequence,
        });
        drop(state);

        self.available.notify_one();
        true
    }

    /// Takes the next job, blocking until one is available.
    ///
    /// Returns `None` once the queue is closed. The returned job counts as in
    /// flight until [`JobQueue::complete`] is called for it.
    pub fn pop(&self) -> Option<Job> {
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return None;
            }
            if let Some(queued) = state.heap.pop() {
                state.queued.remove(&queued.job);
                state.in_flight.insert(queued.job.clone());
                return Some(queued.job);
            }
            self.available.wait(&mut state);
        }
    }

    /// Marks an in-flight job as finished, successfully or not.
    pub fn complete(&self, job: &Job) {
        let mut state = self.state.lock();
        state.in_flight.remove(job);
        let idle = state.heap.is_empty() && state.in_flight.is_empty();
        drop(state);

        if idle {
            self.idle.notify_all();
        }
    }

    /// Closes the queue and wakes every blocked consumer.
    ///
    /// Queued jobs are kept; further pushes are rejected.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.available.notify_all();
        self.idle.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Removes and returns every queued job in scheduling order.
    pub fn drain(&self) -> Vec<Job> {
        let mut state = self.state.lock();
        let mut jobs = Vec::with_capacity(state.heap.len());
        while let Some(queued) = state.heap.pop() {
            jobs.push(queued.job);
        }
        state.queued.clear();
        jobs
    }

    /// Number of queued jobs, excluding those in flight.
    pub fn len(&self) -> usize {
        self.state.lock().heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of jobs taken by workers and not yet completed.
    pub fn in_flight(&self) -> usize {
        self.state.lock().in_flight.len()
    }

    /// True if nothing is queued or in flight.
    pub fn is_idle(&self) -> bool {
        let state = self.state.lock();
        state.heap.is_empty() && state.in_flight.is_empty()
    }

    /// Blocks until the queue is idle, closed, or `timeout` elapses.
    ///
    /// Returns true if the queue became idle.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        loop {
            if state.heap.is_empty() && state.in_flight.is_empty() {
                return true;
            }
            if state.closed {
                return false;
            }
            if self.idle.wait_until(&mut state, deadline).timed_out() {
                return state.heap.is_empty() && state.in_flight.is_empty();
            }
        }
    }
}

impl std::fmt::Debug for JobQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("JobQueue")
            .field("queued", &state.heap.len())
            .field("in_flight", &state.in_flight.len())
            .field("closed", &state.closed)
            .finish()
    }
}
