//! Single-flight render scheduler with a trailing rerun.
//!
//! # Algorithm
//!
//! Every request bumps a generation counter, which cancels any token issued
//! for an older generation, and raises the rerun flag. If no pass is running
//! the caller starts a drain loop on the blocking pool; otherwise the running
//! loop picks the flag up when its current pass ends. Any burst of requests
//! during one pass therefore collapses into a single trailing pass that sees
//! the latest state.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::Notify;

/// How a render pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    Completed,
    /// Superseded by a newer request; nothing further was published.
    Cancelled,
}

/// Cooperative cancellation: a token is live until a newer generation is requested.
#[derive(Debug, Clone)]
pub struct CancelToken {
    issued: u64,
    live: Arc<AtomicU64>,
}

impl CancelToken {
    /// Generation this token was issued for.
    pub fn generation(&self) -> u64 {
        self.issued
    }

    pub fn is_cancelled(&self) -> bool {
        self.live.load(Ordering::Acquire) != self.issued
    }
}

#[cfg(test)]
impl CancelToken {
    pub(crate) fn for_tests(issued: u64, live: u64) -> Self {
        Self {
            issued,
            live: Arc::new(AtomicU64::new(live)),
        }
    }
}

/// Work executed by the scheduler. Runs on tokio's blocking pool.
pub trait RenderPass: Send + Sync + 'static {
    fn run(&self, cancel: &CancelToken) -> PassOutcome;
}

struct SchedulerState<P> {
    pass: P,
    generation: Arc<AtomicU64>,
    running: AtomicBool,
    rerun: AtomicBool,
    passes: AtomicU64,
    idle: Notify,
}

impl<P: RenderPass> SchedulerState<P> {
    fn drain(&self) {
        loop {
            while self.rerun.swap(false, Ordering::AcqRel) {
                let token = CancelToken {
                    issued: self.generation.load(Ordering::Acquire),
                    live: Arc::clone(&self.generation),
                };
                tracing::debug!(generation = token.issued, "render pass started");

                let outcome = self.pass.run(&token);
                self.passes.fetch_add(1, Ordering::AcqRel);
                match outcome {
                    PassOutcome::Completed => {
                        tracing::debug!(generation = token.issued, "render pass finished")
                    }
                    PassOutcome::Cancelled => {
                        tracing::debug!(generation = token.issued, "render pass cancelled")
                    }
                }
            }

            self.running.store(false, Ordering::Release);

            // A request may have raised the flag after the last swap but
            // before `running` dropped; it saw us running and did not spawn.
            if !self.rerun.load(Ordering::Acquire)
                || self
                    .running
                    .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                    .is_err()
            {
                break;
            }
        }
        self.idle.notify_waiters();
    }
}

/// Coalescing render trigger. Cheap to call at any rate from any thread.
pub struct RenderScheduler<P: RenderPass> {
    state: Arc<SchedulerState<P>>,
    runtime: Handle,
}

impl<P: RenderPass> RenderScheduler<P> {
    pub fn new(pass: P, runtime: Handle) -> Self {
        Self {
            state: Arc::new(SchedulerState {
                pass,
                generation: Arc::new(AtomicU64::new(0)),
                running: AtomicBool::new(false),
                rerun: AtomicBool::new(false),
                passes: AtomicU64::new(0),
                idle: Notify::new(),
            }),
            runtime,
        }
    }

    pub fn pass(&self) -> &P {
        &self.state.pass
    }

    /// Ask for a render of the current state. Returns the request's generation.
    pub fn request(&self) -> u64 {
        let generation = self.state.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.state.rerun.store(true, Ordering::Release);

        if self
            .state
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            let state = Arc::clone(&self.state);
            self.runtime.spawn_blocking(move || state.drain());
        } else {
            tracing::trace!(generation, "render coalesced into trailing pass");
        }
        generation
    }

    /// Latest requested generation.
    pub fn generation(&self) -> u64 {
        self.state.generation.load(Ordering::Acquire)
    }

    /// Passes executed so far, cancelled ones included.
    pub fn passes_run(&self) -> u64 {
        self.state.passes.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::Acquire)
    }

    /// Resolve once no pass is running or pending.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.state.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            // A raised rerun flag means a pass is about to start.
            if !self.state.running.load(Ordering::Acquire) && !self.state.rerun.load(Ordering::Acquire) {
                return;
            }
            notified.await;
        }
    }
}
