//! Scheduler port: the host event loop's "call later" capability.

use std::time::Duration;

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs tasks on a later turn of the host event loop.
///
/// Replayed and synthetic deliveries go through this port so that a
/// continuation never fires inside the call that issued the request.
pub trait Scheduler: Send + Sync {
    /// Runs `task` after `delay`, never inline.
    fn call_later(&self, delay: Duration, task: Task);
}
