//! Error types for sagastep.

use thiserror::Error;

use crate::saga::Fault;
use crate::scheduler::ThreadId;

/// A `Result` alias with [`enum@Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by scheduler operations.
///
/// All failures are synchronous: a resume call that cannot proceed fails
/// immediately, and nothing is retried. A trigger with no matching route is
/// not an error — it is silently ignored.
#[derive(Debug, Error)]
pub enum Error {
    /// A resume call named a saga with no running thread.
    #[error("no running thread for saga `{saga}`")]
    ThreadNotFound {
        /// The saga name the caller asked for.
        saga: String,
    },

    /// A resume call named a step the thread is not suspended on.
    ///
    /// This is a hard precondition check: the routine is not touched and the
    /// thread table is left exactly as it was.
    #[error("thread `{thread}` is in step `{actual}`, not `{requested}`, so refusing to resume")]
    StepMismatch {
        /// The thread the caller addressed.
        thread: ThreadId,
        /// The step the thread is actually suspended on.
        actual: String,
        /// The step the caller named.
        requested: String,
    },

    /// A resume call re-entered the saga that is currently being advanced.
    ///
    /// Advances are synchronous; a routine (or anything it dispatches to)
    /// must not resume its own thread from inside the advance.
    #[error("thread `{thread}` is mid-advance; re-entrant resume is not supported")]
    ThreadBusy {
        /// The thread currently on the stack.
        thread: ThreadId,
    },

    /// The routine failed during its first advance; no thread was recorded.
    #[error("saga `{thread}` failed during start: {fault}")]
    StartFailed {
        /// The instance that failed to start.
        thread: ThreadId,
        /// The escaping fault.
        fault: Fault,
    },

    /// A fault escaped the routine uncaught during a resume.
    ///
    /// The thread is removed from the table before this error is returned;
    /// a later resume for the same saga fails with [`Error::ThreadNotFound`].
    #[error("saga `{thread}` failed uncaught in step `{step}`: {fault}")]
    SagaFailed {
        /// The instance that failed.
        thread: ThreadId,
        /// The step it was suspended on when the fault was delivered.
        step: String,
        /// The escaping fault.
        fault: Fault,
    },

    /// The store handle captured at thread start has been dropped.
    #[error("store handle for thread `{thread}` is gone")]
    StoreGone {
        /// The thread whose store went away.
        thread: ThreadId,
    },
}
