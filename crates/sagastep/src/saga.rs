//! The saga routine abstraction: explicit state machines driven one
//! suspension at a time.
//!
//! A routine is a resumable computation. Instead of a language-level
//! coroutine, it is an ordinary struct whose fields are the saved
//! continuation: each call to [`SagaRoutine::start`] or [`SagaRoutine::resume`]
//! runs until the next suspension point and returns a [`Step`] describing
//! where the routine now stands.
//!
//! # Control flow
//!
//! ```text
//! not started ──start()──▶ suspended at step S ──resume(outcome)──▶ suspended at step S'
//!                               │                      │
//!                               │                      ├─▶ Done (completed)
//!                               │                      └─▶ Err(Fault) (failed, uncaught)
//! ```
//!
//! A routine may re-enter the same step label any number of times (loops),
//! and may dispatch actions through its [`SagaContext`] at any advance,
//! including the very first. All such dispatches happen synchronously inside
//! the advance call that triggered them.
//!
//! # Example
//!
//! A saga that waits once in step `"wait"`, then reports success or failure:
//!
//! ```
//! use sagastep::{Action, Fault, Outcome, SagaContext, SagaRoutine, Step};
//!
//! struct Confirm;
//!
//! impl SagaRoutine for Confirm {
//!     fn start(&mut self, _ctx: &SagaContext<'_>) -> Result<Step, Fault> {
//!         Ok(Step::wait("wait"))
//!     }
//!
//!     fn resume(&mut self, outcome: Outcome, ctx: &SagaContext<'_>) -> Result<Step, Fault> {
//!         match outcome {
//!             Outcome::Value(_) => ctx.dispatch(Action::new("CONFIRMED"))?,
//!             Outcome::Failure(_) => ctx.dispatch(Action::new("REJECTED"))?,
//!         }
//!         Ok(Step::done())
//!     }
//! }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::effect::Effect;
use crate::error::Error;
use crate::scheduler::ThreadId;
use crate::store::{Action, StoreHandle};

/// A resumable saga computation.
///
/// Implementations are explicit state machines: whatever the routine needs to
/// remember between suspensions lives in `self`. The scheduler guarantees
/// `start` is called exactly once, before any `resume`, and stops calling
/// after a [`Step::Done`] or an `Err`.
pub trait SagaRoutine {
    /// Advance from the initial state to the first suspension or completion.
    ///
    /// No externally supplied input exists yet; the routine runs on its bound
    /// arguments alone. An `Err` here is a start-time failure: the scheduler
    /// records no thread and surfaces [`Error::StartFailed`](crate::Error::StartFailed).
    fn start(&mut self, ctx: &SagaContext<'_>) -> Result<Step, Fault>;

    /// Advance from the current suspension with the controller's outcome.
    ///
    /// On [`Outcome::Failure`] the routine chooses: absorb the fault and
    /// return a new [`Step`] (its own recovery path), or propagate it with
    /// `Err`, in which case the scheduler removes the thread and surfaces
    /// [`Error::SagaFailed`](crate::Error::SagaFailed) to the resume caller.
    fn resume(&mut self, outcome: Outcome, ctx: &SagaContext<'_>) -> Result<Step, Fault>;
}

/// Where a routine stands after an advance.
#[derive(Debug)]
pub enum Step {
    /// Suspended: the routine waits on the given effect.
    Suspend(Effect),
    /// Completed with a final value (usually ignored).
    Done(Value),
}

impl Step {
    /// Suspend on a plain wait effect with the given step label.
    pub fn wait(step: impl Into<String>) -> Self {
        Self::Suspend(Effect::wait(step))
    }

    /// Complete with no interesting final value.
    pub fn done() -> Self {
        Self::Done(Value::Null)
    }

    /// Complete with a final value.
    pub fn done_with(value: impl Into<Value>) -> Self {
        Self::Done(value.into())
    }
}

/// What the controller delivered at a suspension point.
#[derive(Debug)]
pub enum Outcome {
    /// The effect resolved successfully with this value.
    Value(Value),
    /// A failure was injected at the suspension point.
    Failure(Fault),
}

/// A type-erased failure: the payload of an injected or internal error.
///
/// Faults cross the routine boundary in both directions — injected by
/// [`error_thread`](crate::Scheduler::error_thread), or propagated out of a
/// routine that does not absorb them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fault {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<Value>,
}

impl Fault {
    /// Create a fault from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            payload: None,
        }
    }

    /// Attach a structured payload.
    pub fn with_payload(mut self, payload: impl Into<Value>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// The fault message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The structured payload, if any.
    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<&str> for Fault {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for Fault {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// Lets routines `?` through nested dispatches: a scheduler error raised by a
/// recursive trigger becomes a fault of the dispatching routine.
impl From<Error> for Fault {
    fn from(err: Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Execution context handed to a routine at every advance.
///
/// Wraps the store boundary so the routine can dispatch actions and read
/// state, and identifies the thread for logging.
pub struct SagaContext<'a> {
    thread: ThreadId,
    store: &'a dyn StoreHandle,
}

impl<'a> SagaContext<'a> {
    pub(crate) fn new(thread: ThreadId, store: &'a dyn StoreHandle) -> Self {
        Self { thread, store }
    }

    /// Dispatch an action through the store.
    ///
    /// The dispatch is synchronous and may recursively trigger other sagas
    /// before it returns.
    pub fn dispatch(&self, action: Action) -> crate::Result<()> {
        self.store.dispatch(action)
    }

    /// Read the store's current state.
    pub fn state(&self) -> Value {
        self.store.state()
    }

    /// The identity of the thread this routine runs as.
    pub fn thread(&self) -> &ThreadId {
        &self.thread
    }
}
