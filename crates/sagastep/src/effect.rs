//! Effect descriptors — the suspension points a saga yields to the scheduler.
//!
//! An effect never runs inside the engine. It is inert data describing what a
//! suspension *would* do, tagged with the step label the scheduler uses to
//! validate resumption. The controller (a test harness today, a live executor
//! eventually) decides when and how each suspension resolves.
//!
//! # Wait vs PendingCall
//!
//! | Kind | Carries | Resolved by |
//! |------|---------|-------------|
//! | [`EffectKind::Wait`] | step label only | controller supplies a value or fault |
//! | [`EffectKind::PendingCall`] | step label + described closure | a live executor may invoke the call; until then, same as `Wait` |
//!
//! # Example
//!
//! ```
//! use sagastep::Effect;
//!
//! let effect = Effect::wait("confirm");
//! assert_eq!(effect.step(), "confirm");
//! assert!(!effect.is_pending_call());
//! ```

use std::fmt;

use serde_json::Value;

use crate::saga::Fault;

/// A suspension point declared by a saga routine.
///
/// Only the step label is interpreted by the scheduler; the kind exists for
/// tooling and for a future live executor.
#[derive(Debug)]
pub struct Effect {
    step: String,
    kind: EffectKind,
}

impl Effect {
    /// A pure suspension: the routine waits for the controller to resolve it.
    pub fn wait(step: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            kind: EffectKind::Wait,
        }
    }

    /// A suspension that describes the call a live executor would perform.
    ///
    /// `describe` is a human-facing label for logs (e.g. `"clock.delay(100)"`).
    /// The closure is never invoked by the scheduler itself.
    ///
    /// # Example
    ///
    /// ```
    /// use sagastep::Effect;
    /// use serde_json::json;
    ///
    /// let effect = Effect::call("wait", "clock.delay(100)", || Ok(json!(100)));
    /// assert!(effect.is_pending_call());
    /// ```
    pub fn call(
        step: impl Into<String>,
        describe: impl Into<String>,
        invoke: impl FnOnce() -> Result<Value, Fault> + 'static,
    ) -> Self {
        Self {
            step: step.into(),
            kind: EffectKind::PendingCall(PendingCall::new(describe, invoke)),
        }
    }

    /// The step label the thread is suspended on.
    pub fn step(&self) -> &str {
        &self.step
    }

    /// Borrow the effect kind.
    pub fn kind(&self) -> &EffectKind {
        &self.kind
    }

    /// Returns `true` if this effect carries a pending call.
    pub fn is_pending_call(&self) -> bool {
        matches!(self.kind, EffectKind::PendingCall(_))
    }

    /// Consume the effect and return its kind.
    ///
    /// This is how an executor detaches a [`PendingCall`] for invocation.
    pub fn into_kind(self) -> EffectKind {
        self.kind
    }
}

/// What a suspension point asks of the outside world.
pub enum EffectKind {
    /// Nothing to execute: resolution always comes from the controller.
    Wait,
    /// A call reserved for a live executor.
    PendingCall(PendingCall),
}

impl fmt::Debug for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wait => f.write_str("Wait"),
            Self::PendingCall(call) => f.debug_tuple("PendingCall").field(&call.describe()).finish(),
        }
    }
}

/// A deferred call: a description for logs plus the closure that performs it.
///
/// Replaces a free-form (target, method, args) triple with something the
/// compiler can check: the closure captures whatever it needs and returns the
/// value the routine would be resumed with.
pub struct PendingCall {
    describe: String,
    invoke: Box<dyn FnOnce() -> Result<Value, Fault>>,
}

impl PendingCall {
    /// Create a pending call from a description and a closure.
    pub fn new(
        describe: impl Into<String>,
        invoke: impl FnOnce() -> Result<Value, Fault> + 'static,
    ) -> Self {
        Self {
            describe: describe.into(),
            invoke: Box::new(invoke),
        }
    }

    /// Human-facing description of the call.
    pub fn describe(&self) -> &str {
        &self.describe
    }

    /// Perform the call, consuming it.
    ///
    /// The scheduler never calls this; it exists for executors and tests.
    pub fn invoke(self) -> Result<Value, Fault> {
        (self.invoke)()
    }
}

impl fmt::Debug for PendingCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingCall")
            .field("describe", &self.describe)
            .finish_non_exhaustive()
    }
}
