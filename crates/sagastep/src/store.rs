//! The action-dispatch store boundary.
//!
//! The scheduler never owns a store. It is invoked once per dispatched action
//! (after the action has reached the store's reducer) and drives further
//! dispatches itself as routines advance — those re-enter the store's
//! dispatch path recursively. Everything the engine needs from the store is
//! captured by [`StoreHandle`]; a reference in-memory implementation lives in
//! the workspace's `test-utils` crate.

use serde_json::Value;

/// An action flowing through the store.
///
/// `kind` is the trigger key routes match on; the payload is opaque to the
/// engine.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Action {
    kind: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    payload: Value,
}

impl Action {
    /// Create an action with no payload.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: Value::Null,
        }
    }

    /// Attach a payload.
    pub fn with_payload(mut self, payload: impl Into<Value>) -> Self {
        self.payload = payload.into();
        self
    }

    /// The action kind (trigger key).
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The action payload (`Value::Null` when absent).
    pub fn payload(&self) -> &Value {
        &self.payload
    }
}

/// What the engine needs from the surrounding store.
///
/// Handles are shared (`Rc<dyn StoreHandle>`) because a running thread keeps
/// one for later resumes; the scheduler holds it weakly so dropping the store
/// tears the wiring down cleanly.
pub trait StoreHandle {
    /// Dispatch an action: reduce it into state, then hand it back to the
    /// scheduler for trigger matching.
    ///
    /// Errors from sagas started by this dispatch propagate to the caller.
    fn dispatch(&self, action: Action) -> crate::Result<()>;

    /// A snapshot of the store's current state.
    fn state(&self) -> Value;
}
