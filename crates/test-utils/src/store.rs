//! In-memory action-dispatch store.
//!
//! Mirrors the store the engine collaborates with in production: every
//! dispatch runs the reducer first, then hands the action to the scheduler
//! for trigger matching — so saga dispatches re-enter this store recursively.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use sagastep::{Action, Scheduler, StoreHandle};
use serde_json::Value;

/// A pure state-transition function.
pub type Reducer = fn(Value, &Action) -> Value;

/// Reducer that keeps the kind of the last dispatched action as the state.
///
/// The simplest observable state there is: asserting on it shows exactly
/// which dispatch happened last.
pub fn kind_reducer(_state: Value, action: &Action) -> Value {
    Value::String(action.kind().to_string())
}

/// An in-memory store wired to a [`Scheduler`].
///
/// Keeps a log of every dispatched action so tests can assert on the full
/// dispatch sequence, not just the final state.
pub struct MemoryStore {
    scheduler: Rc<Scheduler>,
    reducer: Reducer,
    state: RefCell<Value>,
    log: RefCell<Vec<Action>>,
    this: Weak<MemoryStore>,
}

impl MemoryStore {
    /// Create a store over the given scheduler.
    pub fn new(scheduler: Rc<Scheduler>, reducer: Reducer, initial: Value) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            scheduler,
            reducer,
            state: RefCell::new(initial),
            log: RefCell::new(Vec::new()),
            this: this.clone(),
        })
    }

    /// A store with [`kind_reducer`] and an initial state of `"@@init"`.
    pub fn with_kind_reducer(scheduler: Rc<Scheduler>) -> Rc<Self> {
        Self::new(scheduler, kind_reducer, Value::String("@@init".into()))
    }

    /// The current state as a string, for reducers that keep string state.
    ///
    /// Panics if the state is not a string; only use with such reducers.
    pub fn state_str(&self) -> String {
        match &*self.state.borrow() {
            Value::String(s) => s.clone(),
            other => panic!("store state is not a string: {other}"),
        }
    }

    /// Every action dispatched so far, in order.
    pub fn dispatched(&self) -> Vec<Action> {
        self.log.borrow().clone()
    }

    /// Kinds of every action dispatched so far, in order.
    pub fn dispatched_kinds(&self) -> Vec<String> {
        self.log
            .borrow()
            .iter()
            .map(|action| action.kind().to_string())
            .collect()
    }

    /// The scheduler this store feeds.
    pub fn scheduler(&self) -> &Rc<Scheduler> {
        &self.scheduler
    }
}

impl StoreHandle for MemoryStore {
    fn dispatch(&self, action: Action) -> sagastep::Result<()> {
        let next = (self.reducer)(self.state.borrow().clone(), &action);
        *self.state.borrow_mut() = next;
        self.log.borrow_mut().push(action.clone());

        // The weak self-reference only fails during construction, before any
        // dispatch can happen.
        let Some(this) = self.this.upgrade() else {
            return Ok(());
        };
        let handle: Rc<dyn StoreHandle> = this;
        self.scheduler.handle_action(&action, &handle)
    }

    fn state(&self) -> Value {
        self.state.borrow().clone()
    }
}
