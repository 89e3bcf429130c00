//! Deterministic, step-controlled saga scheduler.
//!
//! Sagas are long-running, effectful workflows layered on an external
//! action-dispatch store. A saga never performs a side effect itself: it
//! suspends, declaring an [`Effect`] descriptor, and the scheduler resumes it
//! later with a success value or an injected failure. That inversion puts a
//! test harness (or, eventually, a live executor) in control of exactly when
//! and how every suspension point resolves — asynchronous business logic
//! becomes testable without real timers, network calls, or threads.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │                            Scheduler                               │
//! │                                                                    │
//! │   action dispatched ─▶ route lookup ─▶ factory builds routine      │
//! │   routine advances to first suspension ─▶ thread table records     │
//! │   (saga, instance) ↦ pending Effect                                │
//! │                                                                    │
//! │   continue_thread / error_thread ─▶ validate step label ─▶ resume  │
//! │   routine dispatches re-enter the store synchronously              │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::rc::Rc;
//! use sagastep::{
//!     Action, Fault, Outcome, Route, SagaContext, SagaRoutine, Scheduler, Step, StoreHandle,
//! };
//!
//! /// Waits once in "wait", then reports how it was resumed.
//! struct Confirm;
//!
//! impl SagaRoutine for Confirm {
//!     fn start(&mut self, _ctx: &SagaContext<'_>) -> Result<Step, Fault> {
//!         Ok(Step::wait("wait"))
//!     }
//!
//!     fn resume(&mut self, outcome: Outcome, ctx: &SagaContext<'_>) -> Result<Step, Fault> {
//!         match outcome {
//!             Outcome::Value(_) => ctx.dispatch(Action::new("SUCCESS"))?,
//!             Outcome::Failure(_) => ctx.dispatch(Action::new("ERROR"))?,
//!         }
//!         Ok(Step::done())
//!     }
//! }
//!
//! # fn store() -> Rc<dyn StoreHandle> { unimplemented!() }
//! let scheduler = Scheduler::new();
//! scheduler.register(Route::new("A", "A", |_| Box::new(Confirm)));
//!
//! // Wired behind a store: dispatching "A" starts the thread...
//! let store: Rc<dyn StoreHandle> = store();
//! scheduler.handle_action(&Action::new("A"), &store)?;
//!
//! // ...and the controller decides how "wait" resolves.
//! scheduler.continue_thread("A", "wait", 100)?;
//! # Ok::<(), sagastep::Error>(())
//! ```
//!
//! # Scope
//!
//! The surrounding store is an external collaborator, reached only through
//! the [`StoreHandle`] boundary. There is no parallelism, no persistence of
//! thread state, and no effect-result caching; a thread leaves the table only
//! by running to completion (or having a fault escape, which removes it).

#![warn(missing_docs)]

mod effect;
mod error;
mod route;
mod saga;
mod scheduler;
mod stats;
mod store;

pub use effect::{Effect, EffectKind, PendingCall};
pub use error::{Error, Result};
pub use route::{OnConflict, Route, SagaFactory};
pub use saga::{Fault, Outcome, SagaContext, SagaRoutine, Step};
pub use scheduler::{Scheduler, SchedulerConfig, ThreadId};
pub use stats::{SchedulerStats, SchedulerStatsSnapshot};
pub use store::{Action, StoreHandle};
