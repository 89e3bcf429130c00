//! The scheduler: route registry, thread table, and the resume/fail protocol.
//!
//! One [`Scheduler`] value owns everything — there are no process-wide
//! singletons. The store invokes [`Scheduler::handle_action`] once per
//! dispatched action; a controller drives suspended threads forward with
//! [`Scheduler::continue_thread`] and [`Scheduler::error_thread`].
//!
//! # Execution model
//!
//! Strictly single-threaded and cooperative. A routine only runs inside an
//! explicit advance call (start, continue, error); everything it dispatches
//! between two suspension points happens synchronously before that call
//! returns, with no interleaving from other routines. Dispatches re-enter the
//! store and may recursively trigger *other* sagas; a recursive trigger for
//! the saga currently being advanced is resolved by its conflict policy once
//! the advance returns.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;
use tracing::{debug, info, trace, warn};

use crate::effect::Effect;
use crate::error::{Error, Result};
use crate::route::{OnConflict, Route};
use crate::saga::{Fault, Outcome, SagaContext, SagaRoutine, Step};
use crate::stats::{SchedulerStats, SchedulerStatsSnapshot};
use crate::store::{Action, StoreHandle};

/// Identity of a single running saga instance.
///
/// Instance numbers are a per-saga sequence starting at 0 and are never
/// reused, so successive instances of the same saga stay distinguishable in
/// logs and errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
pub struct ThreadId {
    saga: String,
    instance: u64,
}

impl ThreadId {
    fn new(saga: impl Into<String>, instance: u64) -> Self {
        Self {
            saga: saga.into(),
            instance,
        }
    }

    /// The saga name this thread runs under.
    pub fn saga(&self) -> &str {
        &self.saga
    }

    /// The per-saga instance number.
    pub fn instance(&self) -> u64 {
        self.instance
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.saga, self.instance)
    }
}

/// Configuration for a [`Scheduler`].
#[derive(Debug, Clone, Default)]
pub struct SchedulerConfig {
    /// Conflict policy for routes that don't set their own.
    ///
    /// Default: [`OnConflict::Queue`].
    pub default_on_conflict: OnConflict,
}

/// A suspended routine together with the effect it waits on.
///
/// Invariant: `effect.step()` always names the step the routine is genuinely
/// suspended on — resume validation runs against it before the routine is
/// touched.
struct RunningThread {
    id: ThreadId,
    effect: Effect,
    routine: Box<dyn SagaRoutine>,
    store: Weak<dyn StoreHandle>,
}

/// A trigger held back while the saga already had a live thread.
struct QueuedTrigger {
    action: Action,
    store: Weak<dyn StoreHandle>,
    /// True when this trigger should replace the running thread
    /// ([`OnConflict::CancelPrevious`] arriving mid-advance).
    replace: bool,
}

/// Per-saga bookkeeping: the live thread, the trigger queue, and the
/// instance counter.
#[derive(Default)]
struct SagaSlot {
    running: Option<RunningThread>,
    /// Set while a routine of this saga is on the stack inside an advance.
    advancing: Option<ThreadId>,
    queued: VecDeque<QueuedTrigger>,
    next_instance: u64,
}

impl SagaSlot {
    fn occupied(&self) -> bool {
        self.running.is_some() || self.advancing.is_some()
    }
}

/// The effect-stepping engine.
///
/// # Example
///
/// ```no_run
/// use std::rc::Rc;
/// use sagastep::{Action, Route, Scheduler, StoreHandle};
///
/// # fn factory(_: &[serde_json::Value]) -> Box<dyn sagastep::SagaRoutine> { unimplemented!() }
/// # fn store() -> Rc<dyn StoreHandle> { unimplemented!() }
/// let scheduler = Scheduler::new();
/// scheduler.register(Route::new("ORDER_PLACED", "order", factory));
///
/// let store: Rc<dyn StoreHandle> = store();
/// scheduler.handle_action(&Action::new("ORDER_PLACED"), &store)?;
/// scheduler.continue_thread("order", "reserve-stock", true)?;
/// # Ok::<(), sagastep::Error>(())
/// ```
#[derive(Default)]
pub struct Scheduler {
    routes: RefCell<HashMap<String, Route>>,
    slots: RefCell<HashMap<String, SagaSlot>>,
    config: SchedulerConfig,
    stats: SchedulerStats,
}

impl Scheduler {
    /// Create a scheduler with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scheduler with the given configuration.
    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Returns the scheduler configuration.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Register a route, overwriting any prior route for the same trigger.
    ///
    /// Never fails. Returns `&self` so registrations chain.
    pub fn register(&self, route: Route) -> &Self {
        debug!(
            trigger = route.trigger(),
            saga = route.saga_name(),
            "route registered"
        );
        self.routes
            .borrow_mut()
            .insert(route.trigger().to_string(), route);
        self
    }

    /// Handle a dispatched action: start a thread if a route matches.
    ///
    /// Called by the store after the action has reached its reducer. An
    /// action with no matching route is silently ignored. What happens when
    /// the matched saga already has a live thread is decided by the route's
    /// [`OnConflict`] policy.
    ///
    /// A routine that completes on its first advance records no thread. A
    /// fault escaping the first advance propagates as
    /// [`Error::StartFailed`], and no thread is recorded.
    pub fn handle_action(&self, action: &Action, store: &Rc<dyn StoreHandle>) -> Result<()> {
        let (saga_name, policy) = {
            let routes = self.routes.borrow();
            match routes.get(action.kind()) {
                Some(route) => (
                    route.saga_name().to_string(),
                    route.policy().unwrap_or(self.config.default_on_conflict),
                ),
                None => {
                    trace!(kind = action.kind(), "no route for action");
                    return Ok(());
                }
            }
        };

        let mut cancelled = None;
        {
            let mut slots = self.slots.borrow_mut();
            let slot = slots.entry(saga_name.clone()).or_default();
            if slot.occupied() {
                match policy {
                    OnConflict::Ignore => {
                        SchedulerStats::inc(&self.stats.triggers_ignored);
                        debug!(
                            saga = %saga_name,
                            kind = action.kind(),
                            "trigger ignored, saga already running"
                        );
                        return Ok(());
                    }
                    OnConflict::Queue => {
                        slot.queued.push_back(QueuedTrigger {
                            action: action.clone(),
                            store: Rc::downgrade(store),
                            replace: false,
                        });
                        SchedulerStats::inc(&self.stats.triggers_queued);
                        debug!(
                            saga = %saga_name,
                            kind = action.kind(),
                            queued = slot.queued.len(),
                            "trigger queued behind running thread"
                        );
                        return Ok(());
                    }
                    OnConflict::CancelPrevious => {
                        if slot.advancing.is_some() {
                            // The running routine is on the stack; replace it
                            // once its advance returns. Newest trigger wins.
                            slot.queued.clear();
                            slot.queued.push_back(QueuedTrigger {
                                action: action.clone(),
                                store: Rc::downgrade(store),
                                replace: true,
                            });
                            debug!(
                                saga = %saga_name,
                                kind = action.kind(),
                                "cancel deferred until the current advance returns"
                            );
                            return Ok(());
                        }
                        cancelled = slot.running.take();
                    }
                }
            }
        }
        if let Some(thread) = cancelled {
            SchedulerStats::inc(&self.stats.threads_cancelled);
            info!(thread = %thread.id, "thread cancelled by new trigger");
        }

        self.start_thread(&saga_name, action, store)
    }

    /// Resume the saga's thread with a success value.
    ///
    /// Fails without touching the thread if no thread is running for `saga`
    /// or if `step` does not match the step the thread is suspended on. On
    /// success the routine advances synchronously: its dispatches are visible
    /// before this call returns, and the table records either its next
    /// suspension or — on completion — nothing.
    pub fn continue_thread(&self, saga: &str, step: &str, value: impl Into<Value>) -> Result<()> {
        self.advance(saga, step, Outcome::Value(value.into()))
    }

    /// Resume the saga's thread by injecting a failure at its suspension.
    ///
    /// Same lookup and validation as [`continue_thread`](Self::continue_thread).
    /// The routine may absorb the fault (its own recovery path) or let it
    /// escape, in which case the thread is removed and the fault comes back
    /// as [`Error::SagaFailed`]. No automatic retry either way.
    pub fn error_thread(&self, saga: &str, step: &str, fault: impl Into<Fault>) -> Result<()> {
        self.advance(saga, step, Outcome::Failure(fault.into()))
    }

    /// The step label the saga's thread is currently suspended on.
    pub fn current_step(&self, saga: &str) -> Option<String> {
        let slots = self.slots.borrow();
        let running = slots.get(saga)?.running.as_ref()?;
        Some(running.effect.step().to_string())
    }

    /// The identity of the saga's running thread, if any.
    pub fn running_thread(&self, saga: &str) -> Option<ThreadId> {
        let slots = self.slots.borrow();
        Some(slots.get(saga)?.running.as_ref()?.id.clone())
    }

    /// How many triggers are held back for this saga.
    pub fn queued_triggers(&self, saga: &str) -> usize {
        self.slots
            .borrow()
            .get(saga)
            .map_or(0, |slot| slot.queued.len())
    }

    /// How many sagas currently have a running thread.
    pub fn running_count(&self) -> usize {
        self.slots
            .borrow()
            .values()
            .filter(|slot| slot.running.is_some())
            .count()
    }

    /// A snapshot of the lifecycle counters.
    pub fn stats(&self) -> SchedulerStatsSnapshot {
        self.stats.snapshot()
    }

    /// Construct a routine for the route matching `action` and advance it to
    /// its first suspension. The slot is marked mid-advance for the duration
    /// so recursive triggers for the same saga go through conflict handling.
    fn start_thread(
        &self,
        saga: &str,
        action: &Action,
        store: &Rc<dyn StoreHandle>,
    ) -> Result<()> {
        let instantiated = {
            let routes = self.routes.borrow();
            match routes.get(action.kind()) {
                Some(route) if route.saga_name() == saga => {
                    let mut slots = self.slots.borrow_mut();
                    let slot = slots.entry(saga.to_string()).or_default();
                    let id = ThreadId::new(saga, slot.next_instance);
                    slot.next_instance += 1;
                    slot.advancing = Some(id.clone());
                    Some((route.instantiate(), id))
                }
                // The route was re-registered while this trigger sat in the
                // queue; the trigger no longer belongs to this saga.
                _ => None,
            }
        };
        let Some((mut routine, id)) = instantiated else {
            debug!(
                kind = action.kind(),
                saga, "route changed since trigger was queued, dropping it"
            );
            return self.settle_slot(saga, None);
        };

        SchedulerStats::inc(&self.stats.threads_started);
        debug!(thread = %id, trigger = action.kind(), "starting saga thread");

        let ctx = SagaContext::new(id.clone(), store.as_ref());
        match routine.start(&ctx) {
            Ok(Step::Suspend(effect)) => {
                debug!(thread = %id, step = effect.step(), "thread suspended");
                self.settle_slot(
                    saga,
                    Some(RunningThread {
                        id,
                        effect,
                        routine,
                        store: Rc::downgrade(store),
                    }),
                )
            }
            Ok(Step::Done(_)) => {
                SchedulerStats::inc(&self.stats.threads_completed);
                debug!(thread = %id, "thread completed without suspending");
                self.settle_slot(saga, None)
            }
            Err(fault) => {
                SchedulerStats::inc(&self.stats.threads_failed);
                warn!(thread = %id, fault = %fault, "saga failed during start");
                self.settle_slot(saga, None)?;
                Err(Error::StartFailed { thread: id, fault })
            }
        }
    }

    /// Validate, take the thread out of the table, run one resume, and settle.
    fn advance(&self, saga: &str, step: &str, outcome: Outcome) -> Result<()> {
        let mut thread = {
            let mut slots = self.slots.borrow_mut();
            let Some(slot) = slots.get_mut(saga) else {
                return Err(Error::ThreadNotFound {
                    saga: saga.to_string(),
                });
            };
            if let Some(id) = &slot.advancing {
                return Err(Error::ThreadBusy { thread: id.clone() });
            }
            match slot.running.take() {
                Some(thread) if thread.effect.step() == step => {
                    slot.advancing = Some(thread.id.clone());
                    thread
                }
                Some(thread) => {
                    let err = Error::StepMismatch {
                        thread: thread.id.clone(),
                        actual: thread.effect.step().to_string(),
                        requested: step.to_string(),
                    };
                    slot.running = Some(thread);
                    return Err(err);
                }
                None => {
                    return Err(Error::ThreadNotFound {
                        saga: saga.to_string(),
                    })
                }
            }
        };

        let Some(store) = thread.store.upgrade() else {
            let id = thread.id.clone();
            let mut slots = self.slots.borrow_mut();
            if let Some(slot) = slots.get_mut(saga) {
                slot.advancing = None;
                slot.running = Some(thread);
            }
            return Err(Error::StoreGone { thread: id });
        };

        match &outcome {
            Outcome::Value(value) => {
                SchedulerStats::inc(&self.stats.resumes_delivered);
                debug!(thread = %thread.id, step, %value, "resuming thread with value");
            }
            Outcome::Failure(fault) => {
                SchedulerStats::inc(&self.stats.faults_injected);
                debug!(thread = %thread.id, step, %fault, "resuming thread with injected fault");
            }
        }

        let ctx = SagaContext::new(thread.id.clone(), store.as_ref());
        match thread.routine.resume(outcome, &ctx) {
            Ok(Step::Suspend(effect)) => {
                debug!(thread = %thread.id, step = effect.step(), "thread suspended");
                thread.effect = effect;
                self.settle_slot(saga, Some(thread))
            }
            Ok(Step::Done(_)) => {
                SchedulerStats::inc(&self.stats.threads_completed);
                info!(thread = %thread.id, "thread completed");
                self.settle_slot(saga, None)
            }
            Err(fault) => {
                SchedulerStats::inc(&self.stats.threads_failed);
                let id = thread.id.clone();
                let at_step = thread.effect.step().to_string();
                drop(thread);
                warn!(
                    thread = %id,
                    step = %at_step,
                    fault = %fault,
                    "fault escaped routine, removing thread"
                );
                self.settle_slot(saga, None)?;
                Err(Error::SagaFailed {
                    thread: id,
                    step: at_step,
                    fault,
                })
            }
        }
    }

    /// Close out an advance: re-install (or discard) the advanced thread,
    /// then start the next queued trigger if the slot is free.
    ///
    /// Each settlement pops at most one queued trigger; starting it settles
    /// again, so a backlog drains one instance at a time.
    fn settle_slot(&self, saga: &str, survivor: Option<RunningThread>) -> Result<()> {
        let (cancelled, next) = {
            let mut slots = self.slots.borrow_mut();
            let Some(slot) = slots.get_mut(saga) else {
                return Ok(());
            };
            slot.advancing = None;
            let replace = slot.queued.front().is_some_and(|queued| queued.replace);
            match survivor {
                Some(thread) if !replace => {
                    slot.running = Some(thread);
                    (None, None)
                }
                Some(thread) => (Some(thread), slot.queued.pop_front()),
                None => (None, slot.queued.pop_front()),
            }
        };
        if let Some(thread) = cancelled {
            SchedulerStats::inc(&self.stats.threads_cancelled);
            info!(thread = %thread.id, "thread cancelled by newer trigger");
        }

        let Some(queued) = next else { return Ok(()) };
        match queued.store.upgrade() {
            Some(store) => self.start_thread(saga, &queued.action, &store),
            None => {
                warn!(
                    saga,
                    kind = queued.action.kind(),
                    "dropping queued trigger, store handle is gone"
                );
                self.settle_slot(saga, None)
            }
        }
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("routes", &self.routes.borrow().len())
            .field("running", &self.running_count())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
