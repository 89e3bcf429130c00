//! Fixture sagas for testing the stepping engine.
//!
//! Each fixture is a deliberately small explicit state machine covering one
//! protocol behavior: absorb vs propagate faults, loops, multi-step
//! sequences, mutual triggering, and re-triggering the own saga.

use sagastep::{Action, Effect, Fault, Outcome, SagaContext, SagaRoutine, Step};
use serde_json::Value;

fn truthy(value: &Value) -> bool {
    matches!(value, Value::Bool(true))
}

/// Waits once in step `wait`; a value dispatches `on_success`, an injected
/// fault is absorbed and dispatches `on_error`.
pub struct WaitThenDispatch {
    on_success: String,
    on_error: String,
}

impl WaitThenDispatch {
    pub fn new(on_success: impl Into<String>, on_error: impl Into<String>) -> Self {
        Self {
            on_success: on_success.into(),
            on_error: on_error.into(),
        }
    }
}

impl SagaRoutine for WaitThenDispatch {
    fn start(&mut self, _ctx: &SagaContext<'_>) -> Result<Step, Fault> {
        Ok(Step::wait("wait"))
    }

    fn resume(&mut self, outcome: Outcome, ctx: &SagaContext<'_>) -> Result<Step, Fault> {
        match outcome {
            Outcome::Value(_) => ctx.dispatch(Action::new(&self.on_success))?,
            Outcome::Failure(_) => ctx.dispatch(Action::new(&self.on_error))?,
        }
        Ok(Step::done())
    }
}

/// Factory reading the success/error action kinds from the route's bound args.
pub fn wait_then_dispatch_factory(args: &[Value]) -> Box<dyn SagaRoutine> {
    let on_success = args.first().and_then(Value::as_str).unwrap_or("SUCCESS");
    let on_error = args.get(1).and_then(Value::as_str).unwrap_or("ERROR");
    Box::new(WaitThenDispatch::new(on_success, on_error))
}

/// Waits once in step `wait`, then dispatches `on_true` or `on_false`
/// depending on the resumed value. Injected faults are NOT absorbed.
pub struct IfTrueAElseB {
    on_true: String,
    on_false: String,
}

impl IfTrueAElseB {
    pub fn new(on_true: impl Into<String>, on_false: impl Into<String>) -> Self {
        Self {
            on_true: on_true.into(),
            on_false: on_false.into(),
        }
    }
}

impl SagaRoutine for IfTrueAElseB {
    fn start(&mut self, _ctx: &SagaContext<'_>) -> Result<Step, Fault> {
        Ok(Step::wait("wait"))
    }

    fn resume(&mut self, outcome: Outcome, ctx: &SagaContext<'_>) -> Result<Step, Fault> {
        match outcome {
            Outcome::Value(value) if truthy(&value) => {
                ctx.dispatch(Action::new(&self.on_true))?;
            }
            Outcome::Value(_) => ctx.dispatch(Action::new(&self.on_false))?,
            Outcome::Failure(fault) => return Err(fault),
        }
        Ok(Step::done())
    }
}

/// Consumes `n` values in step `wait` (dispatching `wait-<i>` after each),
/// then waits once in step `end` before dispatching `done`.
pub struct WaitNTimes {
    n: u32,
    seen: u32,
}

impl WaitNTimes {
    pub fn new(n: u32) -> Self {
        Self { n, seen: 0 }
    }
}

impl SagaRoutine for WaitNTimes {
    fn start(&mut self, _ctx: &SagaContext<'_>) -> Result<Step, Fault> {
        if self.n == 0 {
            return Ok(Step::wait("end"));
        }
        Ok(Step::wait("wait"))
    }

    fn resume(&mut self, _outcome: Outcome, ctx: &SagaContext<'_>) -> Result<Step, Fault> {
        if self.seen < self.n {
            ctx.dispatch(Action::new(format!("wait-{}", self.seen)))?;
            self.seen += 1;
            if self.seen < self.n {
                return Ok(Step::wait("wait"));
            }
            return Ok(Step::wait("end"));
        }
        ctx.dispatch(Action::new("done"))?;
        Ok(Step::done())
    }
}

/// Blocks in step `wait` until resumed with `true`, dispatching `looping`
/// on every falsy value.
pub struct WaitUntilTrue;

impl SagaRoutine for WaitUntilTrue {
    fn start(&mut self, _ctx: &SagaContext<'_>) -> Result<Step, Fault> {
        Ok(Step::wait("wait"))
    }

    fn resume(&mut self, outcome: Outcome, ctx: &SagaContext<'_>) -> Result<Step, Fault> {
        match outcome {
            Outcome::Value(value) if truthy(&value) => {
                ctx.dispatch(Action::new("done"))?;
                Ok(Step::done())
            }
            Outcome::Value(_) => {
                ctx.dispatch(Action::new("looping"))?;
                Ok(Step::wait("wait"))
            }
            Outcome::Failure(fault) => Err(fault),
        }
    }
}

/// Echoes the resumed value back as the payload of an `ECHO` action.
pub struct Echo;

impl SagaRoutine for Echo {
    fn start(&mut self, _ctx: &SagaContext<'_>) -> Result<Step, Fault> {
        Ok(Step::wait("wait"))
    }

    fn resume(&mut self, outcome: Outcome, ctx: &SagaContext<'_>) -> Result<Step, Fault> {
        match outcome {
            Outcome::Value(value) => {
                ctx.dispatch(Action::new("ECHO").with_payload(value))?;
                Ok(Step::done())
            }
            Outcome::Failure(fault) => Err(fault),
        }
    }
}

/// Dispatches `notify` during its first advance and completes without ever
/// suspending.
pub struct NoSuspend {
    notify: String,
}

impl NoSuspend {
    pub fn new(notify: impl Into<String>) -> Self {
        Self {
            notify: notify.into(),
        }
    }
}

impl SagaRoutine for NoSuspend {
    fn start(&mut self, ctx: &SagaContext<'_>) -> Result<Step, Fault> {
        ctx.dispatch(Action::new(&self.notify))?;
        Ok(Step::done())
    }

    fn resume(&mut self, _outcome: Outcome, _ctx: &SagaContext<'_>) -> Result<Step, Fault> {
        Ok(Step::done())
    }
}

/// Fails on its very first advance.
pub struct FailOnStart;

impl SagaRoutine for FailOnStart {
    fn start(&mut self, _ctx: &SagaContext<'_>) -> Result<Step, Fault> {
        Err(Fault::new("boom at start"))
    }

    fn resume(&mut self, _outcome: Outcome, _ctx: &SagaContext<'_>) -> Result<Step, Fault> {
        Ok(Step::done())
    }
}

/// Suspends on a pending-call effect describing a delay, then dispatches
/// the given action once resumed.
pub struct DelayedDispatch {
    then: String,
}

impl DelayedDispatch {
    pub fn new(then: impl Into<String>) -> Self {
        Self { then: then.into() }
    }
}

impl SagaRoutine for DelayedDispatch {
    fn start(&mut self, _ctx: &SagaContext<'_>) -> Result<Step, Fault> {
        Ok(Step::Suspend(Effect::call(
            "wait",
            "clock.delay(100)",
            || Ok(Value::from(100)),
        )))
    }

    fn resume(&mut self, outcome: Outcome, ctx: &SagaContext<'_>) -> Result<Step, Fault> {
        match outcome {
            Outcome::Value(_) => {
                ctx.dispatch(Action::new(&self.then))?;
                Ok(Step::done())
            }
            Outcome::Failure(fault) => Err(fault),
        }
    }
}

/// Waits in step `try`; an injected fault moves it to step `retry` instead
/// of killing it, and a value from either step dispatches `ok`.
pub struct RetryOnFault;

impl SagaRoutine for RetryOnFault {
    fn start(&mut self, _ctx: &SagaContext<'_>) -> Result<Step, Fault> {
        Ok(Step::wait("try"))
    }

    fn resume(&mut self, outcome: Outcome, ctx: &SagaContext<'_>) -> Result<Step, Fault> {
        match outcome {
            Outcome::Value(_) => {
                ctx.dispatch(Action::new("ok"))?;
                Ok(Step::done())
            }
            Outcome::Failure(_) => {
                ctx.dispatch(Action::new("retrying"))?;
                Ok(Step::wait("retry"))
            }
        }
    }
}

/// Waits once, re-dispatches its own trigger, then either completes or
/// suspends again in step `after` — exercises recursive same-saga triggers.
pub struct Retrigger {
    trigger: String,
    then_suspend: bool,
}

impl Retrigger {
    pub fn completing(trigger: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into(),
            then_suspend: false,
        }
    }

    pub fn suspending(trigger: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into(),
            then_suspend: true,
        }
    }
}

impl SagaRoutine for Retrigger {
    fn start(&mut self, _ctx: &SagaContext<'_>) -> Result<Step, Fault> {
        Ok(Step::wait("wait"))
    }

    fn resume(&mut self, _outcome: Outcome, ctx: &SagaContext<'_>) -> Result<Step, Fault> {
        ctx.dispatch(Action::new(&self.trigger))?;
        if self.then_suspend {
            return Ok(Step::wait("after"));
        }
        Ok(Step::done())
    }
}
