//! Route registration: binding a trigger key to a saga template.

use std::fmt;

use serde_json::Value;

use crate::saga::SagaRoutine;

/// Constructs a fresh routine from the route's bound arguments.
pub type SagaFactory = Box<dyn Fn(&[Value]) -> Box<dyn SagaRoutine>>;

/// What to do when a trigger fires while the saga already has a live thread.
///
/// Applied per route, falling back to
/// [`SchedulerConfig::default_on_conflict`](crate::SchedulerConfig::default_on_conflict).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnConflict {
    /// Hold the trigger; start it when the running instance completes.
    ///
    /// No trigger is ever lost, and ordering is preserved.
    #[default]
    Queue,
    /// Drop the trigger.
    Ignore,
    /// Discard the running instance and start fresh from the new trigger.
    ///
    /// If the running instance is mid-advance, the replacement happens as
    /// soon as its advance call returns; the newest trigger wins.
    CancelPrevious,
}

/// A registered saga template: trigger key, name, factory, bound arguments.
///
/// Built once at registration time and immutable thereafter. Registering a
/// second route for the same trigger key overwrites the first.
///
/// # Example
///
/// ```no_run
/// use sagastep::{OnConflict, Route};
/// use serde_json::json;
///
/// # fn factory(_: &[serde_json::Value]) -> Box<dyn sagastep::SagaRoutine> { unimplemented!() }
/// let route = Route::new("ORDER_PLACED", "order", factory)
///     .bound_args([json!("warehouse-1")])
///     .on_conflict(OnConflict::Ignore);
/// ```
pub struct Route {
    trigger: String,
    saga_name: String,
    factory: SagaFactory,
    bound_args: Vec<Value>,
    on_conflict: Option<OnConflict>,
}

impl Route {
    /// Create a route from a trigger key, a saga name, and a factory.
    pub fn new(
        trigger: impl Into<String>,
        saga_name: impl Into<String>,
        factory: impl Fn(&[Value]) -> Box<dyn SagaRoutine> + 'static,
    ) -> Self {
        Self {
            trigger: trigger.into(),
            saga_name: saga_name.into(),
            factory: Box::new(factory),
            bound_args: Vec::new(),
            on_conflict: None,
        }
    }

    /// Arguments handed to the factory at every trigger.
    pub fn bound_args(mut self, args: impl IntoIterator<Item = Value>) -> Self {
        self.bound_args = args.into_iter().collect();
        self
    }

    /// Conflict policy for this route, overriding the scheduler default.
    pub fn on_conflict(mut self, policy: OnConflict) -> Self {
        self.on_conflict = Some(policy);
        self
    }

    /// The trigger key (action kind) this route matches.
    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    /// The saga name threads of this route run under.
    pub fn saga_name(&self) -> &str {
        &self.saga_name
    }

    pub(crate) fn policy(&self) -> Option<OnConflict> {
        self.on_conflict
    }

    pub(crate) fn instantiate(&self) -> Box<dyn SagaRoutine> {
        (self.factory)(&self.bound_args)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("trigger", &self.trigger)
            .field("saga_name", &self.saga_name)
            .field("bound_args", &self.bound_args)
            .field("on_conflict", &self.on_conflict)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::saga::{Fault, Outcome, SagaContext, SagaRoutine, Step};

    struct Noop;

    impl SagaRoutine for Noop {
        fn start(&mut self, _ctx: &SagaContext<'_>) -> Result<Step, Fault> {
            Ok(Step::done())
        }

        fn resume(&mut self, _outcome: Outcome, _ctx: &SagaContext<'_>) -> Result<Step, Fault> {
            Ok(Step::done())
        }
    }

    #[test]
    fn builder_defaults() {
        let route = Route::new("A", "a", |_| Box::new(Noop));

        assert_eq!(route.trigger(), "A");
        assert_eq!(route.saga_name(), "a");
        assert_eq!(route.policy(), None);
    }

    #[test]
    fn builder_overrides() {
        let route = Route::new("A", "a", |_| Box::new(Noop))
            .bound_args([json!(1), json!("two")])
            .on_conflict(OnConflict::CancelPrevious);

        assert_eq!(route.policy(), Some(OnConflict::CancelPrevious));
        assert_eq!(route.bound_args, vec![json!(1), json!("two")]);
    }
}
