#![allow(dead_code)]

pub mod sagas;

use std::rc::Rc;

use sagastep::{Scheduler, SchedulerConfig};
use test_utils::MemoryStore;

/// A scheduler plus a kind-reducer store wired to it.
pub fn harness() -> (Rc<Scheduler>, Rc<MemoryStore>) {
    test_utils::init_test_tracing();
    let scheduler = Rc::new(Scheduler::new());
    let store = MemoryStore::with_kind_reducer(Rc::clone(&scheduler));
    (scheduler, store)
}

/// Same, with a scheduler configuration.
pub fn harness_with(config: SchedulerConfig) -> (Rc<Scheduler>, Rc<MemoryStore>) {
    test_utils::init_test_tracing();
    let scheduler = Rc::new(Scheduler::with_config(config));
    let store = MemoryStore::with_kind_reducer(Rc::clone(&scheduler));
    (scheduler, store)
}
