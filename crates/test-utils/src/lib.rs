//! Shared test infrastructure for sagastep.
//!
//! Provides the store collaborator the engine runs against: an in-memory
//! action-dispatch store with a reducer and the scheduler hooked in after it,
//! plus tracing setup for tests.

mod store;

pub use store::{kind_reducer, MemoryStore, Reducer};

/// Install a tracing subscriber for test runs.
///
/// Uses `try_init()`, so calling it from every test is harmless: only the
/// first call in the process installs the subscriber.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("sagastep=debug")
        .try_init();
}
