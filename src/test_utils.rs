//! Helpers shared by unit and integration tests.
use std::sync::{Mutex, MutexGuard, OnceLock};

static CONFIG_ENV: OnceLock<Mutex<()>> = OnceLock::new();

/// Serialises tests that set variables read by `${VAR}` config expansion.
/// A panicking holder does not poison the lock for the remaining tests.
pub fn env_lock() -> MutexGuard<'static, ()> {
    CONFIG_ENV
        .get_or_init(Mutex::default)
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
