//! Sync module - Keep topics aligned with document changes
//!
//! Provides:
//! - debounce: keyed trailing-edge debouncer
//! - coordinator: reconciliation passes and rename/delete handling
//! - watch: filesystem watcher driving the coordinator (feature "watch")

pub mod api;
pub mod coordinator;
#[cfg(any(feature = "watch", test))]
pub mod debounce;
#[cfg(feature = "watch")]
pub mod watch;
