//! Fire-and-forget execution of callbacks off the caller's path.
//!
//! Components hold internal locks while they mutate state. Callbacks supplied
//! by users (state-change handlers, failure hooks, event listeners) must never
//! run while one of those locks is held, otherwise a slow or reentrant handler
//! could stall or deadlock the component. [`spawn_detached`] hands the callback
//! to a separate execution path and returns immediately.

/// Runs `f` on a separate execution path without waiting for it.
///
/// Inside a tokio runtime the closure is scheduled on the runtime's blocking
/// pool, so it may block freely. Outside a runtime a short-lived named thread
/// is used instead. Invocation order across successive calls is not
/// guaranteed.
///
/// # Example
///
/// ```rust
/// use session_guard_core::spawn_detached;
/// use std::sync::mpsc;
///
/// let (tx, rx) = mpsc::channel();
/// spawn_detached(move || {
///     tx.send(42).unwrap();
/// });
/// assert_eq!(rx.recv().unwrap(), 42);
/// ```
pub fn spawn_detached<F>(f: F)
where
    F: FnOnce() + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            drop(handle.spawn_blocking(f));
        }
        Err(_) => {
            let spawned = std::thread::Builder::new()
                .name("session-guard-notify".to_string())
                .spawn(f);

            if let Err(_err) = spawned {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %_err, "failed to spawn notification thread");
            }
        }
    }
}
