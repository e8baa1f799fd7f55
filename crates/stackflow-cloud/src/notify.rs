//! Progress and audit notification sink
//!
//! The orchestrator and the task protocol report every state transition
//! through a caller-supplied sink. The call is fire-and-forget: a sink
//! must not block the caller, so implementations backed by a network
//! service hand the publish off to a background task.

/// Single-argument notification sink.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Discards every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _message: &str) {}
}

/// Forwards notifications to the tracing subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str) {
        tracing::info!("{message}");
    }
}
