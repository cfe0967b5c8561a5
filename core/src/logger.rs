//! Pluggable request/response logging.
//!
//! The transport emits at most two lines per call through a `Logger`: one
//! before sending and one after the response arrives. Logging is
//! observability only and never changes the outcome of a call.

/// Sink for the transport's informational lines.
///
/// Any `Fn(&str) + Send + Sync` closure is a `Logger`, so callers can hook
/// the transport into whatever they already log with.
pub trait Logger: Send + Sync {
    fn info(&self, message: &str);
}

impl<F> Logger for F
where
    F: Fn(&str) + Send + Sync,
{
    fn info(&self, message: &str) {
        self(message)
    }
}

/// Forwards lines to `tracing` at INFO level under the `currency_sdk` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn info(&self, message: &str) {
        tracing::info!(target: "currency_sdk", "{message}");
    }
}
