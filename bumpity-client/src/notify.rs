/// Sink for user-visible failure messages (a toast, an alert box, stderr...)
pub trait Notifier: Send + Sync {
    fn alert(&self, message: &str);
}

/// Notifier for headless clients: alerts only end up in the logs
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn alert(&self, message: &str) {
        tracing::warn!(message, "user alert");
    }
}
