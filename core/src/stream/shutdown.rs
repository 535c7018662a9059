use tokio::sync::watch;

/// Creates a linked shutdown trigger and signal.
pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (sender, receiver) = watch::channel(false);
    (ShutdownTrigger(sender), ShutdownSignal(receiver))
}

/// Service-wide stop switch held by the binary.
#[derive(Debug)]
pub struct ShutdownTrigger(watch::Sender<bool>);

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.0.send_replace(true);
    }

    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal(self.0.subscribe())
    }
}

/// Cloneable view of the stop switch for long-running tasks.
#[derive(Debug, Clone)]
pub struct ShutdownSignal(watch::Receiver<bool>);

impl ShutdownSignal {
    pub fn is_triggered(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once shutdown is triggered. Never resolves if the trigger is
    /// dropped without firing.
    pub async fn triggered(&mut self) {
        loop {
            if *self.0.borrow_and_update() {
                return;
            }
            if self.0.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn every_signal_observes_the_trigger() {
        let (trigger, mut first) = shutdown_channel();
        let mut second = trigger.signal();
        assert!(!first.is_triggered());

        trigger.trigger();
        first.triggered().await;
        second.triggered().await;
        assert!(second.is_triggered());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_trigger_never_fires() {
        let (trigger, mut signal) = shutdown_channel();
        drop(trigger);
        let waited = tokio::time::timeout(Duration::from_secs(5), signal.triggered()).await;
        assert!(waited.is_err());
    }
}
