use tokio::sync::watch;

/// Process-wide stop signal. Triggering is sticky: listeners created after the
/// fact still observe it.
#[derive(Clone)]
pub struct Shutdown {
    sender: watch::Sender<bool>,
}

#[derive(Clone)]
pub struct ShutdownListener {
    receiver: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new() -> (Self, ShutdownListener) {
        let (sender, receiver) = watch::channel(false);
        (Self { sender }, ShutdownListener { receiver })
    }

    pub fn subscribe(&self) -> ShutdownListener {
        ShutdownListener {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }
}

impl ShutdownListener {
    pub async fn notified(&mut self) {
        if *self.receiver.borrow_and_update() {
            return;
        }
        let _ = self.receiver.wait_for(|stopped| *stopped).await;
    }
}

pub fn install_signal_handlers(shutdown: Shutdown) {
    let ctrlc = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received Ctrl+C, shutting down");
            ctrlc.trigger();
        }
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let term = shutdown.clone();
        tokio::spawn(async move {
            if let Ok(mut sig) = signal(SignalKind::terminate()) {
                sig.recv().await;
                tracing::info!("received SIGTERM, shutting down");
                term.trigger();
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;

    #[tokio::test]
    async fn trigger_reaches_listeners_created_before_and_after() {
        let (shutdown, _) = Shutdown::new();
        let mut early = shutdown.subscribe();
        let waiter = tokio::spawn(async move { early.notified().await });

        shutdown.trigger();
        timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();

        let mut late = shutdown.subscribe();
        timeout(Duration::from_secs(1), late.notified()).await.unwrap();
    }
}
