//! Stop-signal coordination
//!
//! One [`StopCoordinator`] is shared by everything taking part in a run. Any
//! holder can fire it once; every [`StopListener`] observes the same reason.
//! Listeners can poll between units of work or await the signal inside a
//! `select!`.

use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Why a run was asked to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The configured run time elapsed
    Deadline,
    /// The user pressed Ctrl-C
    Interrupted,
    /// All work was done
    Completed,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::Deadline => write!(f, "deadline reached"),
            StopReason::Interrupted => write!(f, "interrupted"),
            StopReason::Completed => write!(f, "completed"),
        }
    }
}

/// Fires the stop signal
#[derive(Debug)]
pub struct StopCoordinator {
    sender: watch::Sender<Option<StopReason>>,
}

impl StopCoordinator {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self { sender }
    }

    /// A new listener; listeners created after the stop still see it
    pub fn listener(&self) -> StopListener {
        StopListener {
            receiver: self.sender.subscribe(),
        }
    }

    /// Fire the stop signal.
    ///
    /// Returns `false` when it had already fired; the first reason is kept.
    pub fn stop(&self, reason: StopReason) -> bool {
        let fired = self.sender.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason);
            true
        });

        if fired {
            info!("Stop signal fired: {}", reason);
        }
        fired
    }

    /// The reason the signal fired, if it has
    pub fn reason(&self) -> Option<StopReason> {
        *self.sender.borrow()
    }

    pub fn is_stopped(&self) -> bool {
        self.reason().is_some()
    }

    /// Fire [`StopReason::Deadline`] after `duration`
    pub fn stop_after(self: &Arc<Self>, duration: Duration) -> JoinHandle<()> {
        let coordinator = Arc::clone(self);
        let mut listener = self.listener();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(duration) => {
                    coordinator.stop(StopReason::Deadline);
                }
                _ = listener.stopped() => {}
            }
        })
    }

    /// Fire [`StopReason::Interrupted`] on Ctrl-C
    pub fn stop_on_ctrl_c(self: &Arc<Self>) -> JoinHandle<()> {
        let coordinator = Arc::clone(self);
        let mut listener = self.listener();
        tokio::spawn(async move {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    match result {
                        Ok(()) => {
                            coordinator.stop(StopReason::Interrupted);
                        }
                        Err(e) => warn!("Unable to listen for Ctrl-C: {}", e),
                    }
                }
                _ = listener.stopped() => {}
            }
        })
    }
}

impl Default for StopCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Observes the stop signal
#[derive(Debug, Clone)]
pub struct StopListener {
    receiver: watch::Receiver<Option<StopReason>>,
}

impl StopListener {
    pub fn is_stopped(&self) -> bool {
        self.receiver.borrow().is_some()
    }

    pub fn reason(&self) -> Option<StopReason> {
        *self.receiver.borrow()
    }

    /// Resolves once the signal has fired.
    ///
    /// Also resolves when the coordinator is dropped without firing, since
    /// nothing can stop the run any more.
    pub async fn stopped(&mut self) -> Option<StopReason> {
        match self.receiver.wait_for(|reason| reason.is_some()).await {
            Ok(reason) => *reason,
            Err(_) => None,
        }
    }

    /// Sleep for `duration` unless stopped first.
    ///
    /// Returns `true` when the full pause elapsed.
    pub async fn sleep(&mut self, duration: Duration) -> bool {
        if self.is_stopped() {
            return false;
        }

        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            _ = self.stopped() => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_reason_wins() {
        let coordinator = StopCoordinator::new();
        let listener = coordinator.listener();
        assert!(!listener.is_stopped());

        assert!(coordinator.stop(StopReason::Interrupted));
        assert!(!coordinator.stop(StopReason::Deadline));

        assert!(listener.is_stopped());
        assert_eq!(listener.reason(), Some(StopReason::Interrupted));
        assert_eq!(coordinator.reason(), Some(StopReason::Interrupted));
    }

    #[tokio::test]
    async fn test_late_listener_sees_stop() {
        let coordinator = StopCoordinator::new();
        coordinator.stop(StopReason::Completed);

        let mut listener = coordinator.listener();
        assert_eq!(listener.stopped().await, Some(StopReason::Completed));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_after_deadline() {
        let coordinator = Arc::new(StopCoordinator::new());
        let mut listener = coordinator.listener();
        let timer = coordinator.stop_after(Duration::from_secs(60));

        let start = tokio::time::Instant::now();
        assert_eq!(listener.stopped().await, Some(StopReason::Deadline));
        assert!(start.elapsed() >= Duration::from_secs(60));
        timer.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_is_cut_short() {
        let coordinator = Arc::new(StopCoordinator::new());
        let mut listener = coordinator.listener();
        coordinator.stop_after(Duration::from_secs(5));

        let start = tokio::time::Instant::now();
        assert!(!listener.sleep(Duration::from_secs(30)).await);
        assert!(start.elapsed() < Duration::from_secs(30));

        // Already stopped: no sleeping at all
        assert!(!listener.sleep(Duration::from_secs(30)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_completes_without_stop() {
        let coordinator = StopCoordinator::new();
        let mut listener = coordinator.listener();
        assert!(listener.sleep(Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn test_dropped_coordinator_releases_listeners() {
        let coordinator = StopCoordinator::new();
        let mut listener = coordinator.listener();
        drop(coordinator);
        assert_eq!(listener.stopped().await, None);
    }
}
