//! Inactivity monitor.
//!
//! A single countdown, restarted by user input and coalesced with a trailing
//! debounce. When it runs out while someone is signed in, the session is
//! ended and a one-shot notice is left for the UI to show.

use std::future::pending;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, trace};

use crate::session::SessionManager;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15 * 60);
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);
pub const LOGOUT_MESSAGE: &str = "You have been logged out due to inactivity.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    PointerMove,
    KeyPress,
    Click,
    Scroll,
    Touch,
}

#[derive(Debug, Clone, Copy)]
pub struct IdleSettings {
    pub timeout: Duration,
    pub debounce: Duration,
}

impl Default for IdleSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdleNotice {
    pub message: String,
    pub logged_out_at: DateTime<Utc>,
}

type NoticeSlot = Arc<Mutex<Option<IdleNotice>>>;

/// Handle to the running monitor. Clones share the same task.
#[derive(Clone)]
pub struct IdleHandle {
    activity: mpsc::UnboundedSender<ActivityKind>,
    shutdown: Arc<watch::Sender<bool>>,
    notice: NoticeSlot,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

pub struct IdleMonitor;

impl IdleMonitor {
    /// Spawns the countdown task. Must be called from within a tokio runtime.
    pub fn start(session: SessionManager, settings: IdleSettings) -> IdleHandle {
        let (activity_tx, activity_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let notice: NoticeSlot = Arc::default();

        let task = tokio::spawn(run(
            session,
            settings,
            activity_rx,
            shutdown_rx,
            notice.clone(),
        ));
        debug!(
            "Inactivity monitor started (timeout {}s, debounce {}ms)",
            settings.timeout.as_secs(),
            settings.debounce.as_millis()
        );

        IdleHandle {
            activity: activity_tx,
            shutdown: Arc::new(shutdown_tx),
            notice,
            task: Arc::new(Mutex::new(Some(task))),
        }
    }
}

impl IdleHandle {
    /// Reports one input event. Ignored once the monitor has stopped.
    pub fn record(&self, kind: ActivityKind) {
        let _ = self.activity.send(kind);
    }

    /// Returns the pending logout notice, at most once.
    pub fn take_notice(&self) -> Option<IdleNotice> {
        self.notice
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Stops the countdown and waits for the task to finish.
    pub async fn shutdown(&self) {
        let _ = self.shutdown.send(true);
        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            let _ = task.await;
            debug!("Inactivity monitor stopped");
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => pending().await,
    }
}

async fn run(
    session: SessionManager,
    settings: IdleSettings,
    mut activity: mpsc::UnboundedReceiver<ActivityKind>,
    mut shutdown: watch::Receiver<bool>,
    notice: NoticeSlot,
) {
    let mut expires_at = Some(Instant::now() + settings.timeout);
    let mut settles_at: Option<Instant> = None;

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            event = activity.recv() => match event {
                Some(kind) => {
                    trace!(?kind, "user activity");
                    settles_at = Some(Instant::now() + settings.debounce);
                }
                None => break,
            },
            _ = wait_until(settles_at) => {
                settles_at = None;
                expires_at = Some(Instant::now() + settings.timeout);
            }
            _ = wait_until(expires_at) => {
                // Disarmed until the next burst of activity.
                expires_at = None;
                if session.is_authenticated() {
                    session.logout();
                    info!("Session ended after {}s of inactivity", settings.timeout.as_secs());
                    *notice.lock().unwrap_or_else(PoisonError::into_inner) = Some(IdleNotice {
                        message: LOGOUT_MESSAGE.to_string(),
                        logged_out_at: Utc::now(),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::manager;
    use tempfile::TempDir;

    const MINUTE: Duration = Duration::from_secs(60);

    async fn signed_in(dir: &TempDir) -> SessionManager {
        let session = manager(dir);
        session.login("hr@company.com", "hr123").await.unwrap();
        session
    }

    #[tokio::test(start_paused = true)]
    async fn test_sixteen_idle_minutes_force_logout() {
        let dir = TempDir::new().unwrap();
        let session = signed_in(&dir).await;
        let idle = IdleMonitor::start(session.clone(), IdleSettings::default());

        tokio::time::sleep(16 * MINUTE).await;

        assert!(!session.is_authenticated());
        let notice = idle.take_notice().expect("notice after forced logout");
        assert_eq!(notice.message, LOGOUT_MESSAGE);
        assert!(idle.take_notice().is_none());
        idle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_activity_postpones_logout() {
        let dir = TempDir::new().unwrap();
        let session = signed_in(&dir).await;
        let idle = IdleMonitor::start(session.clone(), IdleSettings::default());

        tokio::time::sleep(14 * MINUTE).await;
        idle.record(ActivityKind::KeyPress);
        tokio::time::sleep(2 * MINUTE).await;
        assert!(session.is_authenticated());

        // Countdown restarted at 14m + 300ms, so it ends just after 29m.
        tokio::time::sleep(14 * MINUTE).await;
        assert!(!session.is_authenticated());
        idle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_restarts_countdown_after_last_event() {
        let dir = TempDir::new().unwrap();
        let session = signed_in(&dir).await;
        let idle = IdleMonitor::start(session.clone(), IdleSettings::default());

        tokio::time::sleep(10 * MINUTE).await;
        for kind in [
            ActivityKind::PointerMove,
            ActivityKind::PointerMove,
            ActivityKind::Scroll,
            ActivityKind::Click,
            ActivityKind::Touch,
        ] {
            idle.record(kind);
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        // Last event at 10m + 800ms, settled 300ms later, so expiry lands at
        // 25m + 1.1s. The loop above left the clock at 10m + 1s.
        tokio::time::sleep(15 * MINUTE).await;
        assert!(session.is_authenticated());
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(!session.is_authenticated());
        idle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_without_session_leaves_no_notice() {
        let dir = TempDir::new().unwrap();
        let session = manager(&dir);
        let idle = IdleMonitor::start(session.clone(), IdleSettings::default());

        tokio::time::sleep(20 * MINUTE).await;
        assert!(idle.take_notice().is_none());
        idle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_countdown() {
        let dir = TempDir::new().unwrap();
        let session = signed_in(&dir).await;
        let idle = IdleMonitor::start(session.clone(), IdleSettings::default());

        idle.shutdown().await;
        idle.record(ActivityKind::Click);
        tokio::time::sleep(30 * MINUTE).await;
        assert!(session.is_authenticated());
        idle.shutdown().await;
    }
}
