use crate::domain::alert::Alert;
use crate::domain::ports::AlertSink;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

pub const DEFAULT_ALERT_TTL: Duration = Duration::from_secs(5);

#[derive(Debug)]
struct Slot {
    alert: Alert,
    shown_at: Instant,
    open: bool,
}

/// Single-slot alert channel.
///
/// A new alert replaces the previous one. An alert stops being visible when
/// closed or once `ttl` has elapsed; the last alert stays readable either way.
#[derive(Debug)]
pub struct AlertCenter {
    ttl: Duration,
    slot: Mutex<Option<Slot>>,
}

impl Default for AlertCenter {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_TTL)
    }
}

impl AlertCenter {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// The alert currently visible, if any.
    pub fn current(&self) -> Option<Alert> {
        let slot = self.lock();
        slot.as_ref()
            .filter(|s| s.open && s.shown_at.elapsed() < self.ttl)
            .map(|s| s.alert.clone())
    }

    /// The most recent alert, visible or not.
    pub fn last(&self) -> Option<Alert> {
        self.lock().as_ref().map(|s| s.alert.clone())
    }

    fn lock(&self) -> MutexGuard<'_, Option<Slot>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AlertSink for AlertCenter {
    fn show(&self, alert: Alert) {
        debug!(kind = ?alert.kind, title = %alert.title, "alert shown");
        *self.lock() = Some(Slot {
            alert,
            shown_at: Instant::now(),
            open: true,
        });
    }

    fn close(&self) {
        if let Some(slot) = self.lock().as_mut() {
            slot.open = false;
        }
    }
}
