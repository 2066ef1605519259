//! Companion-node liveness.

use chrono::TimeDelta;
use growhub_domain::snapshot::CompanionStatus;
use growhub_domain::time::Timestamp;

/// Contact older than this marks the companion as offline.
pub const DEFAULT_CONTACT_TIMEOUT: TimeDelta = TimeDelta::seconds(120);

/// Tracks the last time the companion node reached us.
///
/// Only companion reports write here; everything else reads the derived flag.
#[derive(Debug, Clone)]
pub struct ConnectivityMonitor {
    last_contact_at: Option<Timestamp>,
    timeout: TimeDelta,
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_CONTACT_TIMEOUT)
    }
}

impl ConnectivityMonitor {
    #[must_use]
    pub fn new(timeout: TimeDelta) -> Self {
        Self {
            last_contact_at: None,
            timeout,
        }
    }

    /// Record a contact. A report delivered late never moves the record back.
    pub fn record_contact(&mut self, at: Timestamp) {
        self.last_contact_at = Some(match self.last_contact_at {
            Some(previous) if previous > at => previous,
            _ => at,
        });
    }

    #[must_use]
    pub fn last_contact_at(&self) -> Option<Timestamp> {
        self.last_contact_at
    }

    /// `false` when no contact was ever recorded, else `now - last < timeout`.
    #[must_use]
    pub fn is_live(&self, now: Timestamp) -> bool {
        self.last_contact_at
            .is_some_and(|last| now - last < self.timeout)
    }

    #[must_use]
    pub fn status(&self, now: Timestamp) -> CompanionStatus {
        CompanionStatus {
            last_contact_at: self.last_contact_at,
            live: self.is_live(now),
        }
    }
}
