//! Audit log port — append-only persistence of readings, commands and events.

use std::future::Future;
use std::sync::Arc;

use growhub_domain::audit::{CommandRecord, ReadingRecord, SystemEvent};
use growhub_domain::error::GrowHubError;
use growhub_domain::time::Timestamp;

/// Append-only store for audit records.
pub trait AuditLog {
    fn record_reading(
        &self,
        record: ReadingRecord,
    ) -> impl Future<Output = Result<(), GrowHubError>> + Send;

    fn record_command(
        &self,
        record: CommandRecord,
    ) -> impl Future<Output = Result<(), GrowHubError>> + Send;

    fn record_event(
        &self,
        event: SystemEvent,
    ) -> impl Future<Output = Result<(), GrowHubError>> + Send;

    /// Readings recorded at or after `since`, newest first.
    fn readings_since(
        &self,
        since: Timestamp,
    ) -> impl Future<Output = Result<Vec<ReadingRecord>, GrowHubError>> + Send;

    /// Delete every record older than `cutoff`, returning how many went.
    fn purge_before(
        &self,
        cutoff: Timestamp,
    ) -> impl Future<Output = Result<u64, GrowHubError>> + Send;
}

impl<T: AuditLog + Send + Sync> AuditLog for Arc<T> {
    fn record_reading(
        &self,
        record: ReadingRecord,
    ) -> impl Future<Output = Result<(), GrowHubError>> + Send {
        (**self).record_reading(record)
    }

    fn record_command(
        &self,
        record: CommandRecord,
    ) -> impl Future<Output = Result<(), GrowHubError>> + Send {
        (**self).record_command(record)
    }

    fn record_event(
        &self,
        event: SystemEvent,
    ) -> impl Future<Output = Result<(), GrowHubError>> + Send {
        (**self).record_event(event)
    }

    fn readings_since(
        &self,
        since: Timestamp,
    ) -> impl Future<Output = Result<Vec<ReadingRecord>, GrowHubError>> + Send {
        (**self).readings_since(since)
    }

    fn purge_before(
        &self,
        cutoff: Timestamp,
    ) -> impl Future<Output = Result<u64, GrowHubError>> + Send {
        (**self).purge_before(cutoff)
    }
}
