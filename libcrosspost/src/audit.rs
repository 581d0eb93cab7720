//! Best-effort audit trail for publish attempts
//!
//! Events are handed to a background writer task over an unbounded channel,
//! so recording never blocks or fails the primary response path. A write
//! failure is diagnosed and swallowed.

use tokio::sync::mpsc;
use tracing::warn;

use crate::db::Database;
use crate::types::AuditEvent;

#[derive(Clone)]
pub struct AuditRecorder {
    tx: mpsc::UnboundedSender<AuditEvent>,
}

impl AuditRecorder {
    /// Start the background writer and return a handle for recording.
    ///
    /// The task runs for the life of the process; it exits when the last
    /// recorder handle is dropped.
    pub fn spawn(db: Database) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<AuditEvent>();

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let Err(e) = db.insert_audit_event(&event).await {
                    warn!(
                        schedule = %event.schedule_id,
                        channel = %event.channel,
                        "Failed to write audit event: {}",
                        e
                    );
                }
            }
        });

        Self { tx }
    }

    /// Queue an event. Fire and forget.
    pub fn record(&self, event: AuditEvent) {
        if self.tx.send(event).is_err() {
            warn!("Audit writer task is gone; dropping audit event");
        }
    }
}
