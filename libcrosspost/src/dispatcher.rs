//! Publish dispatch: the single write path for schedule state.
//!
//! One dispatch loads the schedule, resolves credentials, claims the row,
//! runs the channel adapter, reconciles the outcome back into the schedule
//! row, and records an audit event. Adapters classify outcomes; only the
//! dispatcher persists them.

use std::sync::Arc;
use tracing::{info, warn};

use crate::audit::AuditRecorder;
use crate::channels::ChannelRouter;
use crate::credentials::CredentialResolver;
use crate::db::Database;
use crate::error::{CrosspostError, Result};
use crate::types::{AuditEvent, Channel, PublishResult, PublishStatus};

pub struct PublishService {
    db: Database,
    resolver: CredentialResolver,
    router: Arc<ChannelRouter>,
    audit: AuditRecorder,
}

impl PublishService {
    pub fn new(
        db: Database,
        resolver: CredentialResolver,
        router: Arc<ChannelRouter>,
        audit: AuditRecorder,
    ) -> Self {
        Self {
            db,
            resolver,
            router,
            audit,
        }
    }

    /// Dispatch one publish attempt for a schedule on its channel.
    ///
    /// Preconditions are checked before any state changes: the schedule must
    /// exist (and not be soft-deleted), and the requested channel must match
    /// the one the schedule was created for. The row is then claimed by
    /// moving it to `running`; losing that claim means another dispatch is in
    /// flight and this one stops with [`CrosspostError::PublishInFlight`].
    ///
    /// The adapter outcome reconciles as: published and manual complete the
    /// schedule and stamp `published_at`; rate_limited and error fail it with
    /// the adapter's message; not_configured sends it back to pending. Every
    /// attempt that reaches an adapter is audited, success or not.
    pub async fn publish(
        &self,
        actor: &str,
        schedule_id: &str,
        channel: Channel,
    ) -> Result<PublishResult> {
        let schedule = self
            .db
            .get_schedule(schedule_id)
            .await?
            .ok_or_else(|| CrosspostError::ScheduleNotFound(schedule_id.to_string()))?;

        if schedule.channel != channel {
            return Err(CrosspostError::InvalidInput(format!(
                "Schedule '{}' is bound to channel '{}', not '{}'",
                schedule_id, schedule.channel, channel
            )));
        }

        let publisher = self.router.get(channel).ok_or_else(|| {
            CrosspostError::InvalidInput(format!("No adapter registered for channel '{}'", channel))
        })?;

        // Resolve credentials before claiming; an infra failure here must not
        // leave the row stuck in running
        let credentials = if channel.slug_prefixes().is_empty() {
            self.resolver.fallback_only()
        } else {
            self.resolver
                .resolve(&schedule.workspace_id, channel.slug_prefixes())
                .await?
        };

        if !self.db.claim_running(&schedule.id).await? {
            return Err(CrosspostError::PublishInFlight(schedule.id.clone()));
        }

        let result = publisher.publish(&schedule, &credentials).await;

        match result.status {
            PublishStatus::Published | PublishStatus::Manual => {
                self.db
                    .complete_schedule(&schedule.id, chrono::Utc::now().timestamp())
                    .await?;
                info!(
                    schedule = %schedule.id,
                    channel = %channel,
                    url = result.url.as_deref().unwrap_or("-"),
                    "Publish completed"
                );
            }
            PublishStatus::RateLimited | PublishStatus::Error => {
                self.db.fail_schedule(&schedule.id, &result.message).await?;
                warn!(
                    schedule = %schedule.id,
                    channel = %channel,
                    status = %result.status,
                    "Publish failed: {}",
                    result.message
                );
            }
            PublishStatus::NotConfigured => {
                self.db.reset_schedule(&schedule.id).await?;
                info!(
                    schedule = %schedule.id,
                    channel = %channel,
                    "Channel not configured; schedule stays pending"
                );
            }
        }

        self.audit
            .record(AuditEvent::for_attempt(actor, &schedule, &result));

        Ok(result)
    }

    pub fn db(&self) -> &Database {
        &self.db
    }
}
