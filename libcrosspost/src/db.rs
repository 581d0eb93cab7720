//! Database operations for Crosspost

use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use std::path::Path;

use crate::error::{DbError, Result};
use crate::types::{AuditEvent, Channel, ContentSchedule, ScheduleContent, ScheduleStatus};

/// An encrypted credential row as stored in the vault table.
///
/// The dispatcher only reads these; creation and rotation happen externally.
#[derive(Debug, Clone)]
pub struct VaultSecretRow {
    pub slug: String,
    pub display_name: Option<String>,
    pub encrypted_value: String,
    pub iv: String,
    pub auth_tag: String,
}

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection
    pub async fn new(db_path: &str) -> Result<Self> {
        // Expand path and create parent directories
        let expanded_path = shellexpand::tilde(db_path).to_string();
        let path = Path::new(&expanded_path);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(DbError::IoError)?;
        }

        // Use mode=rwc to allow creating the database file if it doesn't exist
        let db_url = format!("sqlite://{}?mode=rwc", expanded_path.replace('\\', "/"));

        let pool = SqlitePool::connect(&db_url)
            .await
            .map_err(DbError::SqlxError)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(DbError::MigrationError)?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create a new schedule
    pub async fn create_schedule(&self, schedule: &ContentSchedule) -> Result<()> {
        let content =
            serde_json::to_string(&schedule.content).unwrap_or_else(|_| "{}".to_string());
        let tags = serde_json::to_string(&schedule.tags).unwrap_or_else(|_| "[]".to_string());

        sqlx::query(
            r#"
            INSERT INTO schedules
                (id, workspace_id, channel, title, content, tags, status,
                 error_message, published_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&schedule.id)
        .bind(&schedule.workspace_id)
        .bind(schedule.channel.as_str())
        .bind(&schedule.title)
        .bind(content)
        .bind(tags)
        .bind(schedule.status.as_str())
        .bind(&schedule.error_message)
        .bind(schedule.published_at)
        .bind(schedule.created_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(())
    }

    /// Get a schedule by ID, excluding soft-deleted rows
    pub async fn get_schedule(&self, schedule_id: &str) -> Result<Option<ContentSchedule>> {
        let row = sqlx::query(
            r#"
            SELECT id, workspace_id, channel, title, content, tags, status,
                   error_message, published_at, created_at
            FROM schedules
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(schedule_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        row.map(parse_schedule_row).transpose()
    }

    /// Claim a schedule for publishing by moving it to `running`.
    ///
    /// The update is conditional on the row not already being `running`, so
    /// two concurrent dispatches for the same schedule cannot both proceed.
    /// Returns false when the claim is lost.
    pub async fn claim_running(&self, schedule_id: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE schedules
            SET status = 'running', error_message = NULL
            WHERE id = ? AND deleted_at IS NULL AND status != 'running'
            "#,
        )
        .bind(schedule_id)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(result.rows_affected() == 1)
    }

    /// Terminal success: mark completed and stamp the published timestamp
    pub async fn complete_schedule(&self, schedule_id: &str, published_at: i64) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE schedules
            SET status = 'completed', published_at = ?, error_message = NULL
            WHERE id = ?
            "#,
        )
        .bind(published_at)
        .bind(schedule_id)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(())
    }

    /// Terminal failure for this attempt: store the adapter's message
    pub async fn fail_schedule(&self, schedule_id: &str, message: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE schedules
            SET status = 'failed', error_message = ?
            WHERE id = ?
            "#,
        )
        .bind(message)
        .bind(schedule_id)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(())
    }

    /// Missing setup: send the schedule back to `pending` so it stays
    /// eligible for a future attempt without being marked failed
    pub async fn reset_schedule(&self, schedule_id: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE schedules
            SET status = 'pending', error_message = NULL
            WHERE id = ?
            "#,
        )
        .bind(schedule_id)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(())
    }

    /// Soft-delete a schedule. The dispatcher never calls this; it exists for
    /// the surrounding CRUD surface and for tests of the read filter.
    pub async fn soft_delete_schedule(&self, schedule_id: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE schedules SET deleted_at = ? WHERE id = ?
            "#,
        )
        .bind(chrono::Utc::now().timestamp())
        .bind(schedule_id)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(())
    }

    /// List active vault rows for a workspace whose slug starts with one of
    /// the given prefixes. Soft-deleted rows are excluded here, at read time.
    pub async fn list_active_secrets(
        &self,
        workspace_id: &str,
        prefixes: &[&str],
    ) -> Result<Vec<VaultSecretRow>> {
        let mut rows = Vec::new();

        for prefix in prefixes {
            let fetched = sqlx::query(
                r#"
                SELECT slug, display_name, encrypted_value, iv, auth_tag
                FROM vault_secrets
                WHERE workspace_id = ? AND deleted_at IS NULL AND slug LIKE ? || '%'
                ORDER BY slug
                "#,
            )
            .bind(workspace_id)
            .bind(prefix)
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

            for row in fetched {
                rows.push(VaultSecretRow {
                    slug: row.get("slug"),
                    display_name: row.get("display_name"),
                    encrypted_value: row.get("encrypted_value"),
                    iv: row.get("iv"),
                    auth_tag: row.get("auth_tag"),
                });
            }
        }

        Ok(rows)
    }

    /// Insert or rotate a vault secret. Used by operator tooling and test
    /// fixtures; the dispatcher itself never writes here.
    pub async fn upsert_secret(
        &self,
        workspace_id: &str,
        slug: &str,
        display_name: Option<&str>,
        encrypted_value: &str,
        iv: &str,
        auth_tag: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO vault_secrets
                (workspace_id, slug, display_name, encrypted_value, iv, auth_tag, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(workspace_id, slug)
            DO UPDATE SET encrypted_value = excluded.encrypted_value,
                          iv = excluded.iv,
                          auth_tag = excluded.auth_tag,
                          display_name = excluded.display_name,
                          deleted_at = NULL
            "#,
        )
        .bind(workspace_id)
        .bind(slug)
        .bind(display_name)
        .bind(encrypted_value)
        .bind(iv)
        .bind(auth_tag)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(())
    }

    /// Record one publish attempt
    pub async fn insert_audit_event(&self, event: &AuditEvent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_events
                (actor, workspace_id, schedule_id, channel, status, success, url, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&event.actor)
        .bind(&event.workspace_id)
        .bind(&event.schedule_id)
        .bind(event.channel.as_str())
        .bind(event.status.as_str())
        .bind(event.success)
        .bind(&event.url)
        .bind(event.created_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(())
    }

    /// Most recent audit events for a workspace, newest first
    pub async fn list_audit_events(
        &self,
        workspace_id: &str,
        limit: i64,
    ) -> Result<Vec<AuditEvent>> {
        let rows = sqlx::query(
            r#"
            SELECT actor, workspace_id, schedule_id, channel, status, success, url, created_at
            FROM audit_events
            WHERE workspace_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(workspace_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            let channel: String = row.get("channel");
            let status: String = row.get("status");
            events.push(AuditEvent {
                actor: row.get("actor"),
                workspace_id: row.get("workspace_id"),
                schedule_id: row.get("schedule_id"),
                channel: channel
                    .parse()
                    .map_err(|e: String| DbError::CorruptRow(e))?,
                status: status
                    .parse()
                    .map_err(|e: String| DbError::CorruptRow(e))?,
                success: row.get("success"),
                url: row.get("url"),
                created_at: row.get("created_at"),
            });
        }

        Ok(events)
    }
}

fn parse_schedule_row(row: sqlx::sqlite::SqliteRow) -> Result<ContentSchedule> {
    let channel: String = row.get("channel");
    let channel: Channel = channel
        .parse()
        .map_err(|e: String| DbError::CorruptRow(e))?;

    let status: String = row.get("status");
    let status = match status.as_str() {
        "pending" => ScheduleStatus::Pending,
        "running" => ScheduleStatus::Running,
        "completed" => ScheduleStatus::Completed,
        "failed" => ScheduleStatus::Failed,
        other => {
            return Err(DbError::CorruptRow(format!("unknown schedule status '{}'", other)).into())
        }
    };

    let content: String = row.get("content");
    let content: ScheduleContent = serde_json::from_str(&content).unwrap_or_default();

    let tags: String = row.get("tags");
    let tags: Vec<String> = serde_json::from_str(&tags).unwrap_or_default();

    Ok(ContentSchedule {
        id: row.get("id"),
        workspace_id: row.get("workspace_id"),
        channel,
        title: row.get("title"),
        content,
        tags,
        status,
        error_message: row.get("error_message"),
        published_at: row.get("published_at"),
        created_at: row.get("created_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PublishResult, PublishStatus};
    use tempfile::TempDir;

    async fn setup_test_db() -> (TempDir, Database) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Database::new(&db_path.to_string_lossy()).await.unwrap();
        (temp_dir, db)
    }

    fn sample_schedule() -> ContentSchedule {
        ContentSchedule::new("ws1".to_string(), Channel::Blog, "Title".to_string())
            .with_content(ScheduleContent {
                html: Some("<p>x</p>".to_string()),
                ..Default::default()
            })
            .with_tags(vec!["rust".to_string(), "release".to_string()])
    }

    #[tokio::test]
    async fn test_create_and_get_schedule() {
        let (_temp, db) = setup_test_db().await;
        let schedule = sample_schedule();

        db.create_schedule(&schedule).await.unwrap();

        let loaded = db.get_schedule(&schedule.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, schedule.id);
        assert_eq!(loaded.channel, Channel::Blog);
        assert_eq!(loaded.content.html.as_deref(), Some("<p>x</p>"));
        assert_eq!(loaded.tags, vec!["rust", "release"]);
        assert_eq!(loaded.status, ScheduleStatus::Pending);
    }

    #[tokio::test]
    async fn test_get_schedule_missing() {
        let (_temp, db) = setup_test_db().await;
        assert!(db.get_schedule("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_soft_deleted_schedule_excluded_at_read() {
        let (_temp, db) = setup_test_db().await;
        let schedule = sample_schedule();
        db.create_schedule(&schedule).await.unwrap();

        db.soft_delete_schedule(&schedule.id).await.unwrap();

        assert!(db.get_schedule(&schedule.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_claim_running_single_writer() {
        let (_temp, db) = setup_test_db().await;
        let schedule = sample_schedule();
        db.create_schedule(&schedule).await.unwrap();

        assert!(db.claim_running(&schedule.id).await.unwrap());
        // Second claim loses while the first is in flight
        assert!(!db.claim_running(&schedule.id).await.unwrap());

        let loaded = db.get_schedule(&schedule.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, ScheduleStatus::Running);
    }

    #[tokio::test]
    async fn test_claim_running_after_reset() {
        let (_temp, db) = setup_test_db().await;
        let schedule = sample_schedule();
        db.create_schedule(&schedule).await.unwrap();

        assert!(db.claim_running(&schedule.id).await.unwrap());
        db.reset_schedule(&schedule.id).await.unwrap();
        // Back to pending, claimable again
        assert!(db.claim_running(&schedule.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_complete_schedule_stamps_timestamp() {
        let (_temp, db) = setup_test_db().await;
        let schedule = sample_schedule();
        db.create_schedule(&schedule).await.unwrap();
        db.claim_running(&schedule.id).await.unwrap();

        db.complete_schedule(&schedule.id, 1_700_000_000).await.unwrap();

        let loaded = db.get_schedule(&schedule.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, ScheduleStatus::Completed);
        assert_eq!(loaded.published_at, Some(1_700_000_000));
        assert!(loaded.error_message.is_none());
    }

    #[tokio::test]
    async fn test_fail_schedule_stores_message() {
        let (_temp, db) = setup_test_db().await;
        let schedule = sample_schedule();
        db.create_schedule(&schedule).await.unwrap();
        db.claim_running(&schedule.id).await.unwrap();

        db.fail_schedule(&schedule.id, "upstream 500").await.unwrap();

        let loaded = db.get_schedule(&schedule.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, ScheduleStatus::Failed);
        assert_eq!(loaded.error_message.as_deref(), Some("upstream 500"));
    }

    #[tokio::test]
    async fn test_list_active_secrets_prefix_filter() {
        let (_temp, db) = setup_test_db().await;

        db.upsert_secret("ws1", "blog_api_token", Some("Blog token"), "ct", "iv", "tag")
            .await
            .unwrap();
        db.upsert_secret("ws1", "blog_api_url", None, "ct", "iv", "tag")
            .await
            .unwrap();
        db.upsert_secret("ws1", "twitter_bearer_token", None, "ct", "iv", "tag")
            .await
            .unwrap();
        db.upsert_secret("ws2", "blog_api_token", None, "ct", "iv", "tag")
            .await
            .unwrap();

        let rows = db.list_active_secrets("ws1", &["blog_"]).await.unwrap();
        let slugs: Vec<&str> = rows.iter().map(|r| r.slug.as_str()).collect();
        assert_eq!(slugs, vec!["blog_api_token", "blog_api_url"]);
    }

    #[tokio::test]
    async fn test_soft_deleted_secret_excluded() {
        let (_temp, db) = setup_test_db().await;
        db.upsert_secret("ws1", "blog_api_token", None, "ct", "iv", "tag")
            .await
            .unwrap();

        sqlx::query("UPDATE vault_secrets SET deleted_at = 1 WHERE slug = 'blog_api_token'")
            .execute(db.pool())
            .await
            .unwrap();

        let rows = db.list_active_secrets("ws1", &["blog_"]).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_audit_event_roundtrip() {
        let (_temp, db) = setup_test_db().await;
        let schedule = sample_schedule();
        let result = PublishResult::published(
            Channel::Blog,
            "ok",
            Some("https://blog.example.com/p/1".to_string()),
        );
        let event = AuditEvent::for_attempt("api", &schedule, &result);

        db.insert_audit_event(&event).await.unwrap();

        let events = db.list_audit_events("ws1", 10).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].schedule_id, schedule.id);
        assert_eq!(events[0].status, PublishStatus::Published);
        assert!(events[0].success);
        assert_eq!(events[0].url.as_deref(), Some("https://blog.example.com/p/1"));
    }
}
