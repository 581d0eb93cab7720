//! End-to-end dispatch pipeline tests
//!
//! These wire the real pieces together: encrypted vault rows in SQLite, the
//! credential resolver, the dispatcher, and a real channel adapter pointed
//! at a local HTTP fixture. Only the third-party platform is faked.

use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use libcrosspost::audit::AuditRecorder;
use libcrosspost::channels::blog::BlogChannel;
use libcrosspost::channels::mock::MockChannel;
use libcrosspost::channels::ChannelRouter;
use libcrosspost::credentials::CredentialResolver;
use libcrosspost::db::Database;
use libcrosspost::dispatcher::PublishService;
use libcrosspost::types::{
    Channel, ContentSchedule, PublishStatus, ScheduleContent, ScheduleStatus,
};
use libcrosspost::vault::{generate_key_b64, SecretCipher};

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn store_secret(db: &Database, cipher: &SecretCipher, workspace: &str, slug: &str, value: &str) {
    let (ct, iv, tag) = cipher.encrypt(value).unwrap();
    db.upsert_secret(workspace, slug, None, &ct, &iv, &tag)
        .await
        .unwrap();
}

async fn wait_for_audit(db: &Database, workspace: &str, expected: usize) -> usize {
    for _ in 0..50 {
        let events = db.list_audit_events(workspace, 100).await.unwrap();
        if events.len() >= expected {
            return events.len();
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    db.list_audit_events(workspace, 100).await.unwrap().len()
}

#[tokio::test]
async fn vault_credentials_drive_a_real_adapter() {
    // Fixture standing in for the webhook destination
    let base = serve(Router::new().route(
        "/hook",
        post(|| async { Json(json!({ "url": "https://blog.example.com/p/9" })) }),
    ))
    .await;

    let temp_dir = TempDir::new().unwrap();
    let db = Database::new(&temp_dir.path().join("flow.db").to_string_lossy())
        .await
        .unwrap();

    // Credentials live encrypted at rest; nothing in process config
    let key = generate_key_b64();
    let cipher = SecretCipher::from_base64_key(&key).unwrap();
    store_secret(&db, &cipher, "ws1", "blog_api_url", &format!("{}/hook", base)).await;
    store_secret(&db, &cipher, "ws1", "blog_api_token", "hook-token").await;

    let resolver = CredentialResolver::new(db.clone(), Some(cipher), HashMap::new());
    let router = Arc::new(ChannelRouter::empty().with_publisher(Box::new(BlogChannel::new(
        reqwest::Client::new(),
        String::new(),
        String::new(),
    ))));
    let audit = AuditRecorder::spawn(db.clone());
    let service = PublishService::new(db.clone(), resolver, router, audit);

    let schedule = ContentSchedule::new("ws1".to_string(), Channel::Blog, "Post".to_string())
        .with_content(ScheduleContent {
            html: Some("<p>body</p>".to_string()),
            ..Default::default()
        });
    db.create_schedule(&schedule).await.unwrap();

    let result = service.publish("api", &schedule.id, Channel::Blog).await.unwrap();

    assert!(result.success);
    assert_eq!(result.status, PublishStatus::Published);
    assert_eq!(result.url.as_deref(), Some("https://blog.example.com/p/9"));

    let loaded = db.get_schedule(&schedule.id).await.unwrap().unwrap();
    assert_eq!(loaded.status, ScheduleStatus::Completed);
    assert!(loaded.published_at.is_some());

    // The attempt landed in the audit trail
    assert_eq!(wait_for_audit(&db, "ws1", 1).await, 1);
    let events = db.list_audit_events("ws1", 10).await.unwrap();
    assert_eq!(events[0].status, PublishStatus::Published);
    assert_eq!(events[0].actor, "api");
    assert_eq!(events[0].url.as_deref(), Some("https://blog.example.com/p/9"));
}

#[tokio::test]
async fn missing_vault_rows_leave_schedule_pending() {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::new(&temp_dir.path().join("flow.db").to_string_lossy())
        .await
        .unwrap();

    // A key is configured but the vault holds nothing for this workspace
    let key = generate_key_b64();
    let cipher = SecretCipher::from_base64_key(&key).unwrap();

    let resolver = CredentialResolver::new(db.clone(), Some(cipher), HashMap::new());
    let router = Arc::new(ChannelRouter::empty().with_publisher(Box::new(BlogChannel::new(
        reqwest::Client::new(),
        String::new(),
        String::new(),
    ))));
    let audit = AuditRecorder::spawn(db.clone());
    let service = PublishService::new(db.clone(), resolver, router, audit);

    let schedule = ContentSchedule::new("ws1".to_string(), Channel::Blog, "Post".to_string());
    db.create_schedule(&schedule).await.unwrap();

    let result = service.publish("api", &schedule.id, Channel::Blog).await.unwrap();

    assert_eq!(result.status, PublishStatus::NotConfigured);
    let loaded = db.get_schedule(&schedule.id).await.unwrap().unwrap();
    assert_eq!(loaded.status, ScheduleStatus::Pending);

    // Not-configured attempts are audited too
    assert_eq!(wait_for_audit(&db, "ws1", 1).await, 1);
    let events = db.list_audit_events("ws1", 10).await.unwrap();
    assert_eq!(events[0].status, PublishStatus::NotConfigured);
    assert!(!events[0].success);
}

#[tokio::test]
async fn workspaces_are_isolated() {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::new(&temp_dir.path().join("flow.db").to_string_lossy())
        .await
        .unwrap();

    let key = generate_key_b64();
    let cipher = SecretCipher::from_base64_key(&key).unwrap();
    // Only ws2 has credentials
    store_secret(&db, &cipher, "ws2", "blog_api_url", "https://other.example.com").await;
    store_secret(&db, &cipher, "ws2", "blog_api_token", "other-token").await;

    let resolver = CredentialResolver::new(db.clone(), Some(cipher), HashMap::new());
    let router = Arc::new(ChannelRouter::empty().with_publisher(Box::new(BlogChannel::new(
        reqwest::Client::new(),
        String::new(),
        String::new(),
    ))));
    let audit = AuditRecorder::spawn(db.clone());
    let service = PublishService::new(db.clone(), resolver, router, audit);

    let schedule = ContentSchedule::new("ws1".to_string(), Channel::Blog, "Post".to_string());
    db.create_schedule(&schedule).await.unwrap();

    // ws1 must not see ws2's credentials
    let result = service.publish("api", &schedule.id, Channel::Blog).await.unwrap();
    assert_eq!(result.status, PublishStatus::NotConfigured);
}

#[tokio::test]
async fn sequential_retry_after_failure_succeeds() {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::new(&temp_dir.path().join("flow.db").to_string_lossy())
        .await
        .unwrap();

    let resolver = CredentialResolver::new(db.clone(), None, HashMap::new());
    let audit = AuditRecorder::spawn(db.clone());

    let failing = Arc::new(ChannelRouter::empty().with_publisher(Box::new(
        MockChannel::failing(Channel::Twitter, "upstream 503"),
    )));
    let service = PublishService::new(db.clone(), resolver, failing, audit.clone());

    let schedule = ContentSchedule::new("ws1".to_string(), Channel::Twitter, "T".to_string());
    db.create_schedule(&schedule).await.unwrap();

    let first = service.publish("api", &schedule.id, Channel::Twitter).await.unwrap();
    assert_eq!(first.status, PublishStatus::Error);
    assert_eq!(
        db.get_schedule(&schedule.id).await.unwrap().unwrap().status,
        ScheduleStatus::Failed
    );

    // Same schedule, healthy adapter this time
    let resolver = CredentialResolver::new(db.clone(), None, HashMap::new());
    let healthy = Arc::new(
        ChannelRouter::empty().with_publisher(Box::new(MockChannel::published(Channel::Twitter))),
    );
    let service = PublishService::new(db.clone(), resolver, healthy, audit);

    let second = service.publish("api", &schedule.id, Channel::Twitter).await.unwrap();
    assert_eq!(second.status, PublishStatus::Published);
    assert_eq!(
        db.get_schedule(&schedule.id).await.unwrap().unwrap().status,
        ScheduleStatus::Completed
    );

    // Both attempts audited, newest first
    assert_eq!(wait_for_audit(&db, "ws1", 2).await, 2);
}
