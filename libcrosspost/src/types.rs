//! Core types for Crosspost

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A publish destination.
///
/// Every schedule is bound to exactly one channel for its lifetime. The
/// dispatcher matches on this enum exhaustively, so adding a channel is a
/// compile-time checklist rather than a string hunt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Blog,
    Instagram,
    Twitter,
    Linkedin,
    Newsletter,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Blog => "blog",
            Channel::Instagram => "instagram",
            Channel::Twitter => "twitter",
            Channel::Linkedin => "linkedin",
            Channel::Newsletter => "newsletter",
        }
    }

    /// Vault slug prefixes relevant to this channel.
    ///
    /// The newsletter channel is served entirely from process configuration
    /// and needs no vault lookup.
    pub fn slug_prefixes(&self) -> &'static [&'static str] {
        match self {
            Channel::Blog => &["blog_"],
            Channel::Instagram => &["instagram_"],
            Channel::Twitter => &["twitter_"],
            Channel::Linkedin => &["linkedin_"],
            Channel::Newsletter => &[],
        }
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "blog" => Ok(Channel::Blog),
            "instagram" => Ok(Channel::Instagram),
            "twitter" => Ok(Channel::Twitter),
            "linkedin" => Ok(Channel::Linkedin),
            "newsletter" => Ok(Channel::Newsletter),
            _ => Err(format!(
                "Unknown channel: '{}'. Valid options: blog, instagram, twitter, linkedin, newsletter",
                s
            )),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Blog sub-platform selected by the `blog_platform` configuration value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlogPlatform {
    Wordpress,
    Ghost,
    Medium,
    Hashnode,
    Webhook,
}

impl FromStr for BlogPlatform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "wordpress" => Ok(BlogPlatform::Wordpress),
            "ghost" => Ok(BlogPlatform::Ghost),
            "medium" => Ok(BlogPlatform::Medium),
            "hashnode" => Ok(BlogPlatform::Hashnode),
            "webhook" => Ok(BlogPlatform::Webhook),
            _ => Err(format!(
                "Unknown blog platform: '{}'. Valid options: wordpress, ghost, medium, hashnode, webhook",
                s
            )),
        }
    }
}

impl fmt::Display for BlogPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BlogPlatform::Wordpress => "wordpress",
            BlogPlatform::Ghost => "ghost",
            BlogPlatform::Medium => "medium",
            BlogPlatform::Hashnode => "hashnode",
            BlogPlatform::Webhook => "webhook",
        };
        write!(f, "{}", s)
    }
}

/// Persisted status of a schedule.
///
/// Transitions only move along pending -> running -> {completed, failed,
/// pending}. A `not_configured` outcome sends the schedule back to pending;
/// it signals missing setup, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl ScheduleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Pending => "pending",
            ScheduleStatus::Running => "running",
            ScheduleStatus::Completed => "completed",
            ScheduleStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Channel-dependent structured content payload.
///
/// Stored as JSON on the schedule row. Each channel reads the fields it
/// cares about and ignores the rest.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ScheduleContent {
    pub html: Option<String>,
    pub markdown: Option<String>,
    pub text: Option<String>,
    pub caption: Option<String>,
    pub subject: Option<String>,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
}

impl ScheduleContent {
    /// Short-form text used for social shares, in preference order.
    pub fn share_text<'a>(&'a self, title: &'a str) -> &'a str {
        self.caption
            .as_deref()
            .or(self.text.as_deref())
            .or(self.markdown.as_deref())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(title)
    }
}

/// The unit of work: one piece of content awaiting or having undergone a
/// publish attempt on one channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentSchedule {
    pub id: String,
    pub workspace_id: String,
    pub channel: Channel,
    pub title: String,
    pub content: ScheduleContent,
    pub tags: Vec<String>,
    pub status: ScheduleStatus,
    pub error_message: Option<String>,
    pub published_at: Option<i64>,
    pub created_at: i64,
}

impl ContentSchedule {
    pub fn new(workspace_id: String, channel: Channel, title: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            workspace_id,
            channel,
            title,
            content: ScheduleContent::default(),
            tags: Vec::new(),
            status: ScheduleStatus::Pending,
            error_message: None,
            published_at: None,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn with_content(mut self, content: ScheduleContent) -> Self {
        self.content = content;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// Classification of a publish attempt outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStatus {
    /// Terminal success.
    Published,
    /// Reserved success variant for human-completed publishes. Accepted by
    /// the state machine but not emitted by any current adapter.
    Manual,
    /// Missing credentials or configuration. Recoverable, not a failure.
    NotConfigured,
    /// Upstream throttling. Terminal for this attempt.
    RateLimited,
    /// Any other upstream or protocol-level failure.
    Error,
}

impl PublishStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublishStatus::Published => "published",
            PublishStatus::Manual => "manual",
            PublishStatus::NotConfigured => "not_configured",
            PublishStatus::RateLimited => "rate_limited",
            PublishStatus::Error => "error",
        }
    }
}

impl FromStr for PublishStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "published" => Ok(PublishStatus::Published),
            "manual" => Ok(PublishStatus::Manual),
            "not_configured" => Ok(PublishStatus::NotConfigured),
            "rate_limited" => Ok(PublishStatus::RateLimited),
            "error" => Ok(PublishStatus::Error),
            _ => Err(format!("Unknown publish status: '{}'", s)),
        }
    }
}

impl fmt::Display for PublishStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The uniform value object every channel adapter returns.
///
/// Adapters never error for expected failure modes (missing credentials,
/// upstream 4xx/5xx, malformed upstream payload); they classify the outcome
/// here and return normally. Persistence is the dispatcher's job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishResult {
    pub success: bool,
    pub channel: Channel,
    pub status: PublishStatus,
    pub message: String,
    pub url: Option<String>,
}

impl PublishResult {
    pub fn published(channel: Channel, message: impl Into<String>, url: Option<String>) -> Self {
        Self {
            success: true,
            channel,
            status: PublishStatus::Published,
            message: message.into(),
            url,
        }
    }

    pub fn not_configured(channel: Channel, message: impl Into<String>) -> Self {
        Self {
            success: false,
            channel,
            status: PublishStatus::NotConfigured,
            message: message.into(),
            url: None,
        }
    }

    pub fn rate_limited(channel: Channel, message: impl Into<String>) -> Self {
        Self {
            success: false,
            channel,
            status: PublishStatus::RateLimited,
            message: message.into(),
            url: None,
        }
    }

    pub fn error(channel: Channel, message: impl Into<String>) -> Self {
        Self {
            success: false,
            channel,
            status: PublishStatus::Error,
            message: message.into(),
            url: None,
        }
    }

    /// HTTP status for the dispatch response: 200 for success and for
    /// `not_configured`, 429 for throttling, 502 for anything else.
    pub fn http_status(&self) -> u16 {
        match self.status {
            PublishStatus::Published | PublishStatus::Manual | PublishStatus::NotConfigured => 200,
            PublishStatus::RateLimited => 429,
            PublishStatus::Error => 502,
        }
    }
}

/// A structured event describing one publish attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub actor: String,
    pub workspace_id: String,
    pub schedule_id: String,
    pub channel: Channel,
    pub status: PublishStatus,
    pub success: bool,
    pub url: Option<String>,
    pub created_at: i64,
}

impl AuditEvent {
    /// Build an audit event from a dispatch outcome.
    pub fn for_attempt(actor: &str, schedule: &ContentSchedule, result: &PublishResult) -> Self {
        Self {
            actor: actor.to_string(),
            workspace_id: schedule.workspace_id.clone(),
            schedule_id: schedule.id.clone(),
            channel: result.channel,
            status: result.status,
            success: result.success,
            url: result.url.clone(),
            created_at: chrono::Utc::now().timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_from_str() {
        assert_eq!("blog".parse::<Channel>().unwrap(), Channel::Blog);
        assert_eq!("INSTAGRAM".parse::<Channel>().unwrap(), Channel::Instagram);
        assert_eq!("Twitter".parse::<Channel>().unwrap(), Channel::Twitter);
        assert_eq!("linkedin".parse::<Channel>().unwrap(), Channel::Linkedin);
        assert_eq!("newsletter".parse::<Channel>().unwrap(), Channel::Newsletter);
    }

    #[test]
    fn test_channel_from_str_invalid() {
        let err = "facebook".parse::<Channel>().unwrap_err();
        assert!(err.contains("Unknown channel"));
        assert!(err.contains("facebook"));
    }

    #[test]
    fn test_channel_serde_lowercase() {
        let json = serde_json::to_string(&Channel::Linkedin).unwrap();
        assert_eq!(json, r#""linkedin""#);
        let channel: Channel = serde_json::from_str(r#""newsletter""#).unwrap();
        assert_eq!(channel, Channel::Newsletter);
    }

    #[test]
    fn test_newsletter_needs_no_vault_prefixes() {
        assert!(Channel::Newsletter.slug_prefixes().is_empty());
        assert!(!Channel::Blog.slug_prefixes().is_empty());
    }

    #[test]
    fn test_blog_platform_from_str() {
        assert_eq!(
            "wordpress".parse::<BlogPlatform>().unwrap(),
            BlogPlatform::Wordpress
        );
        assert_eq!("Ghost".parse::<BlogPlatform>().unwrap(), BlogPlatform::Ghost);
        assert_eq!(
            "hashnode".parse::<BlogPlatform>().unwrap(),
            BlogPlatform::Hashnode
        );
        assert!("blogger".parse::<BlogPlatform>().is_err());
    }

    #[test]
    fn test_publish_status_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&PublishStatus::NotConfigured).unwrap(),
            r#""not_configured""#
        );
        assert_eq!(
            serde_json::to_string(&PublishStatus::RateLimited).unwrap(),
            r#""rate_limited""#
        );
        let status: PublishStatus = serde_json::from_str(r#""published""#).unwrap();
        assert_eq!(status, PublishStatus::Published);
    }

    #[test]
    fn test_publish_result_http_status() {
        let ok = PublishResult::published(Channel::Blog, "ok", None);
        assert_eq!(ok.http_status(), 200);

        let missing = PublishResult::not_configured(Channel::Blog, "no creds");
        assert_eq!(missing.http_status(), 200);

        let limited = PublishResult::rate_limited(Channel::Twitter, "slow down");
        assert_eq!(limited.http_status(), 429);

        let failed = PublishResult::error(Channel::Linkedin, "upstream 500");
        assert_eq!(failed.http_status(), 502);
    }

    #[test]
    fn test_publish_result_constructors_set_success() {
        assert!(PublishResult::published(Channel::Blog, "ok", None).success);
        assert!(!PublishResult::not_configured(Channel::Blog, "x").success);
        assert!(!PublishResult::rate_limited(Channel::Blog, "x").success);
        assert!(!PublishResult::error(Channel::Blog, "x").success);
    }

    #[test]
    fn test_schedule_new_defaults() {
        let schedule = ContentSchedule::new("ws1".to_string(), Channel::Blog, "Title".to_string());

        assert!(Uuid::parse_str(&schedule.id).is_ok());
        assert_eq!(schedule.workspace_id, "ws1");
        assert_eq!(schedule.channel, Channel::Blog);
        assert_eq!(schedule.status, ScheduleStatus::Pending);
        assert!(schedule.published_at.is_none());
        assert!(schedule.error_message.is_none());
        assert!(schedule.tags.is_empty());
    }

    #[test]
    fn test_schedule_content_camel_case_json() {
        let content: ScheduleContent = serde_json::from_str(
            r#"{"html":"<p>x</p>","imageUrl":"https://img.example/a.jpg","linkUrl":"https://example.com"}"#,
        )
        .unwrap();

        assert_eq!(content.html.as_deref(), Some("<p>x</p>"));
        assert_eq!(content.image_url.as_deref(), Some("https://img.example/a.jpg"));
        assert_eq!(content.link_url.as_deref(), Some("https://example.com"));
        assert!(content.caption.is_none());
    }

    #[test]
    fn test_share_text_preference_order() {
        let mut content = ScheduleContent {
            caption: Some("caption".to_string()),
            text: Some("text".to_string()),
            markdown: Some("md".to_string()),
            ..Default::default()
        };
        assert_eq!(content.share_text("title"), "caption");

        content.caption = None;
        assert_eq!(content.share_text("title"), "text");

        content.text = None;
        assert_eq!(content.share_text("title"), "md");

        content.markdown = None;
        assert_eq!(content.share_text("title"), "title");
    }

    #[test]
    fn test_share_text_ignores_blank() {
        let content = ScheduleContent {
            caption: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(content.share_text("fallback"), "fallback");
    }

    #[test]
    fn test_audit_event_for_attempt() {
        let schedule = ContentSchedule::new("ws1".to_string(), Channel::Twitter, "T".to_string());
        let result = PublishResult::published(
            Channel::Twitter,
            "tweeted",
            Some("https://x.com/i/status/1".to_string()),
        );

        let event = AuditEvent::for_attempt("api", &schedule, &result);
        assert_eq!(event.actor, "api");
        assert_eq!(event.workspace_id, "ws1");
        assert_eq!(event.schedule_id, schedule.id);
        assert_eq!(event.channel, Channel::Twitter);
        assert_eq!(event.status, PublishStatus::Published);
        assert!(event.success);
        assert_eq!(event.url.as_deref(), Some("https://x.com/i/status/1"));
    }
}
