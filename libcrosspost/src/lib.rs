//! Crosspost - multi-channel content publishing dispatcher
//!
//! This library provides the core dispatch pipeline: schedules are loaded
//! from storage, credentials are resolved from an encrypted vault with a
//! process-configuration fallback, and channel adapters carry the content
//! to its destination.

pub mod api;
pub mod audit;
pub mod channels;
pub mod config;
pub mod credentials;
pub mod db;
pub mod dispatcher;
pub mod error;
pub mod logging;
pub mod rate_limit;
pub mod types;
pub mod vault;

// Re-export commonly used types
pub use audit::AuditRecorder;
pub use channels::{ChannelPublisher, ChannelRouter};
pub use config::{Config, Endpoints};
pub use credentials::{CredentialResolver, ResolvedCredentials};
pub use db::Database;
pub use dispatcher::PublishService;
pub use error::{CrosspostError, Result};
pub use types::{Channel, ContentSchedule, PublishResult, PublishStatus, ScheduleStatus};
pub use vault::SecretCipher;
