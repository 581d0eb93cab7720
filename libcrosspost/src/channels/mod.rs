//! Channel publisher adapters
//!
//! One adapter per publish destination, all behind a shared trait. Adapters
//! receive the fully-loaded schedule and its resolved credentials, speak the
//! channel-specific wire protocol, and classify the outcome into a
//! [`PublishResult`]. They never mutate the schedule record and never error
//! for expected failure modes; persistence and state transitions belong to
//! the dispatcher.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::config::Endpoints;
use crate::credentials::ResolvedCredentials;
use crate::types::{Channel, ContentSchedule, PublishResult};

pub mod blog;
pub mod instagram;
pub mod linkedin;
pub mod newsletter;
pub mod twitter;

// Mock channel is available for all builds (not just tests) to support
// integration tests
pub mod mock;

/// Shared contract for all channel adapters.
#[async_trait]
pub trait ChannelPublisher: Send + Sync {
    /// The channel this adapter serves.
    fn channel(&self) -> Channel;

    /// Execute the channel's publish protocol.
    ///
    /// Missing credentials yield `not_configured`, upstream throttling
    /// yields `rate_limited`, any other upstream or protocol failure yields
    /// `error`. The returned value is the adapter's whole story; it must not
    /// panic or error for conditions the upstream can plausibly produce.
    async fn publish(
        &self,
        schedule: &ContentSchedule,
        credentials: &ResolvedCredentials,
    ) -> PublishResult;
}

/// Exhaustive adapter set, keyed by channel.
pub struct ChannelRouter {
    publishers: HashMap<Channel, Box<dyn ChannelPublisher>>,
}

impl ChannelRouter {
    /// The production adapter set: all five channels wired to the configured
    /// endpoints over one shared HTTP client.
    pub fn standard(http: reqwest::Client, endpoints: &Endpoints) -> Self {
        Self::empty()
            .with_publisher(Box::new(newsletter::NewsletterChannel::new(http.clone())))
            .with_publisher(Box::new(instagram::InstagramChannel::new(
                http.clone(),
                endpoints.instagram_graph.clone(),
            )))
            .with_publisher(Box::new(twitter::TwitterChannel::new(
                http.clone(),
                endpoints.twitter_api.clone(),
                endpoints.twitter_upload.clone(),
            )))
            .with_publisher(Box::new(linkedin::LinkedinChannel::new(
                http.clone(),
                endpoints.linkedin_api.clone(),
            )))
            .with_publisher(Box::new(blog::BlogChannel::new(
                http,
                endpoints.medium_api.clone(),
                endpoints.hashnode_gql.clone(),
            )))
    }

    pub fn empty() -> Self {
        Self {
            publishers: HashMap::new(),
        }
    }

    /// Register or replace the adapter for a channel. Tests use this to
    /// substitute a [`mock::MockChannel`].
    pub fn with_publisher(mut self, publisher: Box<dyn ChannelPublisher>) -> Self {
        self.publishers.insert(publisher.channel(), publisher);
        self
    }

    pub fn get(&self, channel: Channel) -> Option<&dyn ChannelPublisher> {
        self.publishers.get(&channel).map(Box::as_ref)
    }
}

/// Render a failed upstream response as a short diagnostic, consuming the
/// body. Bodies are truncated; upstream error pages can be enormous.
pub(crate) async fn failure_detail(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let snippet: String = body.chars().take(300).collect();
    format!("HTTP {}: {}", status.as_u16(), snippet.trim())
}
