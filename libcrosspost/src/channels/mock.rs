//! Mock channel adapter for testing
//!
//! A configurable adapter that returns a canned [`PublishResult`] and
//! records what it was asked to publish, so dispatcher behavior can be
//! verified without credentials or network access.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::credentials::ResolvedCredentials;
use crate::types::{Channel, ContentSchedule, PublishResult};

use super::ChannelPublisher;

/// Mock channel for testing
pub struct MockChannel {
    channel: Channel,
    result: PublishResult,
    /// Schedule ids this mock was invoked with, in order
    pub calls: Arc<Mutex<Vec<String>>>,
    /// Credential slugs observed on the last call (sorted)
    pub seen_slugs: Arc<Mutex<Vec<String>>>,
    probe_slugs: Vec<String>,
}

impl MockChannel {
    pub fn new(channel: Channel, result: PublishResult) -> Self {
        Self {
            channel,
            result,
            calls: Arc::new(Mutex::new(Vec::new())),
            seen_slugs: Arc::new(Mutex::new(Vec::new())),
            probe_slugs: Vec::new(),
        }
    }

    /// A mock that reports a successful publish
    pub fn published(channel: Channel) -> Self {
        Self::new(
            channel,
            PublishResult::published(channel, "mock publish", Some("https://mock.example/1".to_string())),
        )
    }

    /// A mock that reports missing configuration
    pub fn not_configured(channel: Channel) -> Self {
        Self::new(
            channel,
            PublishResult::not_configured(channel, "mock missing credentials"),
        )
    }

    /// A mock that reports upstream throttling
    pub fn rate_limited(channel: Channel) -> Self {
        Self::new(
            channel,
            PublishResult::rate_limited(channel, "mock rate limit"),
        )
    }

    /// A mock that reports an upstream failure
    pub fn failing(channel: Channel, message: &str) -> Self {
        Self::new(channel, PublishResult::error(channel, message))
    }

    /// Record which of these slugs resolve on each call.
    pub fn probing_slugs(mut self, slugs: &[&str]) -> Self {
        self.probe_slugs = slugs.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ChannelPublisher for MockChannel {
    fn channel(&self) -> Channel {
        self.channel
    }

    async fn publish(
        &self,
        schedule: &ContentSchedule,
        credentials: &ResolvedCredentials,
    ) -> PublishResult {
        self.calls.lock().unwrap().push(schedule.id.clone());

        let mut seen: Vec<String> = self
            .probe_slugs
            .iter()
            .filter(|slug| credentials.get(slug).is_some())
            .cloned()
            .collect();
        seen.sort();
        *self.seen_slugs.lock().unwrap() = seen;

        self.result.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn test_mock_records_calls() {
        let mock = MockChannel::published(Channel::Blog);
        let schedule = ContentSchedule::new("ws1".to_string(), Channel::Blog, "T".to_string());
        let creds = ResolvedCredentials::default();

        let result = mock.publish(&schedule, &creds).await;
        assert!(result.success);
        assert_eq!(mock.call_count(), 1);
        assert_eq!(mock.calls.lock().unwrap()[0], schedule.id);
    }

    #[tokio::test]
    async fn test_mock_probes_slugs() {
        let mock = MockChannel::published(Channel::Blog).probing_slugs(&["blog_api_url", "blog_api_token"]);
        let schedule = ContentSchedule::new("ws1".to_string(), Channel::Blog, "T".to_string());

        let mut fallback = HashMap::new();
        fallback.insert("blog_api_url".to_string(), "https://x".to_string());
        let creds = ResolvedCredentials::from_fallback(fallback);

        mock.publish(&schedule, &creds).await;
        assert_eq!(*mock.seen_slugs.lock().unwrap(), vec!["blog_api_url".to_string()]);
    }
}
