//! Newsletter channel adapter
//!
//! Unlike the social channels this does not talk to a third-party platform
//! directly; it proxies to the internal orchestration service's send
//! endpoint. The endpoint address lives in process configuration only, so
//! this adapter performs no vault lookup.

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::credentials::ResolvedCredentials;
use crate::rate_limit;
use crate::types::{Channel, ContentSchedule, PublishResult};

use super::{failure_detail, ChannelPublisher};

pub struct NewsletterChannel {
    http: reqwest::Client,
}

impl NewsletterChannel {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ChannelPublisher for NewsletterChannel {
    fn channel(&self) -> Channel {
        Channel::Newsletter
    }

    async fn publish(
        &self,
        schedule: &ContentSchedule,
        credentials: &ResolvedCredentials,
    ) -> PublishResult {
        let Some(api_url) = credentials.get("newsletter_api_url") else {
            return PublishResult::not_configured(
                Channel::Newsletter,
                "Newsletter orchestration endpoint is not configured (newsletter_api_url)",
            );
        };

        let payload = json!({
            "subject": schedule.content.subject.as_deref().unwrap_or(&schedule.title),
            "html": schedule.content.html,
            "text": schedule.content.text,
            "tags": schedule.tags,
        });

        debug!(schedule = %schedule.id, "Dispatching newsletter send");

        let mut request = self.http.post(api_url).json(&payload);
        if let Some(token) = credentials.get("newsletter_api_token") {
            request = request.bearer_auth(token);
        }

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                return PublishResult::error(
                    Channel::Newsletter,
                    format!("Newsletter dispatch failed: {}", e),
                )
            }
        };

        if let Some(limited) = rate_limit::check(&response, Channel::Newsletter) {
            return limited;
        }

        if !response.status().is_success() {
            let detail = failure_detail(response).await;
            return PublishResult::error(
                Channel::Newsletter,
                format!("Newsletter dispatch failed: {}", detail),
            );
        }

        // The orchestration service may echo back an archive URL
        let url = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|v| v.get("url").and_then(|u| u.as_str()).map(String::from));

        PublishResult::published(Channel::Newsletter, "Newsletter send dispatched", url)
    }
}
