//! Blog channel adapter
//!
//! A secondary dispatcher keyed by the configured `blog_platform` value.
//! Each sub-platform follows the same contract as the top-level adapters.
//! When no platform is configured the adapter falls back to the generic
//! webhook publisher, provided both a webhook URL and token are present;
//! otherwise the channel is `not_configured`.

use async_trait::async_trait;

use crate::credentials::ResolvedCredentials;
use crate::types::{BlogPlatform, Channel, ContentSchedule, PublishResult};

use super::ChannelPublisher;

mod ghost;
mod hashnode;
mod medium;
mod webhook;
mod wordpress;

pub struct BlogChannel {
    http: reqwest::Client,
    medium_base: String,
    hashnode_gql: String,
}

impl BlogChannel {
    pub fn new(http: reqwest::Client, medium_base: String, hashnode_gql: String) -> Self {
        Self {
            http,
            medium_base,
            hashnode_gql,
        }
    }
}

#[async_trait]
impl ChannelPublisher for BlogChannel {
    fn channel(&self) -> Channel {
        Channel::Blog
    }

    async fn publish(
        &self,
        schedule: &ContentSchedule,
        credentials: &ResolvedCredentials,
    ) -> PublishResult {
        match credentials.get("blog_platform") {
            Some(value) => match value.parse::<BlogPlatform>() {
                Ok(BlogPlatform::Wordpress) => {
                    wordpress::publish(&self.http, schedule, credentials).await
                }
                Ok(BlogPlatform::Ghost) => ghost::publish(&self.http, schedule, credentials).await,
                Ok(BlogPlatform::Medium) => {
                    medium::publish(&self.http, &self.medium_base, schedule, credentials).await
                }
                Ok(BlogPlatform::Hashnode) => {
                    hashnode::publish(&self.http, &self.hashnode_gql, schedule, credentials).await
                }
                Ok(BlogPlatform::Webhook) => {
                    webhook::publish(&self.http, schedule, credentials).await
                }
                Err(e) => PublishResult::error(Channel::Blog, e),
            },
            // No platform selected: generic webhook when fully configured
            None => {
                let has_webhook = credentials.get("blog_api_url").is_some()
                    && credentials.get("blog_api_token").is_some();
                if has_webhook {
                    webhook::publish(&self.http, schedule, credentials).await
                } else {
                    PublishResult::not_configured(
                        Channel::Blog,
                        "No blog platform configured (blog_platform), and no webhook fallback (blog_api_url + blog_api_token)",
                    )
                }
            }
        }
    }
}

/// Body text preferred by the blog platforms: html first, then markdown,
/// then plain text.
fn body_html(schedule: &ContentSchedule) -> String {
    schedule
        .content
        .html
        .clone()
        .or_else(|| schedule.content.markdown.clone())
        .or_else(|| schedule.content.text.clone())
        .unwrap_or_default()
}

fn body_markdown(schedule: &ContentSchedule) -> String {
    schedule
        .content
        .markdown
        .clone()
        .or_else(|| schedule.content.text.clone())
        .or_else(|| schedule.content.html.clone())
        .unwrap_or_default()
}
