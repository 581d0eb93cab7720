//! Instagram channel adapter
//!
//! Two-phase Graph API protocol: create a media container for the image,
//! then publish the container by id. The phases are strictly sequential; a
//! failure in phase one aborts before phase two. Instagram has no text-only
//! posts, so a schedule without an image URL is an `error`, not
//! `not_configured`.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::credentials::ResolvedCredentials;
use crate::rate_limit;
use crate::types::{Channel, ContentSchedule, PublishResult};

use super::{failure_detail, ChannelPublisher};

pub struct InstagramChannel {
    http: reqwest::Client,
    graph_base: String,
}

#[derive(Deserialize)]
struct GraphId {
    id: String,
}

impl InstagramChannel {
    pub fn new(http: reqwest::Client, graph_base: String) -> Self {
        Self { http, graph_base }
    }
}

#[async_trait]
impl ChannelPublisher for InstagramChannel {
    fn channel(&self) -> Channel {
        Channel::Instagram
    }

    async fn publish(
        &self,
        schedule: &ContentSchedule,
        credentials: &ResolvedCredentials,
    ) -> PublishResult {
        let Some(access_token) = credentials.get("instagram_access_token") else {
            return PublishResult::not_configured(
                Channel::Instagram,
                "Instagram access token is not configured (instagram_access_token)",
            );
        };
        let Some(business_id) = credentials.get("instagram_business_id") else {
            return PublishResult::not_configured(
                Channel::Instagram,
                "Instagram business account id is not configured (instagram_business_id)",
            );
        };

        let Some(image_url) = schedule.content.image_url.as_deref().filter(|u| !u.is_empty())
        else {
            return PublishResult::error(
                Channel::Instagram,
                "Instagram posts require an image; schedule content has no image URL",
            );
        };

        let caption = schedule.content.share_text(&schedule.title);

        // Phase 1: create the media container
        debug!(schedule = %schedule.id, "Creating Instagram media container");
        let response = match self
            .http
            .post(format!("{}/{}/media", self.graph_base, business_id))
            .form(&[
                ("image_url", image_url),
                ("caption", caption),
                ("access_token", access_token),
            ])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                return PublishResult::error(
                    Channel::Instagram,
                    format!("Instagram container creation failed: {}", e),
                )
            }
        };

        if let Some(limited) = rate_limit::check(&response, Channel::Instagram) {
            return limited;
        }
        if !response.status().is_success() {
            let detail = failure_detail(response).await;
            return PublishResult::error(
                Channel::Instagram,
                format!("Instagram container creation failed: {}", detail),
            );
        }

        let container: GraphId = match response.json().await {
            Ok(c) => c,
            Err(e) => {
                return PublishResult::error(
                    Channel::Instagram,
                    format!("Instagram container response was malformed: {}", e),
                )
            }
        };

        // Phase 2: publish the container
        debug!(schedule = %schedule.id, container = %container.id, "Publishing Instagram container");
        let response = match self
            .http
            .post(format!("{}/{}/media_publish", self.graph_base, business_id))
            .form(&[
                ("creation_id", container.id.as_str()),
                ("access_token", access_token),
            ])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                return PublishResult::error(
                    Channel::Instagram,
                    format!("Instagram media publish failed: {}", e),
                )
            }
        };

        if let Some(limited) = rate_limit::check(&response, Channel::Instagram) {
            return limited;
        }
        if !response.status().is_success() {
            let detail = failure_detail(response).await;
            return PublishResult::error(
                Channel::Instagram,
                format!("Instagram media publish failed: {}", detail),
            );
        }

        let media: GraphId = match response.json().await {
            Ok(m) => m,
            Err(e) => {
                return PublishResult::error(
                    Channel::Instagram,
                    format!("Instagram publish response was malformed: {}", e),
                )
            }
        };

        PublishResult::published(
            Channel::Instagram,
            format!("Instagram media {} published", media.id),
            None,
        )
    }
}
