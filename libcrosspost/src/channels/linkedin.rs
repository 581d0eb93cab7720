//! LinkedIn channel adapter
//!
//! Shares are created as UGC posts. The author identity is resolved with a
//! fixed precedence: explicit organization id, then explicit person URN,
//! then a live lookup of the authenticated profile. The share's media
//! category is ARTICLE when a link URL is present, IMAGE when only an image
//! URL is present, NONE otherwise.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::credentials::ResolvedCredentials;
use crate::rate_limit;
use crate::types::{Channel, ContentSchedule, PublishResult};

use super::{failure_detail, ChannelPublisher};

const RESTLI_HEADER: (&str, &str) = ("X-Restli-Protocol-Version", "2.0.0");

pub struct LinkedinChannel {
    http: reqwest::Client,
    api_base: String,
}

#[derive(Deserialize)]
struct Profile {
    id: String,
}

#[derive(Deserialize)]
struct UgcPost {
    id: String,
}

impl LinkedinChannel {
    pub fn new(http: reqwest::Client, api_base: String) -> Self {
        Self { http, api_base }
    }

    /// Resolve the share author, falling back to one `/v2/me` lookup.
    async fn resolve_author(
        &self,
        credentials: &ResolvedCredentials,
        access_token: &str,
    ) -> Result<String, PublishResult> {
        if let Some(org_id) = credentials.get("linkedin_organization_id") {
            return Ok(format!("urn:li:organization:{}", org_id));
        }
        if let Some(person_urn) = credentials.get("linkedin_person_urn") {
            return Ok(person_urn.to_string());
        }

        debug!("No explicit LinkedIn author configured; looking up authenticated profile");

        let response = match self
            .http
            .get(format!("{}/v2/me", self.api_base))
            .bearer_auth(access_token)
            .header(RESTLI_HEADER.0, RESTLI_HEADER.1)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                return Err(PublishResult::error(
                    Channel::Linkedin,
                    format!("LinkedIn profile lookup failed: {}", e),
                ))
            }
        };

        if let Some(limited) = rate_limit::check(&response, Channel::Linkedin) {
            return Err(limited);
        }
        if !response.status().is_success() {
            let detail = failure_detail(response).await;
            return Err(PublishResult::error(
                Channel::Linkedin,
                format!("LinkedIn profile lookup failed: {}", detail),
            ));
        }

        match response.json::<Profile>().await {
            Ok(profile) => Ok(format!("urn:li:person:{}", profile.id)),
            Err(e) => Err(PublishResult::error(
                Channel::Linkedin,
                format!("LinkedIn profile response was malformed: {}", e),
            )),
        }
    }
}

#[async_trait]
impl ChannelPublisher for LinkedinChannel {
    fn channel(&self) -> Channel {
        Channel::Linkedin
    }

    async fn publish(
        &self,
        schedule: &ContentSchedule,
        credentials: &ResolvedCredentials,
    ) -> PublishResult {
        let Some(access_token) = credentials.get("linkedin_access_token") else {
            return PublishResult::not_configured(
                Channel::Linkedin,
                "LinkedIn access token is not configured (linkedin_access_token)",
            );
        };

        let author = match self.resolve_author(credentials, access_token).await {
            Ok(a) => a,
            Err(result) => return result,
        };

        let commentary = schedule.content.share_text(&schedule.title);
        let link_url = schedule.content.link_url.as_deref().filter(|u| !u.is_empty());
        let image_url = schedule.content.image_url.as_deref().filter(|u| !u.is_empty());

        let (category, media) = match (link_url, image_url) {
            (Some(link), _) => (
                "ARTICLE",
                json!([{ "status": "READY", "originalUrl": link }]),
            ),
            (None, Some(image)) => (
                "IMAGE",
                json!([{ "status": "READY", "originalUrl": image }]),
            ),
            (None, None) => ("NONE", json!([])),
        };

        let payload = json!({
            "author": author,
            "lifecycleState": "PUBLISHED",
            "specificContent": {
                "com.linkedin.ugc.ShareContent": {
                    "shareCommentary": { "text": commentary },
                    "shareMediaCategory": category,
                    "media": media,
                }
            },
            "visibility": {
                "com.linkedin.ugc.MemberNetworkVisibility": "PUBLIC"
            }
        });

        debug!(schedule = %schedule.id, author = %author, category, "Creating LinkedIn UGC post");

        let response = match self
            .http
            .post(format!("{}/v2/ugcPosts", self.api_base))
            .bearer_auth(access_token)
            .header(RESTLI_HEADER.0, RESTLI_HEADER.1)
            .json(&payload)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                return PublishResult::error(
                    Channel::Linkedin,
                    format!("LinkedIn share failed: {}", e),
                )
            }
        };

        if let Some(limited) = rate_limit::check(&response, Channel::Linkedin) {
            return limited;
        }
        if !response.status().is_success() {
            let detail = failure_detail(response).await;
            return PublishResult::error(
                Channel::Linkedin,
                format!("LinkedIn share failed: {}", detail),
            );
        }

        let post: UgcPost = match response.json().await {
            Ok(p) => p,
            Err(e) => {
                return PublishResult::error(
                    Channel::Linkedin,
                    format!("LinkedIn share response was malformed: {}", e),
                )
            }
        };

        PublishResult::published(
            Channel::Linkedin,
            "LinkedIn share created",
            Some(format!("https://www.linkedin.com/feed/update/{}", post.id)),
        )
    }
}
