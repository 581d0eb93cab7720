//! X/Twitter channel adapter
//!
//! Posts via the v2 tweets endpoint. An attached image travels through the
//! legacy v1.1 media-upload endpoint first; that whole leg is best-effort,
//! so a failed download or upload degrades to a text-only tweet instead of
//! aborting the publish. Tweet text is truncated to the platform limit.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::credentials::ResolvedCredentials;
use crate::rate_limit;
use crate::types::{Channel, ContentSchedule, PublishResult};

use super::{failure_detail, ChannelPublisher};

pub const TWEET_MAX_CHARS: usize = 280;

pub struct TwitterChannel {
    http: reqwest::Client,
    api_base: String,
    upload_base: String,
}

#[derive(Deserialize)]
struct MediaUpload {
    media_id_string: String,
}

#[derive(Deserialize)]
struct TweetEnvelope {
    data: TweetData,
}

#[derive(Deserialize)]
struct TweetData {
    id: String,
}

impl TwitterChannel {
    pub fn new(http: reqwest::Client, api_base: String, upload_base: String) -> Self {
        Self {
            http,
            api_base,
            upload_base,
        }
    }

    /// Best-effort media leg: download the image and push it through the
    /// legacy upload endpoint. Returns the media id, a rate-limit result
    /// when the platform throttled the upload, or nothing when the leg
    /// should be skipped.
    async fn upload_media(
        &self,
        image_url: &str,
        bearer_token: &str,
    ) -> Result<Option<String>, PublishResult> {
        let image = match self.http.get(image_url).send().await {
            Ok(r) if r.status().is_success() => match r.bytes().await {
                Ok(b) => b,
                Err(e) => {
                    warn!("Image download failed, tweeting without media: {}", e);
                    return Ok(None);
                }
            },
            Ok(r) => {
                warn!(
                    "Image download returned HTTP {}, tweeting without media",
                    r.status().as_u16()
                );
                return Ok(None);
            }
            Err(e) => {
                warn!("Image download failed, tweeting without media: {}", e);
                return Ok(None);
            }
        };

        let response = match self
            .http
            .post(format!("{}/1.1/media/upload.json", self.upload_base))
            .bearer_auth(bearer_token)
            .form(&[("media_data", BASE64.encode(&image))])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!("Media upload failed, tweeting without media: {}", e);
                return Ok(None);
            }
        };

        if let Some(limited) = rate_limit::check(&response, Channel::Twitter) {
            return Err(limited);
        }
        if !response.status().is_success() {
            let detail = failure_detail(response).await;
            warn!("Media upload failed, tweeting without media: {}", detail);
            return Ok(None);
        }

        match response.json::<MediaUpload>().await {
            Ok(upload) => Ok(Some(upload.media_id_string)),
            Err(e) => {
                warn!("Media upload response was malformed, tweeting without media: {}", e);
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl ChannelPublisher for TwitterChannel {
    fn channel(&self) -> Channel {
        Channel::Twitter
    }

    async fn publish(
        &self,
        schedule: &ContentSchedule,
        credentials: &ResolvedCredentials,
    ) -> PublishResult {
        let Some(bearer_token) = credentials.get("twitter_bearer_token") else {
            return PublishResult::not_configured(
                Channel::Twitter,
                "Twitter bearer token is not configured (twitter_bearer_token)",
            );
        };

        let text = truncate_chars(schedule.content.share_text(&schedule.title), TWEET_MAX_CHARS);

        let media_id = match schedule.content.image_url.as_deref().filter(|u| !u.is_empty()) {
            Some(image_url) => match self.upload_media(image_url, bearer_token).await {
                Ok(id) => id,
                Err(limited) => return limited,
            },
            None => None,
        };

        let mut payload = json!({ "text": text });
        if let Some(id) = &media_id {
            payload["media"] = json!({ "media_ids": [id] });
        }

        debug!(schedule = %schedule.id, with_media = media_id.is_some(), "Posting tweet");

        let response = match self
            .http
            .post(format!("{}/2/tweets", self.api_base))
            .bearer_auth(bearer_token)
            .json(&payload)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                return PublishResult::error(Channel::Twitter, format!("Tweet failed: {}", e))
            }
        };

        if let Some(limited) = rate_limit::check(&response, Channel::Twitter) {
            return limited;
        }
        if !response.status().is_success() {
            let detail = failure_detail(response).await;
            return PublishResult::error(Channel::Twitter, format!("Tweet failed: {}", detail));
        }

        let tweet: TweetEnvelope = match response.json().await {
            Ok(t) => t,
            Err(e) => {
                return PublishResult::error(
                    Channel::Twitter,
                    format!("Tweet response was malformed: {}", e),
                )
            }
        };

        PublishResult::published(
            Channel::Twitter,
            if media_id.is_some() {
                "Tweet posted with media"
            } else {
                "Tweet posted"
            },
            Some(format!("https://twitter.com/i/web/status/{}", tweet.data.id)),
        )
    }
}

/// Truncate on a character boundary, never mid-codepoint.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate_chars("hello", TWEET_MAX_CHARS), "hello");
    }

    #[test]
    fn test_truncate_at_limit() {
        let long = "x".repeat(400);
        let truncated = truncate_chars(&long, TWEET_MAX_CHARS);
        assert_eq!(truncated.chars().count(), TWEET_MAX_CHARS);
    }

    #[test]
    fn test_truncate_multibyte_safe() {
        let long = "é".repeat(300);
        let truncated = truncate_chars(&long, TWEET_MAX_CHARS);
        assert_eq!(truncated.chars().count(), TWEET_MAX_CHARS);
        assert!(truncated.chars().all(|c| c == 'é'));
    }
}
