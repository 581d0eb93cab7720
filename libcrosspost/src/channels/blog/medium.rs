//! Medium sub-adapter: resolve the authenticated user id, then create the
//! post under that user.

use serde::Deserialize;
use serde_json::json;

use crate::channels::failure_detail;
use crate::credentials::ResolvedCredentials;
use crate::rate_limit;
use crate::types::{Channel, ContentSchedule, PublishResult};

#[derive(Deserialize)]
struct MeEnvelope {
    data: MediumUser,
}

#[derive(Deserialize)]
struct MediumUser {
    id: String,
}

#[derive(Deserialize)]
struct PostEnvelope {
    data: MediumPost,
}

#[derive(Deserialize)]
struct MediumPost {
    url: Option<String>,
}

pub(super) async fn publish(
    http: &reqwest::Client,
    api_base: &str,
    schedule: &ContentSchedule,
    credentials: &ResolvedCredentials,
) -> PublishResult {
    let Some(token) = credentials.get("blog_api_token") else {
        return PublishResult::not_configured(
            Channel::Blog,
            "Medium integration token is not configured (blog_api_token)",
        );
    };

    // Call 1: resolve the authenticated user
    let response = match http
        .get(format!("{}/v1/me", api_base))
        .bearer_auth(token)
        .send()
        .await
    {
        Ok(r) => r,
        Err(e) => {
            return PublishResult::error(Channel::Blog, format!("Medium user lookup failed: {}", e))
        }
    };

    if let Some(limited) = rate_limit::check(&response, Channel::Blog) {
        return limited;
    }
    if !response.status().is_success() {
        let detail = failure_detail(response).await;
        return PublishResult::error(
            Channel::Blog,
            format!("Medium user lookup failed: {}", detail),
        );
    }

    let user = match response.json::<MeEnvelope>().await {
        Ok(me) => me.data,
        Err(e) => {
            return PublishResult::error(
                Channel::Blog,
                format!("Medium user response was malformed: {}", e),
            )
        }
    };

    // Call 2: create the post under that user
    let markdown = super::body_markdown(schedule);
    let payload = json!({
        "title": schedule.title,
        "contentFormat": "markdown",
        "content": markdown,
        "tags": schedule.tags,
        "publishStatus": "public",
    });

    let response = match http
        .post(format!("{}/v1/users/{}/posts", api_base, user.id))
        .bearer_auth(token)
        .json(&payload)
        .send()
        .await
    {
        Ok(r) => r,
        Err(e) => {
            return PublishResult::error(Channel::Blog, format!("Medium publish failed: {}", e))
        }
    };

    if let Some(limited) = rate_limit::check(&response, Channel::Blog) {
        return limited;
    }
    if !response.status().is_success() {
        let detail = failure_detail(response).await;
        return PublishResult::error(Channel::Blog, format!("Medium publish failed: {}", detail));
    }

    let url = response
        .json::<PostEnvelope>()
        .await
        .ok()
        .and_then(|p| p.data.url);

    PublishResult::published(Channel::Blog, "Medium post published", url)
}
