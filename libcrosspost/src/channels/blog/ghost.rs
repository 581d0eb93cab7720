//! Ghost sub-adapter: one Admin-API call with the `Ghost` auth scheme.

use serde::Deserialize;
use serde_json::json;

use crate::channels::failure_detail;
use crate::credentials::ResolvedCredentials;
use crate::rate_limit;
use crate::types::{Channel, ContentSchedule, PublishResult};

#[derive(Deserialize)]
struct GhostEnvelope {
    posts: Vec<GhostPost>,
}

#[derive(Deserialize)]
struct GhostPost {
    url: Option<String>,
}

pub(super) async fn publish(
    http: &reqwest::Client,
    schedule: &ContentSchedule,
    credentials: &ResolvedCredentials,
) -> PublishResult {
    let Some(site_url) = credentials.get("blog_api_url") else {
        return PublishResult::not_configured(
            Channel::Blog,
            "Ghost site URL is not configured (blog_api_url)",
        );
    };
    let Some(token) = credentials.get("blog_api_token") else {
        return PublishResult::not_configured(
            Channel::Blog,
            "Ghost Admin API token is not configured (blog_api_token)",
        );
    };

    let payload = json!({
        "posts": [{
            "title": schedule.title,
            "html": super::body_html(schedule),
            "status": "published",
            "tags": schedule.tags,
        }]
    });

    let response = match http
        .post(format!(
            "{}/ghost/api/v3/admin/posts/",
            site_url.trim_end_matches('/')
        ))
        .header("Authorization", format!("Ghost {}", token))
        .query(&[("source", "html")])
        .json(&payload)
        .send()
        .await
    {
        Ok(r) => r,
        Err(e) => {
            return PublishResult::error(Channel::Blog, format!("Ghost publish failed: {}", e))
        }
    };

    if let Some(limited) = rate_limit::check(&response, Channel::Blog) {
        return limited;
    }
    if !response.status().is_success() {
        let detail = failure_detail(response).await;
        return PublishResult::error(Channel::Blog, format!("Ghost publish failed: {}", detail));
    }

    let url = response
        .json::<GhostEnvelope>()
        .await
        .ok()
        .and_then(|e| e.posts.into_iter().next())
        .and_then(|p| p.url);

    PublishResult::published(Channel::Blog, "Ghost post published", url)
}
