//! Generic webhook sub-adapter.
//!
//! POSTs a normalized payload to an operator-supplied URL. A response body
//! that is not JSON still counts as success; the external URL is simply
//! absent.

use serde_json::json;

use crate::channels::failure_detail;
use crate::credentials::ResolvedCredentials;
use crate::rate_limit;
use crate::types::{Channel, ContentSchedule, PublishResult};

pub(super) async fn publish(
    http: &reqwest::Client,
    schedule: &ContentSchedule,
    credentials: &ResolvedCredentials,
) -> PublishResult {
    let Some(url) = credentials.get("blog_api_url") else {
        return PublishResult::not_configured(
            Channel::Blog,
            "Webhook URL is not configured (blog_api_url)",
        );
    };
    let Some(token) = credentials.get("blog_api_token") else {
        return PublishResult::not_configured(
            Channel::Blog,
            "Webhook token is not configured (blog_api_token)",
        );
    };

    let payload = json!({
        "title": schedule.title,
        "html": schedule.content.html,
        "markdown": schedule.content.markdown,
        "tags": schedule.tags,
        "scheduleId": schedule.id,
        "workspaceId": schedule.workspace_id,
    });

    let response = match http.post(url).bearer_auth(token).json(&payload).send().await {
        Ok(r) => r,
        Err(e) => {
            return PublishResult::error(Channel::Blog, format!("Webhook delivery failed: {}", e))
        }
    };

    if let Some(limited) = rate_limit::check(&response, Channel::Blog) {
        return limited;
    }
    if !response.status().is_success() {
        let detail = failure_detail(response).await;
        return PublishResult::error(Channel::Blog, format!("Webhook delivery failed: {}", detail));
    }

    // Best effort: a JSON body may carry a canonical URL
    let url = response
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|v| v.get("url").and_then(|u| u.as_str()).map(String::from));

    PublishResult::published(Channel::Blog, "Webhook delivered", url)
}
