//! WordPress sub-adapter: one REST call, publishing immediately.

use serde::Deserialize;
use serde_json::json;

use crate::channels::failure_detail;
use crate::credentials::ResolvedCredentials;
use crate::rate_limit;
use crate::types::{Channel, ContentSchedule, PublishResult};

#[derive(Deserialize)]
struct WpPost {
    link: Option<String>,
}

pub(super) async fn publish(
    http: &reqwest::Client,
    schedule: &ContentSchedule,
    credentials: &ResolvedCredentials,
) -> PublishResult {
    let Some(site_url) = credentials.get("blog_api_url") else {
        return PublishResult::not_configured(
            Channel::Blog,
            "WordPress site URL is not configured (blog_api_url)",
        );
    };
    let Some(token) = credentials.get("blog_api_token") else {
        return PublishResult::not_configured(
            Channel::Blog,
            "WordPress API token is not configured (blog_api_token)",
        );
    };

    let payload = json!({
        "title": schedule.title,
        "content": super::body_html(schedule),
        "status": "publish",
    });

    let response = match http
        .post(format!("{}/wp-json/wp/v2/posts", site_url.trim_end_matches('/')))
        .bearer_auth(token)
        .json(&payload)
        .send()
        .await
    {
        Ok(r) => r,
        Err(e) => {
            return PublishResult::error(Channel::Blog, format!("WordPress publish failed: {}", e))
        }
    };

    if let Some(limited) = rate_limit::check(&response, Channel::Blog) {
        return limited;
    }
    if !response.status().is_success() {
        let detail = failure_detail(response).await;
        return PublishResult::error(Channel::Blog, format!("WordPress publish failed: {}", detail));
    }

    let url = response
        .json::<WpPost>()
        .await
        .ok()
        .and_then(|p| p.link);

    PublishResult::published(Channel::Blog, "WordPress post published", url)
}
