//! Hashnode sub-adapter: one GraphQL mutation.
//!
//! GraphQL failures arrive as HTTP 200 with an `errors` array; those are
//! failures, not successes.

use serde::Deserialize;
use serde_json::json;

use crate::channels::failure_detail;
use crate::credentials::ResolvedCredentials;
use crate::rate_limit;
use crate::types::{Channel, ContentSchedule, PublishResult};

const PUBLISH_POST_MUTATION: &str = r#"
mutation PublishPost($input: PublishPostInput!) {
  publishPost(input: $input) {
    post { id url }
  }
}
"#;

#[derive(Deserialize)]
struct GqlResponse {
    data: Option<GqlData>,
    errors: Option<Vec<GqlError>>,
}

#[derive(Deserialize)]
struct GqlError {
    message: String,
}

#[derive(Deserialize)]
struct GqlData {
    #[serde(rename = "publishPost")]
    publish_post: Option<PublishPost>,
}

#[derive(Deserialize)]
struct PublishPost {
    post: Option<HashnodePost>,
}

#[derive(Deserialize)]
struct HashnodePost {
    url: Option<String>,
}

pub(super) async fn publish(
    http: &reqwest::Client,
    gql_endpoint: &str,
    schedule: &ContentSchedule,
    credentials: &ResolvedCredentials,
) -> PublishResult {
    let Some(token) = credentials.get("blog_api_token") else {
        return PublishResult::not_configured(
            Channel::Blog,
            "Hashnode API token is not configured (blog_api_token)",
        );
    };
    let Some(publication_id) = credentials.get("blog_publication_id") else {
        return PublishResult::not_configured(
            Channel::Blog,
            "Hashnode publication id is not configured (blog_publication_id)",
        );
    };

    // Hashnode wants slug/name pairs, not bare strings
    let tags: Vec<serde_json::Value> = schedule
        .tags
        .iter()
        .map(|tag| json!({ "slug": tag_slug(tag), "name": tag }))
        .collect();

    let body = json!({
        "query": PUBLISH_POST_MUTATION,
        "variables": {
            "input": {
                "title": schedule.title,
                "contentMarkdown": super::body_markdown(schedule),
                "publicationId": publication_id,
                "tags": tags,
            }
        }
    });

    let response = match http
        .post(gql_endpoint)
        .header("Authorization", token)
        .json(&body)
        .send()
        .await
    {
        Ok(r) => r,
        Err(e) => {
            return PublishResult::error(Channel::Blog, format!("Hashnode publish failed: {}", e))
        }
    };

    if let Some(limited) = rate_limit::check(&response, Channel::Blog) {
        return limited;
    }
    if !response.status().is_success() {
        let detail = failure_detail(response).await;
        return PublishResult::error(Channel::Blog, format!("Hashnode publish failed: {}", detail));
    }

    let gql: GqlResponse = match response.json().await {
        Ok(g) => g,
        Err(e) => {
            return PublishResult::error(
                Channel::Blog,
                format!("Hashnode response was malformed: {}", e),
            )
        }
    };

    if let Some(errors) = gql.errors.filter(|e| !e.is_empty()) {
        let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
        return PublishResult::error(
            Channel::Blog,
            format!("Hashnode publish failed: {}", messages.join("; ")),
        );
    }

    let url = gql
        .data
        .and_then(|d| d.publish_post)
        .and_then(|p| p.post)
        .and_then(|p| p.url);

    PublishResult::published(Channel::Blog, "Hashnode post published", url)
}

fn tag_slug(tag: &str) -> String {
    tag.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}
