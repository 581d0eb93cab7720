//! Uniform upstream rate-limit classification
//!
//! Every adapter runs each outbound response through [`check`] before
//! parsing it as success data, so one upstream behavior class produces one
//! system-wide outcome regardless of which third-party API throttled us.

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Response, StatusCode};

use crate::types::{Channel, PublishResult};

/// Vendor-specific headers that carry a reset hint when `Retry-After` is
/// absent. Twitter uses `x-rate-limit-reset` (epoch seconds); several others
/// use `x-ratelimit-reset`.
const VENDOR_RESET_HEADERS: &[&str] = &["x-rate-limit-reset", "x-ratelimit-reset"];

/// Classify a throttled response into a uniform `rate_limited` result.
///
/// Returns `None` when the response does not signal throttling, leaving the
/// body untouched so the caller can still log it or parse success data.
pub fn check(response: &Response, channel: Channel) -> Option<PublishResult> {
    if response.status() != StatusCode::TOO_MANY_REQUESTS {
        return None;
    }

    let message = match retry_hint(response.headers()) {
        Some(hint) => format!(
            "{} API rate limit exceeded; retry after {}",
            channel, hint
        ),
        None => format!("{} API rate limit exceeded", channel),
    };

    Some(PublishResult::rate_limited(channel, message))
}

/// Read a retry-after hint from the standard header or a vendor variant.
fn retry_hint(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get(RETRY_AFTER).and_then(|v| v.to_str().ok()) {
        return Some(format!("{}s", value.trim()));
    }

    for name in VENDOR_RESET_HEADERS {
        if let Some(value) = headers.get(*name).and_then(|v| v.to_str().ok()) {
            return Some(format!("reset at {}", value.trim()));
        }
    }

    None
}
