//! Rate-limit classification and retry delays.
//!
//! Only rate limiting is retried. Detection prefers the HTTP status; the
//! textual markers cover failures that arrive without one.

use crate::config::RetryConfig;
use crate::error::ModelError;
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;

/// Lower-cased substrings that mark an unstructured error as rate limiting.
pub const RATE_LIMIT_MARKERS: &[&str] = &[
    "quota",
    "rate limit",
    "rate-limit",
    "resource_exhausted",
    "too many requests",
];

/// Whether `error` signals rate limiting.
pub fn is_rate_limited(error: &ModelError) -> bool {
    if error.status_code == Some(429) {
        return true;
    }
    let message = error.message.to_lowercase();
    RATE_LIMIT_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
}

/// Calculate exponential backoff duration for a given attempt.
///
/// `attempt` is zero-based: the wait after the first failure is `base_delay`.
/// Uses `base_delay * 2^attempt` capped at `max_delay_ms`.
pub fn backoff_duration(attempt: u32, base_delay_ms: u64, max_delay_ms: u64) -> Duration {
    let delay = base_delay_ms.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(delay.min(max_delay_ms))
}

/// Wait before the next attempt: the server's suggestion if it gave one,
/// otherwise exponential backoff. Both are capped by `max_delay_ms`.
pub fn retry_delay(error: &ModelError, attempt: u32, config: &RetryConfig) -> Duration {
    let cap = Duration::from_millis(config.max_delay_ms);
    match error.retry_after {
        Some(suggested) => suggested.min(cap),
        None => backoff_duration(attempt, config.base_delay_ms, config.max_delay_ms),
    }
}

/// Extract a server-suggested retry delay from an error payload.
///
/// Understands the JSON `google.rpc.RetryInfo` detail (`"retryDelay": "37s"`)
/// and the text form `retry_delay { seconds: 37 }`.
pub fn parse_retry_delay(payload: &str) -> Option<Duration> {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(payload) {
        let details = value
            .pointer("/error/details")
            .and_then(|d| d.as_array())
            .into_iter()
            .flatten();
        for detail in details {
            let is_retry_info = detail
                .get("@type")
                .and_then(|t| t.as_str())
                .is_some_and(|t| t.ends_with("RetryInfo"));
            if !is_retry_info {
                continue;
            }
            if let Some(delay) = detail
                .get("retryDelay")
                .and_then(|d| d.as_str())
                .and_then(parse_duration_seconds)
            {
                return Some(delay);
            }
        }
    }

    static TEXT_FORM: OnceLock<Regex> = OnceLock::new();
    let re = TEXT_FORM
        .get_or_init(|| Regex::new(r"retry_delay\s*\{\s*seconds:\s*(\d+)").expect("valid regex"));
    re.captures(payload)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Parse a `Retry-After` header value given in seconds.
pub fn parse_retry_after_header(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Parse a protobuf JSON duration such as `"37s"` or `"1.5s"`.
fn parse_duration_seconds(value: &str) -> Option<Duration> {
    let seconds: f64 = value.trim().strip_suffix('s')?.parse().ok()?;
    if seconds.is_finite() && seconds >= 0.0 {
        Some(Duration::from_secs_f64(seconds))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_429_is_rate_limited() {
        assert!(is_rate_limited(&ModelError::http(429, "slow down")));
    }

    #[test]
    fn test_textual_markers_are_rate_limited() {
        for message in [
            "Resource has been exhausted (e.g. check quota).",
            "Rate limit exceeded for requests per minute",
            "RESOURCE_EXHAUSTED",
            "Too Many Requests",
        ] {
            assert!(is_rate_limited(&ModelError::new(message)), "{message}");
        }
    }

    #[test]
    fn test_other_errors_not_rate_limited() {
        assert!(!is_rate_limited(&ModelError::http(401, "API key not valid")));
        assert!(!is_rate_limited(&ModelError::http(500, "internal error")));
        assert!(!is_rate_limited(&ModelError::new("connection refused")));
    }

    #[test]
    fn test_bare_number_in_body_not_rate_limited() {
        // "429" without a status or a marker is not enough
        let err = ModelError::new("Processed 429 tokens successfully");
        assert!(!is_rate_limited(&err));
    }

    #[test]
    fn test_backoff_exponential() {
        assert_eq!(backoff_duration(0, 1000, 60_000), Duration::from_millis(1000));
        assert_eq!(backoff_duration(1, 1000, 60_000), Duration::from_millis(2000));
        assert_eq!(backoff_duration(2, 1000, 60_000), Duration::from_millis(4000));
        assert_eq!(backoff_duration(3, 1000, 60_000), Duration::from_millis(8000));
    }

    #[test]
    fn test_backoff_capped() {
        assert_eq!(backoff_duration(10, 1000, 30_000), Duration::from_millis(30_000));
        assert_eq!(backoff_duration(80, 1000, 30_000), Duration::from_millis(30_000));
    }

    #[test]
    fn test_retry_delay_prefers_server_suggestion() {
        let config = RetryConfig::default();
        let err = ModelError::http(429, "quota").with_retry_after(Some(Duration::from_secs(7)));
        assert_eq!(retry_delay(&err, 0, &config), Duration::from_secs(7));

        let err = ModelError::http(429, "quota");
        assert_eq!(retry_delay(&err, 1, &config), Duration::from_secs(2));
    }

    #[test]
    fn test_retry_delay_caps_server_suggestion() {
        let config = RetryConfig {
            max_delay_ms: 5_000,
            ..RetryConfig::default()
        };
        let err = ModelError::http(429, "quota").with_retry_after(Some(Duration::from_secs(600)));
        assert_eq!(retry_delay(&err, 0, &config), Duration::from_secs(5));
    }

    #[test]
    fn test_parse_retry_delay_json_retry_info() {
        let body = r#"{
          "error": {
            "code": 429,
            "message": "You exceeded your current quota.",
            "status": "RESOURCE_EXHAUSTED",
            "details": [
              {"@type": "type.googleapis.com/google.rpc.QuotaFailure", "violations": []},
              {"@type": "type.googleapis.com/google.rpc.RetryInfo", "retryDelay": "37s"}
            ]
          }
        }"#;
        assert_eq!(parse_retry_delay(body), Some(Duration::from_secs(37)));
    }

    #[test]
    fn test_parse_retry_delay_fractional_seconds() {
        let body = r#"{"error": {"details": [
            {"@type": "type.googleapis.com/google.rpc.RetryInfo", "retryDelay": "1.5s"}
        ]}}"#;
        assert_eq!(parse_retry_delay(body), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_parse_retry_delay_text_form() {
        let text = "429 Resource exhausted. [violations { } , links { } , retry_delay {\n  seconds: 12\n}\n]";
        assert_eq!(parse_retry_delay(text), Some(Duration::from_secs(12)));
    }

    #[test]
    fn test_parse_retry_delay_absent() {
        assert_eq!(parse_retry_delay(r#"{"error": {"code": 429}}"#), None);
        assert_eq!(parse_retry_delay("plain failure"), None);
    }

    #[test]
    fn test_parse_retry_after_header() {
        assert_eq!(parse_retry_after_header(" 30 "), Some(Duration::from_secs(30)));
        assert_eq!(parse_retry_after_header("Wed, 21 Oct 2015 07:28:00 GMT"), None);
    }
}
