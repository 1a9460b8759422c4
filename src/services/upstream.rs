//! Failure classification for chat-model calls.
//!
//! genai folds provider HTTP failures into its own error type, so the status is
//! recovered from the rendered message.

use super::error::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamFailure {
    RateLimited,
    Timeout,
    Unavailable,
    Auth,
    Other,
}

pub fn classify_message(message: &str) -> UpstreamFailure {
    let msg = message.to_ascii_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| msg.contains(n));

    if has(&["429", "rate limit", "rate_limit", "too many requests", "quota"]) {
        UpstreamFailure::RateLimited
    } else if has(&["timed out", "timeout", "deadline"]) {
        UpstreamFailure::Timeout
    } else if has(&["401", "403", "unauthorized", "forbidden", "api key", "api_key"]) {
        UpstreamFailure::Auth
    } else if has(&[
        "500",
        "502",
        "503",
        "504",
        "unavailable",
        "overloaded",
        "connection",
        "connect",
    ]) {
        UpstreamFailure::Unavailable
    } else {
        UpstreamFailure::Other
    }
}

pub fn classify_genai_error(err: &genai::Error) -> UpstreamFailure {
    classify_message(&err.to_string())
}

pub(crate) fn genai_service_error(service: &'static str, err: genai::Error) -> ServiceError {
    let reason = err.to_string();
    match classify_message(&reason) {
        UpstreamFailure::RateLimited => ServiceError::RateLimited { service },
        UpstreamFailure::Timeout => ServiceError::Timeout { service, reason },
        UpstreamFailure::Unavailable => ServiceError::Unavailable { service, reason },
        UpstreamFailure::Auth => ServiceError::Rejected { service, reason },
        UpstreamFailure::Other => ServiceError::InvalidResponse { service, reason },
    }
}
