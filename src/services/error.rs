use thiserror::Error;

use crate::retry::Transient;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{service} rate limited the request")]
    RateLimited { service: &'static str },

    #[error("{service} timed out: {reason}")]
    Timeout {
        service: &'static str,
        reason: String,
    },

    #[error("{service} unavailable: {reason}")]
    Unavailable {
        service: &'static str,
        reason: String,
    },

    #[error("{service} returned an invalid response: {reason}")]
    InvalidResponse {
        service: &'static str,
        reason: String,
    },

    #[error("{service} rejected the request: {reason}")]
    Rejected {
        service: &'static str,
        reason: String,
    },

    #[error("{service} is not configured")]
    NotConfigured { service: &'static str },
}

impl ServiceError {
    pub fn service(&self) -> &'static str {
        match self {
            ServiceError::RateLimited { service }
            | ServiceError::Timeout { service, .. }
            | ServiceError::Unavailable { service, .. }
            | ServiceError::InvalidResponse { service, .. }
            | ServiceError::Rejected { service, .. }
            | ServiceError::NotConfigured { service } => service,
        }
    }

    pub(crate) fn from_reqwest(service: &'static str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ServiceError::Timeout {
                service,
                reason: err.to_string(),
            }
        } else if err.is_decode() {
            ServiceError::InvalidResponse {
                service,
                reason: err.to_string(),
            }
        } else {
            ServiceError::Unavailable {
                service,
                reason: err.to_string(),
            }
        }
    }
}

impl Transient for ServiceError {
    fn is_transient(&self) -> bool {
        matches!(
            self,
            ServiceError::RateLimited { .. }
                | ServiceError::Timeout { .. }
                | ServiceError::Unavailable { .. }
        )
    }
}
