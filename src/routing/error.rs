use thiserror::Error;

use super::types::{RouteDecision, RoutingState};

#[derive(Debug, Error)]
pub enum RoutingError {
    /// Rejected before any external call.
    #[error("invalid query: {reason}")]
    InvalidQuery { reason: String },

    /// An external service kept failing transiently and no evidence path remained.
    #[error("{service} exhausted after {attempts} attempts: {reason}")]
    Exhausted {
        service: &'static str,
        attempts: u32,
        reason: String,
        trail: Option<Box<RouteDecision>>,
    },

    #[error("synthesis failed: {reason}")]
    SynthesisFailed {
        reason: String,
        trail: Option<Box<RouteDecision>>,
    },

    #[error("invalid routing transition from {from:?} to {to:?}")]
    InvalidTransition { from: RoutingState, to: RoutingState },

    #[error("invalid routing configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl RoutingError {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, RoutingError::Exhausted { .. })
    }

    /// Routing trail up to the failure, when classification had already run.
    pub fn trail(&self) -> Option<&RouteDecision> {
        match self {
            RoutingError::Exhausted { trail, .. } | RoutingError::SynthesisFailed { trail, .. } => {
                trail.as_deref()
            }
            _ => None,
        }
    }

    pub(crate) fn with_trail(mut self, decision: RouteDecision) -> Self {
        if let RoutingError::Exhausted { ref mut trail, .. }
        | RoutingError::SynthesisFailed { ref mut trail, .. } = self
        {
            *trail = Some(Box::new(decision));
        }
        self
    }
}
