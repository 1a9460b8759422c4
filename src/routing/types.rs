use serde::Serialize;

use crate::classifier::{ClassificationResult, Route};
use crate::retrieval::RerankOutcome;
use crate::services::StructuredRows;

use super::error::RoutingError;

/// Orchestrator states for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingState {
    Classified,
    ExecutingStructured,
    ExecutingRetrieval,
    ExecutingBoth,
    FallbackExecuting,
    Succeeded,
    Failed,
}

impl RoutingState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RoutingState::Succeeded | RoutingState::Failed)
    }

    pub fn can_transition_to(&self, next: RoutingState) -> bool {
        use RoutingState::*;
        match self {
            Classified => matches!(
                next,
                ExecutingStructured | ExecutingRetrieval | ExecutingBoth | Succeeded | Failed
            ),
            ExecutingStructured => matches!(next, FallbackExecuting | Succeeded | Failed),
            ExecutingRetrieval | ExecutingBoth | FallbackExecuting => {
                matches!(next, Succeeded | Failed)
            }
            Succeeded | Failed => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalStatus {
    Ok,
    Exhausted,
}

/// Failure taxonomy recorded in the routing trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Rate limit or timeout that survived every retry.
    TransientExternal,
    /// The path ran but produced nothing usable.
    PathFailure,
    /// Every attempted path came back without evidence.
    EvidenceExhausted,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathFailureRecord {
    /// `STATISTICAL` for the structured path, `CONTEXTUAL` for retrieval.
    pub route: Route,
    pub kind: FailureKind,
    pub reason: String,
}

/// Routing trail for one request, built as it executes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteDecision {
    pub chosen_route: Route,
    pub attempted_routes: Vec<Route>,
    pub fallback_reason: Option<String>,
    pub terminal_status: TerminalStatus,
    pub states: Vec<RoutingState>,
    pub failures: Vec<PathFailureRecord>,
}

impl RouteDecision {
    pub fn new(chosen_route: Route) -> Self {
        Self {
            chosen_route,
            attempted_routes: Vec::new(),
            fallback_reason: None,
            terminal_status: TerminalStatus::Ok,
            states: vec![RoutingState::Classified],
            failures: Vec::new(),
        }
    }

    pub fn state(&self) -> RoutingState {
        self.states
            .last()
            .copied()
            .unwrap_or(RoutingState::Classified)
    }

    pub fn transition(&mut self, next: RoutingState) -> Result<(), RoutingError> {
        let from = self.state();
        if !from.can_transition_to(next) {
            return Err(RoutingError::InvalidTransition { from, to: next });
        }
        self.states.push(next);
        Ok(())
    }

    /// Enters an execution state and records the route it serves.
    pub fn execute(&mut self, state: RoutingState, route: Route) -> Result<(), RoutingError> {
        self.transition(state)?;
        self.attempted_routes.push(route);
        Ok(())
    }

    /// One-time switch to the alternate path.
    pub fn fall_back(&mut self, route: Route, reason: impl Into<String>) -> Result<(), RoutingError> {
        self.transition(RoutingState::FallbackExecuting)?;
        self.attempted_routes.push(route);
        self.fallback_reason = Some(reason.into());
        Ok(())
    }

    pub fn fell_back(&self) -> bool {
        self.fallback_reason.is_some()
    }

    pub fn record_failure(&mut self, route: Route, kind: FailureKind, reason: impl Into<String>) {
        self.failures.push(PathFailureRecord {
            route,
            kind,
            reason: reason.into(),
        });
    }

    /// Moves to `Failed` from wherever the request stopped.
    pub fn fail(&mut self) {
        if self.state().can_transition_to(RoutingState::Failed) {
            self.states.push(RoutingState::Failed);
        }
        self.terminal_status = TerminalStatus::Exhausted;
    }
}

/// One retrieved passage handed to synthesis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvidenceItem {
    pub id: String,
    pub text: String,
    pub source: Option<String>,
    pub fused_score: f32,
    pub rerank_score: Option<f32>,
}

/// Evidence handed to synthesis, as it was handed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvidenceBundle {
    pub structured: Option<StructuredRows>,
    pub passages: Vec<EvidenceItem>,
    pub k_used: Option<usize>,
    pub reranked: bool,
    pub rerank_outcome: Option<RerankOutcome>,
    /// Retrieval text after entity transformation.
    pub retrieval_query: Option<String>,
    pub evidence_gap: Option<String>,
}

impl EvidenceBundle {
    pub fn is_empty(&self) -> bool {
        self.structured.as_ref().is_none_or(|rows| rows.is_empty()) && self.passages.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerResponse {
    pub answer: String,
    /// Synthesis said it could not answer from the evidence.
    pub declined: bool,
    /// Path whose evidence produced the answer.
    pub route_taken: Route,
    pub evidence_bundle: EvidenceBundle,
    pub routing_trail: RouteDecision,
    pub classification: ClassificationResult,
    /// Query after follow-up rewriting; what was classified.
    pub resolved_query: String,
}
