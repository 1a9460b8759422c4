//! Routing and fallback state machine.
//!
//! [`RoutingOrchestrator::handle`] validates the query, resolves follow-ups against the
//! conversation, classifies, executes the chosen evidence path(s) and hands the bundle to
//! synthesis. A failed or empty structured path falls back to retrieval once. Transient
//! failures are retried by [`RetryPolicy`]; exhaustion only reaches the caller when no
//! evidence path is left.

pub mod config;
pub mod error;
pub mod types;
pub mod validation;


pub use config::{DEFAULT_GREETING_REPLY, RoutingConfig};
pub use error::RoutingError;
pub use types::{
    AnswerResponse, EvidenceBundle, EvidenceItem, FailureKind, PathFailureRecord, RouteDecision,
    RoutingState, TerminalStatus,
};
pub use validation::validate_query;

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::classifier::{ClassificationResult, QueryClassifier, Route};
use crate::retrieval::{HybridRetriever, RetrievalError, RetrievalRequest, RetrievalResult};
use crate::retry::{RetryError, RetryPolicy};
use crate::services::{
    HistoryProvider, QueryRewriter, ServiceError, StructuredExecutor, StructuredRows,
    StructuredSchema, Synthesis, SynthesisRequest, SynthesisService, Turn, is_follow_up,
};

/// External collaborators owned by the orchestrator.
#[derive(Clone)]
pub struct ServiceHandles {
    pub structured: Arc<dyn StructuredExecutor>,
    pub synthesis: Arc<dyn SynthesisService>,
    pub history: Arc<dyn HistoryProvider>,
    pub rewriter: Option<Arc<dyn QueryRewriter>>,
    pub schema: StructuredSchema,
}

impl std::fmt::Debug for ServiceHandles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceHandles")
            .field("schema", &self.schema.name)
            .field("rewriter", &self.rewriter.is_some())
            .finish_non_exhaustive()
    }
}

impl ServiceHandles {
    pub fn new(
        structured: Arc<dyn StructuredExecutor>,
        synthesis: Arc<dyn SynthesisService>,
        history: Arc<dyn HistoryProvider>,
    ) -> Self {
        Self {
            structured,
            synthesis,
            history,
            rewriter: None,
            schema: StructuredSchema::default(),
        }
    }

    pub fn with_rewriter(mut self, rewriter: Arc<dyn QueryRewriter>) -> Self {
        self.rewriter = Some(rewriter);
        self
    }

    pub fn with_schema(mut self, schema: StructuredSchema) -> Self {
        self.schema = schema;
        self
    }
}

/// Why a path produced no evidence.
#[derive(Debug, Clone)]
struct PathFailure {
    kind: FailureKind,
    service: &'static str,
    attempts: u32,
    reason: String,
}

impl PathFailure {
    fn unusable(service: &'static str, reason: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::PathFailure,
            service,
            attempts: 1,
            reason: reason.into(),
        }
    }

    fn into_error(self) -> RoutingError {
        RoutingError::Exhausted {
            service: self.service,
            attempts: self.attempts,
            reason: self.reason,
            trail: None,
        }
    }
}

/// Evidence collected so far for one request.
#[derive(Debug, Default)]
struct Gathered {
    rows: Option<StructuredRows>,
    retrieval: Option<RetrievalResult>,
    gaps: Vec<String>,
    exhausted: Option<PathFailure>,
}

impl Gathered {
    fn has_evidence(&self) -> bool {
        self.rows.is_some() || self.retrieval.is_some()
    }

    fn gap(&self) -> Option<String> {
        (!self.gaps.is_empty()).then(|| self.gaps.join("; "))
    }
}

/// Stateless over requests; construct once and share.
#[derive(Debug, Clone)]
pub struct RoutingOrchestrator {
    classifier: Arc<QueryClassifier>,
    retriever: Arc<HybridRetriever>,
    services: ServiceHandles,
    retry: RetryPolicy,
    config: RoutingConfig,
}

impl RoutingOrchestrator {
    pub fn new(
        classifier: Arc<QueryClassifier>,
        retriever: Arc<HybridRetriever>,
        services: ServiceHandles,
        retry: RetryPolicy,
        config: RoutingConfig,
    ) -> Result<Self, RoutingError> {
        config
            .validate()
            .and_then(|_| retry.validate())
            .map_err(|reason| RoutingError::InvalidConfig { reason })?;

        Ok(Self {
            classifier,
            retriever,
            services,
            retry,
            config,
        })
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    pub fn classifier(&self) -> &QueryClassifier {
        &self.classifier
    }

    #[instrument(skip(self, query), fields(query_len = query.len()))]
    pub async fn handle(
        &self,
        query: &str,
        conversation_id: Option<&str>,
    ) -> Result<AnswerResponse, RoutingError> {
        let query = validate_query(query, self.config.max_query_chars)?;

        let history = self.load_history(conversation_id).await;
        let resolved = self.resolve(query, &history).await?;
        let classification = self.classifier.classify(&resolved);
        let mut decision = RouteDecision::new(classification.route);

        if classification.is_greeting() {
            decision.transition(RoutingState::Succeeded)?;
            info!("Greeting answered without gathering evidence");
            return Ok(AnswerResponse {
                answer: self.config.greeting_reply.clone(),
                declined: false,
                route_taken: classification.route,
                evidence_bundle: EvidenceBundle::default(),
                routing_trail: decision,
                classification,
                resolved_query: resolved,
            });
        }

        match self
            .execute(&resolved, &classification, &history, &mut decision)
            .await
        {
            Ok((gathered, synthesis, route_taken)) => {
                decision.transition(RoutingState::Succeeded)?;

                info!(
                    route = %classification.route,
                    route_taken = %route_taken,
                    fallback = decision.fell_back(),
                    failures = decision.failures.len(),
                    declined = synthesis.declined,
                    "Query handled"
                );

                if let Some(id) = conversation_id {
                    self.remember(id, query, &synthesis.text).await;
                }

                Ok(AnswerResponse {
                    answer: synthesis.text,
                    declined: synthesis.declined,
                    route_taken,
                    evidence_bundle: self.bundle(gathered),
                    routing_trail: decision,
                    classification,
                    resolved_query: resolved,
                })
            }
            Err(err) => {
                decision.fail();
                warn!(error = %err, states = ?decision.states, "Query failed");
                Err(err.with_trail(decision))
            }
        }
    }

    async fn execute(
        &self,
        question: &str,
        classification: &ClassificationResult,
        history: &[Turn],
        decision: &mut RouteDecision,
    ) -> Result<(Gathered, Synthesis, Route), RoutingError> {
        let mut gathered = Gathered::default();
        let mut route_taken = classification.route;

        match classification.route {
            Route::Statistical => {
                decision.execute(RoutingState::ExecutingStructured, Route::Statistical)?;
                let outcome = self.execute_structured(question).await;
                if let Err(reason) = self.absorb_structured(outcome, &mut gathered, decision) {
                    decision.fall_back(Route::Contextual, reason)?;
                    route_taken = Route::Contextual;
                    let outcome = self.execute_retrieval(question, classification, None).await;
                    let _ = self.absorb_retrieval(outcome, &mut gathered, decision);
                }
            }
            Route::Contextual => {
                decision.execute(RoutingState::ExecutingRetrieval, Route::Contextual)?;
                let outcome = self.execute_retrieval(question, classification, None).await;
                let _ = self.absorb_retrieval(outcome, &mut gathered, decision);
            }
            Route::Hybrid => {
                decision.execute(RoutingState::ExecutingBoth, Route::Hybrid)?;
                let (structured, retrieval) = if self.config.entity_bias {
                    let structured = self.execute_structured(question).await;
                    let retrieval = self
                        .execute_retrieval(question, classification, structured.as_ref().ok())
                        .await;
                    (structured, retrieval)
                } else {
                    tokio::join!(
                        self.execute_structured(question),
                        self.execute_retrieval(question, classification, None)
                    )
                };
                let _ = self.absorb_structured(structured, &mut gathered, decision);
                let _ = self.absorb_retrieval(retrieval, &mut gathered, decision);
            }
        }

        self.check_evidence(&mut gathered, decision)?;
        let synthesis = self.synthesize(question, &gathered, history).await?;

        if synthesis.declined
            && classification.route == Route::Statistical
            && !decision.fell_back()
        {
            return self
                .fall_back_after_decline(
                    question,
                    classification,
                    history,
                    decision,
                    gathered,
                    synthesis,
                )
                .await;
        }

        Ok((gathered, synthesis, route_taken))
    }

    /// Synthesis could not answer from the rows: one retrieval attempt instead. If that
    /// also yields nothing, the conservative answer stands.
    async fn fall_back_after_decline(
        &self,
        question: &str,
        classification: &ClassificationResult,
        history: &[Turn],
        decision: &mut RouteDecision,
        gathered: Gathered,
        declined: Synthesis,
    ) -> Result<(Gathered, Synthesis, Route), RoutingError> {
        let reason = "synthesis could not answer from the structured rows";
        decision.record_failure(Route::Statistical, FailureKind::PathFailure, reason);
        decision.fall_back(Route::Contextual, reason)?;
        debug!("Structured answer declined, falling back to retrieval");

        let mut fallback = Gathered::default();
        let outcome = self.execute_retrieval(question, classification, None).await;
        if self.absorb_retrieval(outcome, &mut fallback, decision).is_err() {
            decision.record_failure(
                decision.chosen_route,
                FailureKind::EvidenceExhausted,
                "no usable evidence on either path",
            );
            return Ok((gathered, declined, Route::Statistical));
        }

        let synthesis = self.synthesize(question, &fallback, history).await?;
        Ok((fallback, synthesis, Route::Contextual))
    }

    /// No evidence at all: terminal if a path ran out of retries, otherwise synthesis
    /// is told the evidence is missing.
    fn check_evidence(
        &self,
        gathered: &mut Gathered,
        decision: &mut RouteDecision,
    ) -> Result<(), RoutingError> {
        if gathered.has_evidence() {
            return Ok(());
        }

        if let Some(failure) = gathered.exhausted.take() {
            return Err(failure.into_error());
        }

        let reason = "no usable evidence from any attempted path";
        decision.record_failure(decision.chosen_route, FailureKind::EvidenceExhausted, reason);
        gathered.gaps.push(reason.to_string());
        warn!(attempted = ?decision.attempted_routes, "Evidence exhausted");
        Ok(())
    }

    async fn execute_structured(&self, question: &str) -> Result<StructuredRows, PathFailure> {
        let schema = &self.services.schema;
        let executor = self.services.structured.as_ref();

        match self
            .retry
            .run("structured", || executor.execute(question, schema))
            .await
        {
            Ok(rows) if rows.is_empty() => Err(PathFailure::unusable(
                "structured executor",
                "structured query returned no rows",
            )),
            Ok(rows) => {
                debug!(rows = rows.len(), "Structured path returned rows");
                Ok(rows)
            }
            Err(err) => Err(service_failure(err)),
        }
    }

    async fn execute_retrieval(
        &self,
        question: &str,
        classification: &ClassificationResult,
        rows: Option<&StructuredRows>,
    ) -> Result<RetrievalResult, PathFailure> {
        let mut request = RetrievalRequest::new(question, classification.complexity_k)
            .with_expansions(classification.max_expansions);
        if let Some(rows) = rows {
            request = request.with_structured_context(rows.clone());
        }

        match self.retriever.retrieve_request(request).await {
            Ok(result) if result.is_empty() => Err(PathFailure::unusable(
                "retrieval",
                "retrieval returned no candidates",
            )),
            Ok(result) => Ok(result),
            Err(RetrievalError::EmbeddingExhausted { attempts, reason }) => Err(PathFailure {
                kind: FailureKind::TransientExternal,
                service: "embedding",
                attempts,
                reason,
            }),
            Err(err) => Err(PathFailure::unusable("retrieval", err.to_string())),
        }
    }

    fn absorb_structured(
        &self,
        outcome: Result<StructuredRows, PathFailure>,
        gathered: &mut Gathered,
        decision: &mut RouteDecision,
    ) -> Result<(), String> {
        match outcome {
            Ok(rows) => {
                gathered.rows = Some(rows);
                Ok(())
            }
            Err(failure) => Err(note_failure(Route::Statistical, failure, gathered, decision)),
        }
    }

    fn absorb_retrieval(
        &self,
        outcome: Result<RetrievalResult, PathFailure>,
        gathered: &mut Gathered,
        decision: &mut RouteDecision,
    ) -> Result<(), String> {
        match outcome {
            Ok(result) => {
                gathered.retrieval = Some(result);
                Ok(())
            }
            Err(failure) => Err(note_failure(Route::Contextual, failure, gathered, decision)),
        }
    }

    async fn synthesize(
        &self,
        question: &str,
        gathered: &Gathered,
        history: &[Turn],
    ) -> Result<Synthesis, RoutingError> {
        let retrieved: Vec<String> = gathered
            .retrieval
            .iter()
            .flat_map(|r| r.ranked.iter())
            .filter_map(|c| self.retriever.index().get(&c.candidate_id))
            .map(|doc| doc.text.clone())
            .collect();

        let skip = history.len().saturating_sub(self.config.synthesis_history);
        let request = SynthesisRequest {
            question: question.to_string(),
            structured: gathered.rows.clone(),
            retrieved,
            history: history[skip..].to_vec(),
            evidence_gap: gathered.gap(),
        };

        let synthesis = self.services.synthesis.as_ref();
        self.retry
            .run("synthesis", || synthesis.synthesize(request.clone()))
            .await
            .map_err(|err| match err {
                RetryError::Exhausted { attempts, source } => RoutingError::Exhausted {
                    service: source.service(),
                    attempts,
                    reason: source.to_string(),
                    trail: None,
                },
                RetryError::Permanent(source) => RoutingError::SynthesisFailed {
                    reason: source.to_string(),
                    trail: None,
                },
            })
    }

    async fn load_history(&self, conversation_id: Option<&str>) -> Vec<Turn> {
        let Some(id) = conversation_id else {
            return Vec::new();
        };
        match self.services.history.turns(id).await {
            Ok(turns) => turns,
            Err(e) => {
                warn!(conversation = id, error = %e, "History unavailable, treating as new");
                Vec::new()
            }
        }
    }

    async fn remember(&self, conversation_id: &str, question: &str, answer: &str) {
        for turn in [Turn::user(question), Turn::assistant(answer)] {
            if let Err(e) = self.services.history.append(conversation_id, turn).await {
                warn!(conversation = conversation_id, error = %e, "Failed to record turn");
            }
        }
    }

    /// Dereferences a follow-up before classification. A permanent rewrite failure keeps
    /// the original text.
    async fn resolve(&self, query: &str, history: &[Turn]) -> Result<String, RoutingError> {
        let Some(rewriter) = self.services.rewriter.as_deref() else {
            return Ok(query.to_string());
        };
        if !is_follow_up(query, history) {
            return Ok(query.to_string());
        }

        match self
            .retry
            .run("rewrite", || rewriter.rewrite(query, history))
            .await
        {
            Ok(rewritten) if !rewritten.trim().is_empty() => {
                debug!(original = query, rewritten = %rewritten.trim(), "Resolved follow-up");
                Ok(rewritten.trim().to_string())
            }
            Ok(_) => Ok(query.to_string()),
            Err(RetryError::Exhausted { attempts, source }) => Err(RoutingError::Exhausted {
                service: source.service(),
                attempts,
                reason: source.to_string(),
                trail: None,
            }),
            Err(RetryError::Permanent(e)) => {
                warn!(error = %e, "Rewrite failed, classifying the original query");
                Ok(query.to_string())
            }
        }
    }

    fn bundle(&self, gathered: Gathered) -> EvidenceBundle {
        let evidence_gap = gathered.gap();
        let mut bundle = EvidenceBundle {
            structured: gathered.rows,
            evidence_gap,
            ..EvidenceBundle::default()
        };

        if let Some(result) = gathered.retrieval {
            bundle.passages = result
                .ranked
                .iter()
                .filter_map(|c| {
                    let doc = self.retriever.index().get(&c.candidate_id)?;
                    Some(EvidenceItem {
                        id: c.candidate_id.clone(),
                        text: doc.text.clone(),
                        source: doc.metadata.source.clone(),
                        fused_score: c.fused_score,
                        rerank_score: c.rerank_score,
                    })
                })
                .collect();
            bundle.k_used = Some(result.k_used);
            bundle.reranked = result.reranked;
            bundle.rerank_outcome = Some(result.rerank_outcome);
            bundle.retrieval_query = Some(result.query_used);
        }

        bundle
    }
}

fn service_failure(err: RetryError<ServiceError>) -> PathFailure {
    match err {
        RetryError::Exhausted { attempts, source } => PathFailure {
            kind: FailureKind::TransientExternal,
            service: source.service(),
            attempts,
            reason: source.to_string(),
        },
        RetryError::Permanent(source) => PathFailure::unusable(source.service(), source.to_string()),
    }
}

/// Records a path failure in the trail and returns its reason.
fn note_failure(
    route: Route,
    failure: PathFailure,
    gathered: &mut Gathered,
    decision: &mut RouteDecision,
) -> String {
    let label = if route == Route::Statistical {
        "structured"
    } else {
        "retrieval"
    };
    warn!(path = label, kind = ?failure.kind, reason = %failure.reason, "Evidence path failed");

    decision.record_failure(route, failure.kind, failure.reason.clone());
    gathered
        .gaps
        .push(format!("{label} path: {}", failure.reason));

    let reason = failure.reason.clone();
    if failure.kind == FailureKind::TransientExternal && gathered.exhausted.is_none() {
        gathered.exhausted = Some(failure);
    }
    reason
}
