//! Signal-weighted query classifier.
//!
//! [`QueryClassifier::classify`] is a pure fold over a compiled [`SignalLibrary`]:
//! override detectors first (in priority order), then weighted scoring, three-tier
//! hybrid detection and a winner-take-all fallback. Complexity and category are
//! estimated for every query, overrides included.

pub mod complexity;
pub mod config;
pub mod error;
pub mod signals;
pub mod types;


pub use complexity::ComplexityEstimator;
pub use config::ClassifierConfig;
pub use error::ClassifierError;
pub use signals::{
    CONNECTOR_SIGNALS, CONTEXTUAL_SIGNALS, ENTITY_GROUPS, OVERRIDE_DETECTORS, OverrideDetector,
    OverrideSpec, PatternGroup, PatternSpec, STATISTICAL_SIGNALS, SignalLibrary, SignalSet,
};
pub use types::{
    ClassificationResult, ComplexityClass, HybridTier, OverrideKind, QueryCategory, Route,
};

use std::collections::BTreeSet;

use tracing::debug;

/// Stateless classifier. Construct once, share by reference.
#[derive(Debug, Clone)]
pub struct QueryClassifier {
    library: SignalLibrary,
    estimator: ComplexityEstimator,
    config: ClassifierConfig,
}

struct Scores {
    stat: f32,
    ctx: f32,
    stat_groups: BTreeSet<String>,
    ctx_groups: BTreeSet<String>,
}

impl QueryClassifier {
    pub fn new(library: SignalLibrary, config: ClassifierConfig) -> Result<Self, ClassifierError> {
        Ok(Self {
            library,
            estimator: ComplexityEstimator::new()?,
            config,
        })
    }

    /// Standard signal table with default thresholds.
    pub fn standard() -> Result<Self, ClassifierError> {
        Self::new(SignalLibrary::standard()?, ClassifierConfig::default())
    }

    pub fn library(&self) -> &SignalLibrary {
        &self.library
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn classify(&self, query: &str) -> ClassificationResult {
        let complexity = self.estimator.complexity(query);
        let category = self.estimator.category(query, complexity);
        let connector_present = self.library.connector_present(query);

        let mut result = ClassificationResult {
            route: Route::Contextual,
            stat_score: 0.0,
            ctx_score: 0.0,
            matched_stat_groups: BTreeSet::new(),
            matched_ctx_groups: BTreeSet::new(),
            is_biographical: false,
            override_kind: None,
            hybrid_tier: None,
            connector_present,
            complexity,
            complexity_k: complexity.k(),
            category,
            max_expansions: category.max_expansions(),
        };

        if let Some(kind) = self.detect_override(query) {
            result.override_kind = Some(kind);
            match kind {
                OverrideKind::Greeting | OverrideKind::Opinion | OverrideKind::Definitional => {
                    result.route = Route::Contextual;
                }
                OverrideKind::Biographical => {
                    result.route = Route::Hybrid;
                    result.is_biographical = true;
                }
            }
            debug!(?kind, route = %result.route, "Classification override");
            return result;
        }

        let scores = self.score(query);
        result.stat_score = scores.stat;
        result.ctx_score = scores.ctx;
        result.matched_stat_groups = scores.stat_groups;
        result.matched_ctx_groups = scores.ctx_groups;

        result.hybrid_tier = self.hybrid_tier(scores.stat, scores.ctx, connector_present);
        result.route = match result.hybrid_tier {
            Some(_) => Route::Hybrid,
            // ties, including 0/0, stay on the unstructured path
            None if scores.stat > scores.ctx => Route::Statistical,
            None => Route::Contextual,
        };

        debug!(
            route = %result.route,
            stat_score = result.stat_score,
            ctx_score = result.ctx_score,
            tier = ?result.hybrid_tier,
            k = result.complexity_k,
            "Classified query"
        );

        result
    }

    fn detect_override(&self, query: &str) -> Option<OverrideKind> {
        self.library
            .overrides()
            .iter()
            .filter(|d| d.matches(query))
            .map(|d| d.kind)
            .find(|kind| *kind != OverrideKind::Definitional || self.is_glossary_lookup(query))
    }

    /// "What is PER?" asks for a meaning; "What is LeBron's PER?" asks for a value.
    fn is_glossary_lookup(&self, query: &str) -> bool {
        !self.library.has_statistical_intent(query) && !self.library.mentions_entity(query)
    }

    fn score(&self, query: &str) -> Scores {
        let mut scores = Scores {
            stat: 0.0,
            ctx: 0.0,
            stat_groups: BTreeSet::new(),
            ctx_groups: BTreeSet::new(),
        };

        for group in self.library.groups(SignalSet::Statistical) {
            if group.matches(query) {
                scores.stat += group.weight;
                scores.stat_groups.insert(group.name.clone());
            }
        }
        for group in self.library.groups(SignalSet::Contextual) {
            if group.matches(query) {
                scores.ctx += group.weight;
                scores.ctx_groups.insert(group.name.clone());
            }
        }

        scores
    }

    fn hybrid_tier(&self, stat: f32, ctx: f32, connector_present: bool) -> Option<HybridTier> {
        let cfg = &self.config;

        if connector_present && stat > 0.0 && ctx > 0.0 {
            return Some(HybridTier::Connector);
        }

        if stat >= cfg.balance_floor && ctx >= cfg.balance_floor {
            let ratio = stat.min(ctx) / stat.max(ctx);
            if ratio >= cfg.balance_ratio {
                return Some(HybridTier::Balanced);
            }
        }

        if stat >= cfg.auto_promote_stat && ctx >= cfg.auto_promote_ctx {
            return Some(HybridTier::AutoPromote);
        }

        None
    }
}
