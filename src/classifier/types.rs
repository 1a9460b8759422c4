use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::constants::{K_ANALYTICAL, K_COMPARATIVE, K_LOOKUP, K_MODERATE};

/// Evidence-gathering path chosen for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Route {
    /// Structured (tabular) lookup only.
    Statistical,
    /// Unstructured text retrieval only.
    Contextual,
    /// Both paths.
    Hybrid,
}

impl Route {
    pub fn uses_structured(&self) -> bool {
        matches!(self, Route::Statistical | Route::Hybrid)
    }

    pub fn uses_retrieval(&self) -> bool {
        matches!(self, Route::Contextual | Route::Hybrid)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Statistical => "STATISTICAL",
            Route::Contextual => "CONTEXTUAL",
            Route::Hybrid => "HYBRID",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Override detector that short-circuited weighted scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideKind {
    Greeting,
    Opinion,
    Biographical,
    Definitional,
}

/// Hybrid detection tier that fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HybridTier {
    /// Connector phrase present and both scores nonzero.
    Connector,
    /// Both scores above the floor and within the balance ratio.
    Balanced,
    /// Strong statistical score with a moderate contextual score.
    AutoPromote,
}

/// Estimated reasoning depth, mapped to retrieval breadth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityClass {
    Lookup,
    Moderate,
    Comparative,
    Analytical,
}

impl ComplexityClass {
    /// Number of candidates retrieval keeps for this class.
    pub fn k(&self) -> usize {
        match self {
            ComplexityClass::Lookup => K_LOOKUP,
            ComplexityClass::Moderate => K_MODERATE,
            ComplexityClass::Comparative => K_COMPARATIVE,
            ComplexityClass::Analytical => K_ANALYTICAL,
        }
    }
}

/// Query style, driving how aggressively the retrieval query is expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryCategory {
    Simple,
    Complex,
    Noisy,
    Conversational,
}

impl QueryCategory {
    pub fn max_expansions(&self) -> usize {
        match self {
            QueryCategory::Simple => 1,
            QueryCategory::Complex => 3,
            QueryCategory::Conversational => 4,
            QueryCategory::Noisy => 5,
        }
    }
}

/// Outcome of classifying one query. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub route: Route,
    pub stat_score: f32,
    pub ctx_score: f32,
    pub matched_stat_groups: BTreeSet<String>,
    pub matched_ctx_groups: BTreeSet<String>,
    pub is_biographical: bool,
    pub override_kind: Option<OverrideKind>,
    pub hybrid_tier: Option<HybridTier>,
    pub connector_present: bool,
    pub complexity: ComplexityClass,
    pub complexity_k: usize,
    pub category: QueryCategory,
    pub max_expansions: usize,
}

impl ClassificationResult {
    /// A standalone greeting; the caller answers it without gathering evidence.
    pub fn is_greeting(&self) -> bool {
        self.override_kind == Some(OverrideKind::Greeting)
    }

    pub fn is_hybrid(&self) -> bool {
        self.route == Route::Hybrid
    }
}
