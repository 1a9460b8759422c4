use crate::constants::{
    DEFAULT_METADATA_CAP, DEFAULT_RELEVANCE_FLOOR, DEFAULT_WEIGHT_COSINE, DEFAULT_WEIGHT_KEYWORD,
    DEFAULT_WEIGHT_METADATA, MAX_ENTITY_TERMS, WEIGHT_SUM_TOLERANCE,
};

/// Linear fusion weights for the three relevance signals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionWeights {
    pub cosine: f32,
    pub keyword: f32,
    pub metadata: f32,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            cosine: DEFAULT_WEIGHT_COSINE,
            keyword: DEFAULT_WEIGHT_KEYWORD,
            metadata: DEFAULT_WEIGHT_METADATA,
        }
    }
}

impl FusionWeights {
    pub fn new(cosine: f32, keyword: f32, metadata: f32) -> Self {
        Self {
            cosine,
            keyword,
            metadata,
        }
    }

    /// Metadata must stay subordinate: it may never outweigh the semantic signal.
    pub fn validate(&self) -> Result<(), String> {
        let all = [self.cosine, self.keyword, self.metadata];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(format!("fusion weights must be non-negative, got {self:?}"));
        }

        let sum: f32 = all.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(format!("fusion weights must sum to 1.0, got {sum}"));
        }

        if self.cosine <= 0.0 {
            return Err("cosine weight must be positive".to_string());
        }

        if self.metadata > self.cosine {
            return Err(format!(
                "metadata weight ({}) must not exceed cosine weight ({})",
                self.metadata, self.cosine
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalConfig {
    pub weights: FusionWeights,

    /// Absolute ceiling on the metadata contribution to a fused score.
    pub metadata_cap: f32,

    /// Minimum judge score to survive re-ranking, as a fraction of the judge's scale.
    /// `None` keeps every judged candidate and only reorders.
    pub relevance_floor: Option<f32>,

    /// Whether to call the judge at all when one is configured.
    pub rerank: bool,

    /// Entity names appended from structured rows on hybrid routes.
    pub max_entity_terms: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            weights: FusionWeights::default(),
            metadata_cap: DEFAULT_METADATA_CAP,
            relevance_floor: Some(DEFAULT_RELEVANCE_FLOOR),
            rerank: true,
            max_entity_terms: MAX_ENTITY_TERMS,
        }
    }
}

impl RetrievalConfig {
    pub fn with_weights(mut self, weights: FusionWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_relevance_floor(mut self, floor: Option<f32>) -> Self {
        self.relevance_floor = floor;
        self
    }

    pub fn with_rerank(mut self, rerank: bool) -> Self {
        self.rerank = rerank;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        self.weights.validate()?;

        if !(0.0..=1.0).contains(&self.metadata_cap) {
            return Err(format!(
                "metadata_cap must be between 0.0 and 1.0, got {}",
                self.metadata_cap
            ));
        }

        if let Some(floor) = self.relevance_floor
            && !(0.0..=1.0).contains(&floor)
        {
            return Err(format!(
                "relevance_floor must be between 0.0 and 1.0, got {floor}"
            ));
        }

        Ok(())
    }

    /// Reads `SIFT_*` overrides. Unparseable values keep the default; `validate` judges
    /// the combination.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let weight = |name: &str, default: f32| {
            std::env::var(name)
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };

        let weights = FusionWeights {
            cosine: weight("SIFT_WEIGHT_COSINE", defaults.weights.cosine),
            keyword: weight("SIFT_WEIGHT_KEYWORD", defaults.weights.keyword),
            metadata: weight("SIFT_WEIGHT_METADATA", defaults.weights.metadata),
        };

        let metadata_cap = weight("SIFT_METADATA_CAP", defaults.metadata_cap);

        let relevance_floor = match std::env::var("SIFT_RELEVANCE_FLOOR") {
            Ok(v) if v.trim().eq_ignore_ascii_case("off") || v.trim().eq_ignore_ascii_case("none") => {
                None
            }
            Ok(v) => v.trim().parse().ok().or(defaults.relevance_floor),
            Err(_) => defaults.relevance_floor,
        };

        let rerank = std::env::var("SIFT_RERANK")
            .ok()
            .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off"))
            .unwrap_or(defaults.rerank);

        Self {
            weights,
            metadata_cap,
            relevance_floor,
            rerank,
            max_entity_terms: defaults.max_entity_terms,
        }
    }
}
