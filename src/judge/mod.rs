//! Relevance judges used to re-rank retrieval candidates.
//!
//! Every judge declares its [`JudgeScale`]; relevance floors are expressed as a
//! fraction of that scale so one floor setting means the same thing across judges.
//! Score distributions differ a lot between judges, which is why each re-rank logs a
//! [`ScoreDistribution`].

pub mod config;
pub mod cross_encoder;
pub mod device;
pub mod error;
pub mod lexical;
pub mod llm;
pub mod model;
pub mod types;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(test)]
mod tests;

pub use config::{DEFAULT_LLM_JUDGE_MODEL, DEFAULT_MAX_SEQ_LEN, JudgeConfig, JudgeKind};
pub use cross_encoder::CrossEncoderJudge;
pub use error::JudgeError;
pub use lexical::LexicalJudge;
pub use llm::{LlmJudge, parse_scores};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockJudge;
pub use types::{JudgeScale, ScoreDistribution};

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

/// External relevance-judgment boundary.
#[async_trait]
pub trait RelevanceJudge: Send + Sync {
    /// One score per passage, in input order, on [`RelevanceJudge::scale`].
    async fn judge(&self, query: &str, passages: &[&str]) -> Result<Vec<f32>, JudgeError>;

    fn scale(&self) -> JudgeScale;

    fn name(&self) -> &'static str;
}

/// Builds the configured judge, or `None` when re-ranking is disabled.
pub fn build_judge(config: &JudgeConfig) -> Result<Option<Arc<dyn RelevanceJudge>>, JudgeError> {
    config
        .validate()
        .map_err(|reason| JudgeError::InvalidConfig { reason })?;

    let judge: Arc<dyn RelevanceJudge> = match config.kind {
        JudgeKind::None => {
            info!("Re-ranking disabled");
            return Ok(None);
        }
        JudgeKind::Lexical => Arc::new(LexicalJudge::new()),
        JudgeKind::CrossEncoder => {
            let Some(ref path) = config.model_path else {
                return Err(JudgeError::InvalidConfig {
                    reason: "cross-encoder judge requires a model path".to_string(),
                });
            };
            Arc::new(CrossEncoderJudge::load(path, config.max_seq_len)?)
        }
        JudgeKind::Llm => Arc::new(LlmJudge::new(config.llm_model.clone())),
    };

    info!(judge = judge.name(), scale = ?judge.scale(), "Relevance judge ready");
    Ok(Some(judge))
}
