use std::path::Path;

use async_trait::async_trait;
use candle_core::{Device, Tensor};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info};

use super::device::{device_label, select_device};
use super::model::CrossEncoderModel;
use super::{JudgeError, JudgeScale, RelevanceJudge};

/// Local cross-encoder judge. Scores are `sigmoid(logit)` on a 0..1 scale.
#[derive(Clone)]
pub struct CrossEncoderJudge {
    device: Device,
    model: CrossEncoderModel,
    tokenizer: Tokenizer,
}

impl std::fmt::Debug for CrossEncoderJudge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrossEncoderJudge")
            .field("device", &device_label(&self.device))
            .finish()
    }
}

impl CrossEncoderJudge {
    pub fn load(model_dir: &Path, max_seq_len: usize) -> Result<Self, JudgeError> {
        if !model_dir.exists() {
            return Err(JudgeError::ModelNotFound {
                path: model_dir.to_path_buf(),
            });
        }

        let device = select_device();
        let model = CrossEncoderModel::load(model_dir, &device)?;
        let tokenizer = load_tokenizer(model_dir, max_seq_len)?;

        info!(
            model_dir = %model_dir.display(),
            device = device_label(&device),
            max_seq_len,
            "Loaded cross-encoder judge"
        );

        Ok(Self {
            device,
            model,
            tokenizer,
        })
    }

    fn score_pair(&self, query: &str, passage: &str) -> Result<f32, JudgeError> {
        let encoding = self
            .tokenizer
            .encode((query, passage), true)
            .map_err(|e| JudgeError::TokenizationFailed {
                reason: e.to_string(),
            })?;

        let row = |data: &[u32]| -> Result<Tensor, JudgeError> {
            Ok(Tensor::new(data, &self.device)?.unsqueeze(0)?)
        };
        let input_ids = row(encoding.get_ids())?;
        let type_ids = row(encoding.get_type_ids())?;
        let attention_mask = row(encoding.get_attention_mask())?;

        let logit = self.model.logit(&input_ids, &type_ids, &attention_mask)?;
        Ok(sigmoid(logit))
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

fn load_tokenizer(model_dir: &Path, max_seq_len: usize) -> Result<Tokenizer, JudgeError> {
    let path = model_dir.join("tokenizer.json");
    let mut tokenizer = Tokenizer::from_file(&path).map_err(|e| JudgeError::ModelLoadFailed {
        reason: format!("failed to load {}: {e}", path.display()),
    })?;

    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length: max_seq_len,
            ..Default::default()
        }))
        .map_err(|e| JudgeError::ModelLoadFailed {
            reason: format!("failed to configure truncation: {e}"),
        })?;

    Ok(tokenizer)
}

#[async_trait]
impl RelevanceJudge for CrossEncoderJudge {
    async fn judge(&self, query: &str, passages: &[&str]) -> Result<Vec<f32>, JudgeError> {
        let judge = self.clone();
        let query = query.to_string();
        let passages: Vec<String> = passages.iter().map(|p| p.to_string()).collect();

        let scores = tokio::task::spawn_blocking(move || {
            passages
                .iter()
                .map(|p| judge.score_pair(&query, p))
                .collect::<Result<Vec<f32>, JudgeError>>()
        })
        .await
        .map_err(|e| JudgeError::InferenceFailed {
            reason: format!("scoring task failed: {e}"),
        })??;

        debug!(passages = scores.len(), "Cross-encoder scored passages");
        Ok(scores)
    }

    fn scale(&self) -> JudgeScale {
        JudgeScale::UNIT
    }

    fn name(&self) -> &'static str {
        "cross-encoder"
    }
}
