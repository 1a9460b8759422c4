use std::path::Path;
use std::sync::Arc;

use candle_core::{DType, Device, IndexOp, Tensor};
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config};

use super::error::JudgeError;

/// BERT-family encoder with a single-logit classification head, as shipped by
/// MS MARCO style cross-encoders.
struct CrossEncoderHead {
    encoder: BertModel,
    head: Linear,
}

impl CrossEncoderHead {
    fn load(vb: VarBuilder, config: &Config) -> candle_core::Result<Self> {
        // checkpoints prefix the encoder as `bert.`, `roberta.`, or not at all
        let encoder = ["bert", "roberta"]
            .into_iter()
            .find(|prefix| vb.contains_tensor(&format!("{prefix}.embeddings.word_embeddings.weight")))
            .map(|prefix| BertModel::load(vb.pp(prefix), config))
            .unwrap_or_else(|| BertModel::load(vb.clone(), config))?;

        let head = candle_nn::linear(config.hidden_size, 1, vb.pp("classifier"))?;
        Ok(Self { encoder, head })
    }

    fn logits(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        attention_mask: &Tensor,
    ) -> candle_core::Result<Tensor> {
        let hidden = self
            .encoder
            .forward(input_ids, token_type_ids, Some(attention_mask))?;
        let cls = hidden.i((.., 0, ..))?;
        self.head.forward(&cls)
    }
}

/// Cheaply cloneable handle to loaded weights.
#[derive(Clone)]
pub struct CrossEncoderModel(Arc<CrossEncoderHead>);

impl CrossEncoderModel {
    /// Expects `config.json` and `model.safetensors` in `model_dir`.
    pub fn load(model_dir: &Path, device: &Device) -> Result<Self, JudgeError> {
        let config_path = model_dir.join("config.json");
        let weights_path = model_dir.join("model.safetensors");

        for required in [&config_path, &weights_path] {
            if !required.exists() {
                return Err(JudgeError::ModelLoadFailed {
                    reason: format!("missing {}", required.display()),
                });
            }
        }

        let raw = std::fs::read_to_string(&config_path).map_err(|e| JudgeError::ModelLoadFailed {
            reason: format!("failed to read {}: {e}", config_path.display()),
        })?;
        let config: Config =
            serde_json::from_str(&raw).map_err(|e| JudgeError::ModelLoadFailed {
                reason: format!("failed to parse model config: {e}"),
            })?;

        // SAFETY: the weights file is opened read-only and not modified while mapped.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, device)? };

        let head = CrossEncoderHead::load(vb, &config).map_err(|e| JudgeError::ModelLoadFailed {
            reason: format!("failed to build cross-encoder: {e}"),
        })?;

        Ok(Self(Arc::new(head)))
    }

    /// Raw relevance logit for one tokenized (query, passage) pair.
    pub fn logit(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        attention_mask: &Tensor,
    ) -> Result<f32, JudgeError> {
        let logits = self.0.logits(input_ids, token_type_ids, attention_mask)?;
        logits
            .flatten_all()?
            .to_vec1::<f32>()?
            .first()
            .copied()
            .ok_or_else(|| JudgeError::InferenceFailed {
                reason: "model produced no logits".to_string(),
            })
    }
}
