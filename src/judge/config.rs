use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_MAX_SEQ_LEN: usize = 512;
pub const DEFAULT_LLM_JUDGE_MODEL: &str = "gpt-4o-mini";

/// Which relevance judge re-ranks retrieval candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JudgeKind {
    /// No re-ranking.
    None,
    #[default]
    Lexical,
    CrossEncoder,
    Llm,
}

impl FromStr for JudgeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "off" | "" => Ok(JudgeKind::None),
            "lexical" => Ok(JudgeKind::Lexical),
            "cross-encoder" | "cross_encoder" | "crossencoder" => Ok(JudgeKind::CrossEncoder),
            "llm" => Ok(JudgeKind::Llm),
            other => Err(format!("unknown judge kind '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct JudgeConfig {
    pub kind: JudgeKind,

    /// Cross-encoder directory (`config.json`, `model.safetensors`, `tokenizer.json`).
    pub model_path: Option<PathBuf>,

    /// Chat model used by the LLM judge.
    pub llm_model: String,

    pub max_seq_len: usize,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            kind: JudgeKind::default(),
            model_path: None,
            llm_model: DEFAULT_LLM_JUDGE_MODEL.to_string(),
            max_seq_len: DEFAULT_MAX_SEQ_LEN,
        }
    }
}

impl JudgeConfig {
    pub fn cross_encoder<P: Into<PathBuf>>(model_path: P) -> Self {
        Self {
            kind: JudgeKind::CrossEncoder,
            model_path: Some(model_path.into()),
            ..Self::default()
        }
    }

    pub fn disabled() -> Self {
        Self {
            kind: JudgeKind::None,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.kind == JudgeKind::CrossEncoder {
            match self.model_path {
                None => return Err("cross-encoder judge requires SIFT_JUDGE_MODEL_PATH".to_string()),
                Some(ref path) if path.as_os_str().is_empty() => {
                    return Err("model_path cannot be empty when provided".to_string());
                }
                _ => {}
            }
        }

        if self.kind == JudgeKind::Llm && self.llm_model.trim().is_empty() {
            return Err("llm judge requires a model name".to_string());
        }

        if self.max_seq_len == 0 {
            return Err("max_seq_len must be positive".to_string());
        }

        Ok(())
    }

    /// Unknown `SIFT_JUDGE` values fall back to the default kind; `validate` catches the rest.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let kind = std::env::var("SIFT_JUDGE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.kind);

        let model_path = std::env::var("SIFT_JUDGE_MODEL_PATH")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        let llm_model = std::env::var("SIFT_JUDGE_MODEL")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.llm_model);

        Self {
            kind,
            model_path,
            llm_model,
            max_seq_len: defaults.max_seq_len,
        }
    }
}
