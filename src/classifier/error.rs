use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("invalid pattern for signal group '{name}': {reason}")]
    InvalidPattern { name: String, reason: String },

    #[error("signal group '{name}' has a negative weight: {weight}")]
    NegativeWeight { name: String, weight: f32 },

    #[error("duplicate signal group name: {name}")]
    DuplicateGroup { name: String },
}
