//! Query and document embedding.
//!
//! - [`HttpEmbedder`] talks to an OpenAI-compatible embeddings endpoint.
//! - [`StubEmbedder`] is a deterministic offline fallback.
//!
//! Vectors leave this module as `f32`; the corpus index normalizes and stores them as `f16`.

mod error;
pub mod http;
pub mod stub;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(test)]
mod tests;

pub use error::EmbeddingError;
pub use http::{HttpEmbedder, HttpEmbedderConfig};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockEmbedder;
pub use stub::StubEmbedder;

use async_trait::async_trait;
use half::f16;

/// External embedding service boundary.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Returns a fixed-length vector for `text`. Callers normalize.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    fn dimension(&self) -> usize;

    fn name(&self) -> &'static str;
}

/// Scales `vector` to unit length in place and returns its original norm.
/// Zero vectors are left untouched.
pub fn normalize(vector: &mut [f32]) -> f32 {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }

    norm
}

pub fn to_unit_f16(mut vector: Vec<f32>) -> Vec<f16> {
    normalize(&mut vector);
    vector.into_iter().map(f16::from_f32).collect()
}

/// Inner product of a unit `f16` document vector and a unit `f32` query vector.
pub fn cosine_f16_f32(doc: &[f16], query: &[f32]) -> f32 {
    if doc.len() != query.len() {
        return 0.0;
    }
    doc.iter()
        .zip(query.iter())
        .map(|(d, q)| d.to_f32() * q)
        .sum()
}
