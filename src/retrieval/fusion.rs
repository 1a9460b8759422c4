use crate::constants::ENGAGEMENT_SATURATION;
use crate::corpus::CandidateMetadata;

use super::config::RetrievalConfig;

const ENGAGEMENT_SHARE: f32 = 0.6;
const AUTHORITY_SHARE: f32 = 0.4;

/// Quality signal in `[0, 1]`: log-scaled engagement plus an authority flag.
pub fn metadata_signal(metadata: &CandidateMetadata) -> f32 {
    let engagement = (metadata.engagement() as f32).min(ENGAGEMENT_SATURATION);
    let scaled = engagement.ln_1p() / ENGAGEMENT_SATURATION.ln_1p();
    let authority = if metadata.authoritative { 1.0 } else { 0.0 };
    (ENGAGEMENT_SHARE * scaled + AUTHORITY_SHARE * authority).clamp(0.0, 1.0)
}

/// Weighted, capped metadata contribution.
pub fn metadata_boost(metadata: &CandidateMetadata, config: &RetrievalConfig) -> f32 {
    (config.weights.metadata * metadata_signal(metadata)).min(config.metadata_cap)
}

/// `w_cos * cosine + w_kw * keyword + boost`. Strictly increasing in `cosine`.
pub fn fuse(cosine: f32, keyword: f32, boost: f32, config: &RetrievalConfig) -> f32 {
    config.weights.cosine * cosine + config.weights.keyword * keyword + boost
}
