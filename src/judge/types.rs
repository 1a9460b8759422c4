use serde::Serialize;

/// Declared output range of a judge. Floors are fractions of this range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct JudgeScale {
    pub min: f32,
    pub max: f32,
}

impl JudgeScale {
    pub const UNIT: JudgeScale = JudgeScale { min: 0.0, max: 1.0 };
    pub const TEN_POINT: JudgeScale = JudgeScale {
        min: 0.0,
        max: 10.0,
    };

    pub fn span(&self) -> f32 {
        self.max - self.min
    }

    /// Absolute score corresponding to `fraction` of the scale.
    pub fn threshold(&self, fraction: f32) -> f32 {
        self.min + fraction.clamp(0.0, 1.0) * self.span()
    }

    /// Maps a raw score into `[0, 1]`.
    pub fn normalize(&self, score: f32) -> f32 {
        if self.span() <= 0.0 {
            return 0.0;
        }
        ((score - self.min) / self.span()).clamp(0.0, 1.0)
    }
}

/// Summary of one batch of judge scores, logged on every re-rank.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreDistribution {
    pub count: usize,
    pub min: f32,
    pub max: f32,
    pub mean: f32,
    pub p50: f32,
    pub p90: f32,
}

impl ScoreDistribution {
    pub fn from_scores(scores: &[f32]) -> Option<Self> {
        let mut sorted: Vec<f32> = scores.iter().copied().filter(|s| s.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(|a, b| a.total_cmp(b));

        let count = sorted.len();
        let mean = sorted.iter().sum::<f32>() / count as f32;

        Some(Self {
            count,
            min: sorted[0],
            max: sorted[count - 1],
            mean,
            p50: percentile(&sorted, 0.5),
            p90: percentile(&sorted, 0.9),
        })
    }

    /// How many scores in this batch would survive `floor`. Useful when tuning.
    pub fn above(scores: &[f32], floor: f32) -> usize {
        scores.iter().filter(|s| **s >= floor).count()
    }
}

/// Nearest-rank percentile over sorted input.
fn percentile(sorted: &[f32], q: f32) -> f32 {
    let rank = (q * sorted.len() as f32).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}
