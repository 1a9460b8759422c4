/// Minimum score both sets need before the balance tier is considered.
pub const DEFAULT_BALANCE_FLOOR: f32 = 1.5;
/// Minimum `min/max` score ratio for the balance tier.
pub const DEFAULT_BALANCE_RATIO: f32 = 0.4;
/// Statistical score that, with [`DEFAULT_AUTO_PROMOTE_CTX`], forces a hybrid route.
pub const DEFAULT_AUTO_PROMOTE_STAT: f32 = 4.0;
pub const DEFAULT_AUTO_PROMOTE_CTX: f32 = 2.0;

/// Thresholds for the hybrid detection tiers.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    pub balance_floor: f32,
    pub balance_ratio: f32,
    pub auto_promote_stat: f32,
    pub auto_promote_ctx: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            balance_floor: DEFAULT_BALANCE_FLOOR,
            balance_ratio: DEFAULT_BALANCE_RATIO,
            auto_promote_stat: DEFAULT_AUTO_PROMOTE_STAT,
            auto_promote_ctx: DEFAULT_AUTO_PROMOTE_CTX,
        }
    }
}

impl ClassifierConfig {
    pub fn with_balance(mut self, floor: f32, ratio: f32) -> Self {
        self.balance_floor = floor;
        self.balance_ratio = ratio;
        self
    }

    pub fn with_auto_promote(mut self, stat: f32, ctx: f32) -> Self {
        self.auto_promote_stat = stat;
        self.auto_promote_ctx = ctx;
        self
    }
}
