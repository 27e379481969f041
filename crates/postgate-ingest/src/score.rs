//! Hot-score models: account-trust and topic-discovery.
//!
//! Both models decay engagement with a 72-hour half-life. Account scoring
//! prefers the breakout ratio (views per follower) and falls back to a
//! legacy engagement formula when either views or follower count is
//! unavailable. Topic scoring blends decayed engagement with the breakout
//! ratio and applies a tier-specific quality gate plus a sliding freshness
//! penalty.
//!
//! All thresholds and weights are product-tuned constants, carried as named
//! fields on [`ScoringConfig`] so deployments can override them.

use chrono::{DateTime, Utc};

/// Tuned scoring constants. `Default` reproduces production values.
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    /// Engagement half-life in hours for both models.
    pub half_life_hours: f64,
    /// Multiplier applied to the views/followers breakout ratio in account
    /// mode.
    pub breakout_multiplier: f64,
    /// Legacy account-mode engagement weights.
    pub legacy_like_weight: f64,
    pub legacy_reply_weight: f64,
    pub legacy_repost_weight: f64,
    /// Topic-mode engagement weights. Replies and reposts are weighted above
    /// likes to favor conversation and amplification.
    pub topic_reply_weight: f64,
    pub topic_repost_weight: f64,
    pub topic_quote_weight: f64,
    /// Topic blend: decayed engagement vs scaled breakout ratio.
    pub blend_engagement_weight: f64,
    pub blend_breakout_weight: f64,
    pub breakout_scale: f64,
    /// Follower-count boundaries for tier classification.
    pub micro_tier_min_followers: u64,
    pub established_tier_min_followers: u64,
    /// Minimum raw engagement per tier. Unknown is gated harder than Micro:
    /// an unresolvable follower count is itself a weak spam signal.
    pub unknown_tier_gate: f64,
    pub micro_tier_gate: f64,
    pub established_tier_gate: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            half_life_hours: 72.0,
            breakout_multiplier: 100.0,
            legacy_like_weight: 1.5,
            legacy_reply_weight: 2.0,
            legacy_repost_weight: 1.0,
            topic_reply_weight: 3.0,
            topic_repost_weight: 2.0,
            topic_quote_weight: 2.0,
            blend_engagement_weight: 0.4,
            blend_breakout_weight: 0.6,
            breakout_scale: 1000.0,
            micro_tier_min_followers: 500,
            established_tier_min_followers: 10_000,
            unknown_tier_gate: 25.0,
            micro_tier_gate: 15.0,
            established_tier_gate: 50.0,
        }
    }
}

/// Follower-size classification for topic-discovery authors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowerTier {
    Unknown,
    Micro,
    Established,
}

impl FollowerTier {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FollowerTier::Unknown => "unknown",
            FollowerTier::Micro => "micro",
            FollowerTier::Established => "established",
        }
    }
}

impl std::fmt::Display for FollowerTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of topic-mode scoring.
#[derive(Debug, Clone, Copy)]
pub struct TopicScore {
    /// Blended score after the freshness adjustment. A value of zero means
    /// the post should be rejected even if `passes_gate` is true.
    pub score: f64,
    pub tier: FollowerTier,
    /// Whether raw engagement clears the tier's minimum gate.
    pub passes_gate: bool,
}

// Sliding freshness penalty breakpoints for topic mode. A further discount
// on top of exponential decay so that, past the gate, stale posts rank below
// fresh ones with identical engagement.
const FRESHNESS_FULL_HOURS: f64 = 6.0;
const FRESHNESS_RECENT_HOURS: f64 = 24.0;
const FRESHNESS_AGING_HOURS: f64 = 48.0;
const FRESHNESS_STALE_HOURS: f64 = 72.0;
const FRESHNESS_RECENT_FACTOR: f64 = 0.9;
const FRESHNESS_AGING_FACTOR: f64 = 0.6;
const FRESHNESS_STALE_FACTOR: f64 = 0.3;

impl ScoringConfig {
    /// Classifies an author into a follower tier.
    #[must_use]
    pub fn classify_tier(&self, follower_count: Option<u64>) -> FollowerTier {
        match follower_count {
            Some(count) if count >= self.established_tier_min_followers => {
                FollowerTier::Established
            }
            Some(count) if count >= self.micro_tier_min_followers => FollowerTier::Micro,
            _ => FollowerTier::Unknown,
        }
    }

    /// Minimum raw engagement required for a tier.
    #[must_use]
    pub fn tier_gate(&self, tier: FollowerTier) -> f64 {
        match tier {
            FollowerTier::Unknown => self.unknown_tier_gate,
            FollowerTier::Micro => self.micro_tier_gate,
            FollowerTier::Established => self.established_tier_gate,
        }
    }

    /// `0.5 ^ (age_hours / half_life)`, clamped to non-negative ages.
    #[must_use]
    pub fn decay_factor(&self, age_hours: f64) -> f64 {
        0.5_f64.powf(age_hours.max(0.0) / self.half_life_hours)
    }
}

/// Hours elapsed between `posted_at` and `now`, clamped to zero for
/// future-dated posts.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn age_hours(posted_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    ((now - posted_at).num_seconds() as f64 / 3600.0).max(0.0)
}

/// Account-trust hot score.
///
/// Breakout path when both views and follower count are positive:
/// `views / followers * 100`. Otherwise the legacy engagement formula
/// `likes*1.5 + replies*2 + reposts*1`. Decayed with the 72h half-life when
/// `posted_at` is known; an unknown date skips decay rather than rejecting
/// (the freshness gate upstream already handles missing dates).
///
/// Never returns NaN or infinity: a non-finite decayed value falls back to
/// the undecayed base. The caller applies the source's trust weight on top.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn calculate_hot_score(
    config: &ScoringConfig,
    views: u64,
    likes: u64,
    replies: u64,
    reposts: u64,
    follower_count: Option<u64>,
    posted_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> f64 {
    let base = match follower_count {
        Some(followers) if views > 0 && followers > 0 => {
            let breakout_ratio = views as f64 / followers as f64;
            breakout_ratio * config.breakout_multiplier
        }
        _ => {
            likes as f64 * config.legacy_like_weight
                + replies as f64 * config.legacy_reply_weight
                + reposts as f64 * config.legacy_repost_weight
        }
    };
    let base = if base.is_finite() { base.max(0.0) } else { 0.0 };

    let score = match posted_at {
        Some(posted_at) => base * config.decay_factor(age_hours(posted_at, now)),
        None => base,
    };

    if score.is_finite() {
        score
    } else {
        base
    }
}

/// Topic-discovery score: tiered engagement blended with breakout ratio.
///
/// `raw = likes + replies*3 + reposts*2 + quotes*2`, decayed with the 72h
/// half-life; breakout ratio is raw engagement per follower (zero when the
/// count is unknown); blend is `decayed*0.4 + breakout*1000*0.6`; the tier
/// gate compares raw (undecayed) engagement; the sliding freshness penalty
/// is applied last. Callers must treat a zero score as a rejection even when
/// `passes_gate` is true.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn calculate_topic_score(
    config: &ScoringConfig,
    likes: u64,
    replies: u64,
    reposts: u64,
    quotes: u64,
    follower_count: Option<u64>,
    age_hours: f64,
) -> TopicScore {
    let tier = config.classify_tier(follower_count);

    let raw_engagement = likes as f64
        + replies as f64 * config.topic_reply_weight
        + reposts as f64 * config.topic_repost_weight
        + quotes as f64 * config.topic_quote_weight;

    let decayed_engagement = raw_engagement * config.decay_factor(age_hours);

    let breakout_ratio = match follower_count {
        Some(followers) if followers > 0 => raw_engagement / followers as f64,
        _ => 0.0,
    };

    let blended = decayed_engagement * config.blend_engagement_weight
        + breakout_ratio * config.breakout_scale * config.blend_breakout_weight;
    let blended = if blended.is_finite() {
        blended.max(0.0)
    } else {
        0.0
    };

    TopicScore {
        score: apply_freshness_adjustment(blended, age_hours),
        tier,
        passes_gate: raw_engagement >= config.tier_gate(tier),
    }
}

/// Sliding freshness multiplier for topic scores.
///
/// Full credit up to 6 hours, then 0.9× to 24h, 0.6× to 48h, 0.3× to 72h,
/// and zero beyond — a stale post scores lower than a fresh one with
/// identical engagement, and anything past 72h collapses to zero.
#[must_use]
pub fn apply_freshness_adjustment(score: f64, age_hours: f64) -> f64 {
    let factor = if age_hours <= FRESHNESS_FULL_HOURS {
        1.0
    } else if age_hours <= FRESHNESS_RECENT_HOURS {
        FRESHNESS_RECENT_FACTOR
    } else if age_hours <= FRESHNESS_AGING_HOURS {
        FRESHNESS_AGING_FACTOR
    } else if age_hours <= FRESHNESS_STALE_HOURS {
        FRESHNESS_STALE_FACTOR
    } else {
        0.0
    };
    score * factor
}
