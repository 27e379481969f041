//! Age-based admission checks applied before scoring.

use chrono::{DateTime, Utc};
use postgate_core::{RejectionReason, SourceType};

/// Fixed safety ceiling for topic-discovery posts. Ages under this pass
/// through to scoring, where the sliding freshness penalty takes over.
pub const TOPIC_MAX_AGE_HOURS: i64 = 72;

/// Checks whether a post is fresh enough to continue through the pipeline.
///
/// - Missing timestamp → `NoDate`, regardless of mode. A missing date used
///   to be treated as age zero, which let stale pinned posts slip through.
/// - `Account` mode (and unknown source types): rejects `Freshness` when the
///   age exceeds the source override, falling back to the workspace ceiling.
///   No ceiling configured means no age limit.
/// - `Topic` mode: rejects `Freshness` only past the fixed
///   [`TOPIC_MAX_AGE_HOURS`] ceiling.
///
/// Future-dated posts clamp to age zero rather than rejecting.
///
/// Ages compare fractionally: a post aged 72h30m is past a 72h ceiling.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn check_freshness(
    posted_at: Option<DateTime<Utc>>,
    source_type: SourceType,
    source_max_age_hours: Option<i64>,
    workspace_max_age_hours: Option<i64>,
    now: DateTime<Utc>,
) -> Option<RejectionReason> {
    let Some(posted_at) = posted_at else {
        return Some(RejectionReason::NoDate);
    };

    let age_hours = ((now - posted_at).num_seconds() as f64 / 3600.0).max(0.0);

    match source_type {
        SourceType::Topic => {
            if age_hours > TOPIC_MAX_AGE_HOURS as f64 {
                return Some(RejectionReason::Freshness);
            }
        }
        SourceType::Account => {
            if let Some(max_age) = source_max_age_hours.or(workspace_max_age_hours) {
                if age_hours > max_age as f64 {
                    return Some(RejectionReason::Freshness);
                }
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        "2026-08-20T12:00:00Z".parse().unwrap()
    }

    fn hours_ago(h: i64) -> Option<DateTime<Utc>> {
        Some(now() - Duration::hours(h))
    }

    #[test]
    fn missing_date_rejects_no_date_in_both_modes() {
        for source_type in [SourceType::Account, SourceType::Topic] {
            let result = check_freshness(None, source_type, None, Some(24), now());
            assert_eq!(result, Some(RejectionReason::NoDate));
        }
    }

    #[test]
    fn account_mode_honors_workspace_ceiling() {
        let result = check_freshness(hours_ago(30), SourceType::Account, None, Some(24), now());
        assert_eq!(result, Some(RejectionReason::Freshness));

        let result = check_freshness(hours_ago(20), SourceType::Account, None, Some(24), now());
        assert_eq!(result, None);
    }

    #[test]
    fn account_mode_source_override_takes_precedence() {
        // Source allows 48h even though the workspace only allows 24h.
        let result =
            check_freshness(hours_ago(30), SourceType::Account, Some(48), Some(24), now());
        assert_eq!(result, None);

        // Source tightens to 12h.
        let result =
            check_freshness(hours_ago(20), SourceType::Account, Some(12), Some(24), now());
        assert_eq!(result, Some(RejectionReason::Freshness));
    }

    #[test]
    fn account_mode_without_any_ceiling_passes_old_posts() {
        let result = check_freshness(hours_ago(5000), SourceType::Account, None, None, now());
        assert_eq!(result, None);
    }

    #[test]
    fn topic_mode_fixed_72h_ceiling() {
        let result = check_freshness(hours_ago(71), SourceType::Topic, None, None, now());
        assert_eq!(result, None);

        let result = check_freshness(hours_ago(73), SourceType::Topic, None, None, now());
        assert_eq!(result, Some(RejectionReason::Freshness));
    }

    #[test]
    fn topic_ceiling_rejects_fractional_overshoot() {
        // 72h30m must reject as Freshness, not pass and collapse to a zero
        // score later in the pipeline.
        let posted_at = Some(now() - Duration::hours(72) - Duration::minutes(30));
        let result = check_freshness(posted_at, SourceType::Topic, None, None, now());
        assert_eq!(result, Some(RejectionReason::Freshness));
    }

    #[test]
    fn account_ceiling_rejects_fractional_overshoot() {
        let posted_at = Some(now() - Duration::hours(24) - Duration::minutes(1));
        let result = check_freshness(posted_at, SourceType::Account, None, Some(24), now());
        assert_eq!(result, Some(RejectionReason::Freshness));
    }

    #[test]
    fn topic_mode_ignores_workspace_ceiling() {
        // Even a tight workspace ceiling does not apply in topic mode; the
        // sliding penalty in scoring handles ages under 72h.
        let result = check_freshness(hours_ago(30), SourceType::Topic, None, Some(24), now());
        assert_eq!(result, None);
    }

    #[test]
    fn future_dated_post_clamps_to_age_zero() {
        let posted_at = Some(now() + Duration::hours(2));
        let result = check_freshness(posted_at, SourceType::Account, None, Some(24), now());
        assert_eq!(result, None);
    }
}
