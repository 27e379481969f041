//! Metric reconciliation from partially-populated structured counters and
//! locale-varying raw card text.
//!
//! The scraper reports `0` for counters it could not read, so structured
//! metrics arrive as [`PartialMetrics`] with `None` meaning "unresolved".
//! These functions fill unresolved fields from the post card's inner text:
//! a views phrase match first, then bare numeric lines assigned positionally.
//! All functions are pure; [`resolve_metrics`] is idempotent.

use std::sync::LazyLock;

use postgate_core::PartialMetrics;
use regex::Regex;

/// A bare number this large on a single unlabeled line is almost certainly a
/// mis-split views count, not a like count. See [`resolve_metrics`] step 4.
pub const SANITY_SWAP_THRESHOLD: u64 = 5_000_000;

/// Fallback candidate lines considered beyond this are noise (timestamps,
/// phone numbers in the post body, etc.).
const MAX_METRIC_LINES: usize = 5;

/// Matches a count followed by a views label in English (`view`/`views`) or
/// Chinese (`次查看`, `播放`, `浏览`). The label must directly follow the
/// number so that `"56M likes"` never matches. Separators are horizontal
/// whitespace only: a number and a label on different lines are different
/// candidates, not a views phrase.
static VIEWS_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d[\d,]*(?:\.\d+)?)[ \t]*([km])?[ \t]*(?:views?\b|次查看|播放|浏览)")
        .expect("views phrase pattern is valid")
});

/// Parses a scraped count string.
///
/// Rules:
/// - plain integers, with thousands separators: `"1,234"` → `1234`
/// - `K` suffix multiplies by 1,000; `M` by 1,000,000 (case-insensitive)
/// - decimals before a suffix are honored: `"1.2K"` → `1200`
/// - anything that does not start with a number yields `0`
///
/// Trailing text after the number (e.g. `"36 replies"`) is ignored.
#[must_use]
pub fn parse_metric(s: &str) -> u64 {
    let trimmed = s.trim();
    let bytes = trimmed.as_bytes();

    // Scan the leading number: digits, thousands separators, one dot.
    let mut end = 0usize;
    let mut has_dot = false;
    while end < bytes.len() {
        let b = bytes[end];
        if b.is_ascii_digit() || b == b',' || (b == b'.' && !has_dot) {
            if b == b'.' {
                has_dot = true;
            }
            end += 1;
        } else {
            break;
        }
    }
    if end == 0 || !bytes[0].is_ascii_digit() {
        return 0;
    }

    let number: String = trimmed[..end].chars().filter(|&c| c != ',').collect();
    let Ok(value) = number.parse::<f64>() else {
        return 0;
    };
    if !value.is_finite() || value < 0.0 {
        return 0;
    }

    // A K/M suffix only counts when it stands alone ("1.2K", "56M likes"),
    // not as the start of a longer word ("5 minutes").
    let rest = trimmed[end..].trim_start();
    let suffix_is_standalone = rest
        .as_bytes()
        .get(1)
        .is_none_or(|b| !b.is_ascii_alphanumeric());
    let multiplier = match rest.as_bytes().first() {
        Some(b'k' | b'K') if suffix_is_standalone => 1_000.0,
        Some(b'm' | b'M') if suffix_is_standalone => 1_000_000.0,
        _ => 1.0,
    };

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        (value * multiplier).round() as u64
    }
}

/// Extracts a views count from raw card text.
///
/// Returns the parsed value of the first views phrase in English or Chinese,
/// or `0` when no phrase matches. Numbers labeled with anything other than a
/// views word (e.g. `"56M likes"`) never match.
#[must_use]
pub fn extract_views_from_text(text: &str) -> u64 {
    let Some(caps) = VIEWS_PHRASE.captures(text) else {
        return 0;
    };
    let number = caps.get(1).map_or("", |m| m.as_str());
    let suffix = caps.get(2).map_or("", |m| m.as_str());
    parse_metric(&format!("{number}{suffix}"))
}

/// Splits raw card text into candidate metric lines.
///
/// Keeps lines whose first character is an ASCII digit, in original order,
/// capped at the first five. Everything else (author names, body text,
/// localized labels on their own line) is dropped.
#[must_use]
pub fn extract_metric_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| line.as_bytes().first().is_some_and(u8::is_ascii_digit))
        .take(MAX_METRIC_LINES)
        .map(ToOwned::to_owned)
        .collect()
}

/// Reconciles structured metrics with raw-text fallback extraction.
///
/// Priority order:
/// 1. Structured counters already resolved are authoritative and never
///    overwritten.
/// 2. Unresolved views are taken from a views phrase in the text. Lines
///    carrying a views phrase are excluded from positional fallback no
///    matter how views were resolved.
/// 3. Only when likes, replies, and reposts are all unresolved, the numeric
///    lines of the text are assigned positionally:
///    - 4 candidates, views unresolved → `[views, likes, replies, reposts]`
///    - 4 candidates, views resolved → first dropped (duplicate of views),
///      rest → `[likes, replies, reposts]`
///    - 3 candidates → `[likes, replies, reposts]`
///    - 2 candidates, views unresolved → `[likes, replies]`, then the sanity
///      swap: likes above [`SANITY_SWAP_THRESHOLD`] are reassigned to views
///      and likes set to zero
///    - 1 candidate → `[likes]`
///
/// Idempotent: resolving the output again with the same text is a no-op.
#[must_use]
pub fn resolve_metrics(partial: PartialMetrics, raw_text: &str) -> PartialMetrics {
    let mut out = partial;

    if out.views.is_none() {
        let views = extract_views_from_text(raw_text);
        if views > 0 {
            out.views = Some(views);
        }
    }

    if !out.engagement_unresolved() {
        return out;
    }

    // A views-labeled line is never a likes/replies candidate, whether the
    // count came from this text, an earlier pass, or the scraper.
    let mut lines = extract_metric_lines(raw_text);
    lines.retain(|line| !VIEWS_PHRASE.is_match(line));
    let candidates: Vec<u64> = lines.iter().map(|line| parse_metric(line)).collect();

    match (candidates.len(), out.views.is_none()) {
        (4, true) => {
            out.views = Some(candidates[0]);
            out.likes = Some(candidates[1]);
            out.replies = Some(candidates[2]);
            out.reposts = Some(candidates[3]);
        }
        (4, false) => {
            // First candidate duplicates the already-resolved views count.
            out.likes = Some(candidates[1]);
            out.replies = Some(candidates[2]);
            out.reposts = Some(candidates[3]);
        }
        (3, _) => {
            out.likes = Some(candidates[0]);
            out.replies = Some(candidates[1]);
            out.reposts = Some(candidates[2]);
        }
        (2, views_unresolved) => {
            if views_unresolved && candidates[0] > SANITY_SWAP_THRESHOLD {
                out.views = Some(candidates[0]);
                out.likes = Some(0);
            } else {
                out.likes = Some(candidates[0]);
            }
            out.replies = Some(candidates[1]);
        }
        (1, _) => {
            out.likes = Some(candidates[0]);
        }
        _ => {}
    }

    out
}
