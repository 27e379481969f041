//! Heuristic spam classifier for topic-discovery posts.
//!
//! Account-mode posts come from explicitly configured handles and are never
//! spam-checked; this filter only guards the open discovery firehose.

/// Promotional phrases that mark a post as spam (matched case-insensitively).
const SPAM_PHRASES: &[&str] = &[
    "check out my bio",
    "link in bio",
    "make money fast",
    "dm for collab",
    "follow for follow",
    "subscribe to my",
];

/// The get-rich emoji combo. All three together is a strong promo signature.
const EMOJI_COMBO: [char; 3] = ['🔥', '💰', '🚀'];

/// Content shorter than this from an account with no known followers is
/// treated as engagement-bait.
const MIN_CONTENT_LEN_UNKNOWN_AUTHOR: usize = 20;

/// Classifies a topic post as likely spam.
///
/// Rules, in order:
/// - no content at all → spam
/// - any phrase from the fixed list, case-insensitive → spam
/// - 🔥, 💰, and 🚀 all present → spam
/// - unknown or zero follower count with content under 20 characters → spam
#[must_use]
pub fn is_likely_spam(content: Option<&str>, follower_count: Option<u64>) -> bool {
    let Some(content) = content else {
        return true;
    };

    let lower = content.to_lowercase();
    if SPAM_PHRASES.iter().any(|phrase| lower.contains(phrase)) {
        return true;
    }

    if EMOJI_COMBO.iter().all(|&emoji| content.contains(emoji)) {
        return true;
    }

    if follower_count.unwrap_or(0) == 0 && content.chars().count() < MIN_CONTENT_LEN_UNKNOWN_AUTHOR
    {
        return true;
    }

    false
}
