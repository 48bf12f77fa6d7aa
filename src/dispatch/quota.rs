//! Quota signal classifier.
//!
//! A pure, case-insensitive substring check against a fixed marker
//! vocabulary. Deliberately conservative: a false positive only retires
//! a provider early, while a false negative just means the rotation
//! tries it again later.

/// Markers that indicate a provider has exhausted its usage allowance.
///
/// The multi-word entries are already covered by their single-word
/// prefixes; they stay to document the exact phrasings seen in the wild.
const QUOTA_MARKERS: &[&str] = &[
    "quota",
    "limit",
    "exceeded",
    "daily limit",
    "rate limit",
    "403",
    "too many requests",
];

/// Does this response text look like a quota or rate-limit message?
pub fn is_quota_signal(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    let lower = text.to_lowercase();
    QUOTA_MARKERS.iter().any(|marker| lower.contains(marker))
}
