/// Canonical merge key for an ingredient name: surrounding whitespace trimmed, case folded.
/// Only used for grouping; display names are never rewritten with it.
pub fn normalize_key(name: &str) -> String {
    name.trim().to_lowercase()
}
