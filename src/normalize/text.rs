//! Text canonicalization.

/// Trim and lower-case a registry value; the missing-value sentinel becomes empty
#[must_use]
pub fn clean_text(value: &str, missing_sentinel: &str) -> String {
    let cleaned = value.trim().to_lowercase();
    if !missing_sentinel.is_empty() && cleaned == missing_sentinel.to_lowercase() {
        String::new()
    } else {
        cleaned
    }
}
