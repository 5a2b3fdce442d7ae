pub mod scenario;

/// Split a comma-separated CLI value into trimmed, non-empty tokens.
pub fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(ToString::to_string)
        .collect()
}
