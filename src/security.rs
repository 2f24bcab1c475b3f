use axum::http::HeaderMap;
use subtle::ConstantTimeEq;

/// Header the CMS publish webhook sends its shared secret in
pub const REVALIDATE_SECRET_HEADER: &str = "x-revalidate-secret";

/// Constant-time string comparison to prevent timing attacks
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Whether the request carries the expected revalidation secret
pub fn has_valid_secret(headers: &HeaderMap, expected: &str) -> bool {
    headers
        .get(REVALIDATE_SECRET_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|provided| constant_time_compare(provided, expected))
        .unwrap_or(false)
}
