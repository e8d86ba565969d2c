use axum::http::HeaderMap;

/// Header carrying the calling user.
pub const USER_HEADER: &str = "x-user";

/// Actor recorded when the header is absent or blank.
pub const DEFAULT_USER: &str = "Guest";

/// Calling user named by the `x-user` header.
pub fn actor_from_headers(headers: &HeaderMap) -> String {
    headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_USER)
        .to_string()
}
