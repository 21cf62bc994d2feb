//! HTTP API for dlens-aa

pub mod advice;
pub mod health;
pub mod results;
pub mod upload;
pub mod users;

pub use advice::advice_routes;
pub use health::health_routes;
pub use results::result_routes;
pub use upload::upload_routes;
pub use users::user_routes;

/// Normalize a caller-supplied user identity for filesystem and DB use
///
/// Keeps ASCII alphanumerics plus `-`, `_`, and `.`; strips everything else
/// (including path separators) and leading/trailing dots. An identity that
/// sanitizes to nothing becomes "anonymous", matching the upload default.
pub fn sanitize_user_id(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect();
    let cleaned = cleaned.trim_matches('.');
    if cleaned.is_empty() {
        "anonymous".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_safe_characters() {
        assert_eq!(sanitize_user_id("alice-01_x.y"), "alice-01_x.y");
    }

    #[test]
    fn strips_path_separators_and_spaces() {
        assert_eq!(sanitize_user_id("../etc/passwd"), "etcpasswd");
        assert_eq!(sanitize_user_id("a b/c"), "abc");
    }

    #[test]
    fn empty_or_unsanitizable_becomes_anonymous() {
        assert_eq!(sanitize_user_id(""), "anonymous");
        assert_eq!(sanitize_user_id("   "), "anonymous");
        assert_eq!(sanitize_user_id("../.."), "anonymous");
    }
}
