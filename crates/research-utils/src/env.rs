//! Environment helpers

use std::path::PathBuf;

/// Load a `.env` file from the current directory or any parent
///
/// Returns the path that was loaded, or `None` when no file was found.
/// Variables already present in the process environment are not overridden.
pub fn load_dotenv() -> Option<PathBuf> {
    match dotenvy::dotenv() {
        Ok(path) => {
            tracing::debug!("Loaded environment from {}", path.display());
            Some(path)
        }
        Err(e) if e.not_found() => None,
        Err(e) => {
            tracing::warn!("Failed to load .env file: {e}");
            None
        }
    }
}

/// Read an environment variable, treating blank values as unset
pub fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read an environment variable with a fallback for unset or blank values
pub fn non_empty_env_or(key: &str, default: &str) -> String {
    non_empty_env(key).unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_env() {
        unsafe {
            std::env::set_var("RESEARCH_UTILS_TEST_SET", "  value ");
            std::env::set_var("RESEARCH_UTILS_TEST_BLANK", "   ");
        }

        assert_eq!(
            non_empty_env("RESEARCH_UTILS_TEST_SET"),
            Some("value".to_string())
        );
        assert_eq!(non_empty_env("RESEARCH_UTILS_TEST_BLANK"), None);
        assert_eq!(non_empty_env("RESEARCH_UTILS_TEST_MISSING"), None);
        assert_eq!(
            non_empty_env_or("RESEARCH_UTILS_TEST_BLANK", "fallback"),
            "fallback"
        );

        unsafe {
            std::env::remove_var("RESEARCH_UTILS_TEST_SET");
            std::env::remove_var("RESEARCH_UTILS_TEST_BLANK");
        }
    }
}
