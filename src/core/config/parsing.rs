use std::env;

use super::types::{ConfigError, Environment};

pub(super) fn env_optional(key: &str) -> Option<String> {
    env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

pub(super) fn env_or_default(key: &str, default: &str) -> String {
    env_optional(key).unwrap_or_else(|| default.to_string())
}

pub(super) fn parse_positive_u64(field: &'static str, value: String) -> Result<u64, ConfigError> {
    match value.parse::<u64>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(ConfigError::InvalidValue { field, value }),
    }
}

pub(super) fn parse_base_url(value: String) -> Result<String, ConfigError> {
    let trimmed = value.trim().trim_end_matches('/');
    let has_scheme = trimmed.starts_with("http://") || trimmed.starts_with("https://");
    let has_host = trimmed.splitn(2, "://").nth(1).is_some_and(|rest| !rest.is_empty());
    if !has_scheme || !has_host {
        return Err(ConfigError::InvalidBaseUrl(value));
    }
    Ok(trimmed.to_string())
}

pub(super) fn parse_bool(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Unknown or missing names fall back to development.
pub(super) fn parse_environment(value: Option<String>) -> Environment {
    let Some(value) = value else {
        return Environment::Development;
    };
    match value.to_ascii_lowercase().as_str() {
        "production" | "prod" => Environment::Production,
        "staging" | "stage" => Environment::Staging,
        "test" | "testing" | "ci" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_base_url_strips_trailing_slash() {
        let parsed = parse_base_url("https://edumon.example/api/".to_string()).expect("url");
        assert_eq!(parsed, "https://edumon.example/api");
    }

    #[test]
    fn parse_base_url_rejects_missing_scheme() {
        assert!(parse_base_url("edumon.example/api".to_string()).is_err());
        assert!(parse_base_url("https://".to_string()).is_err());
    }

    #[test]
    fn parse_positive_u64_rejects_zero() {
        assert_eq!(parse_positive_u64("TIMEOUT", "45".to_string()).unwrap(), 45);
        assert!(parse_positive_u64("TIMEOUT", "0".to_string()).is_err());
        assert!(parse_positive_u64("TIMEOUT", "soon".to_string()).is_err());
    }

    #[test]
    fn parse_bool_is_case_insensitive() {
        for truthy in ["1", "true", "Yes", "ON"] {
            assert!(parse_bool(truthy), "{truthy}");
        }
        for falsy in ["0", "false", "off", ""] {
            assert!(!parse_bool(falsy), "{falsy}");
        }
    }

    #[test]
    fn environment_aliases() {
        assert_eq!(parse_environment(Some("PROD".to_string())), Environment::Production);
        assert_eq!(parse_environment(Some("stage".to_string())), Environment::Staging);
        assert_eq!(parse_environment(Some("ci".to_string())), Environment::Test);
        assert_eq!(parse_environment(Some("local".to_string())), Environment::Development);
        assert_eq!(parse_environment(None), Environment::Development);
    }
}
