use crate::core::config::Config;

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Resolve the API credential: config file first, then the environment.
/// `None` means the app runs in its disabled "not configured" state; no
/// request is ever attempted without a key.
pub fn resolve_api_key(config: &Config) -> Option<String> {
    config
        .api_key
        .clone()
        .filter(|key| !key.trim().is_empty())
        .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|key| !key.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_key_wins_over_environment() {
        let config = Config {
            api_key: Some("from-config".into()),
            ..Config::default()
        };
        // Regardless of the ambient environment, the config value is taken.
        assert_eq!(resolve_api_key(&config).as_deref(), Some("from-config"));
    }

    #[test]
    fn blank_config_key_counts_as_absent() {
        let config = Config {
            api_key: Some("   ".into()),
            ..Config::default()
        };
        let resolved = resolve_api_key(&config);
        // Falls through to the env var, which may or may not be set in the
        // test environment; a blank config key must never be returned.
        assert_ne!(resolved.as_deref(), Some("   "));
    }
}
