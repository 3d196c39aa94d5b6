use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_TOAST_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("API URL must be an http:// or https:// URL: {0}")]
    InvalidApiUrl(String),
    #[error("PITCHSIDE_TOAST_MS must be a whole number of milliseconds, got '{0}'")]
    InvalidToastDuration(String),
}

/// Client settings. The backend base URL is the only thing the engine needs
/// from the outside world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub toast_duration: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            toast_duration: Duration::from_millis(DEFAULT_TOAST_MS),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`Config::from_env`], with the API URL taken from the command
    /// line instead of `PITCHSIDE_API_URL`.
    pub fn from_env_with_api_url(api_url: &str) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| match key {
            "PITCHSIDE_API_URL" => Some(api_url.to_string()),
            _ => std::env::var(key).ok(),
        })
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = lookup("PITCHSIDE_API_URL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_url = normalize_api_url(&api_url)?;

        let toast_duration = match lookup("PITCHSIDE_TOAST_MS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| ConfigError::InvalidToastDuration(raw))?,
            None => Duration::from_millis(DEFAULT_TOAST_MS),
        };

        Ok(Self {
            api_url,
            toast_duration,
        })
    }
}

/// Validate a base URL and strip the trailing slash so paths can be appended.
pub fn normalize_api_url(raw: &str) -> Result<String, ConfigError> {
    let parsed = url::Url::parse(raw).map_err(|e| ConfigError::InvalidApiUrl(format!("{raw}: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidApiUrl(raw.to_string()));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn reads_and_normalizes_values() {
        let config = Config::from_lookup(lookup(&[
            ("PITCHSIDE_API_URL", "https://api.pitchside.cc/"),
            ("PITCHSIDE_TOAST_MS", "2500"),
        ]))
        .unwrap();
        assert_eq!(config.api_url, "https://api.pitchside.cc");
        assert_eq!(config.toast_duration, Duration::from_millis(2500));
    }

    #[test]
    fn command_line_url_is_normalized_once() {
        let config = Config::from_env_with_api_url("https://api.pitchside.cc/").unwrap();
        assert_eq!(config.api_url, "https://api.pitchside.cc");
        assert!(matches!(
            Config::from_env_with_api_url("localhost:3000"),
            Err(ConfigError::InvalidApiUrl(_))
        ));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            Config::from_lookup(lookup(&[("PITCHSIDE_API_URL", "ftp://files")])),
            Err(ConfigError::InvalidApiUrl(_))
        ));
        assert_eq!(
            Config::from_lookup(lookup(&[("PITCHSIDE_TOAST_MS", "soon")])),
            Err(ConfigError::InvalidToastDuration("soon".to_string()))
        );
    }
}
