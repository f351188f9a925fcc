//! Generation run configuration.

use std::path::PathBuf;
use std::time::Duration;

use sora_client::ClientConfig;

use crate::error::GenerateResult;

/// Settings for one generation run.
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    /// Delay between status polls
    pub poll_interval: Duration,
    /// Overall deadline from submission to finished download
    pub job_timeout: Duration,
    /// History file override; `None` uses the user-scoped default
    pub history_path: Option<PathBuf>,
    /// Also record jobs the service reported as failed
    pub record_failed_jobs: bool,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            job_timeout: Duration::from_secs(900), // 15 minutes
            history_path: None,
            record_failed_jobs: false,
        }
    }
}

impl GenerateConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            poll_interval: Duration::from_secs(
                std::env::var("SORA_POLL_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .filter(|secs| *secs > 0)
                    .unwrap_or(3),
            ),
            job_timeout: Duration::from_secs(
                std::env::var("SORA_JOB_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .filter(|secs| *secs > 0)
                    .unwrap_or(900),
            ),
            history_path: std::env::var("SORA_HISTORY_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            record_failed_jobs: std::env::var("SORA_RECORD_FAILED_JOBS")
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        }
    }
}

/// Client settings from the API key, environment overrides and an optional
/// `--base-url`. Fails when the key is empty.
pub fn client_config(api_key: &str, base_url: Option<&str>) -> GenerateResult<ClientConfig> {
    let mut config = ClientConfig::new(api_key)?.with_env_overrides()?;
    if let Some(base_url) = base_url {
        config = config.with_base_url(base_url)?;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerateError;
    use serial_test::serial;

    const VARS: [&str; 4] = [
        "SORA_POLL_INTERVAL_SECS",
        "SORA_JOB_TIMEOUT_SECS",
        "SORA_HISTORY_PATH",
        "SORA_RECORD_FAILED_JOBS",
    ];

    fn clear_env() {
        for key in VARS {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = GenerateConfig::from_env();
        assert_eq!(config.poll_interval, Duration::from_secs(3));
        assert_eq!(config.job_timeout, Duration::from_secs(900));
        assert!(config.history_path.is_none());
        assert!(!config.record_failed_jobs);
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear_env();
        std::env::set_var("SORA_POLL_INTERVAL_SECS", "1");
        std::env::set_var("SORA_JOB_TIMEOUT_SECS", "60");
        std::env::set_var("SORA_HISTORY_PATH", "/tmp/sora/history.json");
        std::env::set_var("SORA_RECORD_FAILED_JOBS", "TRUE");

        let config = GenerateConfig::from_env();
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.job_timeout, Duration::from_secs(60));
        assert_eq!(
            config.history_path.as_deref(),
            Some(std::path::Path::new("/tmp/sora/history.json"))
        );
        assert!(config.record_failed_jobs);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_values_fall_back() {
        clear_env();
        std::env::set_var("SORA_POLL_INTERVAL_SECS", "0");
        std::env::set_var("SORA_JOB_TIMEOUT_SECS", "soon");
        let config = GenerateConfig::from_env();
        assert_eq!(config.poll_interval, Duration::from_secs(3));
        assert_eq!(config.job_timeout, Duration::from_secs(900));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_missing_api_key_is_config_error() {
        std::env::remove_var("SORA_BASE_URL");
        let err = client_config("  ", None).unwrap_err();
        assert!(matches!(err, GenerateError::Config(_)), "{:?}", err);
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    #[serial]
    fn test_base_url_flag_wins() {
        std::env::set_var("SORA_BASE_URL", "http://env.example");
        let config = client_config("sk-test", Some("http://127.0.0.1:9/v1/")).unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:9/v1");
        std::env::remove_var("SORA_BASE_URL");
    }
}
