//! read configuration from a file or the environment

use std::time::Duration;

use crate::errors::Error;

pub const DEFAULT_API_VERSION: u32 = 1;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;

pub enum ConfigLocation {
    File(String),
    Env,
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct Config {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    #[serde(default = "default_api_version")]
    pub api_version: u32,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_api_version() -> u32 {
    DEFAULT_API_VERSION
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

impl Config {
    pub fn from_values(
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Config {
            base_url: base_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            api_version: DEFAULT_API_VERSION,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            request_timeout_secs: None,
        }
    }

    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn from_env() -> Result<Self, Error> {
        let mut config = Config::from_values(
            required_env("AUTOLAB_HOST")?,
            required_env("AUTOLAB_CLIENT_ID")?,
            required_env("AUTOLAB_CLIENT_SECRET")?,
            required_env("AUTOLAB_REDIRECT_URI")?,
        );
        if let Ok(version) = std::env::var("AUTOLAB_API_VERSION") {
            config.api_version = version
                .parse()
                .map_err(|_| Error::Config(format!("Invalid AUTOLAB_API_VERSION '{}'", version)))?;
        }
        if let Ok(interval) = std::env::var("AUTOLAB_POLL_INTERVAL_MS") {
            config.poll_interval_ms = interval.parse().map_err(|_| {
                Error::Config(format!("Invalid AUTOLAB_POLL_INTERVAL_MS '{}'", interval))
            })?;
        }
        Ok(config)
    }

    pub fn with_api_version(mut self, api_version: u32) -> Self {
        self.api_version = api_version;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Base URL with a scheme, validated before any network call is made.
    pub fn resolved_base_url(&self) -> Result<String, Error> {
        let has_scheme =
            self.base_url.starts_with("http://") || self.base_url.starts_with("https://");
        let base = if has_scheme {
            self.base_url.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", self.base_url.trim_end_matches('/'))
        };
        reqwest::Url::parse(&base)
            .map_err(|e| Error::Config(format!("Invalid base URL '{}': {}", base, e)))?;
        Ok(base)
    }
}

pub fn read_config(loc: ConfigLocation) -> Result<Config, Error> {
    match loc {
        ConfigLocation::File(path) => Config::from_file(path),
        ConfigLocation::Env => Config::from_env(),
    }
}

fn required_env(name: &str) -> Result<String, Error> {
    std::env::var(name).map_err(|_| Error::Config(format!("Missing {} env var", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_config_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("autolab.json");
        std::fs::write(
            &path,
            r#"{
                "base_url": "autolab.example.edu",
                "client_id": "id",
                "client_secret": "secret",
                "redirect_uri": "urn:ietf:wg:oauth:2.0:oob"
            }"#,
        )
        .unwrap();

        let config = read_config(ConfigLocation::File(path.display().to_string())).unwrap();
        assert_eq!(config.api_version, DEFAULT_API_VERSION);
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.request_timeout_secs, None);
        assert_eq!(
            config.resolved_base_url().unwrap(),
            "https://autolab.example.edu"
        );
    }

    #[test]
    fn explicit_scheme_is_kept() {
        let config = Config::from_values("http://localhost:3000/", "id", "secret", "uri");
        assert_eq!(config.resolved_base_url().unwrap(), "http://localhost:3000");
    }

    #[test]
    fn host_starting_with_http_letters_gets_scheme() {
        let config = Config::from_values("httpd.autolab.edu", "id", "secret", "uri");
        assert_eq!(
            config.resolved_base_url().unwrap(),
            "https://httpd.autolab.edu"
        );
    }

    #[test]
    fn unparseable_host_is_rejected() {
        let config = Config::from_values("http://[::1", "id", "secret", "uri");
        assert!(matches!(config.resolved_base_url(), Err(Error::Config(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let res = Config::from_file("/nonexistent/autolab.json");
        assert!(matches!(res, Err(Error::Io(_))));
    }
}
