//! read configuration from a file, env vars, or explicit values

use crate::errors::Error;

pub enum ConfigLocation {
    File(String),
    Env,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct ClientConfig {
    /// Base URL every descriptor path is resolved against.
    pub base_url: String,
    /// Path of the endpoint that issues a credential to a fresh client.
    #[serde(default = "default_bootstrap_path")]
    pub bootstrap_path: String,
    /// Path of the endpoint that exchanges an expired credential for a new one.
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,
    /// Additional routes that must never carry a credential. The bootstrap
    /// and refresh paths are always exempt regardless of this list.
    #[serde(default)]
    pub exempt_routes: Vec<String>,
}

fn default_bootstrap_path() -> String {
    "/auth/guest-register".to_string()
}

fn default_refresh_path() -> String {
    "/auth/refresh-token".to_string()
}

impl ClientConfig {
    pub fn from_values(
        base_url: impl Into<String>,
        bootstrap_path: impl Into<String>,
        refresh_path: impl Into<String>,
        exempt_routes: Vec<String>,
    ) -> Result<Self, Error> {
        let config = Self {
            base_url: base_url.into(),
            bootstrap_path: bootstrap_path.into(),
            refresh_path: refresh_path.into(),
            exempt_routes,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn read(loc: ConfigLocation) -> Result<Self, Error> {
        let config: Self = match loc {
            ConfigLocation::File(path) => {
                let contents = std::fs::read_to_string(path)?;
                serde_json::from_str(&contents)?
            }
            ConfigLocation::Env => Self::read_from_env()?,
        };
        config.validate()?;
        Ok(config)
    }

    fn read_from_env() -> Result<Self, Error> {
        Ok(Self {
            base_url: std::env::var("TOKENGATE_BASE_URL")
                .map_err(|_| Error::Config("Missing TOKENGATE_BASE_URL env var".to_string()))?,
            bootstrap_path: std::env::var("TOKENGATE_BOOTSTRAP_PATH")
                .unwrap_or_else(|_| default_bootstrap_path()),
            refresh_path: std::env::var("TOKENGATE_REFRESH_PATH")
                .unwrap_or_else(|_| default_refresh_path()),
            exempt_routes: std::env::var("TOKENGATE_EXEMPT_ROUTES")
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_default(),
        })
    }

    // Validate the base URL before any network call is attempted.
    fn validate(&self) -> Result<(), Error> {
        let _ = reqwest::Url::parse(&self.base_url).map_err(|e| {
            Error::Config(format!("Invalid base URL '{}': {}", self.base_url, e))
        })?;
        for path in [&self.bootstrap_path, &self.refresh_path] {
            if !path.starts_with('/') {
                return Err(Error::Config(format!(
                    "Endpoint path '{path}' must start with '/'"
                )));
            }
        }
        Ok(())
    }
}
