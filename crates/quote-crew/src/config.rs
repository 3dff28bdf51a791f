use std::env;
use std::fmt::{self, Debug, Formatter};

use quote_crew_openai_model::{OpenAIConfig, OpenAIConfigBuilder};

const API_KEY_VAR: &str = "OPENAI_API_KEY";
const MODEL_VAR: &str = "OPENAI_MODEL";
const BASE_URL_VAR: &str = "OPENAI_BASE_URL";

/// Sampling temperature used by every participant.
pub const TEAM_TEMPERATURE: f32 = 0.4;

/// Errors in the process configuration.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is unset or blank.
    #[error("{0} is missing in environment variables")]
    Missing(&'static str),
}

/// Settings read from the environment once at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    api_key: String,
    model: Option<String>,
    base_url: Option<String>,
}

impl AppConfig {
    /// Reads `OPENAI_API_KEY` (required), `OPENAI_MODEL` and
    /// `OPENAI_BASE_URL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`AppConfig::from_env`], reading variables from `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let api_key = read(API_KEY_VAR).ok_or(ConfigError::Missing(API_KEY_VAR))?;
        Ok(Self {
            api_key,
            model: read(MODEL_VAR),
            base_url: read(BASE_URL_VAR),
        })
    }

    /// Builds the provider configuration.
    pub fn openai_config(&self) -> OpenAIConfig {
        let mut builder = OpenAIConfigBuilder::with_api_key(&self.api_key)
            .with_temperature(TEAM_TEMPERATURE);
        if let Some(model) = &self.model {
            builder = builder.with_model(model);
        }
        if let Some(base_url) = &self.base_url {
            builder = builder.with_base_url(base_url);
        }
        builder.build()
    }
}

impl Debug for AppConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}
