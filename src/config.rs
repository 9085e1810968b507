//! Environment-backed configuration.
//!
//! A `.env` file is honored when present (dotenvy), process environment
//! always wins. Three secrets are required; everything else has a sensible
//! default:
//!
//! | Variable | Default |
//! |---------------------------|--------------------------------|
//! | `OPENAI_API_KEY`          | required                       |
//! | `SUPADATA_API_KEY`        | required                       |
//! | `BLOGSMITH_JWT_SECRET`    | required                       |
//! | `OPENAI_MODEL_NAME`       | `gpt-4o-mini`                  |
//! | `BLOGSMITH_TOKEN_TTL`     | `86400` (seconds)              |
//! | `BLOGSMITH_DB_PATH`       | `.blogsmith/blogsmith.db`      |
//! | `BLOGSMITH_BIND`          | `127.0.0.1`                    |
//! | `BLOGSMITH_RPM`           | `60` (requests/minute)         |
//! | `BLOGSMITH_RPH`           | `1000` (requests/hour)         |

use std::path::PathBuf;

use crate::errors::ConfigError;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub requests_per_minute: usize,
    pub requests_per_hour: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 60,
            requests_per_hour: 1000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub openai_api_key: String,
    pub openai_model: String,
    pub supadata_api_key: String,
    pub jwt_secret: String,
    pub token_ttl_secs: u64,
    pub database_path: PathBuf,
    pub bind_host: String,
    pub rate_limit: RateLimitConfig,
}

impl AppConfig {
    /// Load configuration from the environment, honoring a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Ignore a missing .env; the process environment may be complete.
        let _ = dotenvy::dotenv();

        Ok(Self {
            openai_api_key: required("OPENAI_API_KEY")?,
            openai_model: optional("OPENAI_MODEL_NAME")
                .unwrap_or_else(|| "gpt-4o-mini".to_string()),
            supadata_api_key: required("SUPADATA_API_KEY")?,
            jwt_secret: required("BLOGSMITH_JWT_SECRET")?,
            token_ttl_secs: parsed("BLOGSMITH_TOKEN_TTL", 86_400)?,
            database_path: optional("BLOGSMITH_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".blogsmith/blogsmith.db")),
            bind_host: optional("BLOGSMITH_BIND").unwrap_or_else(|| "127.0.0.1".to_string()),
            rate_limit: RateLimitConfig {
                requests_per_minute: parsed("BLOGSMITH_RPM", 60)?,
                requests_per_hour: parsed("BLOGSMITH_RPH", 1000)?,
            },
        })
    }

    /// Loggable view with secrets masked.
    pub fn redacted(&self) -> String {
        format!(
            "openai_model={} database_path={} bind_host={} rpm={} rph={} \
             openai_api_key={} supadata_api_key={} jwt_secret={}",
            self.openai_model,
            self.database_path.display(),
            self.bind_host,
            self.rate_limit.requests_per_minute,
            self.rate_limit.requests_per_hour,
            mask(&self.openai_api_key),
            mask(&self.supadata_api_key),
            mask(&self.jwt_secret),
        )
    }
}

fn mask(secret: &str) -> String {
    if secret.len() <= 4 {
        "****".to_string()
    } else {
        format!("{}****", &secret[..4])
    }
}

/// Empty values count as unset: a blank line in a .env file must not
/// satisfy a required secret.
fn optional(var: &'static str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn required(var: &'static str) -> Result<String, ConfigError> {
    optional(var).ok_or(ConfigError::MissingVar(var))
}

fn parsed<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match optional(var) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidVar {
            var,
            value: raw,
            message: e.to_string(),
        }),
    }
}
