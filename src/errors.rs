//! Typed error hierarchy for blogsmith.
//!
//! Four top-level enums cover the four subsystems:
//! - `ConfigError` — environment/configuration loading failures
//! - `TranscriptError` — transcript API failures
//! - `PipelineError` — blog generation pipeline failures
//! - `AuthError` — credential and token failures

use thiserror::Error;

/// Errors raised while loading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Required environment variable {0} is not set")]
    MissingVar(&'static str),

    #[error("Environment variable {var} has invalid value '{value}': {message}")]
    InvalidVar {
        var: &'static str,
        value: String,
        message: String,
    },
}

/// Errors from the transcript stage.
#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("No transcript available for video {video_id}")]
    NotFound { video_id: String },

    #[error("Transcript API returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Transcript request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Transcript API response could not be decoded: {0}")]
    Decode(#[source] reqwest::Error),
}

/// Errors from the blog generation pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Transcript stage failed: {0}")]
    Transcript(#[from] TranscriptError),

    #[error("Writer stage failed: {0}")]
    Writer(String),

    #[error("Generated article too short ({chars} characters)")]
    ContentTooShort { chars: usize },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors from authentication and token handling.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token is invalid")]
    TokenInvalid,

    #[error("Password hashing failed: {0}")]
    Hash(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_names_missing_var() {
        let err = ConfigError::MissingVar("OPENAI_API_KEY");
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn transcript_not_found_carries_video_id() {
        let err = TranscriptError::NotFound {
            video_id: "dQw4w9WgXcQ".to_string(),
        };
        match &err {
            TranscriptError::NotFound { video_id } => assert_eq!(video_id, "dQw4w9WgXcQ"),
            _ => panic!("Expected NotFound variant"),
        }
        assert!(err.to_string().contains("dQw4w9WgXcQ"));
    }

    #[test]
    fn pipeline_error_converts_from_transcript_error() {
        let inner = TranscriptError::Http {
            status: 503,
            body: "upstream unavailable".to_string(),
        };
        let err: PipelineError = inner.into();
        match &err {
            PipelineError::Transcript(TranscriptError::Http { status, .. }) => {
                assert_eq!(*status, 503);
            }
            _ => panic!("Expected PipelineError::Transcript(Http(...))"),
        }
    }

    #[test]
    fn content_too_short_carries_length() {
        let err = PipelineError::ContentTooShort { chars: 42 };
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn auth_error_variants_are_distinct() {
        assert!(matches!(
            AuthError::InvalidCredentials,
            AuthError::InvalidCredentials
        ));
        assert!(!matches!(AuthError::TokenExpired, AuthError::TokenInvalid));
    }

    #[test]
    fn all_error_types_implement_std_error_trait() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        assert_std_error(&ConfigError::MissingVar("X"));
        assert_std_error(&PipelineError::ContentTooShort { chars: 1 });
        assert_std_error(&AuthError::TokenInvalid);
    }
}
