//! Errors shared by every relay operation.

use thiserror::Error;

use crate::domain::content::ContentRejection;
use crate::domain::prompts::MissingConfiguration;
use crate::domain::search::ConfigurationError;
use crate::ports::AIError;

/// Failure of a relay operation.
///
/// The first three variants are caused by the caller; the rest are upstream
/// or internal failures whose detail is logged rather than returned.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} is required")]
    MissingConfiguration(&'static str),

    #[error("invalid search configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("AI provider error: {0}")]
    Upstream(#[from] AIError),

    #[error("unexpected model output: {0}")]
    UpstreamFormat(String),

    #[error("model refused to answer: {0}")]
    Refused(String),
}

impl RelayError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn upstream_format(message: impl Into<String>) -> Self {
        Self::UpstreamFormat(message.into())
    }

    /// True when the request itself was at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RelayError::Validation(_)
                | RelayError::MissingConfiguration(_)
                | RelayError::Configuration(_)
        )
    }
}

impl From<ContentRejection> for RelayError {
    fn from(rejection: ContentRejection) -> Self {
        Self::Validation(rejection.to_string())
    }
}

impl From<MissingConfiguration> for RelayError {
    fn from(missing: MissingConfiguration) -> Self {
        Self::MissingConfiguration(missing.0)
    }
}
