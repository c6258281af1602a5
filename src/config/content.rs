//! Content generation configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::application::DEFAULT_MATCH_THRESHOLD;

#[derive(Debug, Clone, Deserialize)]
pub struct ContentConfig {
    /// Minimum preference-match score for strong-match requests
    #[serde(default = "default_match_threshold")]
    pub match_threshold: f64,
}

impl ContentConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&self.match_threshold) {
            return Err(ValidationError::InvalidMatchThreshold(self.match_threshold));
        }
        Ok(())
    }
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            match_threshold: default_match_threshold(),
        }
    }
}

fn default_match_threshold() -> f64 {
    DEFAULT_MATCH_THRESHOLD
}
