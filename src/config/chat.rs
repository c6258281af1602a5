//! Business context for the assistant's instructions

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::error::{ConfigError, ValidationError};
use crate::domain::prompts::BusinessContext;

/// Where the business context comes from.
///
/// A JSON file with `businessContext`, `userContext` and `instructions` is
/// read first; any inline value set here replaces the file's.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatConfig {
    /// Path to the chat config JSON file
    pub config_path: Option<PathBuf>,

    pub business_context: Option<String>,
    pub user_context: Option<String>,
    pub instructions: Option<String>,
}

impl ChatConfig {
    /// Reads the file (if any) and applies inline overrides.
    pub fn business_context(&self) -> Result<BusinessContext, ConfigError> {
        let mut context = match &self.config_path {
            Some(path) => read_context_file(path)?,
            None => BusinessContext::default(),
        };

        if let Some(value) = &self.business_context {
            context.business_context = value.clone();
        }
        if let Some(value) = &self.user_context {
            context.user_context = value.clone();
        }
        if let Some(value) = &self.instructions {
            context.instructions = value.clone();
        }

        if context.business_context.trim().is_empty() {
            return Err(ValidationError::MissingRequired("chat.business_context").into());
        }
        Ok(context)
    }
}

fn read_context_file(path: &Path) -> Result<BusinessContext, ConfigError> {
    let unreadable = |message: String| ConfigError::ChatConfigUnreadable {
        path: path.display().to_string(),
        message,
    };

    let raw = std::fs::read_to_string(path).map_err(|e| unreadable(e.to_string()))?;
    serde_json::from_str(&raw).map_err(|e| unreadable(e.to_string()))
}
