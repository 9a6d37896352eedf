use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::BlankPolicy;

use super::AppError;

/// Behavior switches for a levy session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevyConfig {
    pub blank_policy: BlankPolicy,
    /// Rewrite amounts to "12,50" form when a row loses focus.
    pub normalize_on_commit: bool,
    pub row_label: String,
    pub result_label: String,
}

impl Default for LevyConfig {
    fn default() -> Self {
        Self {
            blank_policy: BlankPolicy::Strict,
            normalize_on_commit: true,
            row_label: "Night".into(),
            result_label: "Levy (5% of per-night average)".into(),
        }
    }
}

impl LevyConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&data)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn with_blank_policy(mut self, policy: BlankPolicy) -> Self {
        self.blank_policy = policy;
        self
    }

    /// Label shown next to a row, e.g. "Night 2".
    pub fn row_label(&self, number: usize) -> String {
        format!("{} {}", self.row_label, number)
    }
}
