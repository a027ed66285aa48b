//! Agent prompt overrides
//!
//! The pre-processing and orchestration prompts of the agent can be replaced
//! by custom templates. Template bodies are read from files; the inference
//! parameters are fixed.

use std::fs;
use std::path::Path;

use crate::config::ConfigError;

/// Stop sequence used by both overridden prompts
pub const HUMAN_STOP_SEQUENCE: &str = "\n\nHuman:";

/// Which agent prompt is overridden
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    PreProcessing,
    Orchestration,
}

/// Inference parameters applied to an overridden prompt
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceSettings {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: i32,
    pub maximum_length: i32,
    pub stop_sequences: Vec<String>,
}

impl InferenceSettings {
    fn deterministic(maximum_length: i32) -> Self {
        Self {
            temperature: 0.0,
            top_p: 1.0,
            top_k: 250,
            maximum_length,
            stop_sequences: vec![HUMAN_STOP_SEQUENCE.to_string()],
        }
    }
}

/// One overridden prompt
#[derive(Debug, Clone, PartialEq)]
pub struct PromptOverride {
    pub kind: PromptKind,
    pub base_template: String,
    pub inference: InferenceSettings,
}

/// Full set of prompt overrides sent with an agent update
#[derive(Debug, Clone, PartialEq)]
pub struct PromptOverrides {
    pub prompts: Vec<PromptOverride>,
}

impl PromptOverrides {
    /// Build overrides from template bodies
    pub fn from_templates(preprocessing: String, orchestration: String) -> Self {
        Self {
            prompts: vec![
                PromptOverride {
                    kind: PromptKind::PreProcessing,
                    base_template: preprocessing,
                    inference: InferenceSettings::deterministic(256),
                },
                PromptOverride {
                    kind: PromptKind::Orchestration,
                    base_template: orchestration,
                    inference: InferenceSettings::deterministic(2048),
                },
            ],
        }
    }

    /// Read both templates from disk
    pub fn load(
        preprocessing_path: impl AsRef<Path>,
        orchestration_path: impl AsRef<Path>,
    ) -> Result<Self, ConfigError> {
        let preprocessing = read_template(preprocessing_path.as_ref())?;
        let orchestration = read_template(orchestration_path.as_ref())?;
        Ok(Self::from_templates(preprocessing, orchestration))
    }
}

fn read_template(path: &Path) -> Result<String, ConfigError> {
    let body = fs::read_to_string(path).map_err(|e| ConfigError::Template {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    if body.trim().is_empty() {
        return Err(ConfigError::Template {
            path: path.to_path_buf(),
            message: "template is empty".to_string(),
        });
    }

    Ok(body)
}
