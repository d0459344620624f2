//! Prompt definitions used by the workflow stages.

use agentic_core::{AppError, AppResult};
use agentic_prompt::{build_prompt, builtin_ids, load_prompt, BuiltPrompt, PromptDefinition};
use std::collections::HashMap;
use std::path::Path;

/// Every stage prompt, loaded once per workflow.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    definitions: HashMap<String, PromptDefinition>,
}

impl PromptLibrary {
    /// Load all stage prompts, honouring overrides in `workspace`.
    pub fn load(workspace: &Path) -> AppResult<Self> {
        let mut definitions = HashMap::new();
        for id in builtin_ids() {
            definitions.insert(id.to_string(), load_prompt(workspace, id)?);
        }

        tracing::debug!("Loaded {} workflow prompts", definitions.len());
        Ok(Self { definitions })
    }

    pub fn get(&self, id: &str) -> AppResult<&PromptDefinition> {
        self.definitions
            .get(id)
            .ok_or_else(|| AppError::Prompt(format!("Prompt '{}' is not loaded", id)))
    }

    /// Render prompt `id` with the given variables.
    pub fn render(&self, id: &str, variables: &[(&str, &str)]) -> AppResult<BuiltPrompt> {
        let variables = variables
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        build_prompt(self.get(id)?, variables)
    }
}
