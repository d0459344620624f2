//! Prompt loader for YAML prompt definitions.

use crate::defaults::{builtin_ids, builtin_prompt};
use crate::types::PromptDefinition;
use agentic_core::{AppError, AppResult};
use std::path::{Path, PathBuf};

fn prompts_dir(workspace_path: &Path) -> PathBuf {
    workspace_path
        .join(agentic_core::config::AGENTIC_DIR)
        .join("prompts")
}

/// Load a prompt definition by ID.
///
/// A workspace file `.agentic/prompts/<id>.yml` takes precedence over the
/// built-in definition with the same id.
///
/// # Example
/// ```no_run
/// use agentic_prompt::{ids, load_prompt};
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), ids::REWRITE)?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompts_dir(workspace_path).join(format!("{}.yml", prompt_id));

    let definition = if prompt_file.exists() {
        tracing::debug!("Loading prompt override from: {:?}", prompt_file);
        load_prompt_file(&prompt_file)?
    } else if let Some(builtin) = builtin_prompt(prompt_id) {
        builtin?
    } else {
        return Err(AppError::Prompt(format!(
            "Prompt '{}' not found (looked for {:?})",
            prompt_id, prompt_file
        )));
    };

    validate_prompt(&definition)?;

    if definition.id != prompt_id {
        return Err(AppError::Prompt(format!(
            "Prompt file {:?} declares id '{}'",
            prompt_file, definition.id
        )));
    }

    tracing::debug!("Loaded prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

fn load_prompt_file(prompt_file: &Path) -> AppResult<PromptDefinition> {
    let contents = std::fs::read_to_string(prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to parse prompt YAML {:?}: {}",
            prompt_file, e
        ))
    })
}

/// List all available prompt IDs: built-ins plus workspace overrides.
pub fn list_prompts(workspace_path: &Path) -> AppResult<Vec<String>> {
    let mut prompt_ids: Vec<String> = builtin_ids().into_iter().map(String::from).collect();

    let dir = prompts_dir(workspace_path);
    if dir.exists() {
        for entry in walkdir::WalkDir::new(&dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("yml") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    prompt_ids.push(stem.to_string());
                }
            }
        }
    }

    prompt_ids.sort();
    prompt_ids.dedup();
    Ok(prompt_ids)
}

/// Validate a prompt definition.
pub fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    if let Some(temperature) = def.behavior.temperature {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(AppError::Prompt(format!(
                "Prompt '{}' temperature must be between 0.0 and 2.0",
                def.id
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::ids;
    use std::fs;
    use tempfile::TempDir;

    fn write_prompt(dir: &Path, id: &str, content: &str) -> PathBuf {
        let prompts = prompts_dir(dir);
        fs::create_dir_all(&prompts).unwrap();
        let file_path = prompts.join(format!("{}.yml", id));
        fs::write(&file_path, content).unwrap();
        file_path
    }

    fn valid_yaml(id: &str, template: &str) -> String {
        format!(
            r#"
id: {}
title: "Test Prompt"
apiVersion: "1.0"
createdBy: test
behavior:
  temperature: 0.5
template: "{}"
"#,
            id, template
        )
    }

    #[test]
    fn test_load_builtin_without_workspace_files() {
        let temp_dir = TempDir::new().unwrap();
        let prompt = load_prompt(temp_dir.path(), ids::REWRITE).unwrap();
        assert_eq!(prompt.id, ids::REWRITE);
        assert!(prompt.template.contains("{{query}}"));
    }

    #[test]
    fn test_workspace_override_wins() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(
            temp_dir.path(),
            ids::REWRITE,
            &valid_yaml(ids::REWRITE, "Rewrite: {{query}}"),
        );

        let prompt = load_prompt(temp_dir.path(), ids::REWRITE).unwrap();
        assert_eq!(prompt.template, "Rewrite: {{query}}");
        assert_eq!(prompt.behavior.temperature, Some(0.5));
    }

    #[test]
    fn test_load_nonexistent_prompt() {
        let temp_dir = TempDir::new().unwrap();
        let result = load_prompt(temp_dir.path(), "nonexistent");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(temp_dir.path(), "invalid", "invalid: yaml: content:");

        let result = load_prompt(temp_dir.path(), "invalid");
        assert!(result.is_err());
    }

    #[test]
    fn test_mismatched_id_rejected() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(
            temp_dir.path(),
            "custom",
            &valid_yaml("something.else", "{{query}}"),
        );
        assert!(load_prompt(temp_dir.path(), "custom").is_err());
    }

    #[test]
    fn test_list_prompts_merges_builtins() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(temp_dir.path(), "custom", &valid_yaml("custom", "{{query}}"));
        write_prompt(
            temp_dir.path(),
            ids::EVALUATE,
            &valid_yaml(ids::EVALUATE, "{{answer}}"),
        );

        let prompts = list_prompts(temp_dir.path()).unwrap();
        assert_eq!(prompts.len(), builtin_ids().len() + 1);
        assert!(prompts.contains(&"custom".to_string()));
        assert!(prompts.contains(&ids::EVALUATE.to_string()));
    }
}
