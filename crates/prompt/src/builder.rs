//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition};
use agentic_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// Both the system and the user template are rendered with the same
/// variables. Missing variables render as empty strings.
///
/// # Example
/// ```no_run
/// use agentic_prompt::{build_prompt, PromptDefinition};
/// use std::collections::HashMap;
///
/// # fn example(def: PromptDefinition) -> Result<(), Box<dyn std::error::Error>> {
/// let mut vars = HashMap::new();
/// vars.insert("query".to_string(), "What is Rust?".to_string());
///
/// let built = build_prompt(&def, vars)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    for name in &definition.input.variables {
        if !variables.contains_key(name) {
            tracing::warn!(
                "Prompt '{}' expects variable '{}' which was not provided",
                definition.id,
                name
            );
        }
    }

    let handlebars = registry();

    let system = definition
        .system
        .as_deref()
        .map(|template| render(&handlebars, template, &variables))
        .transpose()?
        .map(|s| s.trim_end().to_string())
        .filter(|s| !s.is_empty());

    let user = render(&handlebars, &definition.template, &variables)?
        .trim_end()
        .to_string();

    Ok(BuiltPrompt {
        system,
        user,
        temperature: definition.behavior.temperature,
        max_tokens: definition.behavior.max_tokens,
        metadata: BuiltPromptMetadata {
            source_prompt_id: definition.id.clone(),
            resolved_variables: variables,
        },
    })
}

fn registry() -> Handlebars<'static> {
    let mut handlebars = Handlebars::new();
    // Prompts are plain text
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars
}

/// Render a Handlebars template with variables.
fn render(
    handlebars: &Handlebars<'_>,
    template: &str,
    variables: &HashMap<String, String>,
) -> AppResult<String> {
    handlebars
        .render_template(template, variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}
