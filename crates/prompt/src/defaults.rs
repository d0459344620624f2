//! Built-in prompt definitions.
//!
//! Every workflow stage ships with a default definition compiled into the
//! binary. A workspace can replace any of them by dropping a file with the
//! same id into `.agentic/prompts/`.

use crate::types::PromptDefinition;
use agentic_core::{AppError, AppResult};

/// Ids of the built-in prompts.
pub mod ids {
    pub const REWRITE: &str = "rag.rewrite";
    pub const REWRITE_CONTEXTUAL: &str = "rag.rewrite.contextual";
    pub const NEEDS_INFO: &str = "rag.needs_info";
    pub const SELECT_SOURCE: &str = "rag.select_source";
    pub const ANSWER: &str = "rag.answer";
    pub const ANSWER_DIRECT: &str = "rag.answer.direct";
    pub const EVALUATE: &str = "rag.evaluate";
}

const BUILTIN_PROMPTS: &[(&str, &str)] = &[
    (ids::REWRITE, include_str!("../prompts/rag.rewrite.yml")),
    (
        ids::REWRITE_CONTEXTUAL,
        include_str!("../prompts/rag.rewrite.contextual.yml"),
    ),
    (ids::NEEDS_INFO, include_str!("../prompts/rag.needs_info.yml")),
    (
        ids::SELECT_SOURCE,
        include_str!("../prompts/rag.select_source.yml"),
    ),
    (ids::ANSWER, include_str!("../prompts/rag.answer.yml")),
    (
        ids::ANSWER_DIRECT,
        include_str!("../prompts/rag.answer.direct.yml"),
    ),
    (ids::EVALUATE, include_str!("../prompts/rag.evaluate.yml")),
];

/// Ids of all built-in prompts.
pub fn builtin_ids() -> Vec<&'static str> {
    BUILTIN_PROMPTS.iter().map(|(id, _)| *id).collect()
}

/// Parse the built-in definition for `id`, if one exists.
pub fn builtin_prompt(id: &str) -> Option<AppResult<PromptDefinition>> {
    BUILTIN_PROMPTS
        .iter()
        .find(|(builtin_id, _)| *builtin_id == id)
        .map(|(_, source)| {
            serde_yaml::from_str(source).map_err(|e| {
                AppError::Prompt(format!("Built-in prompt '{}' is malformed: {}", id, e))
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OutputFormat;

    #[test]
    fn test_every_builtin_parses_with_matching_id() {
        for id in builtin_ids() {
            let def = builtin_prompt(id).unwrap().unwrap();
            assert_eq!(def.id, id);
            assert!(!def.template.is_empty());
            assert!(def.system.is_some(), "{} should carry a system prompt", id);
        }
    }

    #[test]
    fn test_decision_prompts_are_deterministic() {
        for id in [ids::NEEDS_INFO, ids::SELECT_SOURCE, ids::EVALUATE, ids::REWRITE] {
            let def = builtin_prompt(id).unwrap().unwrap();
            assert_eq!(def.behavior.temperature, Some(0.0), "{}", id);
        }

        let answer = builtin_prompt(ids::ANSWER).unwrap().unwrap();
        assert_eq!(answer.behavior.temperature, Some(0.3));
    }

    #[test]
    fn test_output_formats() {
        let select = builtin_prompt(ids::SELECT_SOURCE).unwrap().unwrap();
        assert_eq!(select.output.format, OutputFormat::Choice);
        assert_eq!(
            select.output.choices,
            vec!["vector_database", "tools_api", "web_search"]
        );

        let evaluate = builtin_prompt(ids::EVALUATE).unwrap().unwrap();
        assert_eq!(evaluate.output.format, OutputFormat::YesNo);
    }

    #[test]
    fn test_unknown_builtin() {
        assert!(builtin_prompt("nope").is_none());
    }
}
