//! Terminal rendering of workflow results.

use agentic_workflow::RagState;

const RULE_WIDTH: usize = 60;

pub fn render_result(state: &RagState) -> String {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);

    let mut lines = summary_lines(state);
    lines.push(String::new());
    lines.push(light.clone());
    lines.push("ANSWER:".to_string());
    lines.push(light);
    lines.push(state.answer.clone());
    lines.push(heavy);

    lines.join("\n")
}

/// Everything but the answer, for when the answer was already streamed.
pub fn render_summary(state: &RagState) -> String {
    let mut lines = summary_lines(state);
    if let Some(error) = &state.error {
        lines.push(format!("Error: {}", error));
    }
    lines.push("=".repeat(RULE_WIDTH));
    lines.join("\n")
}

fn summary_lines(state: &RagState) -> Vec<String> {
    let heavy = "=".repeat(RULE_WIDTH);

    let mut lines = vec![
        String::new(),
        heavy.clone(),
        "AGENTIC RAG RESULTS".to_string(),
        heavy,
        String::new(),
        format!("Original Query: {}", state.original_query),
        format!("Rewritten Query: {}", state.rewritten_query),
        format!("Retrieval Used: {}", state.needs_retrieval),
    ];

    if state.needs_retrieval {
        let source = state
            .selected_source
            .map(|s| s.as_str())
            .unwrap_or("N/A");
        lines.push(format!("Source: {}", source));
    }

    lines.push(String::new());
    lines.push(format!("Iterations: {}", state.iteration));
    lines.push(format!(
        "Answer Quality: {}",
        if state.answer_is_relevant {
            "✓ Relevant"
        } else {
            "✗ Not Relevant"
        }
    ));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentic_workflow::Source;

    #[test]
    fn test_render_direct_answer() {
        let mut state = RagState::new("wat is rust", 3, Vec::new());
        state.rewritten_query = "What is Rust?".to_string();
        state.answer = "A language.".to_string();
        state.answer_is_relevant = true;
        state.iteration = 1;

        let rendered = render_result(&state);
        assert!(rendered.contains("Original Query: wat is rust"));
        assert!(rendered.contains("Rewritten Query: What is Rust?"));
        assert!(rendered.contains("Retrieval Used: false"));
        assert!(!rendered.contains("Source:"));
        assert!(rendered.contains("Iterations: 1"));
        assert!(rendered.contains("Answer Quality: ✓ Relevant"));
        let rule = "-".repeat(RULE_WIDTH);
        assert!(rendered.contains(&format!("ANSWER:\n{}\nA language.", rule)));
    }

    #[test]
    fn test_render_with_source() {
        let mut state = RagState::new("q", 3, Vec::new());
        state.needs_retrieval = true;
        state.selected_source = Some(Source::WebSearch);

        let rendered = render_result(&state);
        assert!(rendered.contains("Source: web_search"));
        assert!(rendered.contains("Answer Quality: ✗ Not Relevant"));
    }

    #[test]
    fn test_render_summary_omits_answer() {
        let mut state = RagState::new("q", 3, Vec::new());
        state.answer = "streamed already".to_string();
        state.iteration = 2;

        let rendered = render_summary(&state);
        assert!(rendered.contains("Iterations: 2"));
        assert!(!rendered.contains("ANSWER:"));
        assert!(!rendered.contains("streamed already"));
    }
}
