//! Built-in tools for the `tools_api` source.

use super::calculator;
use chrono::Local;

const TIME_WORDS: &[&str] = &["date", "time", "today", "tomorrow", "yesterday", "clock"];

/// Word pairs that ask for the date without a word from `TIME_WORDS`.
const TIME_PHRASES: &[[&str; 2]] = &[
    ["what", "day"],
    ["which", "day"],
    ["what", "month"],
    ["which", "month"],
    ["what", "year"],
    ["which", "year"],
    ["right", "now"],
];

/// A named tool that turns an input string into a result string.
#[derive(Clone, Copy)]
pub struct Tool {
    pub name: &'static str,
    pub description: &'static str,
    run: fn(&str) -> String,
}

/// Registry of the available tools.
#[derive(Clone)]
pub struct ToolsManager {
    tools: Vec<Tool>,
}

impl Default for ToolsManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolsManager {
    pub fn new() -> Self {
        let tools = vec![
            Tool {
                name: "calculator",
                description: "Evaluates arithmetic expressions",
                run: calculator_tool,
            },
            Tool {
                name: "datetime",
                description: "Reports the current local date and time",
                run: datetime_tool,
            },
        ];
        tracing::info!("Registered {} tools", tools.len());
        Self { tools }
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    pub fn get_tools_info(&self) -> String {
        let names: Vec<&str> = self.tools.iter().map(|t| t.name).collect();
        format!("Available tools: {}", names.join(", "))
    }

    pub fn execute_tool(&self, name: &str, input: &str) -> String {
        tracing::info!("Executing tool: {}", name);

        match self.tools.iter().find(|t| t.name == name) {
            Some(tool) => (tool.run)(input),
            None => {
                tracing::warn!("Tool '{}' not found", name);
                format!("Tool '{}' is not available.", name)
            }
        }
    }

    /// Tools info plus the output of every tool the query calls for.
    pub fn retrieve(&self, query: &str) -> String {
        let mut sections = vec![self.get_tools_info()];

        if let Some(expression) = calculator::extract_expression(query) {
            sections.push(self.execute_tool("calculator", &expression));
        }
        if mentions_time(query) {
            sections.push(self.execute_tool("datetime", query));
        }

        sections.join("\n")
    }
}

fn calculator_tool(expression: &str) -> String {
    match calculator::evaluate(expression) {
        Ok(value) => format!("Result: {}", calculator::format_number(value)),
        Err(e) => format!("Error: {}", e),
    }
}

fn datetime_tool(_query: &str) -> String {
    format!(
        "Current date and time: {}",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    )
}

/// Whole-word match against `TIME_WORDS` and `TIME_PHRASES`.
fn mentions_time(query: &str) -> bool {
    let lowered = query.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    words.iter().any(|word| TIME_WORDS.contains(word))
        || words
            .windows(2)
            .any(|pair| TIME_PHRASES.iter().any(|phrase| phrase[..] == *pair))
}
