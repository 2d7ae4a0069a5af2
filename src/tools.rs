//! Rendering of tool-role message payloads.
//!
//! Tool messages in the export carry a `name` and a raw `content` payload
//! instead of `text`. Known tools get a Markdown rendering; anything else is
//! replaced by a placeholder so the transcript stays readable.

use crate::model::stringify;
use serde_json::Value;
use std::collections::HashMap;

/// Turns a tool's raw payload into Markdown.
pub type ToolFormatter = fn(&Value) -> String;

/// The text produced for one tool part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub text: String,
    /// `true` when a registered formatter produced the text, `false` for
    /// placeholders.
    pub formatted: bool,
}

impl ToolOutput {
    fn placeholder(text: String) -> Self {
        Self {
            text,
            formatted: false,
        }
    }
}

/// Tool name → formatter.
#[derive(Clone)]
pub struct ToolRegistry {
    formatters: HashMap<String, ToolFormatter>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.formatters.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ToolRegistry")
            .field("tools", &names)
            .finish()
    }
}

impl Default for ToolRegistry {
    /// A registry with the built-in `web_search` and `code_interpreter` formatters.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("web_search", format_web_search);
        registry.register("code_interpreter", format_code_execution);
        registry
    }
}

impl ToolRegistry {
    pub fn empty() -> Self {
        Self {
            formatters: HashMap::new(),
        }
    }

    /// Add or replace the formatter for `name`, returning the previous one.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        formatter: ToolFormatter,
    ) -> Option<ToolFormatter> {
        self.formatters.insert(name.into(), formatter)
    }

    pub fn render(&self, name: Option<&str>, content: Option<&Value>) -> ToolOutput {
        let (Some(name), Some(content)) = (name, content) else {
            return ToolOutput::placeholder("[Unknown tool output]".to_string());
        };
        match self.formatters.get(name) {
            Some(format) => ToolOutput {
                text: format(content),
                formatted: true,
            },
            None => ToolOutput::placeholder(format!("[Tool: {name} output - see original data]")),
        }
    }
}

/// Bullet list of result titles when the payload has `homeResults`,
/// otherwise the payload verbatim.
pub fn format_web_search(content: &Value) -> String {
    let Some(results) = content.get("homeResults").and_then(Value::as_array) else {
        return stringify(content);
    };
    results
        .iter()
        .map(|result| {
            let title = result
                .get("title")
                .filter(|t| !t.is_null())
                .map(stringify)
                .unwrap_or_else(|| "No Title".to_string());
            format!("- {title}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fenced Python block for string payloads, otherwise the payload verbatim.
pub fn format_code_execution(content: &Value) -> String {
    match content {
        Value::String(code) => format!("```python\n{code}\n```"),
        other => stringify(other),
    }
}
