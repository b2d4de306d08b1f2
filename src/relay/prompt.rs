//! Prompt templates for the inference phase.
//!
//! Two templates, each a plain-text file with `{{key}}` placeholders:
//!
//! ```text
//! system.md — persona, {{assistant_name}}, {{date}}, three-section answer shape
//! user.md   — {{context}} (numbered search block) then {{query}}
//! ```
//!
//! Built-in copies are compiled in. When a prompts directory is configured,
//! a file present there replaces the built-in one; a missing file is skipped
//! and the built-in stays.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;

use crate::llm::InferenceRequest;

const BUILTIN_SYSTEM: &str = include_str!("../../config/prompts/system.md");
const BUILTIN_USER: &str = include_str!("../../config/prompts/user.md");

const SYSTEM_FILE: &str = "system.md";
const USER_FILE: &str = "user.md";

/// Loaded templates. Read once at startup, rendered per request.
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    system: String,
    user: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self { system: BUILTIN_SYSTEM.trim().to_string(), user: BUILTIN_USER.trim().to_string() }
    }
}

impl PromptTemplates {
    pub fn load(prompts_dir: Option<&Path>) -> Self {
        let mut templates = Self::default();
        if let Some(dir) = prompts_dir {
            if let Some(text) = read_layer(dir, SYSTEM_FILE) {
                templates.system = text;
            }
            if let Some(text) = read_layer(dir, USER_FILE) {
                templates.user = text;
            }
        }
        templates
    }

    /// Render both halves of the prompt for one query.
    pub fn build(
        &self,
        assistant_name: &str,
        today: NaiveDate,
        context: &str,
        query: &str,
    ) -> InferenceRequest {
        let date = today.format("%B %-d, %Y").to_string();
        InferenceRequest {
            system_instruction: PromptBuilder::new(&self.system)
                .var("assistant_name", assistant_name)
                .var("date", date)
                .build(),
            user_content: PromptBuilder::new(&self.user)
                .var("context", context)
                .var("query", query)
                .build(),
        }
    }
}

fn read_layer(dir: &Path, filename: &str) -> Option<String> {
    let path = dir.join(filename);
    match fs::read_to_string(&path) {
        Ok(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Ok(_) => {
            tracing::debug!("prompt: '{}' is empty — using built-in", path.display());
            None
        }
        Err(_) => {
            tracing::debug!("prompt: '{}' not found — using built-in", path.display());
            None
        }
    }
}

/// `{{key}}` substitution over a template, applied once at [`build`](Self::build).
struct PromptBuilder<'a> {
    template: &'a str,
    vars: HashMap<&'static str, String>,
}

impl<'a> PromptBuilder<'a> {
    fn new(template: &'a str) -> Self {
        Self { template, vars: HashMap::new() }
    }

    fn var(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.vars.insert(key, value.into());
        self
    }

    /// Substitutes in a single left-to-right pass so placeholder-looking text
    /// inside a value (e.g. a search snippet containing `{{query}}`) is left alone.
    fn build(self) -> String {
        let mut out = String::with_capacity(self.template.len());
        let mut rest = self.template;
        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find("}}") {
                Some(end) if self.vars.contains_key(&after[..end]) => {
                    out.push_str(&self.vars[&after[..end]]);
                    rest = &after[end + 2..];
                }
                _ => {
                    out.push_str("{{");
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}
