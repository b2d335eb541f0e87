//! Prompt templates for Tubegist.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::OnceLock;

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{\{(\w+)\}\}").expect("placeholder regex is valid"))
}

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub agent: AgentPrompts,
    pub tools: ToolPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}

/// Prompts driving the reasoning loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentPrompts {
    /// System preamble. `{{tools}}` expands to the registered tool list.
    pub system: String,
    /// Final answer used when the step budget runs out. `{{max_steps}}` is available.
    pub budget_exhausted: String,
}

impl Default for AgentPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are an assistant that answers questions about YouTube videos using their transcripts.

You have access to the following tools:

{{tools}}

To use a tool, reply with exactly these two lines and nothing after them:
Action: <tool name>
Action Input: <JSON object matching the tool's input schema>

The result will be sent back to you as a message starting with "Observation:".
A transcript returned by fetch_transcript must be passed verbatim as "transcript_text"
to the other tools.

When you know the answer, reply with:
Final Answer: <your answer to the user>

Guidelines:
- Use one tool per reply
- If a tool reports an error, fix the input or explain the problem in your final answer
- Never invent transcript content
- Answer in the language of the user's request"#
                .to_string(),

            budget_exhausted: "I could not finish this request within {{max_steps}} reasoning steps. \
This is a best effort, incomplete answer: the tools I used did not lead to a final result. \
Try a narrower request or allow more steps."
                .to_string(),
        }
    }
}

/// Prompts used inside the summary tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPrompts {
    /// Summary of a single chunk. `{{text}}` is the chunk.
    pub summarize_chunk: String,
    /// Combination of chunk summaries. `{{summaries}}` holds them.
    pub summarize_combine: String,
    /// Topic listing for a chunk. `{{text}}` is the chunk.
    pub key_ideas: String,
    /// Quote selection for a chunk. `{{text}}` is the chunk.
    pub quotes: String,
}

impl Default for ToolPrompts {
    fn default() -> Self {
        Self {
            summarize_chunk: r#"Text: {{text}}
Objective: Summarize the provided text.
Answer:"#
                .to_string(),

            summarize_combine: r#"Multiple summaries: {{summaries}}
Objective: Create a single, coherent summary in English.
Answer:"#
                .to_string(),

            key_ideas: r#"Text: {{text}}
Objective: Extract the main topics from the provided text.
Answer: List the topics separated by commas."#
                .to_string(),

            quotes: r#"Text: {{text}}
Objective: Extract the most important quote from the text. Ignore the [MM:SS] markers.
Answer: Provide the quote as plain text."#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let agent_path = custom_path.join("agent.toml");
            if agent_path.exists() {
                let content = std::fs::read_to_string(&agent_path)?;
                prompts.agent = toml::from_str(&content)?;
            }

            let tools_path = custom_path.join("tools.toml");
            if tools_path.exists() {
                let content = std::fs::read_to_string(&tools_path)?;
                prompts.tools = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Placeholders are replaced in one pass, so substituted values are never
    /// rendered again. Unknown placeholders are left as they are.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        placeholder_regex()
            .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }

    /// Render a template that takes a single variable.
    pub fn render_one(&self, template: &str, key: &str, value: &str) -> String {
        let mut vars = std::collections::HashMap::new();
        vars.insert(key.to_string(), value.to_string());
        self.render_with_custom(template, &vars)
    }
}
