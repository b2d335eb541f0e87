//! Agent runner with tool calling loop.

use super::conversation::Conversation;
use super::decision::AgentDecision;
use super::registry::ToolRegistry;
use crate::config::Prompts;
use crate::error::Result;
use crate::gateway::ModelGateway;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Default number of model invocations per request.
pub const DEFAULT_MAX_STEPS: usize = 10;

/// Remaining reasoning steps for one request.
#[derive(Debug, Clone, Copy)]
pub struct Budget {
    remaining: usize,
}

impl Budget {
    pub fn new(steps: usize) -> Self {
        Self { remaining: steps }
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Spend one step.
    pub fn consume(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }
}

/// Loop state for one request.
#[derive(Debug)]
enum LoopState {
    AwaitingModel,
    InvokingTool { tool_name: String, arguments: Value },
    Done { completed: bool },
}

/// Agent that plans with a language model and acts through registered tools.
pub struct Agent {
    gateway: Arc<dyn ModelGateway>,
    registry: Arc<ToolRegistry>,
    max_steps: usize,
    prompts: Arc<Prompts>,
}

impl Agent {
    /// Create a new agent over a gateway and a tool registry.
    pub fn new(gateway: Arc<dyn ModelGateway>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            gateway,
            registry,
            max_steps: DEFAULT_MAX_STEPS,
            prompts: Arc::new(Prompts::default()),
        }
    }

    /// Set maximum model invocations for the agent loop.
    pub fn with_max_steps(mut self, max: usize) -> Self {
        self.max_steps = max;
        self
    }

    /// Use custom prompts. Their config variables apply to the agent templates.
    pub fn with_prompts(mut self, prompts: Arc<Prompts>) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// System preamble listing every registered tool.
    pub fn system_preamble(&self) -> String {
        let mut vars = HashMap::new();
        vars.insert("tools".to_string(), self.registry.describe_all());
        self.prompts.render_with_custom(&self.prompts.agent.system, &vars)
    }

    /// Run the agent with a user task.
    ///
    /// Tool failures are reported back to the model. Only an unreachable gateway
    /// ends the run with an error; an exhausted budget ends it with a best-effort
    /// notice and `completed == false`.
    #[instrument(skip(self, task, context), fields(run_id = %uuid::Uuid::new_v4(), max_steps = self.max_steps))]
    pub async fn run(&self, task: &str, context: Option<&str>) -> Result<AgentResponse> {
        let started_at = Utc::now();

        let user_message = match context {
            Some(ctx) => format!("Context: {}\n\nTask: {}", ctx, task),
            None => task.to_string(),
        };

        let mut conversation = Conversation::new(self.system_preamble(), user_message);
        let mut budget = Budget::new(self.max_steps);
        let mut tool_calls = Vec::new();
        let mut state = LoopState::AwaitingModel;

        let completed = loop {
            state = match state {
                LoopState::AwaitingModel if budget.is_exhausted() => {
                    warn!("Agent exhausted its budget of {} steps", self.max_steps);
                    conversation.push_agent_message(self.budget_notice(), true);
                    LoopState::Done { completed: false }
                }
                LoopState::AwaitingModel => {
                    debug!("Agent step {}", self.max_steps - budget.remaining() + 1);

                    let decision = self.gateway.generate(&conversation.prompt()).await?;
                    budget.consume();

                    match decision {
                        AgentDecision::Stop(text) => {
                            conversation.push_agent_message(text, true);
                            LoopState::Done { completed: true }
                        }
                        AgentDecision::Invoke {
                            tool_name,
                            arguments,
                        } => LoopState::InvokingTool {
                            tool_name,
                            arguments,
                        },
                    }
                }
                LoopState::InvokingTool {
                    tool_name,
                    arguments,
                } => {
                    let record = self.execute_tool_call(&tool_name, &arguments).await;
                    let outcome = if record.is_error {
                        Err(record.result.clone())
                    } else {
                        Ok(record.result.clone())
                    };
                    conversation.record_tool_exchange(&tool_name, arguments, outcome);
                    tool_calls.push(record);
                    LoopState::AwaitingModel
                }
                LoopState::Done { completed } => break completed,
            };
        };

        let content = conversation.final_answer().unwrap_or_default().to_string();

        Ok(AgentResponse {
            content,
            completed,
            steps: self.max_steps - budget.remaining(),
            tool_calls,
            conversation,
            started_at,
        })
    }

    /// Validate and execute a single tool call. Failures become error records.
    async fn execute_tool_call(&self, name: &str, arguments: &Value) -> ToolCallRecord {
        let arguments_text = arguments.to_string();
        info!(
            "Agent calling tool: {} with args: {}",
            name,
            preview(&arguments_text, 120)
        );

        let outcome = match self.registry.validate(name, arguments) {
            Ok(spec) => spec
                .invoke
                .invoke(arguments)
                .await
                .map(|output| render_output(&output)),
            Err(e) => Err(e),
        };

        let (result, is_error) = match outcome {
            Ok(output) => (output, false),
            Err(e) => {
                warn!("Tool {} failed: {}", name, e);
                (e.to_string(), true)
            }
        };

        ToolCallRecord {
            name: name.to_string(),
            arguments: arguments_text,
            result,
            is_error,
        }
    }

    fn budget_notice(&self) -> String {
        let mut vars = HashMap::new();
        vars.insert("max_steps".to_string(), self.max_steps.to_string());
        self.prompts
            .render_with_custom(&self.prompts.agent.budget_exhausted, &vars)
    }
}

/// Tool output as conversation text: strings verbatim, everything else as JSON.
fn render_output(output: &Value) -> String {
    match output {
        Value::String(text) => text.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

fn preview(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

/// Response from an agent run.
#[derive(Debug)]
pub struct AgentResponse {
    /// The final response content from the agent.
    pub content: String,
    /// False when the step budget ran out before the model stopped.
    pub completed: bool,
    /// Number of model invocations used.
    pub steps: usize,
    /// Record of all tool calls made during execution.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Full history of the run.
    pub conversation: Conversation,
    pub started_at: DateTime<Utc>,
}

/// Record of a tool call made by the agent.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    /// Name of the tool called.
    pub name: String,
    /// JSON arguments passed to the tool.
    pub arguments: String,
    /// Output, or the error description when `is_error` is set.
    pub result: String,
    pub is_error: bool,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::registry::{Tool, ToolSpec};
    use crate::agent::Turn;
    use crate::error::GistError;
    use crate::gateway::Prompt;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Gateway that replays a script and records every prompt it sees.
    struct ScriptedGateway {
        script: Mutex<Vec<AgentDecision>>,
        repeat_last: bool,
        seen: Mutex<Vec<Vec<Turn>>>,
    }

    impl ScriptedGateway {
        fn new(script: Vec<AgentDecision>) -> Self {
            Self {
                script: Mutex::new(script),
                repeat_last: false,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn always(decision: AgentDecision) -> Self {
            Self {
                script: Mutex::new(vec![decision]),
                repeat_last: true,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ModelGateway for ScriptedGateway {
        async fn generate(&self, prompt: &Prompt<'_>) -> Result<AgentDecision> {
            self.seen.lock().unwrap().push(prompt.turns.to_vec());
            let mut script = self.script.lock().unwrap();
            if self.repeat_last && script.len() == 1 {
                Ok(script[0].clone())
            } else {
                Ok(script.remove(0))
            }
        }
    }

    struct UnreachableGateway;

    #[async_trait]
    impl ModelGateway for UnreachableGateway {
        async fn generate(&self, _prompt: &Prompt<'_>) -> Result<AgentDecision> {
            Err(GistError::GatewayUnavailable("connection refused".to_string()))
        }
    }

    /// Transcript fetch that never finds captions.
    struct NoCaptions {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Tool for NoCaptions {
        async fn invoke(&self, arguments: &Value) -> Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let id = arguments["video_id"].as_str().unwrap_or_default();
            Err(GistError::TranscriptUnavailable(id.to_string()))
        }
    }

    struct Upper;

    #[async_trait]
    impl Tool for Upper {
        async fn invoke(&self, arguments: &Value) -> Result<Value> {
            let text = arguments["transcript_text"].as_str().unwrap_or_default();
            Ok(Value::String(text.to_uppercase()))
        }
    }

    fn registry_with(fetch: Arc<NoCaptions>) -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry
            .register(ToolSpec::new(
                "fetch_transcript",
                "Fetch a transcript.",
                json!({
                    "type": "object",
                    "properties": {"video_id": {"type": "string"}},
                    "required": ["video_id"]
                }),
                fetch,
            ))
            .unwrap();
        registry
            .register(ToolSpec::new(
                "summarize",
                "Summarize a transcript.",
                json!({
                    "type": "object",
                    "properties": {"transcript_text": {"type": "string"}},
                    "required": ["transcript_text"]
                }),
                Arc::new(Upper),
            ))
            .unwrap();
        Arc::new(registry)
    }

    fn no_captions() -> Arc<NoCaptions> {
        Arc::new(NoCaptions {
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_immediate_stop_uses_one_call() {
        let gateway = Arc::new(ScriptedGateway::new(vec![AgentDecision::Stop("X".to_string())]));
        let agent = Agent::new(gateway.clone(), registry_with(no_captions()));

        let response = agent.run("anything", None).await.unwrap();

        assert_eq!(response.content, "X");
        assert!(response.completed);
        assert_eq!(response.steps, 1);
        assert_eq!(gateway.calls(), 1);
        assert!(response.tool_calls.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_tool_exhausts_budget_with_notice() {
        let gateway = Arc::new(ScriptedGateway::always(AgentDecision::invoke(
            "unknown_tool",
            json!({}),
        )));
        let agent = Agent::new(gateway.clone(), registry_with(no_captions())).with_max_steps(3);

        let response = agent.run("loop forever", None).await.unwrap();

        assert_eq!(gateway.calls(), 3);
        assert!(!response.completed);
        assert!(response.content.contains("best effort, incomplete"));
        assert!(response.content.contains("3 reasoning steps"));
        assert_eq!(response.tool_calls.len(), 3);
        assert!(response.tool_calls.iter().all(|c| c.is_error));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_observed_on_next_call() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            AgentDecision::invoke("transcribe_audio", json!({})),
            AgentDecision::Stop("Sorry, I used the wrong tool.".to_string()),
        ]));
        let agent = Agent::new(gateway.clone(), registry_with(no_captions()));

        let response = agent.run("summarize", None).await.unwrap();
        assert_eq!(response.content, "Sorry, I used the wrong tool.");

        let seen = gateway.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        match seen[1].last() {
            Some(Turn::ToolResult {
                tool_name,
                output,
                is_error,
            }) => {
                assert_eq!(tool_name, "transcribe_audio");
                assert!(*is_error);
                assert!(output.contains("Unknown tool"));
            }
            other => panic!("expected error tool result, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_repeated_transcript_failure_is_reported_each_time() {
        let fetch = no_captions();
        let gateway = Arc::new(ScriptedGateway::new(vec![
            AgentDecision::invoke("fetch_transcript", json!({"video_id": "abc"})),
            AgentDecision::invoke("fetch_transcript", json!({"video_id": "abc"})),
            AgentDecision::Stop("The video has no captions.".to_string()),
        ]));
        let agent = Agent::new(gateway.clone(), registry_with(fetch.clone()));

        let response = agent.run("Summarize abc", None).await.unwrap();

        assert!(response.completed);
        assert_eq!(response.content, "The video has no captions.");
        assert_eq!(fetch.calls.load(Ordering::SeqCst), 2);

        let results: Vec<_> = response.conversation.tool_results().collect();
        assert_eq!(results.len(), 2);
        assert!(results[1].2);
        assert!(results[1].1.contains("No captions available for video abc"));
    }

    #[tokio::test]
    async fn test_schema_invalid_arguments_are_recoverable() {
        let fetch = no_captions();
        let gateway = Arc::new(ScriptedGateway::new(vec![
            AgentDecision::invoke("fetch_transcript", json!("abc")),
            AgentDecision::invoke("fetch_transcript", json!({"id": "abc"})),
            AgentDecision::Stop("done".to_string()),
        ]));
        let agent = Agent::new(gateway, registry_with(fetch.clone()));

        let response = agent.run("task", None).await.unwrap();

        assert_eq!(response.content, "done");
        // Neither call reached the tool
        assert_eq!(fetch.calls.load(Ordering::SeqCst), 0);
        assert!(response.tool_calls[0].result.contains("expected object arguments"));
        assert!(response.tool_calls[1].result.contains("missing required field 'video_id'"));
    }

    #[tokio::test]
    async fn test_successful_tool_output_is_fed_back() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            AgentDecision::invoke("summarize", json!({"transcript_text": "short talk"})),
            AgentDecision::Stop("It was a short talk.".to_string()),
        ]));
        let agent = Agent::new(gateway.clone(), registry_with(no_captions()));

        let response = agent.run("task", Some("Focus on video abc")).await.unwrap();

        assert_eq!(response.steps, 2);
        assert_eq!(response.tool_calls[0].result, "SHORT TALK");
        assert!(!response.tool_calls[0].is_error);

        let seen = gateway.seen.lock().unwrap();
        assert!(matches!(
            &seen[0][0],
            Turn::UserMessage { text } if text == "Context: Focus on video abc\n\nTask: task"
        ));
        assert!(matches!(
            seen[1].last(),
            Some(Turn::ToolResult { output, is_error: false, .. }) if output == "SHORT TALK"
        ));
    }

    #[tokio::test]
    async fn test_gateway_failure_aborts_run() {
        let agent = Agent::new(Arc::new(UnreachableGateway), registry_with(no_captions()));
        let err = agent.run("task", None).await.unwrap_err();
        assert!(matches!(err, GistError::GatewayUnavailable(_)));
    }

    #[tokio::test]
    async fn test_never_exceeds_budget() {
        for max_steps in 1..=5 {
            let gateway = Arc::new(ScriptedGateway::always(AgentDecision::invoke(
                "summarize",
                json!({"transcript_text": "again"}),
            )));
            let agent = Agent::new(gateway.clone(), registry_with(no_captions()))
                .with_max_steps(max_steps);

            let response = agent.run("task", None).await.unwrap();
            assert_eq!(gateway.calls(), max_steps);
            assert_eq!(response.steps, max_steps);
        }
    }

    #[test]
    fn test_preamble_lists_tools_in_order() {
        let gateway = Arc::new(ScriptedGateway::new(vec![]));
        let agent = Agent::new(gateway, registry_with(no_captions()));
        let preamble = agent.system_preamble();

        let fetch = preamble.find("- fetch_transcript:").unwrap();
        let summarize = preamble.find("- summarize:").unwrap();
        assert!(fetch < summarize);
        assert!(!preamble.contains("{{tools}}"));
    }

    #[tokio::test]
    async fn test_budget_notice_uses_config_variables() {
        let mut prompts = Prompts::default();
        prompts.variables.insert("contact".to_string(), "the admin".to_string());
        prompts.agent.budget_exhausted = "Gave up after {{max_steps}} steps, ask {{contact}}.".to_string();

        let gateway = Arc::new(ScriptedGateway::always(AgentDecision::invoke(
            "unknown_tool",
            json!({}),
        )));
        let agent = Agent::new(gateway, registry_with(no_captions()))
            .with_max_steps(1)
            .with_prompts(Arc::new(prompts));

        let response = agent.run("task", None).await.unwrap();
        assert_eq!(response.content, "Gave up after 1 steps, ask the admin.");
    }

    #[test]
    fn test_render_output() {
        assert_eq!(render_output(&json!("plain")), "plain");
        assert_eq!(render_output(&json!(["a", "b"])), "[\n  \"a\",\n  \"b\"\n]");
    }

    #[test]
    fn test_tool_call_record_display() {
        let record = ToolCallRecord {
            name: "fetch_transcript".to_string(),
            arguments: r#"{"video_id":"abc"}"#.to_string(),
            result: "No captions".to_string(),
            is_error: true,
        };
        assert_eq!(format!("{}", record), r#"fetch_transcript({"video_id":"abc"})"#);
    }
}
