//! Agent system for tool-augmented reasoning over video transcripts.
//!
//! The [`Agent`] drives a bounded loop: ask the model gateway for a decision,
//! run the requested tool, feed the result back, and stop on a final answer or
//! when the step budget runs out.

mod conversation;
mod decision;
mod registry;
mod runner;

pub use conversation::{Conversation, Turn};
pub use decision::{
    AgentDecision, ACTION_INPUT_MARKER, ACTION_MARKER, FINAL_ANSWER_MARKER, OBSERVATION_MARKER,
};
pub use registry::{validate_arguments, Tool, ToolRegistry, ToolSpec};
pub use runner::{Agent, AgentResponse, Budget, ToolCallRecord, DEFAULT_MAX_STEPS};
