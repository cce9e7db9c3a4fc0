//! Per-task execution context threaded across plan steps.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::task::{Task, TaskId};

use super::Plan;

/// One intermediate result recorded during step execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntermediateResult {
    pub step: usize,
    /// `text` for free-text replies, otherwise the tool name
    pub origin: String,
    pub content: Value,
}

/// One recorded step failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepError {
    pub step: usize,
    /// `generation` for LLM failures, otherwise the tool name
    pub origin: String,
    pub message: String,
}

/// The single shared mutable object of one task execution.
///
/// Exclusively owned by one executor instance; steps run sequentially, so
/// there are never concurrent writers. Errors accumulate without removing
/// previously recorded state - later steps observe all prior successes and
/// failures.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub task_id: TaskId,
    pub goal: String,
    pub parameters: Value,
    pub plan: Plan,
    pub current_step: usize,
    /// Last result per tool name
    pub tool_results: HashMap<String, Value>,
    pub intermediate: Vec<IntermediateResult>,
    pub errors: Vec<StepError>,
}

impl ExecutionContext {
    pub fn new(task: &Task, plan: Plan) -> Self {
        Self {
            task_id: task.id,
            goal: task.goal.clone(),
            parameters: task.parameters.clone(),
            plan,
            current_step: 0,
            tool_results: HashMap::new(),
            intermediate: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Record a free-text reply for a step.
    pub fn record_text(&mut self, step: usize, text: String) {
        self.intermediate.push(IntermediateResult {
            step,
            origin: "text".to_string(),
            content: Value::String(text),
        });
    }

    /// Record a successful tool result: keyed by tool name for later steps,
    /// and appended to the ordered intermediate log.
    pub fn record_tool_result(&mut self, step: usize, tool: &str, result: Value) {
        self.tool_results.insert(tool.to_string(), result.clone());
        self.intermediate.push(IntermediateResult {
            step,
            origin: tool.to_string(),
            content: result,
        });
    }

    /// Record a step failure without touching accumulated state.
    pub fn record_error(&mut self, step: usize, origin: &str, message: &str) {
        tracing::warn!(step, origin, "Step error: {}", message);
        self.errors.push(StepError {
            step,
            origin: origin.to_string(),
            message: message.to_string(),
        });
    }

    /// Number of distinct steps that recorded at least one error.
    pub fn steps_with_errors(&self) -> usize {
        let mut steps: Vec<usize> = self.errors.iter().map(|e| e.step).collect();
        steps.sort_unstable();
        steps.dedup();
        steps.len()
    }

    /// Compact serialization of the context for step prompts.
    ///
    /// Bounded: tool results and notes are truncated so a long run cannot
    /// blow up later step prompts.
    pub fn digest(&self) -> String {
        let mut out = String::new();

        out.push_str(&format!("Goal: {}\n", self.goal));
        if !self.parameters.is_null() && self.parameters != Value::Object(Default::default()) {
            out.push_str(&format!("Parameters: {}\n", truncate(&self.parameters.to_string(), 400)));
        }
        out.push_str(&format!(
            "Progress: step {} of {}\n",
            self.current_step + 1,
            self.plan.len()
        ));

        if !self.tool_results.is_empty() {
            let mut names: Vec<&String> = self.tool_results.keys().collect();
            names.sort();
            out.push_str("Tool results so far:\n");
            for name in names {
                let rendered = self.tool_results[name].to_string();
                out.push_str(&format!("- {}: {}\n", name, truncate(&rendered, 600)));
            }
        }

        let recent: Vec<&IntermediateResult> = self
            .intermediate
            .iter()
            .rev()
            .filter(|r| r.origin == "text")
            .take(3)
            .collect();
        if !recent.is_empty() {
            out.push_str("Recent notes:\n");
            for note in recent.into_iter().rev() {
                let text = note.content.as_str().unwrap_or_default();
                out.push_str(&format!("- [step {}] {}\n", note.step + 1, truncate(text, 400)));
            }
        }

        if !self.errors.is_empty() {
            out.push_str(&format!("Errors so far: {}\n", self.errors.len()));
        }

        out
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let prefix: String = text.chars().take(max_chars).collect();
        format!("{}…", prefix)
    }
}
