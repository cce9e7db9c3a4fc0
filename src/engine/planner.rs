//! Plan generation with a fixed fallback.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::llm::{parse, ChatMessage, LlmClient};

/// Upper bound on plan length; longer model replies are truncated.
const MAX_PLAN_STEPS: usize = 7;

/// An ordered list of step descriptions, immutable after generation.
///
/// # Invariant
/// A plan always has at least one step; construction enforces it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    steps: Vec<String>,
}

impl Plan {
    /// Build a plan from generated steps; empty input yields the fallback.
    pub fn from_steps(mut steps: Vec<String>) -> Self {
        steps.retain(|s| !s.trim().is_empty());
        steps.truncate(MAX_PLAN_STEPS);
        if steps.is_empty() {
            Self::fallback()
        } else {
            Self { steps }
        }
    }

    /// The fixed three-step plan used whenever generation fails.
    pub fn fallback() -> Self {
        Self {
            steps: vec![
                "Analyze the task requirements".to_string(),
                "Execute the task".to_string(),
                "Format the results".to_string(),
            ],
        }
    }

    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Generates an execution plan for a task.
///
/// Plan generation is never fatal: a malformed, empty, or failed reply falls
/// back to the fixed three-step plan so the task always has a usable, if
/// degraded, plan.
pub struct PlanGenerator {
    llm: Arc<dyn LlmClient>,
    model: String,
}

impl PlanGenerator {
    pub fn new(llm: Arc<dyn LlmClient>, model: String) -> Self {
        Self { llm, model }
    }

    /// Produce an ordered list of 3-7 step descriptions for the task.
    pub async fn generate(&self, task_type: &str, goal: &str) -> Plan {
        let messages = [
            ChatMessage::system(
                "You are a recruiting task planner. Reply with a JSON array of \
                 short step descriptions, nothing else.",
            ),
            ChatMessage::user(format!(
                "Create an execution plan for this task.\n\n\
                 Task type: {}\n\
                 Goal: {}\n\n\
                 Reply with a JSON array of 3 to 7 step strings, e.g.\n\
                 [\"Analyze the job requirements\", \"Search candidate sources\", ...]",
                task_type, goal
            )),
        ];

        let reply = match self.llm.chat_completion(&self.model, &messages, None).await {
            Ok(response) => response.content.unwrap_or_default(),
            Err(e) => {
                tracing::warn!("Plan generation failed, using fallback plan: {}", e);
                return Plan::fallback();
            }
        };

        let steps = parse::extract_string_list(&reply);
        if steps.is_empty() {
            tracing::warn!("Plan reply held no usable step list, using fallback plan");
            return Plan::fallback();
        }

        tracing::debug!(steps = steps.len(), "Generated execution plan");
        Plan::from_steps(steps)
    }
}
