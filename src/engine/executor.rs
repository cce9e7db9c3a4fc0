//! Plan executor - sequential step execution with per-step failure isolation.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::llm::{parse, ChatMessage, LlmClient};
use crate::task::Task;
use crate::tools::ToolRegistry;

use super::{ExecutionContext, IntermediateResult, PlanGenerator, StepError};

/// Errors that terminate a task as a whole.
///
/// Everything else (step failures, tool failures, source failures, synthesis
/// parse failures) is absorbed into the report as structured degradation.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Generation client is not ready; configure OPENROUTER_API_KEY")]
    NotReady,

    #[error("Task cancelled by caller")]
    Cancelled,
}

/// Overall quality of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    /// Every step succeeded and the summary parsed
    Clean,
    /// The run finished but some steps degraded; see `errors`
    Partial,
}

/// Final structured result of one task execution.
///
/// Always carries the full error log and intermediate state, so a caller can
/// distinguish a clean success from a success with recoverable issues.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskReport {
    pub status: ReportStatus,
    pub summary: String,
    pub goal: String,
    pub plan: Vec<String>,
    pub steps_total: usize,
    pub steps_with_errors: usize,
    pub tool_results: HashMap<String, Value>,
    pub intermediate: Vec<IntermediateResult>,
    pub errors: Vec<StepError>,
}

/// Executes a task's plan step by step.
///
/// # State machine
/// `not started -> running(step i) -> completed | failed`
///
/// The executor never aborts a plan because one step failed: failures are
/// recorded in the context and execution advances to the next step, and the
/// terminal synthesis phase always runs. The two exceptions are a not-ready
/// generation client (fails before any step) and cancellation.
pub struct PlanExecutor {
    llm: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
    model: String,
    planner: PlanGenerator,
}

impl PlanExecutor {
    pub fn new(llm: Arc<dyn LlmClient>, tools: Arc<ToolRegistry>, model: String) -> Self {
        let planner = PlanGenerator::new(Arc::clone(&llm), model.clone());
        Self {
            llm,
            tools,
            model,
            planner,
        }
    }

    /// Run the full plan for a task and produce its report.
    ///
    /// # Errors
    /// - `EngineError::NotReady` when the generation client is unavailable
    ///   (no steps run)
    /// - `EngineError::Cancelled` when `cancel` fires; in-flight step work is
    ///   dropped rather than awaited
    pub async fn execute(
        &self,
        task: &Task,
        cancel: &CancellationToken,
    ) -> Result<TaskReport, EngineError> {
        if !self.llm.is_ready() {
            return Err(EngineError::NotReady);
        }

        let plan = tokio::select! {
            _ = cancel.cancelled() => return Err(EngineError::Cancelled),
            plan = self.planner.generate(&task.task_type, &task.goal) => plan,
        };

        tracing::info!(
            task_id = %task.id,
            steps = plan.len(),
            "Executing plan"
        );

        let mut ctx = ExecutionContext::new(task, plan);

        for index in 0..ctx.plan.len() {
            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            ctx.current_step = index;
            let step = ctx.plan.steps()[index].clone();

            tokio::select! {
                _ = cancel.cancelled() => return Err(EngineError::Cancelled),
                _ = self.run_step(index, &step, &mut ctx) => {}
            }
        }

        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        Ok(self.synthesize(&ctx).await)
    }

    /// Execute one plan step. All failures are recorded into the context;
    /// this method never propagates them.
    async fn run_step(&self, index: usize, step: &str, ctx: &mut ExecutionContext) {
        tracing::debug!(task_id = %ctx.task_id, step = index, "Running step: {}", step);

        let messages = [
            ChatMessage::system(
                "You are a recruiting task executor. Use the available tools when \
                 the step calls for a domain action; otherwise reply with a short \
                 note on what you concluded.",
            ),
            ChatMessage::user(format!(
                "Current step: {}\n\n{}",
                step,
                ctx.digest()
            )),
        ];
        let schemas = self.tools.get_tool_schemas();

        let response = match self
            .llm
            .chat_completion(&self.model, &messages, Some(&schemas))
            .await
        {
            Ok(response) => response,
            Err(e) => {
                ctx.record_error(index, "generation", &e.to_string());
                return;
            }
        };

        for call in response.tool_calls.unwrap_or_default() {
            let name = call.function.name;
            let raw_args = call.function.arguments;

            let args: Value = if raw_args.trim().is_empty() {
                Value::Object(Default::default())
            } else {
                match serde_json::from_str(&raw_args) {
                    Ok(value) => value,
                    Err(e) => {
                        ctx.record_error(
                            index,
                            &name,
                            &format!("Malformed tool arguments: {}", e),
                        );
                        continue;
                    }
                }
            };

            match self.tools.execute(&name, args).await {
                Ok(result) => {
                    tracing::debug!(step = index, tool = %name, "Tool call succeeded");
                    ctx.record_tool_result(index, &name, result);
                }
                Err(e) => ctx.record_error(index, &name, &e.to_string()),
            }
        }

        if let Some(text) = response.content {
            if !text.trim().is_empty() {
                ctx.record_text(index, text);
            }
        }
    }

    /// Terminal synthesis: always produces a report, degrading to `partial`
    /// with a stock summary when the narrative summary cannot be obtained.
    async fn synthesize(&self, ctx: &ExecutionContext) -> TaskReport {
        let messages = [
            ChatMessage::system(
                "Summarize the outcome of a completed recruiting task. \
                 Reply with a single JSON object: {\"summary\": \"...\"}",
            ),
            ChatMessage::user(ctx.digest()),
        ];

        let summary = match self.llm.chat_completion(&self.model, &messages, None).await {
            Ok(response) => response
                .content
                .as_deref()
                .and_then(parse::extract_json)
                .and_then(|v| v.get("summary").and_then(Value::as_str).map(str::to_string)),
            Err(e) => {
                tracing::warn!(task_id = %ctx.task_id, "Summary generation failed: {}", e);
                None
            }
        };

        let degraded = summary.is_none();
        let summary = summary.unwrap_or_else(|| {
            format!(
                "Executed {} plan steps ({} with errors); see tool results and \
                 intermediate log for details.",
                ctx.plan.len(),
                ctx.steps_with_errors()
            )
        });

        let status = if degraded || !ctx.errors.is_empty() {
            ReportStatus::Partial
        } else {
            ReportStatus::Clean
        };

        TaskReport {
            status,
            summary,
            goal: ctx.goal.clone(),
            plan: ctx.plan.steps().to_vec(),
            steps_total: ctx.plan.len(),
            steps_with_errors: ctx.steps_with_errors(),
            tool_results: ctx.tool_results.clone(),
            intermediate: ctx.intermediate.clone(),
            errors: ctx.errors.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Plan;
    use crate::llm::{ChatResponse, FunctionCall, ToolCall, ToolDefinition};
    use crate::tools::Tool;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// LLM double that replays a fixed reply script, then echoes a default.
    struct ScriptedLlm {
        ready: bool,
        script: Mutex<VecDeque<anyhow::Result<ChatResponse>>>,
    }

    impl ScriptedLlm {
        fn new(script: Vec<anyhow::Result<ChatResponse>>) -> Self {
            Self {
                ready: true,
                script: Mutex::new(script.into()),
            }
        }

        fn not_ready() -> Self {
            Self {
                ready: false,
                script: Mutex::new(VecDeque::new()),
            }
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        fn is_ready(&self) -> bool {
            self.ready
        }

        async fn chat_completion(
            &self,
            _model: &str,
            _messages: &[ChatMessage],
            _tools: Option<&[ToolDefinition]>,
        ) -> anyhow::Result<ChatResponse> {
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(ChatResponse::text("ok")))
        }
    }

    struct CountingTool;

    #[async_trait]
    impl Tool for CountingTool {
        fn name(&self) -> &str {
            "count_candidates"
        }

        fn description(&self) -> &str {
            "Counts candidates"
        }

        fn parameters_schema(&self) -> Value {
            json!({"type": "object", "properties": {}})
        }

        async fn execute(&self, args: Value) -> anyhow::Result<Value> {
            if args.get("fail").is_some() {
                anyhow::bail!("handler exploded")
            }
            Ok(json!({"count": 42}))
        }
    }

    fn tool_call(name: &str, arguments: &str) -> ToolCall {
        ToolCall {
            id: "call-1".to_string(),
            call_type: "function".to_string(),
            function: FunctionCall {
                name: name.to_string(),
                arguments: arguments.to_string(),
            },
        }
    }

    fn tool_reply(name: &str, arguments: &str) -> ChatResponse {
        ChatResponse {
            tool_calls: Some(vec![tool_call(name, arguments)]),
            ..Default::default()
        }
    }

    fn registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::empty();
        registry.register(Arc::new(CountingTool));
        Arc::new(registry)
    }

    fn executor(script: Vec<anyhow::Result<ChatResponse>>) -> PlanExecutor {
        PlanExecutor::new(
            Arc::new(ScriptedLlm::new(script)),
            registry(),
            "test-model".to_string(),
        )
    }

    fn task() -> Task {
        Task::new("candidate_search", "find rust engineers", json!({}))
    }

    const PLAN_2: &str = r#"["Search sources", "Summarize findings"]"#;

    #[tokio::test]
    async fn not_ready_client_is_a_configuration_error() {
        let executor = PlanExecutor::new(
            Arc::new(ScriptedLlm::not_ready()),
            registry(),
            "test-model".to_string(),
        );
        let err = executor
            .execute(&task(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotReady));
    }

    #[tokio::test]
    async fn unparsable_plan_reply_still_executes_fallback_plan() {
        // Plan call returns garbage; the three fallback steps plus synthesis
        // all draw on the default "ok" reply.
        let executor = executor(vec![Ok(ChatResponse::text("no plan for you"))]);
        let report = executor
            .execute(&task(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.steps_total, 3);
        assert_eq!(report.plan, Plan::fallback().steps());
    }

    #[tokio::test]
    async fn step_error_is_isolated_and_later_steps_run() {
        let executor = executor(vec![
            Ok(ChatResponse::text(PLAN_2)),
            Err(anyhow::anyhow!("model unavailable")), // step 0
            Ok(ChatResponse::text("step 1 fine")),     // step 1
            Ok(ChatResponse::text(r#"{"summary": "done"}"#)),
        ]);
        let report = executor
            .execute(&task(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.status, ReportStatus::Partial);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].step, 0);
        assert_eq!(report.errors[0].origin, "generation");
        // Step 1 still produced its note.
        assert!(report
            .intermediate
            .iter()
            .any(|r| r.step == 1 && r.origin == "text"));
    }

    #[tokio::test]
    async fn all_steps_failing_still_reaches_synthesis() {
        let executor = executor(vec![
            Ok(ChatResponse::text(PLAN_2)),
            Err(anyhow::anyhow!("down")),
            Err(anyhow::anyhow!("still down")),
            Err(anyhow::anyhow!("summary down too")),
        ]);
        let report = executor
            .execute(&task(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.status, ReportStatus::Partial);
        assert_eq!(report.steps_with_errors, 2);
        // Degraded stock summary still references the run.
        assert!(report.summary.contains("plan steps"));
    }

    #[tokio::test]
    async fn tool_calls_are_dispatched_and_merged_into_context() {
        let executor = executor(vec![
            Ok(ChatResponse::text(r#"["Count the pool"]"#)),
            Ok(tool_reply("count_candidates", "{}")),
            Ok(ChatResponse::text(r#"{"summary": "counted"}"#)),
        ]);
        let report = executor
            .execute(&task(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.status, ReportStatus::Clean);
        assert_eq!(report.tool_results["count_candidates"]["count"], 42);
        assert_eq!(report.summary, "counted");
    }

    #[tokio::test]
    async fn unknown_tool_and_bad_arguments_are_step_errors_not_fatal() {
        let two_calls = ChatResponse {
            tool_calls: Some(vec![
                tool_call("no_such_tool", "{}"),
                tool_call("count_candidates", "{not json"),
            ]),
            ..Default::default()
        };
        let executor = executor(vec![
            Ok(ChatResponse::text(r#"["Use the tools"]"#)),
            Ok(two_calls),
            Ok(ChatResponse::text(r#"{"summary": "survived"}"#)),
        ]);
        let report = executor
            .execute(&task(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.status, ReportStatus::Partial);
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors.iter().any(|e| e.message.contains("Unknown tool")));
        assert!(report
            .errors
            .iter()
            .any(|e| e.message.contains("Malformed tool arguments")));
        assert_eq!(report.summary, "survived");
    }

    #[tokio::test]
    async fn failing_tool_handler_is_recorded_with_tool_origin() {
        let executor = executor(vec![
            Ok(ChatResponse::text(r#"["Count the pool"]"#)),
            Ok(tool_reply("count_candidates", r#"{"fail": true}"#)),
            Ok(ChatResponse::text(r#"{"summary": "done"}"#)),
        ]);
        let report = executor
            .execute(&task(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].origin, "count_candidates");
        assert!(report.errors[0].message.contains("handler exploded"));
    }

    #[tokio::test]
    async fn cancellation_before_execution_fails_the_task() {
        let executor = executor(vec![]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = executor.execute(&task(), &cancel).await.unwrap_err();
        assert!(matches!(err, EngineError::Cancelled));
    }

    #[tokio::test]
    async fn unparsable_summary_degrades_to_partial() {
        let executor = executor(vec![
            Ok(ChatResponse::text(r#"["Only step"]"#)),
            Ok(ChatResponse::text("step note")),
            Ok(ChatResponse::text("not json")),
        ]);
        let report = executor
            .execute(&task(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.status, ReportStatus::Partial);
        assert!(report.errors.is_empty());
        // The raw context survives even without a narrative summary.
        assert!(report.intermediate.iter().any(|r| r.origin == "text"));
    }

    #[tokio::test]
    async fn free_text_replies_are_tagged_with_their_step() {
        let executor = executor(vec![
            Ok(ChatResponse::text(PLAN_2)),
            Ok(ChatResponse::text("first note")),
            Ok(ChatResponse::text("second note")),
            Ok(ChatResponse::text(r#"{"summary": "ok"}"#)),
        ]);
        let report = executor
            .execute(&task(), &CancellationToken::new())
            .await
            .unwrap();

        let steps: Vec<usize> = report.intermediate.iter().map(|r| r.step).collect();
        assert_eq!(steps, vec![0, 1]);
    }
}
