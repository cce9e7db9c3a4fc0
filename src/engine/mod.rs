//! Plan-driven task execution.
//!
//! The engine turns a task goal into an ordered plan (`planner`), executes
//! each step sequentially against the LLM with tool dispatch (`executor`),
//! and threads a per-task mutable context (`context`) across steps. Step
//! failures are isolated and accumulated; only a missing generation
//! capability or an external cancellation fails the task as a whole.

mod context;
mod executor;
mod planner;

pub use context::{ExecutionContext, IntermediateResult, StepError};
pub use executor::{EngineError, PlanExecutor, ReportStatus, TaskReport};
pub use planner::{Plan, PlanGenerator};
