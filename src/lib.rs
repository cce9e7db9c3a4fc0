//! # talentflow
//!
//! Agent task orchestration engine for a recruiting platform.
//!
//! This library provides:
//! - A plan-driven task executor that turns a sourcing goal into an ordered
//!   step list and runs it against an LLM with tool dispatch
//! - Concurrent candidate collection across independent sources with
//!   deduplication and cross-source verification
//! - An explainable multi-factor candidate ranker and pool insights
//! - A narrow HTTP API for submitting, inspecting, and cancelling tasks
//!
//! ## Task Flow
//! 1. Receive a task via API (goal + parameters), persisted as `pending`
//! 2. Generate an execution plan (LLM, with a fixed fallback plan)
//! 3. Execute each step sequentially; steps may dispatch tools
//!    (`search_candidates`, `analyze_job_description`,
//!    `generate_compliance_report`)
//! 4. Synthesize a final report; store it and mark the task terminal
//!
//! ## Modules
//! - `engine`: plan generation, step execution, terminal synthesis
//! - `tools`: tool trait, registry, and the three domain handlers
//! - `sourcing`: source connectors, collector, validator, ranker
//! - `insights`: pool statistics and outreach recommendations
//! - `store`: task lifecycle store (memory/SQLite) and blob store
//! - `llm`: LLM client abstraction (OpenRouter-compatible)

pub mod api;
pub mod config;
pub mod engine;
pub mod insights;
pub mod llm;
pub mod sourcing;
pub mod store;
pub mod task;
pub mod tools;

pub use config::Config;
pub use engine::{PlanExecutor, TaskReport};
pub use task::{Task, TaskId, TaskStatus};
