//! Job description analysis tool.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::Tool;
use crate::llm::{parse, ChatMessage, LlmClient};

/// Structured requirements extracted from a free-text job description.
///
/// Malformed extraction output degrades to this type's default (all fields
/// empty) instead of failing the call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobRequirements {
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub preferred_skills: Vec<String>,
    #[serde(default)]
    pub min_experience_years: f32,
    #[serde(default)]
    pub seniority: Option<String>,
    #[serde(default)]
    pub key_responsibilities: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AnalyzeArgs {
    text: String,
}

/// Extracts required/preferred skills, experience floor, seniority, and key
/// responsibilities from a job description.
pub struct AnalyzeJobDescription {
    llm: Arc<dyn LlmClient>,
    model: String,
}

impl AnalyzeJobDescription {
    pub fn new(llm: Arc<dyn LlmClient>, model: String) -> Self {
        Self { llm, model }
    }

    fn extraction_prompt(text: &str) -> String {
        format!(
            "Extract the hiring requirements from this job description.\n\n\
             Job description:\n{}\n\n\
             Reply with a single JSON object:\n\
             {{\n\
               \"required_skills\": [\"...\"],\n\
               \"preferred_skills\": [\"...\"],\n\
               \"min_experience_years\": 0,\n\
               \"seniority\": \"junior|mid|senior|staff\",\n\
               \"key_responsibilities\": [\"...\"]\n\
             }}",
            text
        )
    }
}

#[async_trait]
impl Tool for AnalyzeJobDescription {
    fn name(&self) -> &str {
        "analyze_job_description"
    }

    fn description(&self) -> &str {
        "Analyze a free-text job description and extract required skills, \
         preferred skills, minimum experience, seniority level, and key \
         responsibilities as structured data."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "text": {
                    "type": "string",
                    "description": "The full job description text"
                }
            },
            "required": ["text"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let args: AnalyzeArgs = serde_json::from_value(args)
            .map_err(|e| anyhow::anyhow!("Invalid analyze_job_description arguments: {}", e))?;

        let messages = [
            ChatMessage::system(
                "You are a recruiting analyst. Reply with exactly one JSON object.",
            ),
            ChatMessage::user(Self::extraction_prompt(&args.text)),
        ];

        let response = self
            .llm
            .chat_completion(&self.model, &messages, None)
            .await?;

        let reply = response.content.unwrap_or_default();
        let requirements: JobRequirements = parse::parse_or_default(&reply);

        if requirements.required_skills.is_empty() {
            tracing::warn!("Job analysis produced no required skills; reply may be malformed");
        }

        Ok(serde_json::to_value(requirements)?)
    }
}
