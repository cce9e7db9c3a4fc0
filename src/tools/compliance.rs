//! Hiring compliance report tool.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::Tool;
use crate::llm::{parse, ChatMessage, LlmClient};

/// Compliance report with fixed sections.
///
/// Malformed generation output degrades to this type's default (all sections
/// empty) instead of failing the call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComplianceReport {
    #[serde(default)]
    pub required_certifications: Vec<String>,
    #[serde(default)]
    pub legal_requirements: Vec<String>,
    #[serde(default)]
    pub industry_standards: Vec<String>,
    #[serde(default)]
    pub risk_areas: Vec<String>,
    #[serde(default)]
    pub verification_steps: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ComplianceArgs {
    role: String,
    industry: String,
    #[serde(default)]
    location: Option<String>,
}

/// Generates a hiring compliance report for a role in a given industry and
/// jurisdiction.
pub struct GenerateComplianceReport {
    llm: Arc<dyn LlmClient>,
    model: String,
}

impl GenerateComplianceReport {
    pub fn new(llm: Arc<dyn LlmClient>, model: String) -> Self {
        Self { llm, model }
    }

    fn report_prompt(args: &ComplianceArgs) -> String {
        let location = args.location.as_deref().unwrap_or("any jurisdiction");
        format!(
            "Produce a hiring compliance report for the role '{}' in the '{}' \
             industry ({}).\n\n\
             Reply with a single JSON object:\n\
             {{\n\
               \"required_certifications\": [\"...\"],\n\
               \"legal_requirements\": [\"...\"],\n\
               \"industry_standards\": [\"...\"],\n\
               \"risk_areas\": [\"...\"],\n\
               \"verification_steps\": [\"...\"]\n\
             }}",
            args.role, args.industry, location
        )
    }
}

#[async_trait]
impl Tool for GenerateComplianceReport {
    fn name(&self) -> &str {
        "generate_compliance_report"
    }

    fn description(&self) -> &str {
        "Generate a hiring compliance report for a role: required certifications, \
         legal requirements, industry standards, risk areas, and verification steps."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "role": {
                    "type": "string",
                    "description": "Role title, e.g. 'Registered Nurse'"
                },
                "industry": {
                    "type": "string",
                    "description": "Industry, e.g. 'healthcare'"
                },
                "location": {
                    "type": "string",
                    "description": "Jurisdiction, e.g. 'Germany'"
                }
            },
            "required": ["role", "industry"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let args: ComplianceArgs = serde_json::from_value(args)
            .map_err(|e| anyhow::anyhow!("Invalid generate_compliance_report arguments: {}", e))?;

        let messages = [
            ChatMessage::system(
                "You are a hiring compliance specialist. Reply with exactly one JSON object.",
            ),
            ChatMessage::user(Self::report_prompt(&args)),
        ];

        let response = self
            .llm
            .chat_completion(&self.model, &messages, None)
            .await?;

        let reply = response.content.unwrap_or_default();
        let report: ComplianceReport = parse::parse_or_default(&reply);

        Ok(serde_json::to_value(report)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ChatResponse, ToolDefinition};

    struct CannedLlm {
        reply: String,
    }

    #[async_trait]
    impl LlmClient for CannedLlm {
        fn is_ready(&self) -> bool {
            true
        }

        async fn chat_completion(
            &self,
            _model: &str,
            _messages: &[ChatMessage],
            _tools: Option<&[ToolDefinition]>,
        ) -> anyhow::Result<ChatResponse> {
            Ok(ChatResponse::text(self.reply.clone()))
        }
    }

    fn tool(reply: &str) -> GenerateComplianceReport {
        GenerateComplianceReport::new(
            Arc::new(CannedLlm {
                reply: reply.to_string(),
            }),
            "test-model".to_string(),
        )
    }

    #[tokio::test]
    async fn builds_structured_report() {
        let reply = r#"{"required_certifications": ["RN license"], "legal_requirements": ["Background check"], "industry_standards": [], "risk_areas": ["License expiry"], "verification_steps": ["Verify with state board"]}"#;
        let result = tool(reply)
            .execute(json!({"role": "Registered Nurse", "industry": "healthcare"}))
            .await
            .unwrap();

        assert_eq!(result["required_certifications"], json!(["RN license"]));
        assert_eq!(result["verification_steps"], json!(["Verify with state board"]));
    }

    #[tokio::test]
    async fn malformed_reply_degrades_to_empty_report() {
        let result = tool("no structure")
            .execute(json!({"role": "Nurse", "industry": "healthcare"}))
            .await
            .unwrap();

        assert_eq!(result["required_certifications"], json!([]));
        assert_eq!(result["risk_areas"], json!([]));
    }

    #[tokio::test]
    async fn missing_required_args_rejected() {
        let err = tool("{}")
            .execute(json!({"role": "Nurse"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid generate_compliance_report"));
    }
}
