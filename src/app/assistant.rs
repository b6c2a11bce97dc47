use crate::adapters::openai::OpenAiChatClient;
use crate::app::report::NO_DATA_MESSAGE;
use crate::config::toml_config::TomlConfig;
use crate::core::{ChatClient, ConfigProvider};
use crate::domain::model::{CostBreakdown, Estimate};
use crate::utils::currency::format_usd;
use crate::utils::error::{EstimateError, Result};
use std::time::Duration;

/// Builds the system message that grounds the assistant in this estimate.
pub fn build_context(breakdown: &CostBreakdown) -> String {
    format!(
        "You are a helpful assistant that provides cost breakdowns and insurance coverage details for healthcare procedures.\n\
         Here is the user's data:\n\
         - Procedure: {}\n\
         - ZIP Code: {}\n\
         - Total Estimated Cost: {}\n\
         - Out-of-Pocket Cost (User Pays): {}\n\
         - Covered by Insurance: {}\n\
         \n\
         Use this information to answer the user's question.",
        breakdown.procedure,
        breakdown.zip_code,
        format_usd(breakdown.total_cost),
        format_usd(breakdown.totals.out_of_pocket),
        format_usd(breakdown.totals.covered_by_insurance),
    )
}

fn no_data_reply() -> String {
    format!("⚠️ {}", NO_DATA_MESSAGE)
}

pub struct CostAssistant<C: ChatClient> {
    client: C,
}

impl<C: ChatClient> CostAssistant<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Answers `question` about `estimate`. Never fails: service errors come
    /// back as a displayable message.
    pub async fn ask(&self, question: &str, estimate: &Estimate) -> String {
        let Some(breakdown) = estimate.breakdown() else {
            return no_data_reply();
        };

        let context = build_context(breakdown);
        match self.client.complete(&context, question).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(
                    "Chat assistant failed: {} (Category: {:?}, Severity: {:?})",
                    e,
                    e.category(),
                    e.severity()
                );
                format!("⚠️ Error: {}", e)
            }
        }
    }
}

impl CostAssistant<OpenAiChatClient> {
    pub fn from_config(config: &TomlConfig) -> Result<Self> {
        if !config.assistant.enabled {
            return Err(EstimateError::ConfigValidationError {
                field: "assistant.enabled".to_string(),
                message: "the chat assistant is disabled".to_string(),
            });
        }
        let api_key = config
            .assistant_api_key()
            .ok_or_else(|| EstimateError::MissingConfigError {
                field: "assistant.api_key".to_string(),
            })?;

        let client = OpenAiChatClient::new(
            config.assistant_endpoint(),
            config.assistant_model(),
            api_key,
            Duration::from_secs(config.assistant_timeout_seconds()),
        )?;
        Ok(Self::new(client))
    }
}

/// Answers `question` with the assistant described by `config`. An estimate
/// without data is answered before any client is built, so a missing key or
/// a disabled assistant does not hide the no-data message.
pub async fn ask_configured(
    config: &TomlConfig,
    question: &str,
    estimate: &Estimate,
) -> String {
    if estimate.breakdown().is_none() {
        return no_data_reply();
    }
    match CostAssistant::from_config(config) {
        Ok(assistant) => assistant.ask(question, estimate).await,
        Err(e) => {
            tracing::warn!("Chat assistant unavailable: {}", e);
            format!("⚠️ {}", e.user_friendly_message())
        }
    }
}
