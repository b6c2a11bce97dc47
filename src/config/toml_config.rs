use crate::core::ConfigProvider;
use crate::utils::error::{EstimateError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4";
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const OUTPUT_FORMATS: [&str; 2] = ["table", "json"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_cost_data_path")]
    pub cost_data_path: String,
    #[serde(default = "default_insurance_plans_path")]
    pub insurance_plans_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub api_key: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_cost_data_path() -> String {
    "data/cost_data.csv".to_string()
}

fn default_insurance_plans_path() -> String {
    "data/insurance_plans.csv".to_string()
}

fn default_true() -> bool {
    true
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_format() -> String {
    "table".to_string()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            cost_data_path: default_cost_data_path(),
            insurance_plans_path: default_insurance_plans_path(),
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: None,
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
        }
    }
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"))
}

impl TomlConfig {
    /// Loads the configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EstimateError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EstimateError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` references with environment values. Undefined
    /// variables are left as written.
    fn substitute_env_vars(content: &str) -> String {
        env_var_pattern()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_csv_path("data.cost_data_path", &self.data.cost_data_path)?;
        validation::validate_csv_path(
            "data.insurance_plans_path",
            &self.data.insurance_plans_path,
        )?;
        validation::validate_one_of("output.format", &self.output.format, &OUTPUT_FORMATS)?;

        if self.assistant.enabled {
            validation::validate_url("assistant.endpoint", &self.assistant.endpoint)?;
            validation::validate_non_empty_string("assistant.model", &self.assistant.model)?;
            validation::validate_positive_number(
                "assistant.timeout_seconds",
                self.assistant.timeout_seconds,
                1,
            )?;
        }

        Ok(())
    }

    /// Fills a missing API key from `OPENAI_API_KEY`.
    pub fn apply_env_api_key(&mut self) {
        if self.assistant_api_key().is_some() {
            return;
        }
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.assistant.api_key = Some(key);
            }
        }
    }
}

impl ConfigProvider for TomlConfig {
    fn cost_data_path(&self) -> &str {
        &self.data.cost_data_path
    }

    fn insurance_plans_path(&self) -> &str {
        &self.data.insurance_plans_path
    }

    fn assistant_endpoint(&self) -> &str {
        &self.assistant.endpoint
    }

    fn assistant_model(&self) -> &str {
        &self.assistant.model
    }

    fn assistant_api_key(&self) -> Option<&str> {
        self.assistant
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty() && !env_var_pattern().is_match(key))
    }

    fn assistant_timeout_seconds(&self) -> u64 {
        self.assistant.timeout_seconds
    }

    fn output_format(&self) -> &str {
        &self.output.format
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
