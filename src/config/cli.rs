use super::toml_config::TomlConfig;
use crate::utils::error::Result;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "care-estimator")]
#[command(about = "Estimate a procedure's cost under an insurance plan")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Cost table CSV (overrides data.cost_data_path)
    #[arg(long)]
    pub cost_data: Option<String>,

    /// Insurance plan CSV (overrides data.insurance_plans_path)
    #[arg(long)]
    pub plans: Option<String>,

    #[arg(short, long)]
    pub procedure: Option<String>,

    #[arg(short, long)]
    pub zip: Option<String>,

    #[arg(long)]
    pub plan: Option<String>,

    /// Question for the chat assistant about this estimate
    #[arg(short, long)]
    pub question: Option<String>,

    /// List known procedures and plans, then exit
    #[arg(long)]
    pub list: bool,

    /// Output format: table or json (overrides output.format)
    #[arg(long)]
    pub format: Option<String>,

    /// Export the breakdown rows to this CSV file
    #[arg(short, long)]
    pub output: Option<String>,

    #[arg(long, help = "Disable the chat assistant")]
    pub no_assistant: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

impl CliConfig {
    /// Loads the TOML file if one was given and applies flag overrides.
    pub fn resolve(&self) -> Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };

        if let Some(path) = &self.cost_data {
            config.data.cost_data_path = path.clone();
        }
        if let Some(path) = &self.plans {
            config.data.insurance_plans_path = path.clone();
        }
        if let Some(format) = &self.format {
            config.output.format = format.clone();
        }
        if self.no_assistant {
            config.assistant.enabled = false;
        }
        config.apply_env_api_key();

        Ok(config)
    }
}
