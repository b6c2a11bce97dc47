pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::csv_tables::{CostTable, PlanTable};
pub use adapters::openai::OpenAiChatClient;
pub use adapters::storage::LocalStorage;
pub use app::assistant::CostAssistant;
pub use config::toml_config::TomlConfig;
pub use core::estimator::EstimateEngine;
pub use domain::model::{
    Allocation, CostBreakdown, Estimate, EstimateRequest, FeeCategory, FeeItem, InsurancePlan,
    Totals,
};
pub use utils::error::{EstimateError, Result};
