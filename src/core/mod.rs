pub mod allocator;
pub mod estimator;

pub use crate::domain::model::{Estimate, EstimateRequest};
pub use crate::domain::ports::{ChatClient, ConfigProvider, FeeSource, PlanSource, Storage};
pub use crate::utils::error::Result;
