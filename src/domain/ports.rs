use crate::domain::model::{InsurancePlan, ProcedureCost};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait FeeSource: Send + Sync {
    fn find_cost(&self, procedure: &str, zip_code: &str) -> Option<&ProcedureCost>;
    fn procedures(&self) -> Vec<&str>;
}

pub trait PlanSource: Send + Sync {
    fn find_plan(&self, plan_name: &str) -> Option<&InsurancePlan>;
    fn plan_names(&self) -> Vec<&str>;
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(&self, system_context: &str, question: &str) -> Result<String>;
}

pub trait ConfigProvider: Send + Sync {
    fn cost_data_path(&self) -> &str;
    fn insurance_plans_path(&self) -> &str;
    fn assistant_endpoint(&self) -> &str;
    fn assistant_model(&self) -> &str;
    fn assistant_api_key(&self) -> Option<&str>;
    fn assistant_timeout_seconds(&self) -> u64;
    fn output_format(&self) -> &str;
}
