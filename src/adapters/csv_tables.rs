use crate::core::{FeeSource, PlanSource, Storage};
use crate::domain::model::{FeeCategory, FeeItem, InsurancePlan, ProcedureCost};
use crate::utils::error::{EstimateError, Result};
use serde::Deserialize;
use std::collections::HashSet;

#[derive(Debug, Deserialize)]
struct CostRow {
    #[serde(rename = "Procedure")]
    procedure: String,
    #[serde(rename = "ZIP Code")]
    zip_code: String,
    #[serde(rename = "Provider Fee")]
    provider_fee: f64,
    #[serde(rename = "Facility Fee")]
    facility_fee: f64,
    #[serde(rename = "Imaging Fee")]
    imaging_fee: f64,
    #[serde(rename = "Anesthesia Fee")]
    anesthesia_fee: f64,
    #[serde(rename = "Total Estimated Cost")]
    total_estimated_cost: f64,
}

impl CostRow {
    fn into_cost(self) -> Result<ProcedureCost> {
        let amounts = [
            self.provider_fee,
            self.facility_fee,
            self.imaging_fee,
            self.anesthesia_fee,
        ];
        let fees = FeeCategory::ORDERED
            .iter()
            .zip(amounts)
            .map(|(category, amount)| FeeItem::new(*category, amount))
            .collect::<Result<Vec<_>>>()?;

        crate::utils::validation::validate_non_negative(
            "Total Estimated Cost",
            self.total_estimated_cost,
        )?;

        Ok(ProcedureCost {
            procedure: self.procedure.trim().to_string(),
            zip_code: self.zip_code.trim().to_string(),
            fees,
            total_cost: self.total_estimated_cost,
        })
    }
}

#[derive(Debug, Deserialize)]
struct PlanRow {
    #[serde(rename = "Plan Name")]
    plan_name: String,
    #[serde(rename = "Total Deductible")]
    total_deductible: f64,
    #[serde(rename = "Remaining Deductible")]
    remaining_deductible: f64,
    #[serde(rename = "Co-Pay (%)")]
    co_pay_percent: f64,
    #[serde(rename = "Co-Insurance (%)")]
    co_insurance_percent: f64,
    #[serde(rename = "Out-of-Pocket Max")]
    out_of_pocket_max: f64,
}

impl PlanRow {
    fn into_plan(self) -> Result<InsurancePlan> {
        InsurancePlan::new(
            self.plan_name.trim(),
            self.total_deductible,
            self.remaining_deductible,
            self.co_pay_percent / 100.0,
            self.co_insurance_percent / 100.0,
            self.out_of_pocket_max,
        )
    }
}

/// Parses every row, converting it with `convert`. Row numbers in errors are
/// 1-based and count the header line.
fn parse_rows<R, T>(
    table: &str,
    data: &[u8],
    convert: impl Fn(R) -> Result<T>,
) -> Result<Vec<T>>
where
    R: for<'de> Deserialize<'de>,
{
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data);

    let mut rows = Vec::new();
    for (index, record) in reader.deserialize::<R>().enumerate() {
        let line = index + 2;
        let row = record?;
        let value = convert(row).map_err(|e| EstimateError::DataError {
            message: format!("{} row {}: {}", table, line, e),
        })?;
        rows.push(value);
    }
    Ok(rows)
}

fn unique_in_order<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    values.filter(|v| seen.insert(*v)).collect()
}

#[derive(Debug, Clone, Default)]
pub struct CostTable {
    rows: Vec<ProcedureCost>,
}

impl CostTable {
    pub fn from_csv_bytes(data: &[u8]) -> Result<Self> {
        let rows = parse_rows("cost data", data, CostRow::into_cost)?;
        tracing::debug!("Loaded {} cost rows", rows.len());
        Ok(Self { rows })
    }

    pub async fn load<S: Storage>(storage: &S, path: &str) -> Result<Self> {
        let data = storage.read_file(path).await?;
        Self::from_csv_bytes(&data)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl FeeSource for CostTable {
    fn find_cost(&self, procedure: &str, zip_code: &str) -> Option<&ProcedureCost> {
        let zip_code = zip_code.trim();
        self.rows
            .iter()
            .find(|row| row.procedure == procedure && row.zip_code == zip_code)
    }

    fn procedures(&self) -> Vec<&str> {
        unique_in_order(self.rows.iter().map(|row| row.procedure.as_str()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct PlanTable {
    plans: Vec<InsurancePlan>,
}

impl PlanTable {
    pub fn from_csv_bytes(data: &[u8]) -> Result<Self> {
        let plans = parse_rows("insurance plans", data, PlanRow::into_plan)?;
        tracing::debug!("Loaded {} insurance plans", plans.len());
        Ok(Self { plans })
    }

    pub async fn load<S: Storage>(storage: &S, path: &str) -> Result<Self> {
        let data = storage.read_file(path).await?;
        Self::from_csv_bytes(&data)
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

impl PlanSource for PlanTable {
    fn find_plan(&self, plan_name: &str) -> Option<&InsurancePlan> {
        self.plans.iter().find(|plan| plan.name() == plan_name)
    }

    fn plan_names(&self) -> Vec<&str> {
        unique_in_order(self.plans.iter().map(|plan| plan.name()))
    }
}
