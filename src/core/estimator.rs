use crate::core::allocator::allocate;
use crate::domain::model::{CostBreakdown, Estimate, EstimateRequest};
use crate::domain::ports::{FeeSource, PlanSource};
use crate::utils::error::{EstimateError, Result};

/// Tolerance for comparing the table's precomputed total with the fee sum.
const TOTAL_MISMATCH_TOLERANCE: f64 = 0.005;

pub struct EstimateEngine<F: FeeSource, P: PlanSource> {
    fees: F,
    plans: P,
}

impl<F: FeeSource, P: PlanSource> EstimateEngine<F, P> {
    pub fn new(fees: F, plans: P) -> Self {
        Self { fees, plans }
    }

    pub fn fees(&self) -> &F {
        &self.fees
    }

    pub fn plans(&self) -> &P {
        &self.plans
    }

    pub fn estimate(&self, request: &EstimateRequest) -> Result<Estimate> {
        let plan = self.plans.find_plan(&request.plan_name).ok_or_else(|| {
            EstimateError::InvalidConfigValueError {
                field: "plan".to_string(),
                value: request.plan_name.clone(),
                reason: format!("Known plans: {}", self.plans.plan_names().join(", ")),
            }
        })?;

        let zip_code = request.zip_code.trim();
        let Some(cost) = self.fees.find_cost(&request.procedure, zip_code) else {
            tracing::info!(
                procedure = %request.procedure,
                zip_code,
                "no cost data for procedure and ZIP code"
            );
            return Ok(Estimate::NoData {
                procedure: request.procedure.clone(),
                zip_code: zip_code.to_string(),
            });
        };

        let fee_sum = cost.fee_sum();
        if (fee_sum - cost.total_cost).abs() > TOTAL_MISMATCH_TOLERANCE {
            tracing::warn!(
                procedure = %cost.procedure,
                zip_code = %cost.zip_code,
                fee_sum,
                total_cost = cost.total_cost,
                "precomputed total does not match the sum of fees"
            );
        }

        let run = allocate(&cost.fees, plan)?;
        tracing::info!(
            procedure = %cost.procedure,
            plan = plan.name(),
            out_of_pocket = run.totals.out_of_pocket,
            covered = run.totals.covered_by_insurance,
            cap_applied = run.totals.cap_applied,
            "estimate computed"
        );

        Ok(Estimate::Found(CostBreakdown {
            procedure: cost.procedure.clone(),
            zip_code: cost.zip_code.clone(),
            plan_name: plan.name().to_string(),
            total_cost: cost.total_cost,
            categories: run.categories,
            totals: run.totals,
            remaining_deductible_after: run.remaining_deductible,
        }))
    }
}
