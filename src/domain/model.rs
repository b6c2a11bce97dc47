use crate::utils::error::{EstimateError, Result};
use crate::utils::validation::validate_non_negative;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fee categories in the order the deductible is consumed. `Ord` follows
/// that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FeeCategory {
    Provider,
    Facility,
    Imaging,
    Anesthesia,
}

impl FeeCategory {
    pub const ORDERED: [FeeCategory; 4] = [
        FeeCategory::Provider,
        FeeCategory::Facility,
        FeeCategory::Imaging,
        FeeCategory::Anesthesia,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FeeCategory::Provider => "Provider Fee",
            FeeCategory::Facility => "Facility Fee",
            FeeCategory::Imaging => "Imaging Fee",
            FeeCategory::Anesthesia => "Anesthesia Fee",
        }
    }
}

impl fmt::Display for FeeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeeItem {
    category: FeeCategory,
    amount: f64,
}

impl FeeItem {
    pub fn new(category: FeeCategory, amount: f64) -> Result<Self> {
        validate_non_negative(category.label(), amount)?;
        Ok(Self { category, amount })
    }

    pub fn category(&self) -> FeeCategory {
        self.category
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }
}

/// Fee schedule for one procedure at one ZIP code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcedureCost {
    pub procedure: String,
    pub zip_code: String,
    pub fees: Vec<FeeItem>,
    pub total_cost: f64,
}

impl ProcedureCost {
    pub fn fee_sum(&self) -> f64 {
        self.fees.iter().map(FeeItem::amount).sum()
    }
}

/// Plan parameters. Rates are fractions, not percentages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsurancePlan {
    name: String,
    total_deductible: f64,
    remaining_deductible: f64,
    co_pay_rate: f64,
    co_insurance_rate: f64,
    out_of_pocket_max: f64,
}

impl InsurancePlan {
    pub fn new(
        name: impl Into<String>,
        total_deductible: f64,
        remaining_deductible: f64,
        co_pay_rate: f64,
        co_insurance_rate: f64,
        out_of_pocket_max: f64,
    ) -> Result<Self> {
        validate_non_negative("Total Deductible", total_deductible)?;
        validate_non_negative("Remaining Deductible", remaining_deductible)?;
        validate_non_negative("Out-of-Pocket Max", out_of_pocket_max)?;

        if remaining_deductible > total_deductible {
            return Err(EstimateError::DataError {
                message: format!(
                    "remaining deductible {} exceeds total deductible {}",
                    remaining_deductible, total_deductible
                ),
            });
        }

        let invalid_rate = |reason: String| EstimateError::InvalidRate {
            co_pay_rate,
            co_insurance_rate,
            reason,
        };
        for (label, rate) in [("co-pay", co_pay_rate), ("co-insurance", co_insurance_rate)] {
            if !rate.is_finite() || !(0.0..=1.0).contains(&rate) {
                return Err(invalid_rate(format!("{} rate must be within [0, 1]", label)));
            }
        }
        if co_pay_rate + co_insurance_rate > 1.0 + f64::EPSILON {
            return Err(invalid_rate(
                "combined rate exceeds 100% of the residual cost".to_string(),
            ));
        }

        Ok(Self {
            name: name.into(),
            total_deductible,
            remaining_deductible,
            co_pay_rate,
            co_insurance_rate,
            out_of_pocket_max,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn total_deductible(&self) -> f64 {
        self.total_deductible
    }

    pub fn remaining_deductible(&self) -> f64 {
        self.remaining_deductible
    }

    pub fn co_pay_rate(&self) -> f64 {
        self.co_pay_rate
    }

    pub fn co_insurance_rate(&self) -> f64 {
        self.co_insurance_rate
    }

    pub fn out_of_pocket_max(&self) -> f64 {
        self.out_of_pocket_max
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Allocation {
    pub applied_to_deductible: f64,
    pub covered_by_insurance: f64,
    pub out_of_pocket: f64,
}

impl Allocation {
    pub fn total(&self) -> f64 {
        self.applied_to_deductible + self.covered_by_insurance + self.out_of_pocket
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryAllocation {
    pub category: FeeCategory,
    pub cost: f64,
    #[serde(flatten)]
    pub allocation: Allocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Totals {
    pub applied_to_deductible: f64,
    pub covered_by_insurance: f64,
    /// Capped at the plan's out-of-pocket maximum.
    pub out_of_pocket: f64,
    pub uncapped_out_of_pocket: f64,
    pub cap_applied: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub procedure: String,
    pub zip_code: String,
    pub plan_name: String,
    pub total_cost: f64,
    pub categories: Vec<CategoryAllocation>,
    pub totals: Totals,
    pub remaining_deductible_after: f64,
}

impl CostBreakdown {
    /// Amount of the total cost that the capped totals no longer account for.
    /// Non-zero only when the out-of-pocket cap binds.
    pub fn unreconciled_amount(&self) -> f64 {
        let accounted = self.totals.applied_to_deductible
            + self.totals.covered_by_insurance
            + self.totals.out_of_pocket;
        (self.categories.iter().map(|c| c.cost).sum::<f64>() - accounted).max(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Estimate {
    Found(CostBreakdown),
    NoData { procedure: String, zip_code: String },
}

impl Estimate {
    pub fn breakdown(&self) -> Option<&CostBreakdown> {
        match self {
            Estimate::Found(breakdown) => Some(breakdown),
            Estimate::NoData { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EstimateRequest {
    pub procedure: String,
    pub zip_code: String,
    pub plan_name: String,
}
