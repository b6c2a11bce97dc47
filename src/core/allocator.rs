//! Cost allocation: splits each fee into the part applied to the deductible,
//! the part covered by insurance and the part the patient pays.

use crate::domain::model::{Allocation, CategoryAllocation, FeeItem, InsurancePlan, Totals};
use crate::utils::error::{EstimateError, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeductibleStep {
    pub applied: f64,
    pub residual: f64,
    pub remaining_deductible: f64,
}

/// Applies as much of `cost` to the remaining deductible as it can absorb.
///
/// When the remaining deductible equals the cost exactly, the whole deductible
/// is applied and the residual is zero.
pub fn apply_deductible(cost: f64, remaining_deductible: f64) -> DeductibleStep {
    if remaining_deductible > cost {
        DeductibleStep {
            applied: cost,
            residual: 0.0,
            remaining_deductible: remaining_deductible - cost,
        }
    } else {
        DeductibleStep {
            applied: remaining_deductible,
            residual: cost - remaining_deductible,
            remaining_deductible: 0.0,
        }
    }
}

/// Returns `(covered_by_insurance, patient_out_of_pocket)` for a post-deductible residual.
pub fn calculate_coverage(residual: f64, co_pay_rate: f64, co_insurance_rate: f64) -> (f64, f64) {
    let covered = residual * (co_pay_rate + co_insurance_rate);
    (covered, residual - covered)
}

/// Sums per-category allocations and caps the out-of-pocket total.
///
/// The cap is not pushed back into the per-category figures, and the amount
/// it removes is not moved to insurance coverage.
pub fn aggregate<'a, I>(allocations: I, out_of_pocket_max: f64) -> Totals
where
    I: IntoIterator<Item = &'a Allocation>,
{
    let (applied, covered, oop) = allocations.into_iter().fold(
        (0.0, 0.0, 0.0),
        |(applied, covered, oop), a| {
            (
                applied + a.applied_to_deductible,
                covered + a.covered_by_insurance,
                oop + a.out_of_pocket,
            )
        },
    );

    Totals {
        applied_to_deductible: applied,
        covered_by_insurance: covered,
        out_of_pocket: oop.min(out_of_pocket_max),
        uncapped_out_of_pocket: oop,
        cap_applied: oop > out_of_pocket_max,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AllocationRun {
    pub categories: Vec<CategoryAllocation>,
    pub totals: Totals,
    pub remaining_deductible: f64,
}

/// Allocates fees in category order (Provider, Facility, Imaging, Anesthesia)
/// whatever order they are passed in, threading the remaining deductible from
/// one fee to the next. Each category may appear at most once.
pub fn allocate(fees: &[FeeItem], plan: &InsurancePlan) -> Result<AllocationRun> {
    let mut ordered: Vec<&FeeItem> = fees.iter().collect();
    ordered.sort_by_key(|fee| fee.category());
    if let Some(pair) = ordered
        .windows(2)
        .find(|pair| pair[0].category() == pair[1].category())
    {
        return Err(EstimateError::DataError {
            message: format!("duplicate fee category: {}", pair[0].category()),
        });
    }

    let (categories, remaining_deductible) = ordered.into_iter().fold(
        (Vec::with_capacity(fees.len()), plan.remaining_deductible()),
        |(mut acc, remaining), fee| {
            let step = apply_deductible(fee.amount(), remaining);
            let (covered, out_of_pocket) =
                calculate_coverage(step.residual, plan.co_pay_rate(), plan.co_insurance_rate());

            tracing::debug!(
                category = %fee.category(),
                cost = fee.amount(),
                applied = step.applied,
                covered,
                out_of_pocket,
                remaining_deductible = step.remaining_deductible,
                "allocated fee"
            );

            acc.push(CategoryAllocation {
                category: fee.category(),
                cost: fee.amount(),
                allocation: Allocation {
                    applied_to_deductible: step.applied,
                    covered_by_insurance: covered,
                    out_of_pocket,
                },
            });
            (acc, step.remaining_deductible)
        },
    );

    let totals = aggregate(
        categories.iter().map(|c| &c.allocation),
        plan.out_of_pocket_max(),
    );

    Ok(AllocationRun {
        categories,
        totals,
        remaining_deductible,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::FeeCategory;

    const EPS: f64 = 1e-9;

    fn fees(amounts: [f64; 4]) -> Vec<FeeItem> {
        FeeCategory::ORDERED
            .iter()
            .zip(amounts)
            .map(|(c, a)| FeeItem::new(*c, a).unwrap())
            .collect()
    }

    #[test]
    fn test_deductible_absorbs_whole_cost() {
        let step = apply_deductible(150.0, 400.0);
        assert_eq!(step.applied, 150.0);
        assert_eq!(step.residual, 0.0);
        assert_eq!(step.remaining_deductible, 250.0);
    }

    #[test]
    fn test_deductible_exhausted_by_cost() {
        let step = apply_deductible(500.0, 200.0);
        assert_eq!(step.applied, 200.0);
        assert_eq!(step.residual, 300.0);
        assert_eq!(step.remaining_deductible, 0.0);
    }

    #[test]
    fn test_deductible_equal_to_cost_takes_exhausted_branch() {
        let step = apply_deductible(300.0, 300.0);
        assert_eq!(step.applied, 300.0);
        assert_eq!(step.residual, 0.0);
        assert_eq!(step.remaining_deductible, 0.0);
    }

    #[test]
    fn test_zero_deductible_passes_cost_through() {
        let step = apply_deductible(80.0, 0.0);
        assert_eq!(step.applied, 0.0);
        assert_eq!(step.residual, 80.0);
    }

    #[test]
    fn test_coverage_split() {
        let (covered, oop) = calculate_coverage(300.0, 0.1, 0.1);
        assert!((covered - 60.0).abs() < EPS);
        assert!((oop - 240.0).abs() < EPS);
    }

    #[test]
    fn test_reference_example() {
        let plan = InsurancePlan::new("Silver", 1000.0, 200.0, 0.1, 0.1, 500.0).unwrap();
        let run = allocate(&fees([500.0, 300.0, 200.0, 100.0]), &plan).unwrap();

        let expected = [
            (200.0, 60.0, 240.0),
            (0.0, 60.0, 240.0),
            (0.0, 40.0, 160.0),
            (0.0, 20.0, 80.0),
        ];
        for (row, (applied, covered, oop)) in run.categories.iter().zip(expected) {
            assert!((row.allocation.applied_to_deductible - applied).abs() < EPS);
            assert!((row.allocation.covered_by_insurance - covered).abs() < EPS);
            assert!((row.allocation.out_of_pocket - oop).abs() < EPS);
        }

        assert!((run.totals.applied_to_deductible - 200.0).abs() < EPS);
        assert!((run.totals.covered_by_insurance - 180.0).abs() < EPS);
        assert!((run.totals.uncapped_out_of_pocket - 720.0).abs() < EPS);
        assert_eq!(run.totals.out_of_pocket, 500.0);
        assert!(run.totals.cap_applied);
        assert_eq!(run.remaining_deductible, 0.0);
    }

    #[test]
    fn test_deductible_threads_in_category_order() {
        let plan = InsurancePlan::new("HDHP", 3000.0, 650.0, 0.0, 0.8, 6000.0).unwrap();
        let run = allocate(&fees([400.0, 200.0, 100.0, 50.0]), &plan).unwrap();

        let applied: Vec<f64> = run
            .categories
            .iter()
            .map(|c| c.allocation.applied_to_deductible)
            .collect();
        assert_eq!(applied, vec![400.0, 200.0, 50.0, 0.0]);
        assert_eq!(run.remaining_deductible, 0.0);
        assert!(!run.totals.cap_applied);
    }

    #[test]
    fn test_aggregate_cap_binds_exactly() {
        let items: Vec<Allocation> = [400.0, 300.0, 200.0, 100.0]
            .iter()
            .map(|&residual| {
                let (covered, oop) = calculate_coverage(residual, 0.1, 0.1);
                Allocation {
                    applied_to_deductible: 0.0,
                    covered_by_insurance: covered,
                    out_of_pocket: oop,
                }
            })
            .collect();

        let totals = aggregate(&items, 250.0);
        assert_eq!(totals.out_of_pocket, 250.0);
        assert!((totals.uncapped_out_of_pocket - 800.0).abs() < EPS);
        assert!((totals.covered_by_insurance - 200.0).abs() < EPS);
    }

    #[test]
    fn test_aggregate_below_cap_is_untouched() {
        let items = [Allocation {
            applied_to_deductible: 10.0,
            covered_by_insurance: 20.0,
            out_of_pocket: 30.0,
        }];
        let totals = aggregate(&items, 1000.0);
        assert_eq!(totals.out_of_pocket, 30.0);
        assert!(!totals.cap_applied);
    }

    #[test]
    fn test_allocation_is_idempotent() {
        let plan = InsurancePlan::new("Gold", 500.0, 120.0, 0.2, 0.3, 900.0).unwrap();
        let items = fees([250.0, 125.5, 75.25, 0.0]);
        assert_eq!(
            allocate(&items, &plan).unwrap(),
            allocate(&items, &plan).unwrap()
        );
    }

    #[test]
    fn test_shuffled_fees_allocate_in_category_order() {
        let plan = InsurancePlan::new("Silver", 1000.0, 200.0, 0.1, 0.1, 500.0).unwrap();
        let canonical = fees([500.0, 300.0, 200.0, 100.0]);
        let mut shuffled = canonical.clone();
        shuffled.reverse();

        let expected = allocate(&canonical, &plan).unwrap();
        let run = allocate(&shuffled, &plan).unwrap();

        assert_eq!(run, expected);
        assert_eq!(run.categories[0].category, FeeCategory::Provider);
        assert!((run.categories[0].allocation.applied_to_deductible - 200.0).abs() < EPS);
        assert!((run.categories[0].allocation.out_of_pocket - 240.0).abs() < EPS);
    }

    #[test]
    fn test_duplicate_category_is_rejected() {
        let plan = InsurancePlan::new("Silver", 1000.0, 200.0, 0.1, 0.1, 500.0).unwrap();
        let items = vec![
            FeeItem::new(FeeCategory::Imaging, 100.0).unwrap(),
            FeeItem::new(FeeCategory::Provider, 50.0).unwrap(),
            FeeItem::new(FeeCategory::Imaging, 20.0).unwrap(),
        ];
        assert!(matches!(
            allocate(&items, &plan),
            Err(EstimateError::DataError { .. })
        ));
    }
}
