use crate::core::Storage;
use crate::domain::model::{CostBreakdown, Estimate, InsurancePlan};
use crate::utils::currency::{format_percent, format_usd};
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const NO_DATA_MESSAGE: &str = "No cost data found for the selected procedure and ZIP code.";

const HEADERS: [&str; 5] = [
    "Category",
    "Cost",
    "Applied to Deductible",
    "Covered by Insurance",
    "Out-of-Pocket",
];

/// One rendered line of the breakdown table, amounts unformatted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownRow {
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Cost")]
    pub cost: f64,
    #[serde(rename = "Applied to Deductible")]
    pub applied_to_deductible: f64,
    #[serde(rename = "Covered by Insurance")]
    pub covered_by_insurance: f64,
    #[serde(rename = "Out-of-Pocket")]
    pub out_of_pocket: f64,
}

/// Category rows followed by a Total row using the table's precomputed total cost.
pub fn breakdown_rows(breakdown: &CostBreakdown) -> Vec<BreakdownRow> {
    let mut rows: Vec<BreakdownRow> = breakdown
        .categories
        .iter()
        .map(|c| BreakdownRow {
            category: c.category.label().to_string(),
            cost: c.cost,
            applied_to_deductible: c.allocation.applied_to_deductible,
            covered_by_insurance: c.allocation.covered_by_insurance,
            out_of_pocket: c.allocation.out_of_pocket,
        })
        .collect();

    rows.push(BreakdownRow {
        category: "Total".to_string(),
        cost: breakdown.total_cost,
        applied_to_deductible: breakdown.totals.applied_to_deductible,
        covered_by_insurance: breakdown.totals.covered_by_insurance,
        out_of_pocket: breakdown.totals.out_of_pocket,
    });
    rows
}

pub fn render_plan_summary(plan: &InsurancePlan) -> String {
    format!(
        "Insurance Plan: {}\n  \
         Total Deductible:     {}\n  \
         Remaining Deductible: {}\n  \
         Co-Pay:               {}\n  \
         Co-Insurance:         {}\n  \
         Out-of-Pocket Max:    {}\n",
        plan.name(),
        format_usd(plan.total_deductible()),
        format_usd(plan.remaining_deductible()),
        format_percent(plan.co_pay_rate()),
        format_percent(plan.co_insurance_rate()),
        format_usd(plan.out_of_pocket_max()),
    )
}

pub fn render_table(breakdown: &CostBreakdown) -> String {
    let cells: Vec<[String; 5]> = breakdown_rows(breakdown)
        .into_iter()
        .map(|row| {
            [
                row.category,
                format_usd(row.cost),
                format_usd(row.applied_to_deductible),
                format_usd(row.covered_by_insurance),
                format_usd(row.out_of_pocket),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let align = |row: &[String]| -> String {
        row.iter()
            .zip(widths)
            .enumerate()
            .map(|(i, (cell, w))| pad(cell, w, i == 0))
            .collect::<Vec<_>>()
            .join("  ")
    };

    let mut lines = vec![
        format!(
            "Cost Breakdown: {} (ZIP {}) under {}",
            breakdown.procedure, breakdown.zip_code, breakdown.plan_name
        ),
        align(&HEADERS.map(str::to_string)[..]),
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    ];
    lines.extend(cells.iter().map(|row| align(&row[..])));
    lines.push(String::new());
    lines.push(format!(
        "Total Estimated Cost: {}",
        format_usd(breakdown.total_cost)
    ));

    if breakdown.totals.cap_applied {
        lines.push(format!(
            "Note: out-of-pocket capped at the plan maximum (uncapped {}); {} of the total cost is not reflected in the totals.",
            format_usd(breakdown.totals.uncapped_out_of_pocket),
            format_usd(breakdown.unreconciled_amount())
        ));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn pad(text: &str, width: usize, left: bool) -> String {
    if left {
        format!("{:<width$}", text, width = width)
    } else {
        format!("{:>width$}", text, width = width)
    }
}

pub fn render_estimate(estimate: &Estimate) -> String {
    match estimate {
        Estimate::Found(breakdown) => render_table(breakdown),
        Estimate::NoData { .. } => format!("⚠️ {}\n", NO_DATA_MESSAGE),
    }
}

#[derive(Debug, Serialize)]
pub struct EstimateReport<'a> {
    pub generated_at: DateTime<Utc>,
    pub estimate: &'a Estimate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<BreakdownRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assistant_reply: Option<String>,
}

impl<'a> EstimateReport<'a> {
    pub fn new(estimate: &'a Estimate) -> Self {
        Self {
            generated_at: Utc::now(),
            estimate,
            rows: estimate.breakdown().map(breakdown_rows),
            assistant_reply: None,
        }
    }

    pub fn with_reply(mut self, reply: Option<String>) -> Self {
        self.assistant_reply = reply;
        self
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub fn breakdown_csv(breakdown: &CostBreakdown) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in breakdown_rows(breakdown) {
        writer.serialize(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| crate::utils::error::EstimateError::IoError(e.into_error()))
}

pub async fn export_breakdown<S: Storage>(
    storage: &S,
    path: &str,
    breakdown: &CostBreakdown,
) -> Result<()> {
    let data = breakdown_csv(breakdown)?;
    storage.write_file(path, &data).await?;
    tracing::info!("Breakdown exported to {}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::allocator::allocate;
    use crate::domain::model::{FeeCategory, FeeItem};

    fn sample() -> (InsurancePlan, CostBreakdown) {
        let plan = InsurancePlan::new("Silver", 1000.0, 200.0, 0.1, 0.1, 500.0).unwrap();
        let fees: Vec<FeeItem> = FeeCategory::ORDERED
            .iter()
            .zip([500.0, 300.0, 200.0, 100.0])
            .map(|(c, a)| FeeItem::new(*c, a).unwrap())
            .collect();
        let run = allocate(&fees, &plan).unwrap();
        let breakdown = CostBreakdown {
            procedure: "MRI".to_string(),
            zip_code: "02139".to_string(),
            plan_name: "Silver".to_string(),
            total_cost: 1100.0,
            categories: run.categories,
            totals: run.totals,
            remaining_deductible_after: run.remaining_deductible,
        };
        (plan, breakdown)
    }

    #[test]
    fn test_rows_end_with_total() {
        let (_, breakdown) = sample();
        let rows = breakdown_rows(&breakdown);
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].category, "Provider Fee");
        let total = rows.last().unwrap();
        assert_eq!(total.category, "Total");
        assert_eq!(total.cost, 1100.0);
        assert_eq!(total.out_of_pocket, 500.0);
    }

    #[test]
    fn test_table_formats_currency_and_cap_note() {
        let (_, breakdown) = sample();
        let table = render_table(&breakdown);
        assert!(table.contains("Provider Fee"));
        assert!(table.contains("$240.00"));
        assert!(table.contains("Total Estimated Cost: $1,100.00"));
        assert!(table.contains("uncapped $720.00"));
        assert!(table.contains("$220.00 of the total cost"));

        let lines: Vec<&str> = table.lines().collect();
        assert!(lines[1].starts_with("Category"));
        assert_eq!(lines[1].len(), lines[2].len());
        assert!(table.ends_with('\n'));
    }

    #[test]
    fn test_plan_summary() {
        let (plan, _) = sample();
        let summary = render_plan_summary(&plan);
        assert!(summary.contains("Remaining Deductible: $200.00"));
        assert!(summary.contains("Co-Pay:               10%"));
        assert!(summary.contains("Out-of-Pocket Max:    $500.00"));
    }

    #[test]
    fn test_no_data_message() {
        let estimate = Estimate::NoData {
            procedure: "MRI".to_string(),
            zip_code: "99999".to_string(),
        };
        assert!(render_estimate(&estimate).contains(NO_DATA_MESSAGE));
        let json = EstimateReport::new(&estimate).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["estimate"]["status"], "no_data");
        assert!(value.get("rows").is_none());
    }

    #[test]
    fn test_json_report_carries_totals() {
        let (_, breakdown) = sample();
        let estimate = Estimate::Found(breakdown);
        let json = EstimateReport::new(&estimate)
            .with_reply(Some("ok".to_string()))
            .to_json()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["estimate"]["status"], "found");
        assert_eq!(value["estimate"]["totals"]["out_of_pocket"], 500.0);
        assert_eq!(value["estimate"]["totals"]["cap_applied"], true);
        assert_eq!(value["rows"].as_array().unwrap().len(), 5);
        assert_eq!(value["assistant_reply"], "ok");
    }

    #[test]
    fn test_breakdown_csv_has_header_and_total() {
        let (_, breakdown) = sample();
        let csv = String::from_utf8(breakdown_csv(&breakdown).unwrap()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Category,Cost,Applied to Deductible,Covered by Insurance,Out-of-Pocket"
        );
        assert!(csv.lines().last().unwrap().starts_with("Total,1100.0,200.0,"));
    }
}
