use care_estimator::app::assistant;
use care_estimator::app::report::{self, EstimateReport};
use care_estimator::core::{ConfigProvider, FeeSource, PlanSource};
use care_estimator::utils::error::ErrorSeverity;
use care_estimator::utils::{logger, validation::Validate};
use care_estimator::{
    CliConfig, CostTable, EstimateEngine, EstimateError, EstimateRequest, LocalStorage, PlanTable,
    Result,
};
use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting care-estimator");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if let Err(e) = run(&cli).await {
        tracing::error!(
            "❌ Estimate failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}

fn required<'a>(field: &str, value: &'a Option<String>) -> Result<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| EstimateError::MissingConfigError {
            field: field.to_string(),
        })
}

async fn run(cli: &CliConfig) -> Result<()> {
    let config = cli.resolve()?;
    config.validate()?;

    let storage = LocalStorage::new(".");
    let (costs, plans) = tokio::try_join!(
        CostTable::load(&storage, config.cost_data_path()),
        PlanTable::load(&storage, config.insurance_plans_path()),
    )?;
    tracing::info!(
        "Loaded {} cost rows and {} plans",
        costs.len(),
        plans.len()
    );

    if cli.list {
        println!("Procedures:");
        for procedure in costs.procedures() {
            println!("  {}", procedure);
        }
        println!("Insurance plans:");
        for plan in plans.plan_names() {
            println!("  {}", plan);
        }
        return Ok(());
    }

    let request = EstimateRequest {
        procedure: required("procedure", &cli.procedure)?.to_string(),
        zip_code: required("zip", &cli.zip)?.to_string(),
        plan_name: required("plan", &cli.plan)?.to_string(),
    };

    let engine = EstimateEngine::new(costs, plans);
    let estimate = engine.estimate(&request)?;

    if let (Some(path), Some(breakdown)) = (&cli.output, estimate.breakdown()) {
        report::export_breakdown(&storage, path, breakdown).await?;
    }

    let reply = match &cli.question {
        Some(question) => {
            Some(assistant::ask_configured(&config, question, &estimate).await)
        }
        None => None,
    };

    if config.output_format() == "json" {
        let json = EstimateReport::new(&estimate).with_reply(reply).to_json()?;
        println!("{}", json);
    } else {
        if let Some(plan) = engine.plans().find_plan(&request.plan_name) {
            println!("{}", report::render_plan_summary(plan));
        }
        print!("{}", report::render_estimate(&estimate));
        if let Some(reply) = reply {
            println!();
            println!("Assistant: {}", reply);
        }
    }

    Ok(())
}
