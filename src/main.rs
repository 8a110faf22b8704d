use clap::Parser;
use scan_compare::domain::model::{BatchSummary, PairStatus};
use scan_compare::utils::error::{CompareError, ErrorSeverity};
use scan_compare::utils::{logger, validation::Validate};
use scan_compare::{
    AnalysisRunner, AnalysisSettings, CliConfig, GammaEngine, LocalStorage, ScanComparePipeline,
    TomlConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting scan-compare");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let file_config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from {}", path);
            TomlConfig::from_file(path).unwrap_or_else(|e| exit_with(&e))
        }
        None => TomlConfig::default(),
    };

    let settings =
        AnalysisSettings::resolve(file_config, cli.overrides()).unwrap_or_else(|e| exit_with(&e));
    if let Err(e) = settings.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        exit_with(&e);
    }
    tracing::debug!("Resolved settings: {:?}", settings);

    if cli.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let pipeline = ScanComparePipeline::new(LocalStorage::default(), settings, GammaEngine);
    let runner = AnalysisRunner::new_with_monitoring(pipeline, cli.monitor);

    match runner.run().await {
        Ok(output) => {
            print_summary(&output.summary);
            tracing::info!("✅ Comparison completed");
            println!("📁 Report saved to: {}", output.output_path);
        }
        Err(e) => exit_with(&e),
    }

    Ok(())
}

fn print_summary(summary: &BatchSummary) {
    println!(
        "Matched {} profile pairs: {} compared, {} failed",
        summary.matched, summary.succeeded, summary.failed
    );

    for entry in &summary.pairs {
        match (entry.status, entry.pass_ratio) {
            (PairStatus::Succeeded, Some(ratio)) => println!(
                "  ✓ {} {} pass rate {:.2}%{}",
                entry.pair,
                entry
                    .direction
                    .map(|d| d.to_string())
                    .unwrap_or_default(),
                ratio * 100.0,
                entry.band.map(|b| format!(" ({:?})", b)).unwrap_or_default()
            ),
            _ => println!(
                "  ✗ {} {}",
                entry.pair,
                entry.reason.as_deref().unwrap_or("comparison failed")
            ),
        }
    }
}

fn exit_with(e: &CompareError) -> ! {
    tracing::error!(
        "❌ scan-compare failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code)
}
