use clap::Parser;
use site_audit::core::progress::{self, step_label};
use site_audit::utils::error::ErrorSeverity;
use site_audit::utils::{logger, validation::Validate};
use site_audit::{AuditEngine, CliConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting site-audit CLI");

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Failed to load configuration: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::debug!(
        "Probe: {} ({}, {}ms), research model: {}",
        config.probe.endpoint,
        config.probe.strategy,
        config.probe.timeout_ms,
        config.research.model
    );

    let engine = AuditEngine::from_config(&config);
    let outcome = progress::with_progress(
        engine.produce_audit_report(&cli.target),
        progress::TICK_INTERVAL,
        |step| tracing::info!("⏳ {}", step_label(step)),
    )
    .await;

    match outcome {
        Ok(report) => {
            let json = if cli.compact {
                serde_json::to_string(&report)?
            } else {
                serde_json::to_string_pretty(&report)?
            };
            println!("{}", json);
        }
        Err(e) => {
            tracing::error!(
                "❌ Audit failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());

            let exit_code = match e.severity() {
                ErrorSeverity::Low | ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            std::process::exit(exit_code);
        }
    }

    Ok(())
}
