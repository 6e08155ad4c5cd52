use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use skiptrade::cli::Cli;
use skiptrade::config::{init_logging, load_config};
use skiptrade::models::tokens::TokenRegistry;
use skiptrade::services::executor::ExecutionStatus;
use skiptrade::services::notify::{DisabledNotifier, Notifier, TelegramNotifier};
use skiptrade::services::route::SkipRouteClient;
use skiptrade::services::swap::{run_swap, SwapReport};
use skiptrade::services::units::format_display;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;
    init_logging(Some(&config.log_file_path), config.max_log_bytes);

    let registry = TokenRegistry::load(&config.assets_config_path)
        .with_context(|| format!("loading assets {}", config.assets_config_path.display()))?;

    let resolver = SkipRouteClient::new(
        config.skip_api_url.clone(),
        config.skip_api_key.clone(),
        config.route_timeout,
    )
    .context("building Skip API client")?;
    let notifier: Box<dyn Notifier> = match &config.telegram {
        Some(telegram) => {
            Box::new(TelegramNotifier::new(telegram).context("building Telegram client")?)
        }
        None => Box::new(DisabledNotifier),
    };

    let intent = cli.intent();
    info!(
        event = "swap_requested",
        from = intent.token_from.as_str(),
        to = intent.token_to.as_str(),
        amount = %intent.amount,
        dry_run = intent.dry_run,
        "Swap requested"
    );

    match run_swap(&config, &registry, &resolver, notifier.as_ref(), &intent).await {
        Ok(report) => print_report(&report),
        Err(err) => {
            error!(event = "swap_aborted", kind = ?err.kind(), error = %err, "Swap aborted");
            println!("Error: {}", err);
        }
    }

    Ok(())
}

fn print_report(report: &SwapReport) {
    println!(
        "Optimal route from {} to {}: {} {} -> {} {}",
        report.token_from,
        report.token_to,
        report.amount_in.normalize(),
        report.token_from,
        format_display(report.estimated_amount_out, 6),
        report.token_to,
    );
    println!("Pools: {}", report.pool_ids.join(" -> "));
    println!(
        "Estimated / minimum received (base units): {} / {}",
        report.estimated_amount_out_base, report.minimum_amount_out
    );
    println!("Command: {}", report.command);

    match &report.outcome.status {
        ExecutionStatus::DryRun => println!("Dry run: command saved, not submitted."),
        ExecutionStatus::Confirmed => {
            println!(
                "Transaction submitted: {}",
                report.outcome.tx_hash.as_deref().unwrap_or_default()
            );
            if report.notified {
                println!("Notification sent.");
            }
        }
        ExecutionStatus::SubmittedWithoutHash => {
            println!("Transaction submitted, but no hash was found in the output.");
        }
        ExecutionStatus::Failed { exit_code } => {
            match exit_code {
                Some(code) => println!("Error: chain client exited with status {}", code),
                None => println!("Error: chain client did not complete"),
            }
            let output = report.outcome.output.trim();
            if !output.is_empty() {
                println!("{}", output);
            }
        }
    }
}
