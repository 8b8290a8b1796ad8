//! Simple Elements - demo runner
//!
//! `simple-elements [pipeline|train|infer|elements] [OPTIONS]`
//!
//! - `pipeline` (default): send -> relay -> receive with the live preview
//!   server, until Ctrl+C.
//! - `train`: runs the placeholder trainer and writes `artifact/`.
//! - `infer`: loads `artifact/` and runs one prediction.
//! - `elements`: prints the element descriptors.
//!
//! Run with `--help` for the options and their `SIMPLE_ELEMENTS_*` variables.

use clap::Parser;
use simple_elements::ai::inference::Predictor;
use simple_elements::ai::train;
use simple_elements::config::{AppConfig, Cli, Command};
use simple_elements::elements;
use simple_elements::pipeline;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("simple_elements=info")),
        )
        .init();

    let config = cli.settings.config();

    match cli.command() {
        Command::Pipeline => run_pipeline(config).await,
        Command::Train => run_train(config).await,
        Command::Infer => run_infer(config),
        Command::Elements => {
            println!("{}", serde_json::to_string_pretty(&elements::all())?);
            Ok(())
        }
    }
}

async fn run_pipeline(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    ctrlc::set_handler(move || {
        println!("\n🛑 Shutdown signal received...");
        let _ = shutdown_tx.send(true);
    })?;

    let running = pipeline::start(&config, shutdown_rx).await?;

    println!();
    println!("════════════════════════════════════════════════════════════════");
    println!("🎯 Simple Elements pipeline is running");
    println!("   • Press Ctrl+C to quit");
    println!();
    println!("🌐 Preview available at http://{}", running.addr);
    println!("   • GET /        - Landing page");
    println!("   • GET /image   - Live MJPEG stream");
    println!("   • GET /config  - Preview descriptor");
    println!("   • GET /health  - Connected clients");
    println!("════════════════════════════════════════════════════════════════");
    println!();

    let stats = running.join().await?;

    println!();
    println!("📊 Frames in: {}", stats.frames_in);
    println!("   Broadcast: {}", stats.frames_broadcast);
    println!("   Skipped:   {}", stats.frames_skipped);
    println!("   Errors:    {}", stats.encode_errors);
    println!("\n👋 Simple Elements has exited. Goodbye!");
    Ok(())
}

async fn run_train(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let paths = train::run(&config.train, |metrics| {
        println!(
            "   epoch {:>3}  progress {:>5.1}%  acc {:.3}/{:.3}  loss {:.3}/{:.3}",
            metrics.charts.accuracy.x,
            metrics.progress * 100.0,
            metrics.charts.accuracy.y.train,
            metrics.charts.accuracy.y.validation,
            metrics.charts.loss.y.train,
            metrics.charts.loss.y.validation,
        );
    })
    .await?;

    println!("✓ Artifact written to {}", paths.dir.display());
    Ok(())
}

fn run_infer(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let predictor = Predictor::startup(&config.train.root)?;
    println!("✓ Loaded {} v{}", predictor.metadata.name, predictor.metadata.version);
    println!("   predict({}) = {}", simple_elements::ai::inference::SAMPLE_INPUT, predictor.run());
    Ok(())
}
