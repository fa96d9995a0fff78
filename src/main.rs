// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use pistin_scanner::config::ScannerConfig;
use pistin_scanner::scanners::ScanEngine;
use pistin_scanner::types::ScanIntensity;

#[derive(Parser, Debug)]
#[command(
    name = "pistin",
    version,
    about = "Adaptive SQL injection scanner",
    long_about = "Probes a target web endpoint for SQL injection vulnerabilities using \
error-based, UNION-based, boolean-blind and time-blind detection over HTTP \
side-channels. Only scan targets you are authorized to test."
)]
struct Cli {
    /// Target URL or host to scan
    target: String,

    /// Scan intensity (low, medium, high, max)
    #[arg(short, long, default_value = "medium")]
    intensity: String,

    /// Overall scan timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Base request rate per host (requests per second)
    #[arg(long)]
    rate: Option<f64>,

    /// Write JSON results to this file instead of stdout
    #[arg(short, long)]
    output: Option<std::path::PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(num_cpus::get())
        .thread_name("pistin-worker")
        .enable_all()
        .build()?;

    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = ScannerConfig::from_env()?;
    if let Some(timeout) = cli.timeout {
        config.scan_timeout_secs = timeout;
    }
    if let Some(rate) = cli.rate {
        config.rate_limiter.base_rate = rate;
    }
    config.validate()?;

    let intensity = match cli.intensity.to_lowercase().as_str() {
        "low" => ScanIntensity::Low,
        "medium" => ScanIntensity::Medium,
        "high" => ScanIntensity::High,
        "max" => ScanIntensity::Max,
        other => anyhow::bail!("unknown intensity: {}", other),
    };

    let engine = ScanEngine::new(config)?;

    match engine.execute_scan(&cli.target, intensity).await {
        Ok(results) => {
            info!(
                "Scan finished: {} findings on {}",
                results.findings.len(),
                results.target
            );

            let json = serde_json::to_string_pretty(&results)?;
            match cli.output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    info!("Results written to {}", path.display());
                }
                None => println!("{}", json),
            }
            Ok(())
        }
        Err(e) => {
            error!("Scan failed: {}", e);
            Err(e)
        }
    }
}
