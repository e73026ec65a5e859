mod journal;
mod runner;
mod scenario;

use std::path::PathBuf;

use campaign_shared::OrderingConfig;
use tracing_subscriber::EnvFilter;

use scenario::Scenario;

const USAGE: &str = "Usage: campaign-replay --scenario <path> [--compact]";

fn get_arg(flag: &str) -> Option<String> {
    std::env::args().skip_while(|a| a != flag).nth(1)
}

fn has_flag(flag: &str) -> bool {
    std::env::args().any(|a| a == flag)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let path = PathBuf::from(get_arg("--scenario").unwrap_or_else(|| {
        eprintln!("Error: --scenario <path> is required");
        eprintln!("{USAGE}");
        std::process::exit(1);
    }));

    let scenario = Scenario::load(&path).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });

    let config = match scenario.config {
        Some(config) => config,
        None => OrderingConfig::from_env().unwrap_or_else(|e| {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }),
    };
    tracing::info!(
        path = %path.display(),
        steps = scenario.steps.len(),
        max_key_len = config.max_key_len,
        rebalance_key_len = config.rebalance_key_len,
        "Replaying scenario"
    );

    let report = runner::run(scenario, config).await.unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });
    let rendered = if has_flag("--compact") {
        serde_json::to_string(&report)
    } else {
        serde_json::to_string_pretty(&report)
    };
    match rendered {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error: failed to render report: {e}");
            std::process::exit(1);
        }
    }
}
