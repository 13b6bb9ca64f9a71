use std::path::Path;

use anyhow::{bail, Context};
use colored::*;

mod client;
mod executor;
mod models;
mod report;

use models::config::{RunConfig, Variant};

const USAGE: &str = "Usage: rulebench <qps|throughput>

Environment:
  API_URL        target endpoint, e.g. https://your-instance.com/api/v1/flows/flow_id (required)
  API_KEY        API key sent as x-api-key (required)
  TEST_DURATION  measurement duration after the 1m warm-up (default: 4m)
  TARGET_RPS     target requests per second (default: 500 qps / 100 throughput)
  BULK_SIZE      payloads per bulk request, throughput only (default: 50)";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let arg = std::env::args().nth(1).unwrap_or_default();
    let variant = match Variant::from_arg(&arg) {
        Some(v) => v,
        None => {
            eprintln!("{}", USAGE);
            bail!("expected benchmark variant `qps` or `throughput`, got `{}`", arg);
        }
    };

    let config = RunConfig::from_env(variant).context("configuration error")?;

    println!(
        "{}",
        format!(" rulebench - {} benchmark ", variant.label())
            .bold()
            .on_blue()
    );

    let snapshot = executor::run_load_test(&config, variant)
        .await
        .context("load test failed")?;

    let confirmation = report::write_artifacts(&snapshot, &config, variant, Path::new("."))
        .context("failed to write report artifacts")?;
    print!("{}", confirmation);

    Ok(())
}
