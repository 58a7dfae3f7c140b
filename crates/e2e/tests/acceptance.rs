//! Acceptance suite entry point
//!
//! This binary drives a physical Kronos appliance; it is not a unit test.
//! Run with: cargo test --package kronos-e2e --test acceptance -- --target <yaml>

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use kronos_e2e::browser::Browser;
use kronos_e2e::runner::SCENARIOS;
use kronos_e2e::{ScenarioRunner, TargetConfig, UiResult};

#[derive(Parser, Debug)]
#[command(name = "kronos-e2e")]
#[command(about = "Acceptance suite for the Kronos device web UI")]
struct Args {
    /// Path to the target device YAML
    #[arg(short, long)]
    target: Option<PathBuf>,

    /// Run only the named scenarios (repeatable); default is all
    #[arg(short, long)]
    scenario: Vec<String>,

    /// List known scenarios and exit
    #[arg(long)]
    list: bool,

    /// Override the device address from the target file
    #[arg(long, env = "KRONOS_BASE_URL")]
    base_url: Option<String>,

    /// Override the hardware model from the target file
    #[arg(long, env = "KRONOS_MODEL")]
    model: Option<String>,

    /// Browser to use (chromium, firefox, webkit)
    #[arg(long)]
    browser: Option<Browser>,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Output directory for the JSON report
    #[arg(short, long, default_value = "test-results")]
    output: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    if args.list {
        for name in SCENARIOS {
            println!("{}", name);
        }
        std::process::exit(0);
    }

    let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
    match rt.block_on(async_main(args)) {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

async fn async_main(args: Args) -> UiResult<bool> {
    let mut target = match &args.target {
        Some(path) => TargetConfig::from_file(path)?,
        None => TargetConfig::default(),
    };
    if let Some(base_url) = args.base_url {
        target.base_url = base_url;
    }
    if let Some(model) = args.model {
        target.hardware_model = Some(model);
    }
    if let Some(browser) = args.browser {
        target.browser = browser;
    }
    if args.headed {
        target.headless = false;
    }

    let runner = ScenarioRunner::new(target, args.output);
    let suite = if args.scenario.is_empty() {
        runner.run_all().await?
    } else {
        runner.run_named(&args.scenario).await?
    };
    runner.write_report(&suite)?;

    Ok(suite.all_passed())
}
