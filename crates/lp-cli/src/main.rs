// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use lp_core::plan::{DEFAULT_PROBE_INTERVAL, DEFAULT_URL};
use lp_core::{LaunchReport, Launcher, PlanOverrides, WaitOutcome, WaitStrategy, readiness};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "launchpad", version, about = "Local web app launcher")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging.
    #[arg(long)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Bring the server up and open the browser once it is reachable.
    Up {
        #[command(flatten)]
        plan: PlanArgs,

        /// Do not open the browser after the wait step.
        #[arg(long)]
        no_browser: bool,

        /// Print the launch report as JSON instead of pretty output.
        #[arg(long)]
        json: bool,
    },

    /// Probe the target URL once and report whether it accepts connections.
    Check {
        /// Target URL.
        #[arg(long, default_value = DEFAULT_URL)]
        url: String,
    },

    /// Print the effective launch plan as JSON without executing anything.
    Plan {
        #[command(flatten)]
        plan: PlanArgs,
    },
}

#[derive(Args, Debug)]
struct PlanArgs {
    /// Launch root (defaults to the executable's own directory).
    #[arg(long)]
    root: Option<PathBuf>,

    /// Server command to spawn.
    #[arg(long)]
    command: Option<String>,

    /// Argument passed to the server command. Can be repeated.
    #[arg(long = "arg", allow_hyphen_values = true)]
    args: Vec<String>,

    /// Environment variables for the server as KEY=VALUE. Can be repeated.
    #[arg(long = "env")]
    env_vars: Vec<String>,

    /// URL opened in the browser and probed for readiness.
    #[arg(long)]
    url: Option<String>,

    /// Skip virtualenv activation even if the resource exists.
    #[arg(long)]
    no_activate: bool,

    /// Use a fixed delay of this many seconds instead of the readiness probe.
    #[arg(long, conflicts_with = "timeout")]
    delay: Option<u64>,

    /// Readiness probe deadline in seconds.
    #[arg(long)]
    timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("lp=debug,lp_core=debug")
    } else {
        EnvFilter::new("lp=info,lp_core=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Up {
            plan,
            no_browser,
            json,
        } => cmd_up(plan, no_browser, json).await,
        Commands::Check { url } => cmd_check(url).await,
        Commands::Plan { plan } => cmd_plan(plan),
    }
}

async fn cmd_up(args: PlanArgs, no_browser: bool, json: bool) -> Result<()> {
    let mut overrides = build_overrides(&args)?;
    if no_browser {
        overrides.open_browser = Some(false);
    }

    let launcher = Launcher::prepare(args.root.as_deref(), &overrides)?;
    let report = launcher.run().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

async fn cmd_check(url: String) -> Result<()> {
    if readiness::probe_once(&url).await? {
        println!("{url} is reachable");
        Ok(())
    } else {
        anyhow::bail!("{url} is not reachable");
    }
}

fn cmd_plan(args: PlanArgs) -> Result<()> {
    let overrides = build_overrides(&args)?;
    let launcher = Launcher::prepare(args.root.as_deref(), &overrides)?;
    println!("{}", serde_json::to_string_pretty(launcher.plan())?);
    Ok(())
}

fn build_overrides(args: &PlanArgs) -> Result<PlanOverrides> {
    let mut overrides = PlanOverrides {
        command: args.command.clone(),
        url: args.url.clone(),
        no_activate: args.no_activate,
        ..PlanOverrides::default()
    };
    if !args.args.is_empty() {
        overrides.args = Some(args.args.clone());
    }
    for raw in &args.env_vars {
        let (key, value) = parse_key_value_flag(raw, "--env")?;
        overrides.env.insert(key, value);
    }
    if let Some(secs) = args.delay {
        overrides.wait = Some(WaitStrategy::delay(Duration::from_secs(secs)));
    } else if let Some(secs) = args.timeout {
        overrides.wait = Some(WaitStrategy::Probe {
            timeout: Duration::from_secs(secs),
            interval: DEFAULT_PROBE_INTERVAL,
        });
    }
    Ok(overrides)
}

fn parse_key_value_flag(raw: &str, flag_name: &str) -> Result<(String, String)> {
    let (raw_key, raw_value) = raw
        .split_once('=')
        .with_context(|| format!("{flag_name} expects KEY=VALUE, got '{raw}'"))?;

    let key = raw_key.trim();
    if key.is_empty() {
        anyhow::bail!("{flag_name} key cannot be empty (got '{raw}')");
    }

    Ok((key.to_string(), raw_value.to_string()))
}

fn print_report(report: &LaunchReport) {
    eprintln!("root: {}", report.root.display());
    match report.pid {
        Some(pid) => eprintln!("server pid: {pid}"),
        None => eprintln!("server pid: unknown"),
    }
    if report.activated {
        eprintln!("virtualenv: activated");
    }
    match report.wait {
        WaitOutcome::Ready { after_ms } => eprintln!("ready after {after_ms} ms"),
        WaitOutcome::TimedOut => eprintln!("timed out waiting for {}", report.url),
        WaitOutcome::Waited => eprintln!("waited fixed delay"),
    }
    if report.browser_opened {
        eprintln!("browser: {}", report.url);
    }
    eprintln!("done in {} ms", report.elapsed_ms);
}
