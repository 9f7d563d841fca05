use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "motion-gate", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a page headless and print (or write) a JSON report.
    Simulate(SimulateArgs),
    /// Validate a page description.
    Check(CheckArgs),
}

#[derive(Parser, Debug)]
struct SimulateArgs {
    /// Input page JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Simulated time to run until, in milliseconds.
    #[arg(long, default_value_t = 3000.0)]
    until_ms: f64,

    /// Frame interval, in milliseconds.
    #[arg(long, default_value_t = 1000.0 / 60.0)]
    step_ms: f64,

    /// Force reduced motion regardless of the page and environment.
    #[arg(long, default_value_t = false)]
    reduced_motion: bool,

    /// Output report path (stdout when omitted).
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Input page JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Simulate(args) => cmd_simulate(args),
        Command::Check(args) => cmd_check(args),
    }
}

fn cmd_simulate(args: SimulateArgs) -> anyhow::Result<()> {
    let page = motion_gate::PageConfig::load(&args.in_path)
        .with_context(|| format!("load page '{}'", args.in_path.display()))?;
    let motion = args
        .reduced_motion
        .then(|| motion_gate::ReducedMotionPolicy::new(true));

    let mut sim = motion_gate::Simulation::new(page, motion)?;
    let report = sim.run(args.until_ms, args.step_ms)?;
    let json = serde_json::to_string_pretty(&report).context("serialize report")?;

    match &args.out {
        Some(out) => {
            if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create output dir '{}'", parent.display()))?;
            }
            std::fs::write(out, json)
                .with_context(|| format!("write report '{}'", out.display()))?;
            eprintln!("wrote {}", out.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let page = motion_gate::PageConfig::load(&args.in_path)
        .with_context(|| format!("load page '{}'", args.in_path.display()))?;

    let missing: Vec<String> = page
        .effects
        .iter()
        .map(|e| &e.anchor)
        .chain(&page.sections)
        .filter(|a| !page.anchors.contains_key(*a))
        .map(|a| a.to_string())
        .collect();
    if !missing.is_empty() {
        eprintln!(
            "warning: anchors not laid out (their effects will fail to register): {}",
            missing.join(", ")
        );
    }

    println!(
        "ok: {} anchors, {} effects, {} sections",
        page.anchors.len(),
        page.effects.len(),
        page.sections.len()
    );
    Ok(())
}
