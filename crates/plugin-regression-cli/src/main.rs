//! Plugin Regression CLI
//!
//! The `plugin-regression` command runs a baseline and an experiment build of
//! an extension side by side under the same load and prints both raw result
//! sets as JSON.
//!
//! ## Commands
//!
//! - `compare`: run a comparison, driving each cohort with a local load command
//! - `cohorts`: show the cohorts two app sources would be assigned

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, Level};

use plugin_regression_core::{
    name_cohorts, AppSource, CommandTestFactory, Dataset, HarnessConfig, LoadProfile,
    PluginTester, RegressionResults, ResolutionOrder, Scenario, Variant, METRICS,
};

#[derive(Parser)]
#[command(name = "plugin-regression")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compare two builds of an extension under identical load", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true, env = "PLUGIN_REGRESSION_LOG_JSON")]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a baseline vs experiment comparison
    ///
    /// Everything after `--` is the load driver, run once per cohort with
    /// PLUGIN_REGRESSION_* variables describing what to provision and run.
    Compare(CompareArgs),

    /// Show the cohorts two app sources would be assigned
    Cohorts {
        /// Baseline app source (`none`, `maven:<g>:<a>:<v>` or a file path)
        baseline: AppSource,

        /// Experiment app source
        experiment: AppSource,
    },
}

#[derive(Args)]
struct CompareArgs {
    /// Baseline app source (`none`, `maven:<g>:<a>:<v>` or a file path)
    #[arg(long)]
    baseline: AppSource,

    /// Override the label derived from the baseline source
    #[arg(long)]
    baseline_label: Option<String>,

    /// Experiment app source
    #[arg(long)]
    experiment: AppSource,

    /// Override the label derived from the experiment source
    #[arg(long)]
    experiment_label: Option<String>,

    /// Load scenario identifier
    #[arg(long)]
    scenario: String,

    /// Version of the host application to install
    #[arg(long)]
    target_version: String,

    /// Build artifact that drives the virtual users
    #[arg(long)]
    load_artifact: PathBuf,

    /// Dataset name
    #[arg(long, default_value = "default")]
    dataset: String,

    /// Location of the dataset's application home snapshot
    #[arg(long, default_value = "")]
    dataset_home: String,

    /// Location of the dataset's database snapshot
    #[arg(long, default_value = "")]
    dataset_database: String,

    /// Concurrent virtual users
    #[arg(long, default_value_t = 10)]
    virtual_users: u32,

    /// Seconds the full load is held
    #[arg(long, default_value_t = 1200)]
    hold_secs: u64,

    /// Seconds to ramp up to full load
    #[arg(long, default_value_t = 90)]
    ramp_secs: u64,

    /// Overall throughput cap in requests per second
    #[arg(long)]
    max_overall_load: Option<f64>,

    /// Seed for virtual user randomness
    #[arg(long, default_value_t = 12345)]
    seed: u64,

    /// Root directory for comparison workspaces
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Feature label naming the workspace and resource use case
    #[arg(long)]
    label: Option<String>,

    /// Lifetime budget of each cohort's resources, in seconds
    #[arg(long)]
    lifespan_secs: Option<u64>,

    /// Failure reporting order: baseline-first or first-in-time
    #[arg(long)]
    resolution: Option<ResolutionOrder>,

    /// Write results to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Load driver command and arguments
    #[arg(last = true, required = true)]
    command: Vec<String>,
}

impl CompareArgs {
    fn load_profile(&self) -> LoadProfile {
        LoadProfile {
            virtual_users: self.virtual_users,
            hold: Duration::from_secs(self.hold_secs),
            ramp: Duration::from_secs(self.ramp_secs),
            max_overall_load: self.max_overall_load,
            seed: self.seed,
        }
    }

    fn config(&self) -> Result<HarnessConfig> {
        let mut config =
            HarnessConfig::from_env().context("Invalid PLUGIN_REGRESSION_* environment")?;
        if let Some(dir) = &self.output_dir {
            config = config.with_output_dir(dir.clone());
        }
        if let Some(label) = &self.label {
            config = config.with_feature_label(label);
        }
        if let Some(secs) = self.lifespan_secs {
            config = config.with_lifespan(Duration::from_secs(secs));
        }
        if let Some(resolution) = self.resolution {
            config = config.with_resolution(resolution);
        }
        Ok(config)
    }

    fn variants(&self) -> (Variant, Variant) {
        (
            variant(&self.baseline, self.baseline_label.as_deref()),
            variant(&self.experiment, self.experiment_label.as_deref()),
        )
    }
}

fn variant(source: &AppSource, label: Option<&str>) -> Variant {
    match label {
        Some(label) => Variant::labeled(source.clone(), label),
        None => Variant::new(source.clone()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    plugin_regression_core::init_tracing(cli.json, level);

    let outcome = match cli.command {
        Commands::Compare(args) => cmd_compare(&args).await,
        Commands::Cohorts {
            baseline,
            experiment,
        } => cmd_cohorts(&baseline, &experiment),
    };

    METRICS.flush();
    outcome
}

async fn cmd_compare(args: &CompareArgs) -> Result<()> {
    let config = args.config()?;
    let dataset = Dataset::new(&args.dataset, &args.dataset_home, &args.dataset_database);
    let factory = Arc::new(CommandTestFactory::new(args.command.clone()));

    let tester = PluginTester::new(factory, dataset, config).context("Invalid harness configuration")?;
    let (baseline, experiment) = args.variants();

    info!(
        baseline = %baseline.source(),
        experiment = %experiment.source(),
        "Starting comparison"
    );

    let results = tester
        .run(
            &args.load_artifact,
            &Scenario::new(args.scenario.as_str()),
            baseline,
            experiment,
            args.load_profile(),
            &args.target_version,
        )
        .await
        .context("Comparison failed")?;

    write_results(&results, args.output.as_ref())
}

fn write_results(results: &RegressionResults, output: Option<&PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(results)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write results to {}", path.display()))?;
            info!(path = %path.display(), "Results written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn cmd_cohorts(baseline: &AppSource, experiment: &AppSource) -> Result<()> {
    let (b, e) = name_cohorts(&baseline.label(), &experiment.label());
    println!("baseline:   {b}");
    println!("experiment: {e}");
    Ok(())
}
