//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use personakit_core::{
    PersonaWorkflow, PipelineRun, ProgressReporter, RunOutcome, StageReport, graph,
};
use personakit_llm::ChatSummarizer;
use personakit_shared::{
    AppConfig, FailurePolicy, SubjectId, init_config, load_config, load_config_from,
    validate_credentials,
};
use personakit_source::RedditSource;
use personakit_writer::FileSink;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// PersonaKit: turn a Reddit profile into a user persona.
#[derive(Parser, Debug)]
#[command(
    name = "personakit",
    version,
    about = "Generate a user persona from a Reddit profile's posts and comments.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.personakit/personakit.toml.
    #[arg(long, global = true, env = "PERSONAKIT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Generate a persona for a Reddit user.
    Run {
        /// Profile URL (https://www.reddit.com/user/<name>/) or bare username.
        profile: String,

        /// Directory to write the persona file to.
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Number of posts and of comments to fetch.
        #[arg(short, long)]
        limit: Option<u32>,

        /// What to do after a stage fails: continue or halt.
        #[arg(long)]
        policy: Option<FailurePolicy>,

        /// Print the result as JSON instead of plain text.
        #[arg(long)]
        json: bool,
    },

    /// Print the pipeline as a Mermaid diagram.
    Graph {
        /// Write the diagram to this file instead of stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "personakit=info",
        1 => "personakit=debug",
        _ => "personakit=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config;
    match cli.command {
        Command::Run {
            profile,
            out,
            limit,
            policy,
            json,
        } => {
            let mut config = resolve_config(config_path.as_ref())?;
            if let Some(out) = out {
                config.defaults.output_dir = out.to_string_lossy().into_owned();
            }
            if let Some(limit) = limit {
                config.defaults.fetch_limit = limit;
            }
            if let Some(policy) = policy {
                config.defaults.failure_policy = policy;
            }
            cmd_run(&config, &profile, json).await
        }
        Command::Graph { out } => cmd_graph(out.as_ref()),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path.as_ref()),
        },
    }
}

fn resolve_config(path: Option<&PathBuf>) -> Result<AppConfig> {
    Ok(match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    })
}

async fn cmd_run(config: &AppConfig, profile: &str, json: bool) -> Result<()> {
    // Bad input is rejected before any network call.
    let subject = SubjectId::from_profile_url(profile)?;
    validate_credentials(config)?;

    let sink = FileSink::new(&config.defaults.output_dir);
    let workflow = PersonaWorkflow::new(
        config,
        Arc::new(RedditSource::from_config(&config.reddit)?),
        Arc::new(ChatSummarizer::from_config(&config.llm)?),
        Arc::new(sink.clone()),
    )?;

    info!(
        %subject,
        limit = config.defaults.fetch_limit,
        policy = ?config.defaults.failure_policy,
        "generating persona"
    );

    let reporter = CliProgress::new();
    let run = workflow.run_with_progress(&subject, &reporter).await;
    let outcome = RunOutcome::from_state(&run.state);

    if json {
        let body = match &outcome {
            RunOutcome::Output { text } => serde_json::json!({ "persona": text }),
            RunOutcome::Error { text } => serde_json::json!({ "error": text }),
        };
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else if outcome.is_output() {
        println!("{}", outcome.text());
        println!();
        if run.state.is_saved {
            println!("  Saved:  {}", sink.path_for(&subject).display());
        }
        println!("  Run:    {}", run.run_id);
        println!("  Time:   {:.1}s", run.total_duration.as_secs_f64());
    }

    match outcome {
        RunOutcome::Output { .. } => Ok(()),
        RunOutcome::Error { text } => Err(eyre!(text)),
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn stage_started(&self, name: &str, index: usize, total: usize) {
        self.spinner
            .set_message(format!("[{}/{total}] {name}", index + 1));
    }

    fn stage_finished(&self, report: &StageReport) {
        if let Some(error) = &report.error {
            self.spinner
                .println(format!("  ! {} failed: {error}", report.stage_name));
        }
    }

    fn done(&self, _run: &PipelineRun) {
        self.spinner.finish_and_clear();
    }
}

fn cmd_graph(out: Option<&PathBuf>) -> Result<()> {
    let diagram = graph::render(&PersonaWorkflow::STAGES);
    match out {
        Some(path) => {
            std::fs::write(path, &diagram)
                .map_err(|e| eyre!("failed to write '{}': {e}", path.display()))?;
            println!("Graph written to: {}", path.display());
        }
        None => print!("{diagram}"),
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&PathBuf>) -> Result<()> {
    let config = resolve_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
