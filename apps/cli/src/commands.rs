//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use scrapechain_core::{Pipeline, PipelinePlan, ProcessExecutor, read_search_term};
use scrapechain_shared::{PipelineConfig, SearchTerm, init_config, load_config, load_config_from};
use tracing::debug;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// scrapechain — search, load, export, and index in one fail-fast run.
#[derive(Parser)]
#[command(
    name = "scrapechain",
    version,
    about = "Prompt for a search term and run the fetch, load, export, and index stages in order.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file to use instead of ~/.scrapechain/scrapechain.toml.
    #[arg(long, env = "SCRAPECHAIN_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Defaults to `run` when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the pipeline (prompts for the search term unless --term is given).
    Run {
        /// Search term to use instead of prompting.
        #[arg(long)]
        term: Option<String>,
    },

    /// Print the stage invocations a run would make, without running them.
    Plan {
        /// Search term to show in the fetch invocation.
        #[arg(long)]
        term: Option<String>,

        /// Emit the plan as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr so stage output
/// on stdout stays clean.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "scrapechain=info",
        1 => "scrapechain=debug",
        _ => "scrapechain=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
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

/// Run the CLI command and return the process exit code.
pub(crate) async fn run(cli: Cli) -> Result<ExitCode> {
    let config_path = cli.config.as_deref();
    match cli.command {
        None => cmd_run(config_path, None).await,
        Some(Command::Run { term }) => cmd_run(config_path, term).await,
        Some(Command::Plan { term, json }) => cmd_plan(config_path, term, json),
        Some(Command::Config { action }) => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

/// Explicit path if given, else the user config (or defaults).
fn resolve_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

async fn cmd_run(config_path: Option<&Path>, term: Option<String>) -> Result<ExitCode> {
    let config = resolve_config(config_path)?;
    let plan = PipelinePlan::from_config(&config)?;

    let term = match term {
        Some(t) => SearchTerm::from(t),
        None => read_search_term(std::io::stdin().lock(), std::io::stdout())?,
    };

    let pipeline = Pipeline::new(plan, ProcessExecutor);
    let report = pipeline.run(term).await?;

    debug!(
        state = %report.state,
        stages_run = report.stages.len(),
        "run finished"
    );

    // Stage diagnostics have already reached the terminal; only the status is propagated.
    Ok(ExitCode::from(report.exit_code()))
}

fn cmd_plan(config_path: Option<&Path>, term: Option<String>, json: bool) -> Result<ExitCode> {
    let config = resolve_config(config_path)?;
    let plan = PipelinePlan::from_config(&config)?;
    let term = SearchTerm::from(term.unwrap_or_else(|| "<term>".to_string()));

    if json {
        let value = serde_json::json!({
            "stages": plan.stages(),
            "invocations": plan.invocations(&term),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(ExitCode::SUCCESS);
    }

    for (spec, invocation) in plan.stages().iter().zip(plan.invocations(&term)) {
        println!("{}. {}", spec.name.position() + 1, spec.name);
        println!("   run:    {invocation}");
        if let Some(input) = &spec.input {
            println!("   reads:  {}", input.path.display());
        }
        if let Some(output) = &spec.output {
            println!("   writes: {}", output.path.display());
        }
        if let Some(dir) = &spec.working_dir {
            println!("   in:     {}", dir.display());
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn cmd_config_init() -> Result<ExitCode> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(ExitCode::SUCCESS)
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<ExitCode> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_invocation_defaults_to_run() {
        let cli = Cli::try_parse_from(["scrapechain"]).expect("parse");
        assert!(cli.command.is_none());
        assert_eq!(cli.verbose, 0);
        assert!(matches!(cli.log_format, LogFormat::Text));
    }

    #[test]
    fn run_accepts_term_and_global_flags() {
        let cli = Cli::try_parse_from(["scrapechain", "run", "--term", "cats", "-vv"])
            .expect("parse");
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Some(Command::Run { term }) => assert_eq!(term.as_deref(), Some("cats")),
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn empty_term_flag_is_allowed() {
        let cli = Cli::try_parse_from(["scrapechain", "run", "--term", ""]).expect("parse");
        match cli.command {
            Some(Command::Run { term }) => assert_eq!(term.as_deref(), Some("")),
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn plan_json_flag() {
        let cli = Cli::try_parse_from(["scrapechain", "plan", "--json"]).expect("parse");
        assert!(matches!(cli.command, Some(Command::Plan { json: true, .. })));
    }

    #[test]
    fn resolve_explicit_config() {
        let dir = std::env::temp_dir().join(format!("sc_cli_{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("create dir");
        let path = dir.join("custom.toml");
        std::fs::write(&path, "[fetch]\nlimit = 7\n").expect("write config");

        let config = resolve_config(Some(&path)).expect("resolve");
        assert_eq!(config.fetch.limit, 7);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn unknown_subcommand_rejected() {
        assert!(Cli::try_parse_from(["scrapechain", "tui"]).is_err());
    }
}
