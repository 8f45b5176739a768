//! pr-tree CLI - Visualize how your open GitHub pull requests stack
//!
//! Pull requests whose base branch is another pull request's head branch are
//! drawn beneath it, so stacked work reads as a tree.

mod commands;

use std::ffi::OsString;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::parser::ValueSource;
use clap::{ArgMatches, Args, CommandFactory, FromArgMatches, Parser, Subcommand};
use pr_tree_core::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::TreeArgs;

/// Filter used with -v when RUST_LOG is not set
const VERBOSE_FILTER: &str = "pr_tree=debug,pr_tree_core=debug,pr_tree_github=debug";

/// pr-tree: draw the tree of your open pull requests
#[derive(Parser, Debug)]
#[command(name = "pr-tree")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    tree: TreeArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// Show current configuration
    Config,

    /// Run an external `pr-tree-<name>` program
    #[command(external_subcommand)]
    External(Vec<OsString>),
}

/// Tree flags typed on the command line
///
/// External subcommands never see these, so they are rejected there.
fn tree_flags_used(matches: &ArgMatches) -> Vec<String> {
    TreeArgs::augment_args(clap::Command::new("tree"))
        .get_arguments()
        .filter(|arg| {
            matches.value_source(arg.get_id().as_str()) == Some(ValueSource::CommandLine)
        })
        .map(|arg| format!("--{}", arg.get_long().unwrap_or(arg.get_id().as_str())))
        .collect()
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new(VERBOSE_FILTER)
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());
    init_tracing(cli.verbose);

    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    let command = match cli.command {
        // External programs get their arguments untouched and own the exit code
        Some(Commands::External(args)) => {
            let stray = tree_flags_used(&matches);
            if !stray.is_empty() {
                Cli::command()
                    .error(
                        ErrorKind::ArgumentConflict,
                        format!(
                            "{} cannot be used with an external subcommand",
                            stray.join(", ")
                        ),
                    )
                    .exit();
            }
            let code = commands::external::execute(args).await?;
            return Ok(ExitCode::from(code));
        }
        other => other,
    };

    let config = Config::load_with_overrides(cli.tree.overrides())?;

    if cli.verbose {
        tracing::info!(
            remote = %config.github.remote,
            api_url = ?config.github.api_url,
            concurrency = config.github.concurrency,
            "Configuration loaded"
        );
    }

    match command {
        Some(Commands::Version) => {
            println!("pr-tree {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Config) => print_config(&config),
        _ => {
            cli.tree.execute(cli.verbose, &config).await?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn print_config(config: &Config) {
    println!("pr-tree Configuration");
    println!("=====================");
    println!();
    println!("GitHub Settings:");
    println!(
        "  api_url: {}",
        config.github.api_url.as_deref().unwrap_or("(github.com)")
    );
    println!("  remote: {}", config.github.remote);
    println!("  concurrency: {}", config.github.concurrency);
    println!();
    println!("Display Settings:");
    println!("  charset: {:?}", config.display.charset);
    println!("  titles: {}", config.display.titles);
    println!();
    if let Some(path) = Config::default_config_path() {
        println!("Config file: {}", path.display());
        if path.exists() {
            println!("  (exists)");
        } else {
            println!("  (not found - using defaults)");
        }
    }
}
