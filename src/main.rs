use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use compose_fixture::cli::{self, Target};
use compose_fixture::docker::compose::split_compose_specs;
use compose_fixture::errors::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cfx")]
#[command(about = "Bring docker-compose test fixtures up and down", long_about = None)]
#[command(version)]
struct Cli {
    /// Log every external command
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct TargetArgs {
    /// Compose file, or a directory containing docker-compose.yml.
    /// Repeat the flag or pass a space separated list.
    #[arg(short = 'f', long = "file", required = true)]
    files: Vec<PathBuf>,

    /// Project name. `up` and `services` generate one when omitted;
    /// the other commands require it.
    #[arg(short = 'p', long = "project")]
    project: Option<String>,
}

impl From<TargetArgs> for Target {
    fn from(args: TargetArgs) -> Self {
        Target {
            files: args
                .files
                .iter()
                .flat_map(|spec| split_compose_specs(&spec.to_string_lossy()))
                .collect(),
            project: args.project,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start all services and print the resulting containers
    Up(TargetArgs),
    /// Remove every container and network of a project
    Down(TargetArgs),
    /// List services declared by the compose files
    Services(TargetArgs),
    /// Show containers of a running project
    Ps(TargetArgs),
    /// Print environment variables the composition adds
    Env(TargetArgs),
    /// Save container logs to files
    Logs {
        #[command(flatten)]
        target: TargetArgs,
        /// Scenario name used in log file names
        #[arg(long, default_value = "manual")]
        scenario: String,
        /// Output directory (defaults to logs.dir from config)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Ignore a second initialisation
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Up(target) => cli::up::run(target.into())?,
        Commands::Down(target) => cli::down::run(target.into())?,
        Commands::Services(target) => cli::services::run(target.into())?,
        Commands::Ps(target) => cli::ps::run(target.into())?,
        Commands::Env(target) => cli::env::run(target.into())?,
        Commands::Logs {
            target,
            scenario,
            dir,
        } => cli::logs::run(target.into(), scenario, dir)?,
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "cfx", &mut std::io::stdout());
        }
    }

    Ok(())
}
