// Entrypoint for the CLI application.
// - Keeps `main` small: parse flags, build a client, dispatch to `ui`.
// - Any error ends the process with exit code 1.

use clap::{ArgAction, Parser, Subcommand};
use crossterm::style::Stylize;
use gp_cli::settings::Settings;
use gp_cli::ui::{self, DownloadOptions};
use gp_cli::Client;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "gp", version)]
#[command(about = "Client of the Go Playground", long_about = None)]
struct Cli {
    /// Base URL of the playground API
    #[arg(long, env = "GP_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Base URL of the playground front-end, used to recognise share links
    #[arg(long, env = "GP_FRONT_URL", global = true)]
    front_url: Option<String>,

    /// Go version: `default` is the latest release, `gotip` the development branch
    #[arg(long, env = "GP_BACKEND", global = true)]
    backend: Option<String>,

    /// HTTP timeout seconds (no timeout by default)
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Load config from this path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More logging on stderr (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile and run on the Go Playground (stdin when no file is given)
    Run {
        /// Output the result of run as JSON
        #[arg(long)]
        json: bool,
        files: Vec<PathBuf>,
    },

    /// Format Go code on the Go Playground
    #[command(visible_alias = "fmt")]
    Format {
        /// Output the result of format as JSON
        #[arg(long)]
        json: bool,
        /// Use goimports instead of gofmt
        #[arg(long)]
        imports: bool,
        files: Vec<PathBuf>,
    },

    /// Generate a share URL on the Go Playground
    Share {
        /// Open the URL in a browser
        #[arg(long)]
        open: bool,
        files: Vec<PathBuf>,
    },

    /// Download shared source by hash or URL (stdin when not given)
    #[command(visible_alias = "dl")]
    Download {
        /// Output directory; multi-file programs are unpacked into it
        #[arg(long)]
        dldir: Option<PathBuf>,
        /// Overwrite existing files without asking
        #[arg(long)]
        force: bool,
        hash_or_url: Option<String>,
    },

    /// Show the Go version used by the Go Playground
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: Cli) -> anyhow::Result<()> {
    let flags = Settings {
        base_url: cli.base_url,
        front_url: cli.front_url,
        backend: cli.backend,
        timeout_secs: cli.timeout_secs,
    };
    let settings = Settings::load(cli.config.as_deref())?.merge(flags);
    tracing::debug!(?settings, "effective settings");
    let client = Client::new(settings.into_client_config()?);

    match cli.command {
        Command::Run { json, files } => ui::run(&client, &files, json),
        Command::Format {
            json,
            imports,
            files,
        } => ui::format(&client, &files, json, imports),
        Command::Share { open, files } => ui::share(&client, &files, open),
        Command::Download {
            dldir,
            force,
            hash_or_url,
        } => ui::download(&client, hash_or_url, &DownloadOptions { dir: dldir, force }),
        Command::Version => ui::version(&client),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("gp={level},gp_cli={level}")));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn report(err: &anyhow::Error) {
    if std::io::stderr().is_terminal() {
        eprintln!("{} {err:#}", "Error:".red().bold());
    } else {
        eprintln!("Error: {err:#}");
    }
}
