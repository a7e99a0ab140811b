use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use ventricle::core::config::RcLoader;
use ventricle::process::signal;
use ventricle::{ExecMode, Outcome, SessionConfig, ShellError, ShellSession, Termination};

const RC_FILE: &str = ".ventriclerc";

#[derive(Parser, Debug)]
#[command(name = "ventricle", version)]
#[command(about = "Run a command or pipeline in an isolated shell session", long_about = None)]
struct Cli {
    /// Don't print the captured error text
    #[arg(short, long)]
    quiet: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Hand the command to $SHELL -c instead of executing it directly
    #[arg(long)]
    shell: bool,

    /// Startup file with `export NAME=value` lines (default: ~/.ventriclerc)
    #[arg(long, value_name = "PATH")]
    rc: Option<PathBuf>,

    /// Skip the startup file
    #[arg(long, conflicts_with = "rc")]
    no_rc: bool,

    /// Command and arguments; a literal `|` separates pipeline stages
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(outcome) => {
            if let (Some(text), false) = (&outcome.error, cli.quiet) {
                eprintln!("{}", text);
            }
            exit_code(&outcome)
        }
        Err(e) => {
            if !cli.quiet {
                eprintln!("ventricle: {}", e);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<Outcome, ShellError> {
    let mode = if cli.shell {
        ExecMode::LoginShell
    } else {
        ExecMode::Direct
    };
    let mut session = ShellSession::with_config(SessionConfig::default().with_mode(mode))?;

    if let Some(path) = rc_path(cli) {
        RcLoader::new(path).load_into(session.environment_mut())?;
    }

    signal::install_interrupt_guard()?;

    let stages = split_stages(&cli.command);
    session.execute_pipeline(&stages)
}

fn rc_path(cli: &Cli) -> Option<PathBuf> {
    if cli.no_rc {
        return None;
    }
    cli.rc
        .clone()
        .or_else(|| dirs::home_dir().map(|home| home.join(RC_FILE)))
}

fn split_stages(args: &[String]) -> Vec<Vec<String>> {
    args.split(|arg| arg == "|").map(<[String]>::to_vec).collect()
}

fn exit_code(outcome: &Outcome) -> ExitCode {
    let code = match outcome.termination {
        Termination::Exited(code) => code,
        Termination::Signaled(signo) => 128 + signo,
    };
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
