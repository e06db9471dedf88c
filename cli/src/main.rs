mod tui;

use clap::Parser;
use thiserror::Error;

use crate::tui::{App, run_app};

/// Browse a package's release notes without leaving the terminal.
///
/// The identifier is either an npm package name (resolved through the
/// registry) or an explicit owner/name repository pair.
///
/// Examples:
///   relnotes vue            # npm package, resolved to vuejs/core
///   relnotes vuejs/core     # repository pair, no registry lookup
#[derive(Debug, Parser)]
#[command(name = "relnotes")]
#[command(version)]
#[command(about = "Browse a package's GitHub release notes in the terminal")]
struct Cli {
    /// Package name or owner/name repository pair.
    #[arg(value_name = "IDENTIFIER")]
    identifier: String,

    /// Enable debug logging to ~/.relnotes-debug.log.
    #[arg(long)]
    debug: bool,
}

#[derive(Debug, Error)]
enum RelnotesError {
    #[error("TUI error: {0}")]
    Tui(std::io::Error),

    #[error("debug log error: {0}")]
    DebugLog(std::io::Error),
}

fn main() -> Result<(), RelnotesError> {
    let cli = Cli::parse();

    if cli.debug {
        init_debug_logging()?;
    }

    run_tui(cli.identifier)
}

/// Initializes debug logging to ~/.relnotes-debug.log.
///
/// The TUI owns the terminal, so tracing output goes to a file.
fn init_debug_logging() -> Result<(), RelnotesError> {
    use std::fs::OpenOptions;
    use tracing_subscriber::EnvFilter;

    let home = dirs::home_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
    let log_path = home.join(".relnotes-debug.log");

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(RelnotesError::DebugLog)?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_writer(file)
        .with_ansi(false)
        .init();

    Ok(())
}

/// Runs the TUI application with proper terminal setup and cleanup.
fn run_tui(identifier: String) -> Result<(), RelnotesError> {
    // Runtime for the fetch tasks; the control loop itself stays synchronous
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(RelnotesError::Tui)?;
    let _guard = runtime.enter();

    // Set up panic hook for terminal cleanup
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        original_hook(info);
    }));

    let mut terminal = ratatui::init();
    let mut app = App::new(identifier);

    let result = run_app(&mut terminal, &mut app);

    ratatui::restore();

    result.map_err(RelnotesError::Tui)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clap_requires_an_identifier() {
        assert!(Cli::try_parse_from(["relnotes"]).is_err());
    }

    #[test]
    fn clap_accepts_package_name() {
        let cli = Cli::try_parse_from(["relnotes", "vue"]).unwrap();
        assert_eq!(cli.identifier, "vue");
        assert!(!cli.debug);
    }

    #[test]
    fn clap_accepts_repository_pair() {
        let cli = Cli::try_parse_from(["relnotes", "vuejs/core"]).unwrap();
        assert_eq!(cli.identifier, "vuejs/core");
    }

    #[test]
    fn clap_accepts_debug_flag() {
        let cli = Cli::try_parse_from(["relnotes", "vue", "--debug"]).unwrap();
        assert!(cli.debug);
    }
}
