//! figma-mcp: MCP server giving AI assistants access to Figma design data
//!
//! Speaks MCP over stdio. Logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use figma_mcp::config::{self, Config, OutputFormat};
use figma_mcp::figma::FigmaClient;
use figma_mcp::mcp::server::McpServer;
use figma_mcp::tools;

/// MCP server giving AI assistants access to Figma design data.
///
/// Exposes a `get_figma_data` tool that returns the layout of a Figma file
/// or node as YAML.
#[derive(Parser, Debug)]
#[command(name = "figma-mcp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Figma personal access token
    #[arg(long, env = "FIGMA_API_KEY", hide_env_values = true)]
    figma_api_key: Option<String>,

    /// Figma OAuth access token
    #[arg(long, env = "FIGMA_OAUTH_TOKEN", hide_env_values = true)]
    figma_oauth_token: Option<String>,

    /// Authenticate with the OAuth token instead of the API key
    #[arg(long)]
    oauth: bool,

    /// Register tools under development names (e.g. `get_figma_data-dev`)
    #[arg(long)]
    dev: bool,

    /// Return tool results as JSON instead of YAML
    #[arg(long)]
    json: bool,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    /// Applies command-line and environment overrides on top of the file.
    fn apply(&self, cfg: &mut Config) {
        if let Some(key) = self.figma_api_key.as_ref().filter(|k| !k.is_empty()) {
            cfg.figma.api_key.clone_from(key);
        }
        if let Some(token) = self.figma_oauth_token.as_ref().filter(|t| !t.is_empty()) {
            cfg.figma.oauth_token.clone_from(token);
        }
        if self.oauth {
            cfg.figma.use_oauth = true;
        }
        if self.dev {
            cfg.server.dev_mode = true;
        }
        if self.json {
            cfg.output.format = OutputFormat::Json;
        }
    }
}

/// Determines the log level from CLI arguments.
#[allow(clippy::match_same_arms)] // Explicit "warn" arm for clarity
fn get_log_level(verbose: u8, quiet: bool, config_level: &str) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => match config_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::WARN, // Default to warn for unknown levels
        },
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialises the tracing subscriber for logging.
///
/// stdout carries protocol messages, so logs are written to stderr.
fn init_tracing(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Entry point for the figma-mcp server.
fn main() -> ExitCode {
    let args = Args::parse();

    let mut cfg = match config::load_config(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };
    args.apply(&mut cfg);

    let log_level = get_log_level(args.verbose, args.quiet, &cfg.logging.level);
    init_tracing(log_level);

    let auth = match cfg.figma.auth_mode() {
        Ok(auth) => auth,
        Err(e) => {
            error!(error = %e, "Cannot start without Figma credentials");
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        auth = auth.label(),
        base_url = %cfg.figma.base_url,
        dev_mode = cfg.server.dev_mode,
        "Starting figma-mcp server"
    );

    let client = match FigmaClient::with_options(auth, &cfg.figma.base_url, cfg.figma.timeout()) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Failed to create Figma client");
            return ExitCode::FAILURE;
        }
    };

    let registry = tools::registry(Arc::new(client), cfg.output.format, cfg.server.dev_mode);
    let mut server = McpServer::stdio(registry);

    info!("MCP server ready, waiting for client connection...");

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to create Tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(server.run()) {
        Ok(()) => {
            info!("Server shut down gracefully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn log_level_from_flags() {
        assert_eq!(get_log_level(0, true, "trace"), Level::ERROR);
        assert_eq!(get_log_level(2, false, "warn"), Level::DEBUG);
        assert_eq!(get_log_level(0, false, "INFO"), Level::INFO);
        assert_eq!(get_log_level(0, false, "bogus"), Level::WARN);
    }

    #[test]
    fn cli_overrides_config() {
        let args = Args::parse_from([
            "figma-mcp",
            "--figma-api-key",
            "figd_cli",
            "--dev",
            "--json",
        ]);
        let mut cfg = Config::default();
        args.apply(&mut cfg);

        assert_eq!(cfg.figma.api_key, "figd_cli");
        assert!(cfg.server.dev_mode);
        assert_eq!(cfg.output.format, OutputFormat::Json);
        assert!(!cfg.figma.use_oauth);
    }
}
