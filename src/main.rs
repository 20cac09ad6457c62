//! # Transcript Guard - Tool-Use Transcript Sanitizer Server
//!
//! Serves the transcript sanitizer over HTTP and sanitizes transcript files from the
//! command line. Chat transcripts are normalized into canonical content blocks and
//! every `tool_result` that does not answer a `tool_use` from the immediately
//! preceding assistant turn is dropped.
//!
//! ## Endpoints
//!
//! ```bash
//! curl -X POST http://localhost:3000/v1/messages/sanitize \
//!   -H "Content-Type: application/json" \
//!   -d '{"messages": [{"role": "user", "content": "Hello!"}]}'
//! ```
//!
//! - `POST /v1/messages/sanitize` - sanitize a raw message list
//! - `POST /v1/agent/prepare` - validate an agent chat request and sanitize its transcript
//! - `GET /health` - status and counters
//!
//! ## Configuration
//!
//! Configuration is layered: environment variables > `TRANSCRIPT_GUARD_CONFIG` file >
//! user config file > system config file > defaults. Run `transcript-guard --help` for
//! the variable names.
//!
//! Authors: Jaro <yarenty@gmail.com>
//!
//! Copyright (c) 2026 SkyCorp
//!

/* --- uses ------------------------------------------------------------------------------------ */

use std::env;
use std::io::Read;

use tracing::info;
use tracing_subscriber::EnvFilter;

use transcript_guard::config::loader::{CONFIG_PATH_ENV, ENV_PREFIX};
use transcript_guard::config::validation::ConfigValidator;
use transcript_guard::config::{Config, paths};
use transcript_guard::error::{GuardError, Result};
use transcript_guard::protocol::sanitize_message_sequence;
use transcript_guard::server::parse_transcript;
use transcript_guard::create_app;

/* --- constants ------------------------------------------------------------------------------ */

/** the version as defined in cargo.toml */
const VERSION: &str = env!("CARGO_PKG_VERSION");

/* --- start of code -------------------------------------------------------------------------- */

///
/// Main application entry point for the Transcript Guard server.
///
/// Handles CLI commands first, then loads configuration, initializes logging and
/// serves the HTTP application until shutdown.
#[tokio::main]
async fn main() {
    // Handle CLI arguments before config loading
    handle_cli_args();

    if let Err(e) = run().await {
        // Print error message line by line to ensure proper formatting
        let error_msg = format!("{}", e);
        eprintln!("Error:");
        for line in error_msg.lines() {
            eprintln!("{}", line);
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = Config::load()?;
    initialize_logging(&config);

    start_server(config).await
}

///
/// Handle command line arguments before config loading.
///
/// Exits the process for every recognized command; returns only when no arguments
/// were given and the server should start.
fn handle_cli_args() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        return; // No arguments, proceed with normal startup
    }

    match args[1].as_str() {
        "--version" | "-V" => {
            println!("transcript-guard {}", VERSION);
            std::process::exit(0);
        }
        "--help" | "-h" => {
            print_help();
            std::process::exit(0);
        }
        "validate" => {
            let exit_code = run_validate();
            std::process::exit(exit_code);
        }
        "sanitize" => {
            let exit_code = match args.get(2) {
                Some(source) => run_sanitize(source),
                None => {
                    eprintln!("Error: sanitize requires a file path or '-' for stdin");
                    2
                }
            };
            std::process::exit(exit_code);
        }
        _ => {
            if args[1].starts_with('-') {
                eprintln!("Error: Unknown option: {}", args[1]);
            } else {
                eprintln!("Error: Unknown command: {}", args[1]);
            }
            eprintln!();
            print_help();
            std::process::exit(1);
        }
    }
}

///
/// Print help information for the Transcript Guard CLI.
fn print_help() {
    println!("Transcript Guard v{}", VERSION);
    println!("Normalizes chat transcripts and drops tool results that break tool-use causality");
    println!();
    println!("USAGE:");
    println!("    transcript-guard [COMMAND] [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    validate            Validate configuration and exit");
    println!("    sanitize <FILE|->   Sanitize a JSON transcript and print it to stdout");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help          Print help information");
    println!("    -V, --version       Print version information");
    println!();
    println!("ENVIRONMENT VARIABLES:");
    println!("    {}SERVER_HOST               Interface to bind (default: 127.0.0.1)", ENV_PREFIX);
    println!("    {}SERVER_PORT               Server port (default: 3000)", ENV_PREFIX);
    println!(
        "    {}SERVER_LOG_LEVEL          trace, debug, info, warn, error (default: info)",
        ENV_PREFIX
    );
    println!("    {}SERVER_MAX_BODY_BYTES     Request body limit (default: 2097152)", ENV_PREFIX);
    println!("    {}SANITIZER_WARN_ON_DROP    Log drops at warn level (default: true)", ENV_PREFIX);
    println!("    {:<39} Explicit configuration file", CONFIG_PATH_ENV);
    println!("    RUST_LOG                                Overrides the configured log filter");
    println!();
    println!("CONFIG FILES (highest precedence first):");
    for path in paths::config_file_paths() {
        println!("    {}", path.display());
    }
    println!();
    println!("EXAMPLES:");
    println!("    transcript-guard                          Start the server");
    println!("    transcript-guard validate                 Validate and exit");
    println!("    transcript-guard sanitize chat.json       Sanitize a transcript file");
    println!("    cat chat.json | transcript-guard sanitize -");
}

///
/// Run the validate command to validate configuration and exit.
///
/// Returns exit code 0 if valid, 1 if invalid.
fn run_validate() -> i32 {
    match Config::load() {
        Ok(config) => {
            println!("[OK] Configuration is valid");
            println!("  • bind address: {}", config.bind_address());
            println!("  • log level: {}", config.server.log_level.as_filter());
            println!("  • max body bytes: {}", config.server.max_body_bytes);
            println!("  • warn on drop: {}", config.sanitizer.warn_on_drop);
            for warning in ConfigValidator::new(&config).warnings() {
                println!("[WARNING] {}", warning);
            }
            0
        }
        Err(e) => {
            eprintln!("[ERROR] Configuration error: {}", e);
            1
        }
    }
}

///
/// Run the sanitize command on a transcript file or stdin.
///
/// Returns exit code 0 on success, 1 if the transcript could not be read or parsed.
fn run_sanitize(source: &str) -> i32 {
    match sanitize_source(source) {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            eprintln!("[ERROR] {}", e);
            1
        }
    }
}

///
/// Read, sanitize and render a transcript.
///
/// # Arguments
///  * `source` - file path (`~` and `$VAR` expanded) or `-` for stdin
///
/// # Returns
///  * Pretty-printed `{ "messages", "dropped_tool_results" }` document
///  * `GuardError` if reading or parsing fails
fn sanitize_source(source: &str) -> Result<String> {
    let raw = if source == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        std::fs::read_to_string(paths::expand_path(source)?)?
    };

    let messages = parse_transcript(serde_json::from_str(&raw)?)?;
    let outcome = sanitize_message_sequence(&messages);
    if !outcome.is_clean() {
        eprintln!("[INFO] Dropped {} orphaned tool_result block(s)", outcome.dropped_tool_results);
    }

    Ok(serde_json::to_string_pretty(&outcome)?)
}

///
/// Initialize logging with the configured log level.
///
/// `RUST_LOG`, when set, takes precedence over the configuration.
///
/// # Arguments
///  * `config` - application configuration containing log level settings
fn initialize_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.server.log_level.as_filter()));

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

///
/// Bind the listener and serve the application until shutdown.
///
/// # Arguments
///  * `config` - application configuration
///
/// # Returns
///  * `Ok(())` when server shuts down gracefully
///  * `GuardError::Http` if server binding or startup fails
async fn start_server(config: Config) -> Result<()> {
    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await.map_err(|e| {
        let error_msg = format!("Failed to bind to {}: {}", address, e);
        if e.kind() == std::io::ErrorKind::AddrInUse {
            GuardError::Http(format!(
                "{}\n\n\
                Port {} is already in use. Either stop the other process:\n\
                   lsof -i :{}\n\
                or choose another port:\n\
                   export {}SERVER_PORT=3001",
                error_msg, config.server.port, config.server.port, ENV_PREFIX
            ))
        } else {
            GuardError::Http(error_msg)
        }
    })?;

    log_startup_info(&config);

    axum::serve(listener, create_app(config))
        .await
        .map_err(|e| GuardError::Http(format!("Server error: {}", e)))?;

    Ok(())
}

///
/// Log startup information and configuration details.
///
/// # Arguments
///  * `config` - application configuration
fn log_startup_info(config: &Config) {
    info!("Transcript Guard v{} listening on http://{}", VERSION, config.bind_address());
    info!("Sanitize endpoint: http://{}/v1/messages/sanitize", config.bind_address());
    info!("Agent prepare endpoint: http://{}/v1/agent/prepare", config.bind_address());

    if !config.sanitizer.warn_on_drop {
        info!("Dropped tool_result counts are reported at debug level");
    }
}
