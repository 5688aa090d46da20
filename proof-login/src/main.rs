//! proof-login - Session management for Proofroom
//!
//! Stores, shows, and clears the auth token the other tools authenticate
//! with. Token acquisition happens outside this tool; operators paste a
//! token issued by the studio.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use libproofroom::api::{HttpApi, ProofroomApi};
use libproofroom::error::{ApiError, ErrorInfo, ErrorKind};
use libproofroom::logging::LoggingConfig;
use libproofroom::{Config, ProofroomService};
use std::io::Read;
use tracing::error;

#[derive(Parser)]
#[command(name = "proof-login")]
#[command(about = "Manage the Proofroom auth token", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Store an auth token
    Store {
        /// Token value (prompted for when omitted)
        #[arg(long)]
        token: Option<String>,

        /// Read the token from stdin (for automation/agents)
        #[arg(long)]
        stdin: bool,

        /// Skip verifying the token against the API before storing it
        #[arg(long)]
        no_verify: bool,
    },

    /// Show whether a token is stored (redacted)
    Show,

    /// Remove the stored token
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    if let Err(e) = run_command(cli.command).await {
        error!("{}", e);
        let code = e
            .downcast_ref::<libproofroom::ProofroomError>()
            .map(|e| e.exit_code())
            .unwrap_or(1);
        std::process::exit(code);
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    LoggingConfig::from_env().verbose(verbose).init();
}

async fn run_command(command: Commands) -> Result<()> {
    let service = ProofroomService::new()?;

    match command {
        Commands::Store { token, stdin, no_verify } => {
            let token = read_token(token, stdin)?;

            if !no_verify {
                verify_token(&token).await?;
            }

            service.session().store_token(&token)?;
            println!("✓ Token stored");
        }

        Commands::Show => match service.session().token() {
            Some(token) => println!("Token stored: {}", redact(&token)),
            None => println!("No token stored"),
        },

        Commands::Clear => {
            service.session().clear_token();
            println!("✓ Token cleared");
        }
    }

    Ok(())
}

fn read_token(flag: Option<String>, stdin: bool) -> Result<String> {
    if let Some(token) = flag {
        return Ok(token);
    }

    if stdin {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read token from stdin")?;
        return Ok(buffer.trim().to_string());
    }

    if !atty::is(atty::Stream::Stdin) {
        bail!("No TTY available; pass --token or --stdin");
    }

    rpassword::prompt_password("Token: ").context("Failed to prompt for token")
}

/// Issue a read with the candidate token and reject it if the server
/// classifies the request as unauthorized.
async fn verify_token(token: &str) -> Result<()> {
    let config = Config::load()?;
    let api = HttpApi::new(&config.api, Some(token.to_string()))?;

    match api.list_projects(None).await {
        Ok(_) => {
            println!("✓ Token verified against {}", config.api.base_url);
            Ok(())
        }
        Err(e @ ApiError::Status { code: 401 | 403, .. }) => {
            let info = ErrorInfo::from_api_error(&e);
            bail!("Token rejected by the server: {}", info.message);
        }
        Err(e) => {
            let info = ErrorInfo::from_api_error(&e);
            if info.kind == ErrorKind::Network {
                bail!(
                    "Could not reach {} to verify the token ({}). \
                     Use --no-verify to store it anyway.",
                    config.api.base_url,
                    info.message
                );
            }
            bail!("Token verification failed: {}", info.message);
        }
    }
}

/// Keep the first and last few characters so operators can recognize which
/// token is stored without exposing it. Counts characters, not bytes, so
/// multibyte tokens redact cleanly.
fn redact(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "********".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}
