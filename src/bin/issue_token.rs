//! Mint a bearer token for a user id, signed with `JWT_SECRET`.
//!
//! Token issuance belongs to the identity provider in production; this is
//! for local development and smoke tests.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use square_jobs::{config::AppConfig, services::auth::TokenVerifier};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "issue-token")]
#[command(about = "Mint a bearer token accepted by the square-jobs API")]
struct Cli {
    /// Subject of the token; becomes the owner of jobs created with it
    user_id: String,

    /// Lifetime in seconds; the token never expires when omitted
    ttl_seconds: Option<u64>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration from environment");
            return ExitCode::FAILURE;
        }
    };

    let ttl = cli.ttl_seconds.map(Duration::from_secs);
    let token = TokenVerifier::new(&config.jwt_secret)
        .and_then(|tokens| tokens.issue(&cli.user_id, ttl));
    match token {
        Ok(token) => {
            println!("{token}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to issue token");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_ttl_is_optional() {
        let cli = Cli::try_parse_from(["issue-token", "alice"]).unwrap();
        assert_eq!(cli.user_id, "alice");
        assert_eq!(cli.ttl_seconds, None);

        let cli = Cli::try_parse_from(["issue-token", "alice", "3600"]).unwrap();
        assert_eq!(cli.ttl_seconds, Some(3600));
    }

    #[test]
    fn test_ttl_must_be_a_number() {
        assert!(Cli::try_parse_from(["issue-token", "alice", "soon"]).is_err());
        assert!(Cli::try_parse_from(["issue-token"]).is_err());
    }
}
