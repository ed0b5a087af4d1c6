//! CLI module for sfcc-auth
//!
//! Provides the command-line interface for running the admin API.

pub mod hash_password;
pub mod serve;

use clap::{Parser, Subcommand};

/// SFCC admin API - authentication, role-based access control and audit logging
#[derive(Parser, Debug)]
#[command(name = "sfcc-auth")]
#[command(version, about, long_about = None)]
#[command(after_help = r#"ENVIRONMENT VARIABLES:
    SFCC_HOST                       Bind address (default: 0.0.0.0)
    SFCC_PORT                       Listen port (default: 5000)
    SFCC_LOG_LEVEL                  Log filter (default: info)
    SFCC_DATABASE_URL               SQLite database URL (optional)
    SFCC_JWT_SECRET                 JWT signing key (random per process if not set)
    SFCC_ADMIN_USERNAME             Superuser name (default: admin)
    SFCC_ADMIN_PASSWORD_HASH        Superuser bcrypt hash (superuser disabled if not set)
    SFCC_SUPERUSER_TOKEN_TTL_HOURS  Superuser token lifetime (default: 24)
    SFCC_USER_TOKEN_TTL_HOURS       User token lifetime (default: 8)
    SFCC_BCRYPT_COST                bcrypt cost for new hashes (default: 12)
    SFCC_TRUST_PROXY_HEADERS        Use X-Forwarded-For for client addresses (default: false)
"#)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the API server
    Serve(serve::ServeArgs),
    /// Print a bcrypt hash for SFCC_ADMIN_PASSWORD_HASH
    HashPassword(hash_password::HashPasswordArgs),
}
