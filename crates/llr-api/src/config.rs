//! # Server Configuration
//!
//! Command-line flags with environment fallbacks. `.env` files are loaded
//! by the binary before parsing, so every flag can also come from there.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::Parser;

/// Flags and environment variables accepted by the `llr-api` binary.
///
/// Custom `Debug` redacts the database URL and the signing key.
#[derive(Parser, Clone)]
#[command(name = "llr-api", version, about = "LLR Desk API server")]
pub struct ServerConfig {
    /// Address to bind the HTTP server to.
    #[arg(long, env = "BIND_ADDR", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind: IpAddr,

    /// Port to bind the HTTP server to.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// PostgreSQL connection URL. Absent means in-memory only.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Upper bound on pooled database connections.
    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = 10)]
    pub db_max_connections: u32,

    /// 32-byte Ed25519 seed, hex encoded, used to sign login tokens.
    #[arg(long, env = "TOKEN_SIGNING_KEY_HEX", hide_env_values = true)]
    pub token_signing_key_hex: Option<String>,

    /// Lifetime of issued login tokens, in seconds.
    #[arg(long, env = "TOKEN_TTL_SECS", default_value_t = 3600)]
    pub token_ttl_secs: u64,

    /// Require a bearer token on every `/api/*` route.
    #[arg(long, env = "REQUIRE_AUTH")]
    pub require_auth: bool,

    /// Accept any non-blank status name, not only catalog members.
    #[arg(long, env = "PERMISSIVE_STATUSES")]
    pub permissive_statuses: bool,

    /// Emit logs as JSON lines.
    #[arg(long, env = "LOG_JSON")]
    pub log_json: bool,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    /// Runtime settings shared with request handlers.
    pub fn app_config(&self) -> AppConfig {
        AppConfig {
            port: self.port,
            require_auth: self.require_auth,
            strict_statuses: !self.permissive_statuses,
            token_ttl_secs: self.token_ttl_secs,
        }
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind", &self.bind)
            .field("port", &self.port)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("db_max_connections", &self.db_max_connections)
            .field(
                "token_signing_key_hex",
                &self.token_signing_key_hex.as_ref().map(|_| "[REDACTED]"),
            )
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("require_auth", &self.require_auth)
            .field("permissive_statuses", &self.permissive_statuses)
            .field("log_json", &self.log_json)
            .finish()
    }
}

/// Application configuration carried in [`crate::AppState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    /// Whether `/api/*` routes demand a bearer token.
    pub require_auth: bool,
    /// Whether requested statuses must come from the status catalog.
    pub strict_statuses: bool,
    pub token_ttl_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            require_auth: false,
            strict_statuses: true,
            token_ttl_secs: 3600,
        }
    }
}
