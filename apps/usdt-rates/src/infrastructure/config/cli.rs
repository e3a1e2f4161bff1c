//! Command-line flags.
//!
//! Every flag is optional; unset flags leave the environment value in place.

use clap::Parser;

/// Flags accepted by the service binary.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "usdt-rates", version, about = "USDT quote snapshot service")]
pub struct CliArgs {
    /// gRPC listen port.
    #[arg(long)]
    pub port: Option<u16>,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Application name used in logs and traces.
    #[arg(long)]
    pub app_name: Option<String>,

    /// Database user.
    #[arg(long)]
    pub db_user: Option<String>,

    /// Database password.
    #[arg(long)]
    pub db_password: Option<String>,

    /// Database host.
    #[arg(long)]
    pub db_host: Option<String>,

    /// Database port.
    #[arg(long)]
    pub db_port: Option<u16>,

    /// Database name.
    #[arg(long)]
    pub db_database: Option<String>,

    /// Health/metrics HTTP port (0 disables it).
    #[arg(long)]
    pub metrics_port: Option<u16>,
}
