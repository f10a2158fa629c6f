//! Command line options for the Latch daemon

use clap::Parser;

/// RESTful distributed lock manager
#[derive(Parser, Clone, Debug)]
#[command(name = "latch-server", version, about)]
pub struct ServerConfig {
    /// Address to bind the HTTP server to
    #[arg(long, default_value = "0.0.0.0", env = "LATCH_BIND")]
    pub bind: String,

    /// Main port (of the lock manager)
    #[arg(long, default_value_t = 8888, env = "LATCH_PORT")]
    pub port: u16,

    /// Full path of an admin userpass file (special values: no => deny
    /// admin requests, yes => no auth for admin requests)
    #[arg(long, default_value = "yes", env = "LATCH_ADMIN_USERPASS_FILE")]
    pub admin_userpass_file: String,

    /// Seconds between expiry sweeps
    #[arg(
        long,
        default_value_t = latch_common::DEFAULT_SWEEP_INTERVAL_SECS,
        env = "LATCH_SWEEP_INTERVAL_SECS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub sweep_interval_secs: u64,
}
