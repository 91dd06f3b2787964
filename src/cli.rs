//! CLI definitions for the lanchat binary.

use clap::{Parser, ValueEnum};

use lanchat_transport::{GROUP_ID_MAX, GROUP_ID_MIN, SERVICE_PORT};

/// Multicast chat over the local network segment
#[derive(Parser)]
#[command(name = "lanchat")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Network interface to join the group on (default: first
    /// multicast-capable interface)
    #[arg(short = 'i', long)]
    pub interface: Option<String>,

    /// Last octet of the 224.0.0.0/24 group address
    #[arg(
        short = 'g',
        long,
        default_value_t = 250,
        value_parser = clap::value_parser!(u8).range(GROUP_ID_MIN as i64..=GROUP_ID_MAX as i64)
    )]
    pub group_id: u8,

    /// UDP service port
    #[arg(short = 'p', long, default_value_t = SERVICE_PORT)]
    pub port: u16,

    /// Send a counter payload every 100ms instead of reading stdin
    #[arg(long)]
    pub robot: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, short = 'L', default_value = "info")]
    pub log_level: LogLevel,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}
