use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fmt::{Display, Formatter};

pub const REDIS_HOST_ENV: &str = "BURROW_REDIS_HOST";
pub const REDIS_PORT_ENV: &str = "BURROW_REDIS_PORT";
pub const REDIS_PASSWORD_ENV: &str = "BURROW_REDIS_PASSWORD";
pub const REDIS_DB_ENV: &str = "BURROW_REDIS_DB";
pub const REDIS_POOL_SIZE_ENV: &str = "BURROW_REDIS_POOL_SIZE";
pub const REDIS_TIMEOUT_MS_ENV: &str = "BURROW_REDIS_TIMEOUT_MS";
pub const SCRIPTED_WRITES_ENV: &str = "BURROW_SCRIPTED_WRITES";
pub const BASE_URL_ENV: &str = "BURROW_BASE_URL";
pub const LOG_FORMAT_ENV: &str = "BURROW_LOG_FORMAT";

pub const DEFAULT_REDIS_HOST: &str = "127.0.0.1";
pub const DEFAULT_REDIS_PORT: u16 = 6379;
pub const DEFAULT_POOL_SIZE: usize = 16;
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[value(name = "pretty")]
    Pretty,
    #[value(name = "json")]
    Json,
}

impl Display for LogFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "burrow", about = "Shorten, resolve and manage short URLs")]
pub struct CLI {
    #[command(flatten)]
    pub redis: RedisArgs,

    /// Prefix for the printed short URLs.
    #[arg(long, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL, global = true)]
    pub base_url: String,

    #[arg(
        long,
        env = LOG_FORMAT_ENV,
        value_enum,
        default_value_t = LogFormat::Pretty,
        global = true
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct RedisArgs {
    #[arg(long, env = REDIS_HOST_ENV, default_value = DEFAULT_REDIS_HOST, global = true)]
    pub redis_host: String,

    #[arg(long, env = REDIS_PORT_ENV, default_value_t = DEFAULT_REDIS_PORT, global = true)]
    pub redis_port: u16,

    #[arg(long, env = REDIS_PASSWORD_ENV, hide_env_values = true, global = true)]
    pub redis_password: Option<String>,

    #[arg(long, env = REDIS_DB_ENV, default_value_t = 0, global = true)]
    pub redis_db: i64,

    #[arg(long, env = REDIS_POOL_SIZE_ENV, default_value_t = DEFAULT_POOL_SIZE, global = true)]
    pub redis_pool_size: usize,

    /// Upper bound for every Redis round trip, in milliseconds.
    #[arg(long, env = REDIS_TIMEOUT_MS_ENV, default_value_t = DEFAULT_TIMEOUT_MS, global = true)]
    pub redis_timeout_ms: u64,

    /// Issue multi-step writes as single Lua scripts.
    #[arg(long, env = SCRIPTED_WRITES_ENV, global = true)]
    pub scripted_writes: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a short URL.
    Shorten {
        url: String,

        #[arg(long)]
        alias: Option<String>,

        /// Days until the short URL expires; 0 keeps it forever.
        #[arg(long, default_value_t = 0)]
        expiration_days: i64,
    },
    /// Print the target of a short code and count a visit.
    Resolve { code: String },
    /// Print the stats of a short code as JSON.
    Stats { code: String },
    /// Delete a short code.
    Delete { code: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        CLI::command().debug_assert();
    }

    #[test]
    fn parses_shorten_with_options() {
        let cli = CLI::try_parse_from([
            "burrow",
            "--redis-port",
            "6380",
            "shorten",
            "https://example.com",
            "--alias",
            "my-alias",
            "--expiration-days",
            "7",
        ])
        .unwrap();

        assert_eq!(cli.redis.redis_port, 6380);
        match cli.command {
            Command::Shorten {
                url,
                alias,
                expiration_days,
            } => {
                assert_eq!(url, "https://example.com");
                assert_eq!(alias.as_deref(), Some("my-alias"));
                assert_eq!(expiration_days, 7);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
