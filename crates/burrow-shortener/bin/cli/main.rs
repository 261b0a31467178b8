mod cli;

use crate::cli::{Command, LogFormat, RedisArgs, CLI};
use anyhow::{anyhow, Context};
use burrow_shortener::{RandomGenerator, ShortenRequest, ShortenerError, ShortenerService};
use burrow_store::{RedisConfig, RedisStore, WriteMode};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();
    init_tracing(config.log_format);

    let redis_config = redis_config(&config.redis);
    info!(
        host = %redis_config.host,
        port = redis_config.port,
        write_mode = %redis_config.write_mode,
        "starting burrow"
    );

    let store = RedisStore::connect(redis_config)
        .await
        .context("failed to connect to redis")?;
    let service = ShortenerService::new(
        Arc::new(store),
        RandomGenerator,
        config.base_url,
    );

    run(&service, config.command).await.map_err(|e| {
        anyhow!("{e} (status {})", e.status_code())
    })
}

async fn run(
    service: &ShortenerService<RedisStore, RandomGenerator>,
    command: Command,
) -> Result<(), ShortenerError> {
    match command {
        Command::Shorten {
            url,
            alias,
            expiration_days,
        } => {
            let shortened = service
                .shorten(ShortenRequest {
                    url,
                    custom_alias: alias,
                    expiration_days,
                })
                .await?;
            println!("{}", to_json(&shortened));
        }
        Command::Resolve { code } => {
            println!("{}", service.redirect(&code).await?);
        }
        Command::Stats { code } => {
            let stats = service.stats(&code).await?;
            println!("{}", to_json(&stats));
        }
        Command::Delete { code } => {
            service.delete(&code).await?;
            println!("deleted {}", code.trim());
        }
    }
    Ok(())
}

fn redis_config(args: &RedisArgs) -> RedisConfig {
    let write_mode = if args.scripted_writes {
        WriteMode::Scripted
    } else {
        WriteMode::Stepwise
    };

    RedisConfig::builder()
        .host(args.redis_host.clone())
        .port(args.redis_port)
        .password(args.redis_password.clone())
        .database(args.redis_db)
        .pool_size(args.redis_pool_size)
        .call_timeout(Duration::from_millis(args.redis_timeout_ms))
        .write_mode(write_mode)
        .build()
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
}

// Logs go to stderr so stdout only carries command output.
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
