use anyhow::{anyhow, Result};
use dohproxy::{Config, HttpForwarder, SharedConfig};
use is_terminal::IsTerminal;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_init();

    let mut first_args = std::env::args().take(2);
    let (program_name, config_file) = (
        first_args.next().unwrap_or("dohproxy".to_string()),
        first_args.next(),
    );

    let config = config_init(&program_name, config_file)?;
    let forwarder = Arc::new(HttpForwarder::new(&config.upstream)?);

    tracing::info!(
        "proxying {} to {} (ECS policy {:?})",
        config.mount_path(),
        config.upstream.url,
        config.ecs.policy
    );
    tracing::info!("HTTP listening on {}", &config.bind_addr);
    let server = dohproxy::api::new(config.clone(), forwarder)?;
    let server_handle = tokio::spawn(server);

    tokio::select! {
        _ = signal::ctrl_c() => {
            tracing::info!("quitting from signal");
        },
        Ok(server_res) = server_handle => {
            if let Err(err) = server_res {
                return Err(err.into())
            }
        }
    }
    tracing::info!("goodbye");
    Ok(())
}

fn tracing_init() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_ansi(std::io::stdout().is_terminal()))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dohproxy=info,tower_http=info".into()),
        )
        .init();
}

fn config_init(program_name: &str, config_file: Option<String>) -> Result<SharedConfig> {
    match config_file {
        None => Err(anyhow!("usage: {program_name} /path/to/config.json")),
        Some(config_file) => {
            let config = Config::try_from_file(&config_file)?;
            tracing::debug!("loaded config from {config_file}");
            Ok(Arc::new(config))
        }
    }
}
