pub mod rest;

use std::path::Path;

use anyhow::{Result, anyhow};
use cinelog_server::config::{Parser, ServerConfig};
use rand::Rng as _;
use reqwest::Url;
use tempfile::TempDir;
use tokio::sync::oneshot;
use tracing::info;

fn random_port() -> Result<u16> {
    let mut rng = rand::rng();

    let mut retries = 3;
    while retries > 0 {
        let port: u16 = rng.random_range(3030..4030);
        let addr: std::net::SocketAddr = format!("127.0.0.1:{}", port).parse()?;
        match std::net::TcpStream::connect_timeout(&addr, std::time::Duration::from_millis(100)) {
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => return Ok(port),
            Err(_) => retries -= 1,
            Ok(_) => retries -= 1,
        }
    }

    Err(anyhow!("Could not find a free port"))
}

/// Keeps temporary data alive and stops the server when dropped
pub struct ConfigGuard {
    #[allow(dead_code)]
    data_dir: TempDir,
    shutdown: Option<oneshot::Sender<()>>,
}

impl Drop for ConfigGuard {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

pub fn test_config(test_name: &str, base_dir: &Path) -> Result<(ServerConfig, ConfigGuard)> {
    let tmp_data_dir = TempDir::with_prefix_in(format!("{}_", test_name), base_dir)?;
    let data_dir = tmp_data_dir.path().to_string_lossy().to_string();
    let port = random_port()?.to_string();
    let args = &["cinelog-e2e-tests", "--data-dir", &data_dir, "--port", &port];
    let config = ServerConfig::try_parse_from(args)?;
    Ok((
        config,
        ConfigGuard {
            data_dir: tmp_data_dir,
            shutdown: None,
        },
    ))
}

pub async fn prepare_env(test_name: &str) -> Result<(ServerConfig, ConfigGuard)> {
    let base_dir = std::env::temp_dir();
    test_config(test_name, &base_dir)
}

/// Starts the server in background and waits until it answers health checks
pub async fn launch_env(
    args: ServerConfig,
    guard: &mut ConfigGuard,
) -> Result<(reqwest::Client, Url)> {
    let base_url = Url::parse(&args.base_url())?;
    let state = cinelog_server::run::build_state(&args).await?;
    let (tx, rx) = oneshot::channel::<()>();
    guard.shutdown = Some(tx);
    tokio::spawn(async move {
        let shutdown = async move {
            let _ = rx.await;
        };
        if let Err(e) = cinelog_server::run::run_graceful_with_state(args, state, shutdown).await {
            tracing::error!("Server failed: {e}");
        }
    });

    let client = reqwest::Client::new();
    let health_url = base_url.join("health")?;
    for _ in 0..50 {
        if let Ok(response) = client.get(health_url.clone()).send().await {
            if response.status().is_success() {
                info!("Server is ready at {base_url}");
                return Ok((client, base_url));
            }
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }
    Err(anyhow!("Server did not start"))
}

pub fn extend_url(url: &Url, segment: impl ToString) -> Url {
    let mut url = url.clone();
    url.path_segments_mut().unwrap().push(&segment.to_string());
    url
}
