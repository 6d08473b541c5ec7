//! Accept loop: one inspection session per connecting client.

use crate::{logger::PacketLogger, proxy::Session};
use anyhow::Context;
use std::path::PathBuf;
use tokio::{net::TcpListener, select, task::JoinSet};

/// Binds the listen port and serves sessions until the process exits.
pub async fn run(
    listen_port: u16,
    remote_host: String,
    remote_port: u16,
    config_path: PathBuf,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", listen_port))
        .await
        .with_context(|| format!("binding listen port {listen_port}"))?;
    tracing::info!(
        "Listening on {}, proxying to {remote_host}:{remote_port}",
        listener.local_addr()?
    );
    run_with_listener(listener, remote_host, remote_port, config_path).await
}

/// Serves sessions on an already-bound listener. Sessions are held in a
/// `JoinSet` owned by this loop and reaped as they finish.
pub async fn run_with_listener(
    listener: TcpListener,
    remote_host: String,
    remote_port: u16,
    config_path: PathBuf,
) -> anyhow::Result<()> {
    let mut sessions = JoinSet::new();
    loop {
        select! {
            accepted = listener.accept() => {
                let (socket, peer) = accepted.context("accept")?;
                tracing::info!("Accepted connection from {peer}");
                let logger = PacketLogger::new(&config_path);
                let session = Session::new(remote_host.clone(), remote_port, logger);
                sessions.spawn(async move {
                    if let Err(e) = session.run(socket).await {
                        tracing::info!("Session ended: {e:#}");
                    }
                });
            }
            finished = sessions.join_next(), if !sessions.is_empty() => {
                if let Some(Err(e)) = finished {
                    tracing::warn!("Session task failed: {e}");
                }
            }
        }
    }
}
