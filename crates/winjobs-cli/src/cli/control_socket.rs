//! Control socket: server (during `winjobs run`) and client (for `winjobs pause` etc.).
//! Protocol: one command per line: "pause", "resume" or "stop".

use anyhow::Result;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use winjobs_core::control::ControlCommand;
use winjobs_core::SlidingWindowJobs;

/// Binds `path` and spawns a task applying each well-formed line to `scheduler`.
/// Malformed lines are logged and ignored.
pub fn spawn_control_listener(
    scheduler: SlidingWindowJobs<String, String>,
    path: impl AsRef<Path>,
) -> Result<tokio::task::JoinHandle<()>> {
    let path = path.as_ref().to_path_buf();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let _ = std::fs::remove_file(&path);
    let listener = UnixListener::bind(&path)?;

    let handle = tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let scheduler = scheduler.clone();
                    tokio::spawn(async move {
                        let mut lines = BufReader::new(stream).lines();
                        while let Ok(Some(line)) = lines.next_line().await {
                            match line.parse::<ControlCommand>() {
                                Ok(cmd) => {
                                    tracing::info!(command = %cmd, "control command received");
                                    cmd.apply(&scheduler);
                                }
                                Err(e) => tracing::debug!("control socket: {}", e),
                            }
                        }
                    });
                }
                Err(e) => tracing::debug!("control socket accept: {}", e),
            }
        }
    });
    Ok(handle)
}

/// Sends one command line to the control socket. Returns false if no socket exists at `path`.
pub async fn send_command(socket_path: &Path, cmd: ControlCommand) -> Result<bool> {
    if !socket_path.exists() {
        return Ok(false);
    }
    let mut stream = UnixStream::connect(socket_path).await?;
    let msg = format!("{}\n", cmd);
    stream.write_all(msg.as_bytes()).await?;
    stream.shutdown().await?;
    Ok(true)
}

/// Removes the socket file when the run ends.
pub struct SocketGuard(pub PathBuf);

impl Drop for SocketGuard {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}
