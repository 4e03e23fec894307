//! `winjobs pause|resume|stop` – signal the active `winjobs run` over its control socket.

use anyhow::Result;
use winjobs_core::control::{default_control_socket_path, ControlCommand};

use crate::cli::control_socket;

pub async fn run_control(cmd: ControlCommand) -> Result<()> {
    let path = default_control_socket_path()?;
    if control_socket::send_command(&path, cmd).await? {
        println!("Sent {cmd}");
    } else {
        println!("No active run (no control socket at {}).", path.display());
    }
    Ok(())
}
