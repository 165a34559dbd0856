//! Running external helpers (`virsh`, `ip`) and capturing their stdout.

use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::error::CommandError;

/// Spawn `program` with `args`, wait for it, and map non-zero exit to `Err`.
///
/// Returns the child's stdout as UTF-8 (lossy).
pub async fn capture(program: &str, args: &[&str]) -> Result<String, CommandError> {
    debug!(program, ?args, "running command");

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|source| CommandError::Spawn {
            program: program.to_string(),
            source,
        })?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        Err(CommandError::Exit {
            program: program.to_string(),
            status: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}
