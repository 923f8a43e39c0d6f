//! Child-process plumbing shared by the tool-backed managers.

use std::process::Stdio;
use tokio::process::Command;

/// Runs `program` to completion and returns its stdout. Spawn failures and
/// non-zero exits come back as a one-line reason.
pub(crate) async fn output(program: &str, args: &[&str]) -> Result<String, String> {
    tracing::trace!("exec: {} {:?}", program, args);

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| format!("cannot run {}: {}", program, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        return Err(if stderr.is_empty() {
            format!("{} exited with {}", program, output.status)
        } else {
            format!("{} exited with {}: {}", program, output.status, stderr)
        });
    }

    String::from_utf8(output.stdout).map_err(|e| format!("{} printed invalid UTF-8: {}", program, e))
}
