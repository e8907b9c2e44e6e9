//! Spawned process-tree control.

use tokio::process::{Child, Command};

/// Put the child in its own process group so the whole tree can be signalled.
pub(crate) fn isolate(command: &mut Command) {
    #[cfg(unix)]
    command.process_group(0);
    #[cfg(not(unix))]
    let _ = command;
}

/// Forcibly terminate the process tree rooted at `child` and reap it.
///
/// `pid` is captured at spawn time: once the leader has been reaped
/// `Child::id` is gone, but its group may still have live members.
pub(crate) async fn terminate_tree(child: &mut Child, pid: Option<u32>) {
    if let Some(pid) = pid {
        kill_tree(pid).await;
    }
    // Covers a child that already left its group or a failed group kill.
    if let Err(e) = child.start_kill() {
        tracing::debug!("start_kill after tree termination: {e}");
    }
    if let Err(e) = child.wait().await {
        tracing::warn!("Failed to reap terminated process: {e}");
    }
}

#[cfg(unix)]
async fn kill_tree(pid: u32) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        tracing::warn!(pid, error = ?e, "killpg SIGKILL failed");
    }
}

#[cfg(windows)]
async fn kill_tree(pid: u32) {
    let result = Command::new("taskkill")
        .args(["/F", "/T", "/PID", &pid.to_string()])
        .output()
        .await;
    if let Err(e) = result {
        tracing::warn!(pid, "taskkill failed: {e}");
    }
}

#[cfg(not(any(unix, windows)))]
async fn kill_tree(_pid: u32) {}
