//! Index server daemon
//!
//! Keeps an [`Engine`](crate::engine::Engine) alive between commands so an
//! indexing run can proceed in the background while queries are answered.
//!
//! Architecture:
//! - `subdex daemon`: Loads the dictionary, listens on a Unix socket, runs indexing and queries
//! - Client: Connects to socket, sends requests, receives responses
//! - Protocol: length-prefixed JSON frames

mod client;
pub mod daemon;
pub mod protocol;

pub use client::{ClientError, IndexClient};

use std::path::PathBuf;

/// Environment variable overriding the socket location
pub const SOCKET_ENV: &str = "SUBDEX_SOCKET";

/// Get the socket path for the index server
/// Uses a per-user runtime directory for security
pub fn get_socket_path() -> PathBuf {
    if let Ok(path) = std::env::var(SOCKET_ENV) {
        return PathBuf::from(path);
    }

    // Try XDG_RUNTIME_DIR first (most secure, tmpfs-backed)
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        return PathBuf::from(runtime_dir).join("subdex.sock");
    }

    // Fall back to user's home directory
    if let Some(home) = dirs::home_dir() {
        return home.join(".local").join("run").join("subdex.sock");
    }

    // Last resort: /tmp with user ID
    let uid = unsafe { libc::getuid() };
    PathBuf::from(format!("/tmp/subdex-{}.sock", uid))
}

/// Get the PID file path for the daemon (next to the socket)
pub fn get_pid_path() -> PathBuf {
    get_socket_path().with_extension("pid")
}

/// Check if the daemon is running
pub fn is_daemon_running() -> bool {
    let pid_path = get_pid_path();
    if !pid_path.exists() {
        return false;
    }

    // Read PID and check if process exists
    if let Ok(pid_str) = std::fs::read_to_string(&pid_path) {
        if let Ok(pid) = pid_str.trim().parse::<i32>() {
            // Check if process exists using kill(pid, 0)
            unsafe {
                return libc::kill(pid, 0) == 0;
            }
        }
    }

    false
}
