//! [`WindowManager`] implementation backed by i3 IPC.
//!
//! Each call opens a short-lived connection to the socket, sends one
//! request and reads its reply.  Sway speaks the same protocol.

use super::ipc::{self, Connection, IpcError};
use crate::traits::WindowManager;
use crate::tree::Node;
use log::debug;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// i3-backed window manager handle.
#[derive(Debug, Clone)]
pub struct I3Wm {
    socket: PathBuf,
}

/// One entry of a `RUN_COMMAND` reply.
#[derive(Deserialize)]
struct CommandOutcome {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

impl I3Wm {
    /// Handle for the window manager at `socket`.
    pub fn new(socket: impl AsRef<Path>) -> Self {
        Self {
            socket: socket.as_ref().to_path_buf(),
        }
    }

    /// Locate the socket from the environment and check it answers.
    pub fn connect() -> Result<Self, IpcError> {
        let wm = Self::new(ipc::socket_path()?);
        Connection::connect(&wm.socket)?;
        Ok(wm)
    }

    pub fn socket(&self) -> &Path {
        &self.socket
    }

    fn request(&self, kind: u32, payload: &[u8]) -> Result<Vec<u8>, IpcError> {
        Connection::connect(&self.socket)?.request(kind, payload)
    }
}

/// Turn a `RUN_COMMAND` reply into an error if any command failed.
fn check_outcomes(body: &[u8]) -> Result<(), IpcError> {
    let outcomes: Vec<CommandOutcome> = serde_json::from_slice(body)?;
    match outcomes.into_iter().find(|o| !o.success) {
        Some(failed) => Err(IpcError::Command(
            failed.error.unwrap_or_else(|| "unknown error".into()),
        )),
        None => Ok(()),
    }
}

impl WindowManager for I3Wm {
    type Error = IpcError;

    fn get_tree(&self) -> Result<Node, Self::Error> {
        let body = self.request(ipc::GET_TREE, b"")?;
        Ok(serde_json::from_slice(&body)?)
    }

    fn command(&self, command: &str) -> Result<(), Self::Error> {
        debug!("run: {}", command);
        let body = self.request(ipc::RUN_COMMAND, command.as_bytes())?;
        check_outcomes(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::net::UnixListener;
    use std::sync::atomic::{AtomicU32, Ordering};

    static TEST_ID: AtomicU32 = AtomicU32::new(0);

    fn tmp_socket_path() -> PathBuf {
        let id = TEST_ID.fetch_add(1, Ordering::SeqCst);
        std::env::temp_dir().join(format!("i3manager-wm-test-{}-{}.sock", std::process::id(), id))
    }

    /// Serve one request with `reply`, returning what was received.
    fn serve_once(reply: &'static [u8]) -> (PathBuf, std::thread::JoinHandle<(u32, Vec<u8>)>) {
        let path = tmp_socket_path();
        let _ = std::fs::remove_file(&path);
        let listener = UnixListener::bind(&path).unwrap();
        let handle = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let (kind, payload) = ipc::read_message(&mut stream).unwrap();
            ipc::write_message(&mut stream, kind, reply).unwrap();
            (kind, payload)
        });
        (path, handle)
    }

    #[test]
    fn command_success() {
        let (path, server) = serve_once(br#"[{"success":true}]"#);
        let wm = I3Wm::new(&path);
        wm.command("workspace 2").unwrap();
        let (kind, payload) = server.join().unwrap();
        assert_eq!(kind, ipc::RUN_COMMAND);
        assert_eq!(payload, b"workspace 2");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn command_failure_carries_message() {
        let (path, server) =
            serve_once(br#"[{"success":false,"error":"No matching node"}]"#);
        let wm = I3Wm::new(&path);
        let err = wm.command("[con_id=1] focus").unwrap_err();
        assert!(matches!(err, IpcError::Command(ref m) if m == "No matching node"));
        server.join().unwrap();
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn get_tree_parses_reply() {
        let (path, server) = serve_once(
            br#"{"id":1,"type":"root","nodes":[{"id":2,"type":"output","name":"DP-1"}]}"#,
        );
        let wm = I3Wm::new(&path);
        let tree = wm.get_tree().unwrap();
        assert_eq!(tree.nodes[0].name(), "DP-1");
        let (kind, _) = server.join().unwrap();
        assert_eq!(kind, ipc::GET_TREE);
        let _ = std::fs::remove_file(&path);
    }
}
