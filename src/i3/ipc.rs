//! i3 IPC framing.
//!
//! Every message, in both directions, is
//!
//! ```text
//! "i3-ipc" <u32 payload length> <u32 message type> <payload>
//! ```
//!
//! with integers in native byte order and a JSON payload.  Replies carry
//! the type of the request; events have the high bit of the type set.

use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};

pub const MAGIC: &[u8; 6] = b"i3-ipc";

pub const RUN_COMMAND: u32 = 0;
pub const SUBSCRIBE: u32 = 2;
pub const GET_TREE: u32 = 4;

/// Set on the type of every event message.
pub const EVENT_BIT: u32 = 0x8000_0000;
pub const EVENT_WORKSPACE: u32 = EVENT_BIT;
pub const EVENT_WINDOW: u32 = EVENT_BIT | 3;
pub const EVENT_SHUTDOWN: u32 = EVENT_BIT | 6;

/// Refuse payloads larger than this.
const MAX_PAYLOAD: u32 = 64 * 1024 * 1024;

/// Errors that can occur when talking to the window manager.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("command failed: {0}")]
    Command(String),
}

/// Resolve the IPC socket path from `I3SOCK`, falling back to `SWAYSOCK`.
pub fn socket_path() -> Result<PathBuf, IpcError> {
    ["I3SOCK", "SWAYSOCK"]
        .iter()
        .find_map(|var| std::env::var_os(var).filter(|v| !v.is_empty()))
        .map(PathBuf::from)
        .ok_or_else(|| IpcError::Protocol("neither I3SOCK nor SWAYSOCK is set".into()))
}

/// Write one framed message.
pub fn write_message<W: Write>(w: &mut W, kind: u32, payload: &[u8]) -> Result<(), IpcError> {
    let len = u32::try_from(payload.len())
        .map_err(|_| IpcError::Protocol(format!("payload too large: {}", payload.len())))?;
    let mut buf = Vec::with_capacity(14 + payload.len());
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&len.to_ne_bytes());
    buf.extend_from_slice(&kind.to_ne_bytes());
    buf.extend_from_slice(payload);
    w.write_all(&buf)?;
    Ok(())
}

/// Read one framed message, returning its type and payload.
pub fn read_message<R: Read>(r: &mut R) -> Result<(u32, Vec<u8>), IpcError> {
    let mut header = [0u8; 14];
    r.read_exact(&mut header)?;
    if &header[..6] != MAGIC {
        return Err(IpcError::Protocol(format!(
            "bad magic {:?}",
            String::from_utf8_lossy(&header[..6])
        )));
    }
    let len = u32::from_ne_bytes([header[6], header[7], header[8], header[9]]);
    let kind = u32::from_ne_bytes([header[10], header[11], header[12], header[13]]);
    if len > MAX_PAYLOAD {
        return Err(IpcError::Protocol(format!("payload too large: {}", len)));
    }
    let mut payload = vec![0u8; len as usize];
    r.read_exact(&mut payload)?;
    Ok((kind, payload))
}

/// A connection to the window manager's IPC socket.
pub struct Connection {
    stream: UnixStream,
}

impl Connection {
    pub fn connect(path: &Path) -> Result<Self, IpcError> {
        let stream = UnixStream::connect(path).map_err(|e| {
            IpcError::Protocol(format!("connect to {}: {}", path.display(), e))
        })?;
        Ok(Self { stream })
    }

    /// Send a request and wait for its reply, skipping interleaved events.
    pub fn request(&mut self, kind: u32, payload: &[u8]) -> Result<Vec<u8>, IpcError> {
        write_message(&mut self.stream, kind, payload)?;
        loop {
            let (reply_kind, body) = read_message(&mut self.stream)?;
            if reply_kind & EVENT_BIT != 0 {
                continue;
            }
            if reply_kind != kind {
                return Err(IpcError::Protocol(format!(
                    "expected reply type {}, got {}",
                    kind, reply_kind
                )));
            }
            return Ok(body);
        }
    }

    /// Block until the next message arrives.
    pub fn next_message(&mut self) -> Result<(u32, Vec<u8>), IpcError> {
        read_message(&mut self.stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn frame_layout() {
        let mut buf = Vec::new();
        write_message(&mut buf, GET_TREE, b"").unwrap();
        assert_eq!(&buf[..6], MAGIC);
        assert_eq!(buf.len(), 14);
        assert_eq!(u32::from_ne_bytes([buf[10], buf[11], buf[12], buf[13]]), GET_TREE);
    }

    #[test]
    fn read_back_written_message() {
        let mut buf = Vec::new();
        write_message(&mut buf, RUN_COMMAND, b"workspace 2").unwrap();
        let (kind, payload) = read_message(&mut Cursor::new(buf)).unwrap();
        assert_eq!(kind, RUN_COMMAND);
        assert_eq!(payload, b"workspace 2");
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut buf = b"i4-ipc".to_vec();
        buf.extend_from_slice(&0u32.to_ne_bytes());
        buf.extend_from_slice(&0u32.to_ne_bytes());
        let err = read_message(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, IpcError::Protocol(_)));
    }

    #[test]
    fn truncated_payload_is_an_io_error() {
        let mut buf = Vec::new();
        write_message(&mut buf, GET_TREE, b"{}").unwrap();
        buf.pop();
        let err = read_message(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, IpcError::Io(_)));
    }

    #[test]
    fn request_skips_events() {
        let (a, mut b) = UnixStream::pair().unwrap();
        let server = std::thread::spawn(move || {
            let (kind, _) = read_message(&mut b).unwrap();
            write_message(&mut b, EVENT_WINDOW, br#"{"change":"focus"}"#).unwrap();
            write_message(&mut b, kind, br#"[{"success":true}]"#).unwrap();
        });
        let mut conn = Connection { stream: a };
        let reply = conn.request(RUN_COMMAND, b"nop").unwrap();
        assert_eq!(reply, br#"[{"success":true}]"#);
        server.join().unwrap();
    }
}
