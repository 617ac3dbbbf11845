//! [`MessageSource`] that subscribes to i3's `workspace` and `window`
//! events.
//!
//! The wire payloads look like
//!
//! ```json
//! {"change":"focus","current":{…node…},"old":{…node…}}
//! {"change":"move","container":{…node…}}
//! ```
//!
//! and are decoded into [`Event`]s.  Changes the manager does not track
//! (`urgent`, `title`, `fullscreen_mode`, …) are dropped here.

use super::ipc::{self, Connection, IpcError};
use crate::command::Message;
use crate::event::Event;
use crate::traits::MessageSource;
use crate::tree::Node;
use log::{debug, info, warn};
use serde::Deserialize;
use std::path::Path;
use std::sync::mpsc;

#[derive(Deserialize)]
struct WorkspacePayload {
    change: String,
    current: Option<Node>,
    old: Option<Node>,
}

#[derive(Deserialize)]
struct WindowPayload {
    change: String,
    container: Node,
}

#[derive(Deserialize)]
struct SubscribeReply {
    success: bool,
}

/// Decode one event message into an [`Event`].
///
/// Returns `Ok(None)` for event types and changes the manager ignores.
pub fn decode(kind: u32, payload: &[u8]) -> Result<Option<Event>, IpcError> {
    match kind {
        ipc::EVENT_WORKSPACE => {
            let p: WorkspacePayload = serde_json::from_slice(payload)?;
            let Some(current) = p.current else {
                return Ok(None);
            };
            Ok(match p.change.as_str() {
                "init" => Some(Event::WorkspaceInit { current }),
                "focus" => Some(Event::WorkspaceFocus { current, old: p.old }),
                "empty" => Some(Event::WorkspaceEmpty { current }),
                "rename" => Some(Event::WorkspaceRename { current }),
                "move" => Some(Event::WorkspaceMove { current }),
                _ => None,
            })
        }
        ipc::EVENT_WINDOW => {
            let p: WindowPayload = serde_json::from_slice(payload)?;
            let container = p.container;
            Ok(match p.change.as_str() {
                "focus" => Some(Event::WindowFocus { container }),
                "close" => Some(Event::WindowClose { container }),
                "move" => Some(Event::WindowMove { container }),
                _ => None,
            })
        }
        _ => Ok(None),
    }
}

/// Event subscription on its own IPC connection.
pub struct I3EventSource {
    conn: Connection,
}

impl I3EventSource {
    /// Connect to `socket` and subscribe to workspace and window events.
    pub fn subscribe(socket: &Path) -> Result<Self, IpcError> {
        let mut conn = Connection::connect(socket)?;
        let reply = conn.request(ipc::SUBSCRIBE, br#"["workspace","window","shutdown"]"#)?;
        let reply: SubscribeReply = serde_json::from_slice(&reply)?;
        if !reply.success {
            return Err(IpcError::Protocol("subscription refused".into()));
        }
        info!("subscribed to window manager events");
        Ok(Self { conn })
    }
}

impl MessageSource for I3EventSource {
    type Error = IpcError;

    /// Forward events until the window manager goes away or the sink closes.
    ///
    /// This method **blocks**.  Run it on a dedicated thread.
    fn run(&mut self, sink: mpsc::Sender<Message>) -> Result<(), Self::Error> {
        loop {
            let (kind, payload) = self.conn.next_message()?;
            if kind == ipc::EVENT_SHUTDOWN {
                info!("window manager is shutting down");
                return Ok(());
            }
            let event = match decode(kind, &payload) {
                Ok(Some(event)) => event,
                Ok(None) => continue,
                Err(e) => {
                    warn!("undecodable event (type {:#x}): {}", kind, e);
                    continue;
                }
            };
            debug!("event {}", event.kind());
            if sink.send(Message::Event(event)).is_err() {
                info!("sink closed, dropping event subscription");
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::net::UnixListener;

    #[test]
    fn decode_workspace_focus() {
        let json = br#"{"change":"focus",
            "current":{"id":5,"type":"workspace","num":2,"name":"2","output":"DP-1"},
            "old":{"id":4,"type":"workspace","num":1,"name":"1","output":"DP-1"}}"#;
        match decode(ipc::EVENT_WORKSPACE, json).unwrap() {
            Some(Event::WorkspaceFocus { current, old }) => {
                assert_eq!(current.num(), 2);
                assert_eq!(old.map(|o| o.num()), Some(1));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn decode_window_move() {
        let json = br#"{"change":"move","container":{"id":9,"type":"con","window":77}}"#;
        match decode(ipc::EVENT_WINDOW, json).unwrap() {
            Some(Event::WindowMove { container }) => assert_eq!(container.window, Some(77)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn ignored_changes() {
        let json = br#"{"change":"title","container":{"id":9,"type":"con"}}"#;
        assert!(decode(ipc::EVENT_WINDOW, json).unwrap().is_none());
        let json = br#"{"change":"urgent","current":{"id":5,"type":"workspace"}}"#;
        assert!(decode(ipc::EVENT_WORKSPACE, json).unwrap().is_none());
        assert!(decode(ipc::EVENT_BIT | 4, b"{}").unwrap().is_none());
    }

    #[test]
    fn malformed_payload_is_an_error() {
        assert!(decode(ipc::EVENT_WINDOW, b"not json").is_err());
    }

    #[test]
    fn subscribe_and_forward() {
        let path = std::env::temp_dir().join(format!(
            "i3manager-events-test-{}.sock",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        let listener = UnixListener::bind(&path).unwrap();
        let server = std::thread::spawn(move || {
            let (mut s, _) = listener.accept().unwrap();
            let (kind, _) = ipc::read_message(&mut s).unwrap();
            ipc::write_message(&mut s, kind, br#"{"success":true}"#).unwrap();
            ipc::write_message(
                &mut s,
                ipc::EVENT_WINDOW,
                br#"{"change":"focus","container":{"id":3,"type":"con","window":1}}"#,
            )
            .unwrap();
            ipc::write_message(&mut s, ipc::EVENT_SHUTDOWN, br#"{"change":"exit"}"#).unwrap();
        });

        let mut source = I3EventSource::subscribe(&path).unwrap();
        let (tx, rx) = mpsc::channel();
        source.run(tx).unwrap();
        server.join().unwrap();

        let got: Vec<Message> = rx.try_iter().collect();
        assert_eq!(got.len(), 1);
        assert!(matches!(
            &got[0],
            Message::Event(Event::WindowFocus { container }) if container.id == 3
        ));
        let _ = std::fs::remove_file(&path);
    }
}
