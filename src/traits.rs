//! Core traits that decouple the manager from any specific window manager,
//! notification service or transport.
//!
//! Every concrete backend (i3 IPC, the D-Bus notification service, the
//! command socket, a test harness, …) implements one of these traits.  The
//! [`Manager`](crate::manager::Manager) only depends on these abstractions.

use crate::command::Message;
use crate::notify::Notification;
use crate::tree::Node;
use std::sync::mpsc;

/// Abstraction over a window manager that can report its layout tree and
/// run commands.
///
/// Calls block until the window manager replies.  The manager only calls
/// them from worker threads, so implementations must be shareable across
/// threads.
pub trait WindowManager: Send + Sync + 'static {
    /// The error type produced by this window manager.
    type Error: std::error::Error + Send + 'static;

    /// Fetch the full layout tree.
    fn get_tree(&self) -> Result<Node, Self::Error>;

    /// Run one command (`workspace 3`, `[con_id=12] focus`, …).
    fn command(&self, command: &str) -> Result<(), Self::Error>;
}

/// A desktop notification service.
pub trait Notifier: Send + Sync + 'static {
    /// Show `notification` and return its id, usable as
    /// [`Notification::replaces_id`] later.
    fn notify(&self, notification: &Notification) -> Result<u32, NotifyError>;
}

/// Error returned by a [`Notifier`].
#[derive(Debug, thiserror::Error)]
#[error("notification error: {0}")]
pub struct NotifyError(pub String);

/// A source of [`Message`]s for the manager's inbox.
///
/// Implementations listen on some transport (the command socket, the
/// window manager's event subscription, an in-memory list in tests) and
/// forward what they receive into the provided [`mpsc::Sender`].
///
/// # Contract
///
/// * [`run`](MessageSource::run) **blocks** until the source is exhausted,
///   the sink is closed, or an unrecoverable error occurs.
/// * Implementations must be [`Send`] so they can run on a dedicated thread.
pub trait MessageSource: Send {
    /// The error type produced by this source.
    type Error: std::error::Error + Send + 'static;

    /// Start listening and forward every incoming message into `sink`.
    fn run(&mut self, sink: mpsc::Sender<Message>) -> Result<(), Self::Error>;
}
