//! Commands and messages shared by all components.
//!
//! [`Command`] is what a client asks for over the command socket.
//! [`Message`] is everything the manager's inbox accepts: commands, events
//! from the window manager, and the results of operations the manager
//! started earlier on a worker thread.
//!
//! # Wire format
//!
//! One command per line, whitespace separated:
//!
//! ```text
//! last-window
//! workspace-left
//! workspace-right
//! output-workspace 2
//! workspace-tree
//! new-output-workspace
//! ```

use crate::event::Event;
use crate::model::WorkspaceId;
use crate::tree::{Node, WindowRef};
use std::fmt;

/// Every operation a client can request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Focus the previously focused window on the current workspace.
    LastWindow,
    /// Focus the previous workspace on the current output (wrapping).
    WorkspaceLeft,
    /// Focus the next workspace on the current output (wrapping).
    WorkspaceRight,
    /// Focus a workspace by position on the current output.
    ///
    /// Arguments are kept raw; see [`parse_index`].
    OutputWorkspace { args: Vec<String> },
    /// Show the current workspace's layout tree as a notification.
    WorkspaceTree,
    /// Switch to the first unused number in the current output's band.
    NewOutputWorkspace,
}

impl Command {
    /// Parse one line.  Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Command>, ParseError> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(None);
        };
        let cmd = match name {
            "last-window" => Command::LastWindow,
            "workspace-left" => Command::WorkspaceLeft,
            "workspace-right" => Command::WorkspaceRight,
            "output-workspace" => Command::OutputWorkspace {
                args: words.map(str::to_string).collect(),
            },
            "workspace-tree" => Command::WorkspaceTree,
            "new-output-workspace" => Command::NewOutputWorkspace,
            other => return Err(ParseError::Unknown(other.to_string())),
        };
        Ok(Some(cmd))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::LastWindow => "last-window",
            Command::WorkspaceLeft => "workspace-left",
            Command::WorkspaceRight => "workspace-right",
            Command::OutputWorkspace { .. } => "output-workspace",
            Command::WorkspaceTree => "workspace-tree",
            Command::NewOutputWorkspace => "new-output-workspace",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::OutputWorkspace { args } if !args.is_empty() => {
                write!(f, "{} {}", self.name(), args.join(" "))
            }
            _ => f.write_str(self.name()),
        }
    }
}

/// A line that is not a known command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown command {0:?}")]
    Unknown(String),
}

/// Invalid arguments to `output-workspace`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgError {
    #[error("Command must have a single argument")]
    Count,
    #[error("Argument must be an integer")]
    NotAnInteger,
}

/// Validate the single non-negative integer argument of `output-workspace`.
pub fn parse_index(args: &[String]) -> Result<usize, ArgError> {
    let [arg] = args else {
        return Err(ArgError::Count);
    };
    if arg.is_empty() || !arg.chars().all(|c| c.is_ascii_digit()) {
        return Err(ArgError::NotAnInteger);
    }
    arg.parse().map_err(|_| ArgError::NotAnInteger)
}

/// An item in the manager's inbox.
#[derive(Debug)]
pub enum Message {
    Event(Event),
    Command(Command),
    /// Continuation of an operation that waited on the window manager or
    /// the notification service.
    Resume(Resumption),
    /// Stop processing, drain in-flight tasks and return.
    Shutdown,
}

/// Results delivered back to the manager by its worker tasks.
#[derive(Debug)]
pub enum Resumption {
    /// Fresh tree fetched after `window` was reported moved.
    WindowMoved { window: WindowRef, tree: Node },
    /// Fresh tree for rendering the workspace outline of `workspace`.
    WorkspaceTree { workspace: WorkspaceId, tree: Node },
    /// Id of the notification showing the workspace tree.
    TreeNotified(u32),
    /// Renumbering renames the window manager refused.
    RenameFailed(Vec<WorkspaceId>),
}
