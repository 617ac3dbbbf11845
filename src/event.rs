//! Window-manager events the manager reacts to.
//!
//! The event source decodes the window manager's wire events into this
//! closed set; anything else is dropped before it reaches the manager.

use crate::tree::Node;

#[derive(Debug, Clone)]
pub enum Event {
    /// A workspace was created.
    WorkspaceInit { current: Node },
    /// Focus moved to `current`, away from `old` (absent on startup).
    WorkspaceFocus { current: Node, old: Option<Node> },
    /// A workspace lost its last window and was destroyed.
    WorkspaceEmpty { current: Node },
    /// `current` carries the workspace's new number and name.
    WorkspaceRename { current: Node },
    /// A workspace was moved to the output named in `current.output`.
    WorkspaceMove { current: Node },
    WindowFocus { container: Node },
    WindowClose { container: Node },
    WindowMove { container: Node },
}

impl Event {
    /// Short kebab-case name, as used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::WorkspaceInit { .. } => "workspace-init",
            Event::WorkspaceFocus { .. } => "workspace-focus",
            Event::WorkspaceEmpty { .. } => "workspace-empty",
            Event::WorkspaceRename { .. } => "workspace-rename",
            Event::WorkspaceMove { .. } => "workspace-move",
            Event::WindowFocus { .. } => "window-focus",
            Event::WindowClose { .. } => "window-close",
            Event::WindowMove { .. } => "window-move",
        }
    }
}
