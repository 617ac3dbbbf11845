//! The window manager's layout tree.
//!
//! [`Node`] mirrors the JSON returned by `GET_TREE` and carried in event
//! payloads.  Only the fields i3manager reads are kept; everything else is
//! ignored during deserialization.

use crate::history::ConId;
use serde::Deserialize;

/// Kind of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Root,
    Output,
    Workspace,
    #[default]
    Con,
    FloatingCon,
    Dockarea,
    #[serde(other)]
    Unknown,
}

/// One element of the layout tree.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Node {
    pub id: ConId,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Workspace number; `-1` (or absent) for named workspaces.
    pub num: Option<i32>,
    pub focused: bool,
    /// X11 window id, `None` for containers without a client.
    pub window: Option<i64>,
    pub pid: Option<i64>,
    /// i3's floating state: `auto_off`, `auto_on`, `user_off` or `user_on`.
    pub floating: Option<String>,
    /// Name of the output the node lives on (workspace payloads).
    pub output: Option<String>,
    pub layout: Option<String>,
    pub nodes: Vec<Node>,
    pub floating_nodes: Vec<Node>,
}

impl Node {
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    pub fn num(&self) -> i32 {
        self.num.unwrap_or(-1)
    }

    /// Whether this node hosts a client window.
    pub fn is_window(&self) -> bool {
        self.window.is_some() || self.pid.is_some()
    }

    /// Whether the user explicitly made this container float.
    pub fn is_user_floating(&self) -> bool {
        self.floating.as_deref() == Some("user_on")
    }

    pub fn is_internal(&self) -> bool {
        self.name().starts_with(crate::model::INTERNAL_PREFIX)
    }

    pub fn is_scratch_workspace(&self) -> bool {
        self.node_type == NodeType::Workspace && self.name() == crate::model::SCRATCH_WORKSPACE
    }

    /// Tiling children followed by floating children.
    pub fn children(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().chain(self.floating_nodes.iter())
    }

    /// Depth-first, pre-order visit of this node and its descendants.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Node)) {
        f(self);
        for child in self.children() {
            child.walk(f);
        }
    }

    /// Every window-bearing node in this subtree, in walk order.
    pub fn windows(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        self.walk(&mut |n| {
            if n.is_window() {
                out.push(n);
            }
        });
        out
    }

    /// Find the workspace enclosing the node matching `target`.
    ///
    /// Returns the nearest ancestor of type workspace together with the
    /// name of the output above it.
    pub fn find_workspace_of(&self, target: &WindowRef) -> Option<Located<'_>> {
        self.locate(target, None, None)
    }

    fn locate<'a>(
        &'a self,
        target: &WindowRef,
        output: Option<&'a str>,
        workspace: Option<&'a Node>,
    ) -> Option<Located<'a>> {
        let output = if self.node_type == NodeType::Output {
            Some(self.name())
        } else {
            output
        };
        let workspace = if self.node_type == NodeType::Workspace {
            Some(self)
        } else {
            workspace
        };
        if self.node_type != NodeType::Workspace && target.matches(self) {
            return workspace.map(|ws| Located {
                output: output.or(ws.output.as_deref()),
                workspace: ws,
            });
        }
        self.children()
            .find_map(|child| child.locate(target, output, workspace))
    }

    /// First workspace node named `name`, searching tiling children only.
    pub fn find_workspace_named(&self, name: &str) -> Option<&Node> {
        if self.node_type == NodeType::Workspace && self.name() == name {
            return Some(self);
        }
        self.nodes.iter().find_map(|n| n.find_workspace_named(name))
    }
}

/// Identifies a moved window in a freshly fetched tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowRef {
    pub con_id: ConId,
    pub window: Option<i64>,
}

impl WindowRef {
    pub fn of(node: &Node) -> Self {
        Self {
            con_id: node.id,
            window: node.window,
        }
    }

    fn matches(&self, node: &Node) -> bool {
        node.id == self.con_id || (self.window.is_some() && node.window == self.window)
    }
}

/// Result of [`Node::find_workspace_of`].
#[derive(Debug, Clone, Copy)]
pub struct Located<'a> {
    pub output: Option<&'a str>,
    pub workspace: &'a Node,
}

//  Rendering

/// Render `root` as an indented outline with box-drawing connectors.
///
/// Each line reads `type: name` (the layout stands in for unnamed
/// containers).  The focused node's line is wrapped in `<b>…</b>`; other
/// markup characters are escaped.
pub fn render(root: &Node) -> String {
    let mut out = String::new();
    render_node(root, 0, false, &[], &mut out);
    out
}

fn render_node(node: &Node, level: usize, last: bool, open: &[usize], out: &mut String) {
    let mut indent = String::new();
    for i in 0..level.saturating_sub(1) {
        indent.push_str(if open.contains(&i) { "\u{2502} " } else { "  " });
    }
    if level > 0 {
        indent.push_str(if last { "\u{2514} " } else { "\u{251c} " });
    }
    let label = match node.name.as_deref() {
        Some(name) if !name.is_empty() => name,
        _ => node.layout.as_deref().unwrap_or(""),
    };
    let line = format!(
        "{}{}: {}\n",
        indent,
        node_type_label(node.node_type),
        escape(label)
    );
    if node.focused {
        out.push_str(&format!("<b>{}</b>", line));
    } else {
        out.push_str(&line);
    }

    let total = node.nodes.len();
    for (i, child) in node.nodes.iter().enumerate() {
        let child_last = i + 1 == total;
        if child_last {
            render_node(child, level + 1, true, open, out);
        } else {
            let mut child_open = open.to_vec();
            child_open.push(level);
            render_node(child, level + 1, false, &child_open, out);
        }
    }
}

fn node_type_label(t: NodeType) -> &'static str {
    match t {
        NodeType::Root => "root",
        NodeType::Output => "output",
        NodeType::Workspace => "workspace",
        NodeType::Con => "con",
        NodeType::FloatingCon => "floating_con",
        NodeType::Dockarea => "dockarea",
        NodeType::Unknown => "unknown",
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Builders for hand-written trees in tests.
#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn root(outputs: Vec<Node>) -> Node {
        Node {
            id: 1,
            name: Some("root".into()),
            node_type: NodeType::Root,
            nodes: outputs,
            ..Node::default()
        }
    }

    pub fn output(id: ConId, name: &str, workspaces: Vec<Node>) -> Node {
        Node {
            id,
            name: Some(name.into()),
            node_type: NodeType::Output,
            nodes: workspaces,
            ..Node::default()
        }
    }

    pub fn workspace(id: ConId, num: i32, name: &str, output: &str, cons: Vec<Node>) -> Node {
        Node {
            id,
            name: Some(name.into()),
            node_type: NodeType::Workspace,
            num: Some(num),
            output: Some(output.into()),
            nodes: cons,
            ..Node::default()
        }
    }

    pub fn window(id: ConId) -> Node {
        Node {
            id,
            name: Some(format!("win{}", id)),
            window: Some(id * 1000),
            ..Node::default()
        }
    }

    pub fn split(id: ConId, children: Vec<Node>) -> Node {
        Node {
            id,
            layout: Some("splith".into()),
            nodes: children,
            ..Node::default()
        }
    }

    pub fn floating(id: ConId, children: Vec<Node>) -> Node {
        Node {
            id,
            node_type: NodeType::FloatingCon,
            nodes: children,
            ..Node::default()
        }
    }

    pub fn focused(mut node: Node) -> Node {
        node.focused = true;
        node
    }

    /// i3's internal output holding the scratch workspace.
    pub fn scratch_output(cons: Vec<Node>) -> Node {
        output(
            2,
            "__i3",
            vec![workspace(3, -1, crate::model::SCRATCH_WORKSPACE, "__i3", cons)],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn deserialize_i3_node() {
        let json = r#"{
            "id": 94, "name": "1:web", "type": "workspace", "num": 1,
            "focused": false, "output": "DP-1", "layout": "splith",
            "rect": {"x": 0, "y": 0, "width": 10, "height": 10},
            "nodes": [{"id": 95, "name": "firefox", "type": "con",
                       "window": 4194307, "floating": "auto_off",
                       "nodes": [], "floating_nodes": []}],
            "floating_nodes": [{"id": 96, "type": "floating_con", "nodes": [
                {"id": 97, "type": "con", "window": null, "pid": 1234}
            ]}]
        }"#;
        let node: Node = serde_json::from_str(json).unwrap();
        assert_eq!(node.node_type, NodeType::Workspace);
        assert_eq!(node.num(), 1);
        assert_eq!(node.output.as_deref(), Some("DP-1"));
        let windows: Vec<ConId> = node.windows().iter().map(|n| n.id).collect();
        assert_eq!(windows, vec![95, 97]);
    }

    #[test]
    fn unknown_node_type_is_tolerated() {
        let node: Node = serde_json::from_str(r#"{"id": 1, "type": "something_new"}"#).unwrap();
        assert_eq!(node.node_type, NodeType::Unknown);
    }

    #[test]
    fn locate_returns_nearest_workspace() {
        let tree = root(vec![output(
            10,
            "DP-1",
            vec![
                workspace(20, 1, "1", "DP-1", vec![window(100)]),
                workspace(21, 2, "2", "DP-1", vec![split(30, vec![window(101)])]),
            ],
        )]);
        let target = WindowRef {
            con_id: 101,
            window: None,
        };
        let found = tree.find_workspace_of(&target).unwrap();
        assert_eq!(found.workspace.id, 21);
        assert_eq!(found.output, Some("DP-1"));
    }

    #[test]
    fn locate_matches_by_x11_window() {
        let tree = root(vec![output(
            10,
            "DP-1",
            vec![workspace(20, 1, "1", "DP-1", vec![window(100)])],
        )]);
        let target = WindowRef {
            con_id: 999,
            window: Some(100_000),
        };
        assert_eq!(tree.find_workspace_of(&target).unwrap().workspace.id, 20);
    }

    #[test]
    fn locate_searches_floating_nodes() {
        let mut ws = workspace(20, 1, "1", "DP-1", vec![]);
        ws.floating_nodes.push(floating(40, vec![window(102)]));
        let tree = root(vec![output(10, "DP-1", vec![ws])]);
        let target = WindowRef {
            con_id: 102,
            window: None,
        };
        assert_eq!(tree.find_workspace_of(&target).unwrap().workspace.id, 20);
    }

    #[test]
    fn locate_missing_window() {
        let tree = root(vec![]);
        let target = WindowRef {
            con_id: 5,
            window: None,
        };
        assert!(tree.find_workspace_of(&target).is_none());
    }

    #[test]
    fn render_outline() {
        let ws = workspace(
            20,
            1,
            "1",
            "DP-1",
            vec![
                split(30, vec![window(100), focused(window(101))]),
                window(102),
            ],
        );
        let text = render(&ws);
        let expected = "workspace: 1\n\
                        \u{251c} con: splith\n\
                        \u{2502} \u{251c} con: win100\n\
                        <b>\u{2502} \u{2514} con: win101\n</b>\
                        \u{2514} con: win102\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn render_escapes_markup() {
        let mut w = window(1);
        w.name = Some("a <b> & c".into());
        assert_eq!(render(&w), "con: a &lt;b&gt; &amp; c\n");
    }
}
