//! In-memory model of outputs and workspaces.
//!
//! Workspaces live in an arena keyed by a stable [`WorkspaceId`].  The
//! `(num, name)` pair the window manager uses to identify a workspace is
//! kept in a separate index, so renaming a workspace re-keys the index while
//! every holder of the id keeps pointing at the same object.
//!
//! [`Output`]s only hold ids, ordered by workspace number.  The arena is the
//! single owner.

use crate::history::{ConId, FocusHistory};
use std::collections::HashMap;

/// Name of the window manager's hidden scratch workspace.
pub const SCRATCH_WORKSPACE: &str = "__i3_scratch";

/// Prefix shared by the window manager's internal outputs and workspaces.
pub const INTERNAL_PREFIX: &str = "__";

/// Stable identity of a [`Workspace`], independent of its number or name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkspaceId(u64);

/// `(num, name)` as reported by the window manager.
pub type WorkspaceKey = (i32, String);

/// A display and the workspaces it hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    name: String,
    workspaces: Vec<WorkspaceId>,
}

impl Output {
    fn new(name: &str) -> Self {
        log::debug!("creating output {}", name);
        Self {
            name: name.to_string(),
            workspaces: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Workspace ids sorted by workspace number.
    pub fn workspaces(&self) -> &[WorkspaceId] {
        &self.workspaces
    }

    pub fn contains(&self, id: WorkspaceId) -> bool {
        self.workspaces.contains(&id)
    }
}

/// A numbered, named workspace and its focus history.
#[derive(Debug, Clone)]
pub struct Workspace {
    num: i32,
    name: String,
    con_id: Option<ConId>,
    history: FocusHistory,
}

impl Workspace {
    fn new(num: i32, name: &str) -> Self {
        log::debug!("creating workspace {}", name);
        Self {
            num,
            name: name.to_string(),
            con_id: None,
            history: FocusHistory::new(),
        }
    }

    pub fn num(&self) -> i32 {
        self.num
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> WorkspaceKey {
        (self.num, self.name.clone())
    }

    /// Container id of the workspace node in the window manager's tree.
    pub fn con_id(&self) -> Option<ConId> {
        self.con_id
    }

    pub fn history(&self) -> &FocusHistory {
        &self.history
    }

    pub fn on_window_focus(&mut self, id: ConId) {
        self.history.on_window_focus(id);
    }

    pub fn on_window_close(&mut self, id: ConId) {
        self.history.on_window_close(id);
    }

    pub fn has_container(&self, id: ConId) -> bool {
        self.history.has_container(id)
    }

    pub fn last_window(&self) -> Option<ConId> {
        self.history.last_window()
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}

/// Outputs, workspaces, and what is currently focused.
#[derive(Debug, Default)]
pub struct Model {
    outputs: HashMap<String, Output>,
    arena: HashMap<WorkspaceId, Workspace>,
    index: HashMap<WorkspaceKey, WorkspaceId>,
    next_id: u64,
    current_output: Option<String>,
    current_workspace: Option<WorkspaceId>,
    scratchpad: Option<WorkspaceId>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    //  Lookups

    pub fn output(&self, name: &str) -> Option<&Output> {
        self.outputs.get(name)
    }

    /// Look up an output by name, creating it on first reference.
    pub fn get_or_create_output(&mut self, name: &str) -> &mut Output {
        self.outputs
            .entry(name.to_string())
            .or_insert_with(|| Output::new(name))
    }

    /// Look up a workspace by `(num, name)`, creating it on first reference.
    ///
    /// A new workspace is not attached to any output; see [`Model::attach`].
    pub fn get_or_create_workspace(&mut self, num: i32, name: &str) -> WorkspaceId {
        if let Some(&id) = self.index.get(&(num, name.to_string())) {
            return id;
        }
        let id = self.alloc(Workspace::new(num, name));
        self.index.insert((num, name.to_string()), id);
        id
    }

    pub fn lookup(&self, num: i32, name: &str) -> Option<WorkspaceId> {
        self.index.get(&(num, name.to_string())).copied()
    }

    /// Find a tracked workspace by the container id of its tree node.
    pub fn lookup_con(&self, con_id: ConId) -> Option<WorkspaceId> {
        self.index
            .values()
            .copied()
            .find(|id| self.arena.get(id).and_then(Workspace::con_id) == Some(con_id))
    }

    pub fn workspace(&self, id: WorkspaceId) -> Option<&Workspace> {
        self.arena.get(&id)
    }

    pub fn workspace_mut(&mut self, id: WorkspaceId) -> Option<&mut Workspace> {
        self.arena.get_mut(&id)
    }

    /// Ids of every workspace in the table (the scratchpad excluded).
    pub fn workspace_ids(&self) -> impl Iterator<Item = WorkspaceId> + '_ {
        self.index.values().copied()
    }

    /// Name of the output hosting `id`.
    pub fn owner_of(&self, id: WorkspaceId) -> Option<&str> {
        self.outputs
            .values()
            .find(|o| o.contains(id))
            .map(|o| o.name.as_str())
    }

    /// Workspaces of `output` in number order.
    pub fn output_workspaces(&self, output: &str) -> Vec<(WorkspaceId, &Workspace)> {
        self.outputs
            .get(output)
            .map(|o| {
                o.workspaces
                    .iter()
                    .filter_map(|id| self.arena.get(id).map(|ws| (*id, ws)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Numbers in use on `output`, except the one held by `except`.
    pub fn used_numbers(&self, output: &str, except: Option<WorkspaceId>) -> Vec<i32> {
        self.output_workspaces(output)
            .into_iter()
            .filter(|(id, _)| Some(*id) != except)
            .map(|(_, ws)| ws.num)
            .collect()
    }

    //  Mutation

    /// Record the tree container id of a workspace node.
    pub fn set_con_id(&mut self, id: WorkspaceId, con_id: ConId) {
        if let Some(ws) = self.arena.get_mut(&id) {
            ws.con_id = Some(con_id);
        }
    }

    /// Add `id` to `output`, keeping the list sorted.  A workspace already
    /// hosted elsewhere is moved.
    pub fn attach(&mut self, output: &str, id: WorkspaceId) {
        if self.outputs.get(output).is_some_and(|o| o.contains(id)) {
            return;
        }
        if let Some(previous) = self.owner_of(id).map(str::to_string) {
            self.detach(&previous, id);
        }
        self.get_or_create_output(output).workspaces.push(id);
        self.sort_output(output);
    }

    /// Remove `id` from `output`'s list.  The workspace itself survives.
    pub fn detach(&mut self, output: &str, id: WorkspaceId) {
        if let Some(o) = self.outputs.get_mut(output) {
            o.workspaces.retain(|&w| w != id);
        }
    }

    /// Give a workspace a new number and name.
    ///
    /// The object is mutated in place; the table is re-keyed and the owning
    /// output re-sorted.  Returns `false` when `id` is unknown.
    pub fn rename(&mut self, id: WorkspaceId, num: i32, name: &str) -> bool {
        let Some(ws) = self.arena.get_mut(&id) else {
            return false;
        };
        let old = (ws.num, std::mem::replace(&mut ws.name, name.to_string()));
        ws.num = num;
        if self.index.get(&old) == Some(&id) {
            self.index.remove(&old);
        }
        self.index.insert((num, name.to_string()), id);
        if let Some(owner) = self.owner_of(id).map(str::to_string) {
            self.sort_output(&owner);
        }
        true
    }

    /// Destroy a workspace: drop it from its output, the table and the arena.
    pub fn remove_workspace(&mut self, id: WorkspaceId) -> Option<Workspace> {
        if let Some(owner) = self.owner_of(id).map(str::to_string) {
            self.detach(&owner, id);
        }
        let ws = self.arena.remove(&id)?;
        if self.index.get(&ws.key()) == Some(&id) {
            self.index.remove(&ws.key());
        }
        if self.current_workspace == Some(id) {
            self.current_workspace = None;
        }
        Some(ws)
    }

    /// Remove `con` from every workspace's history, scratchpad included.
    pub fn forget_window(&mut self, con: ConId) {
        for ws in self.arena.values_mut() {
            ws.on_window_close(con);
        }
    }

    /// Every workspace, scratchpad included, whose history holds `con`.
    pub fn holders(&self, con: ConId) -> Vec<WorkspaceId> {
        let mut ids: Vec<WorkspaceId> = self
            .arena
            .iter()
            .filter(|(_, ws)| ws.has_container(con))
            .map(|(&id, _)| id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Make `target` the only workspace whose history holds `con`.
    ///
    /// An entry already in `target` keeps its position.  Returns whether
    /// anything changed.
    pub fn confine_window(&mut self, con: ConId, target: WorkspaceId) -> bool {
        let mut changed = false;
        for id in self.holders(con) {
            if id != target {
                if let Some(ws) = self.arena.get_mut(&id) {
                    ws.on_window_close(con);
                    changed = true;
                }
            }
        }
        if let Some(ws) = self.arena.get_mut(&target) {
            if !ws.has_container(con) {
                ws.on_window_focus(con);
                changed = true;
            }
        }
        changed
    }

    //  Focus pointers

    pub fn current_output(&self) -> Option<&str> {
        self.current_output.as_deref()
    }

    /// The focused workspace, if it still exists.
    pub fn current_workspace(&self) -> Option<WorkspaceId> {
        self.current_workspace.filter(|id| self.arena.contains_key(id))
    }

    pub fn set_current(&mut self, output: Option<&str>, workspace: Option<WorkspaceId>) {
        if let Some(output) = output {
            self.get_or_create_output(output);
            self.current_output = Some(output.to_string());
        }
        if workspace.is_some() {
            self.current_workspace = workspace;
        }
    }

    //  Scratchpad

    /// The scratchpad workspace, created on first use.
    ///
    /// It lives in the arena only: no output hosts it and it has no table
    /// entry.
    pub fn scratchpad(&mut self) -> WorkspaceId {
        if let Some(id) = self.scratchpad {
            return id;
        }
        let id = self.alloc(Workspace::new(-1, SCRATCH_WORKSPACE));
        self.scratchpad = Some(id);
        id
    }

    pub fn scratchpad_id(&self) -> Option<WorkspaceId> {
        self.scratchpad
    }

    /// Whether `con` is known to be hidden in the scratchpad.
    pub fn is_scratched(&self, con: ConId) -> bool {
        self.scratchpad
            .and_then(|id| self.arena.get(&id))
            .is_some_and(|ws| ws.has_container(con))
    }

    //  Internals

    fn alloc(&mut self, ws: Workspace) -> WorkspaceId {
        let id = WorkspaceId(self.next_id);
        self.next_id += 1;
        self.arena.insert(id, ws);
        id
    }

    fn sort_output(&mut self, output: &str) {
        let Some(o) = self.outputs.get_mut(output) else {
            return;
        };
        let arena = &self.arena;
        o.workspaces
            .sort_by_key(|id| arena.get(id).map(|ws| ws.num).unwrap_or(i32::MAX));
    }
}
