//! Core window manager state.
//!
//! [`State`] is the client registry: it owns every managed client, the
//! monitor directory, the per-(monitor, workspace) sequences, focus, and the
//! in-progress drag session. All mutation happens here, one event at a time;
//! nothing in this module talks to the display server.

use std::collections::{BTreeSet, HashMap};

use indexmap::IndexMap;
use thiserror::Error;
use tracing::warn;

use crate::client::{Client, ClientFlags, ClientId, SizeHints, WindowHandle};
use crate::config::Config;
use crate::drag::DragSession;
use crate::layout::{MF_MAX, MF_MIN};
use crate::workspace::Workspace;

/// Workspaces per monitor.
pub const NUM_WORKSPACES: usize = 9;
/// Monitor directory cap.
pub const MAX_MONITORS: usize = 32;
/// Managed client cap; windows beyond it are left unmanaged.
pub const MAX_CLIENTS: usize = 99;

/// Geometry of a rectangular region in screen space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[allow(clippy::cast_possible_wrap)]
    pub const fn right(self) -> i32 {
        self.x + self.width as i32
    }

    #[allow(clippy::cast_possible_wrap)]
    pub const fn bottom(self) -> i32 {
        self.y + self.height as i32
    }

    pub const fn contains(self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    pub const fn center(self) -> (i32, i32) {
        (
            self.x + (self.width / 2) as i32,
            self.y + (self.height / 2) as i32,
        )
    }

    /// Shrink by `margin` on all four sides.
    #[allow(clippy::cast_possible_wrap)]
    pub fn inset(self, margin: u32) -> Self {
        Self::new(
            self.x + margin as i32,
            self.y + margin as i32,
            self.width.saturating_sub(margin * 2).max(1),
            self.height.saturating_sub(margin * 2).max(1),
        )
    }

    /// Translate and shrink as needed so no edge extends outside `outer`.
    pub fn clamp_within(self, outer: Self) -> Self {
        let width = self.width.min(outer.width).max(1);
        let height = self.height.min(outer.height).max(1);
        let x = self.x.clamp(outer.x, (outer.right() - width as i32).max(outer.x));
        let y = self.y.clamp(outer.y, (outer.bottom() - height as i32).max(outer.y));
        Self::new(x, y, width, height)
    }
}

/// One physical monitor plus the per-monitor state the manager keeps for it.
///
/// The rectangle is immutable between re-detection events; the workspace
/// sequences, active workspace, and master ratio live for as long as the
/// monitor index does.
#[derive(Debug, Clone)]
pub struct Monitor {
    pub geometry: Geometry,
    pub active_workspace: usize,
    pub master_width: f64,
    pub workspaces: Vec<Workspace>,
}

impl Monitor {
    pub fn new(geometry: Geometry, master_width: f64, names: &[String]) -> Self {
        let workspaces = (0..NUM_WORKSPACES)
            .map(|ws| {
                let name = names
                    .get(ws)
                    .cloned()
                    .unwrap_or_else(|| (ws + 1).to_string());
                Workspace::new(name)
            })
            .collect();
        Self {
            geometry,
            active_workspace: 0,
            master_width: master_width.clamp(MF_MIN, MF_MAX),
            workspaces,
        }
    }

    pub fn workspace(&self, ws: usize) -> &Workspace {
        // Defensive clamp: a bad index is a programming error, but taking the
        // whole session down with it is worse.
        debug_assert!(ws < self.workspaces.len());
        &self.workspaces[ws.min(self.workspaces.len() - 1)]
    }

    pub fn workspace_mut(&mut self, ws: usize) -> &mut Workspace {
        debug_assert!(ws < self.workspaces.len());
        let last = self.workspaces.len() - 1;
        &mut self.workspaces[ws.min(last)]
    }
}

/// Focus tracking with a recency history for fallback.
#[derive(Debug, Clone, Default)]
pub struct FocusState {
    pub focused: Option<ClientId>,
    pub history: Vec<ClientId>,
}

impl FocusState {
    pub fn set_focused(&mut self, id: ClientId) {
        if self.focused != Some(id) {
            if let Some(prev) = self.focused {
                self.history.retain(|&c| c != prev);
                self.history.push(prev);
                if self.history.len() > 64 {
                    self.history.remove(0);
                }
            }
            self.focused = Some(id);
        }
    }

    pub fn clear(&mut self) {
        // Keep the cleared client in the history so switching back to its
        // workspace refocuses it.
        if let Some(prev) = self.focused.take() {
            self.history.retain(|&c| c != prev);
            self.history.push(prev);
        }
    }

    pub fn forget(&mut self, id: ClientId) {
        self.history.retain(|&c| c != id);
        if self.focused == Some(id) {
            self.focused = None;
        }
    }
}

/// Registry errors surfaced to the dispatcher.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("window {0} is already managed")]
    DuplicateWindow(WindowHandle),

    #[error("client capacity ({MAX_CLIENTS}) exhausted")]
    CapacityExceeded,
}

/// The central manager state.
pub struct State {
    pub config: Config,
    /// Runtime gap size, seeded from config and adjusted by bindings.
    pub gaps: u32,
    pub clients: IndexMap<ClientId, Client>,
    pub monitors: Vec<Monitor>,
    pub focus: FocusState,
    pub drag: Option<DragSession>,
    pub pointer: (i32, i32),
    pub global_floating: bool,
    /// (monitor, workspace) pairs whose layout must be recomputed.
    pub dirty: BTreeSet<(usize, usize)>,
    by_handle: HashMap<WindowHandle, ClientId>,
    next_id: u64,
}

impl State {
    pub fn new(config: Config) -> Self {
        let gaps = config.gaps;
        Self {
            config,
            gaps,
            clients: IndexMap::new(),
            monitors: Vec::new(),
            focus: FocusState::default(),
            drag: None,
            pointer: (0, 0),
            global_floating: false,
            dirty: BTreeSet::new(),
            by_handle: HashMap::new(),
            next_id: 1,
        }
    }

    // ── Monitor directory ────────────────────────────────────────────

    /// Replace the monitor directory after (re-)detection.
    ///
    /// Per-monitor state survives where the index survives; clients of
    /// removed monitors are reassigned to the last remaining monitor before
    /// any index can dangle.
    pub fn update_monitors(&mut self, mut geometries: Vec<Geometry>) {
        if geometries.len() > MAX_MONITORS {
            warn!(
                detected = geometries.len(),
                "monitor count exceeds {MAX_MONITORS}, ignoring the excess"
            );
            geometries.truncate(MAX_MONITORS);
        }

        let names = self.config.workspaces.clone();
        for (i, geometry) in geometries.iter().enumerate() {
            match self.monitors.get_mut(i) {
                Some(monitor) => monitor.geometry = *geometry,
                None => {
                    let mw = self.config.master_width_for(i);
                    self.monitors.push(Monitor::new(*geometry, mw, &names));
                }
            }
        }

        if geometries.is_empty() {
            self.monitors.clear();
            return;
        }

        // Migrate clients off monitors that disappeared.
        let target = geometries.len() - 1;
        let removed: Vec<Monitor> = self.monitors.drain(geometries.len()..).collect();
        for monitor in removed {
            for (ws, workspace) in monitor.workspaces.into_iter().enumerate() {
                for id in workspace.sequence {
                    self.monitors[target].workspace_mut(ws).push_tail(id);
                    if let Some(client) = self.clients.get_mut(&id) {
                        client.monitor = target;
                    }
                }
            }
        }

        for m in 0..self.monitors.len() {
            for ws in 0..NUM_WORKSPACES {
                self.dirty.insert((m, ws));
            }
        }
    }

    /// Index of the monitor containing the point, else 0.
    pub fn monitor_at(&self, x: i32, y: i32) -> usize {
        self.monitors
            .iter()
            .position(|m| m.geometry.contains(x, y))
            .unwrap_or(0)
    }

    // ── Client registry ──────────────────────────────────────────────

    /// Register a new client at the tail of the given workspace sequence.
    pub fn insert(
        &mut self,
        handle: WindowHandle,
        class: String,
        size_hints: SizeHints,
        geometry: Geometry,
        monitor: usize,
        workspace: usize,
    ) -> Result<ClientId, RegistryError> {
        if self.by_handle.contains_key(&handle) {
            return Err(RegistryError::DuplicateWindow(handle));
        }
        if self.clients.len() >= MAX_CLIENTS {
            return Err(RegistryError::CapacityExceeded);
        }

        debug_assert!(monitor < self.monitors.len().max(1));
        debug_assert!(workspace < NUM_WORKSPACES);
        let monitor = monitor.min(self.monitors.len().saturating_sub(1));
        let workspace = workspace.min(NUM_WORKSPACES - 1);

        let id = ClientId(self.next_id);
        self.next_id += 1;

        let mut client = Client::new(id, handle, class);
        client.size_hints = size_hints;
        client.geometry = geometry;
        client.monitor = monitor;
        client.workspace = workspace;
        if size_hints.is_fixed() {
            client.flags.insert(ClientFlags::FIXED);
        }

        if let Some(mon) = self.monitors.get_mut(monitor) {
            mon.workspace_mut(workspace).push_tail(id);
        }
        self.clients.insert(id, client);
        self.by_handle.insert(handle, id);
        self.dirty.insert((monitor, workspace));

        Ok(id)
    }

    /// Remove a client, detaching it from its sequence order-preservingly
    /// and transferring focus to the new sequence head if it was focused.
    pub fn remove(&mut self, id: ClientId) -> Option<Client> {
        let client = self.clients.shift_remove(&id)?;
        self.by_handle.remove(&client.handle);

        let was_focused = self.focus.focused == Some(id);
        self.focus.forget(id);

        if let Some(monitor) = self.monitors.get_mut(client.monitor) {
            let workspace = monitor.workspace_mut(client.workspace);
            workspace.remove(id);
            if was_focused {
                self.focus.focused = workspace.master();
            }
        }

        self.dirty.insert((client.monitor, client.workspace));
        Some(client)
    }

    pub fn client_id(&self, handle: WindowHandle) -> Option<ClientId> {
        self.by_handle.get(&handle).copied()
    }

    /// Detach from the current sequence and re-append at the tail of the
    /// target workspace on the same monitor.
    pub fn move_to_workspace(&mut self, id: ClientId, workspace: usize) {
        debug_assert!(workspace < NUM_WORKSPACES);
        let workspace = workspace.min(NUM_WORKSPACES - 1);

        let Some(client) = self.clients.get_mut(&id) else {
            return;
        };
        if client.workspace == workspace {
            return;
        }

        let monitor = client.monitor;
        let source = client.workspace;
        client.workspace = workspace;

        if let Some(mon) = self.monitors.get_mut(monitor) {
            mon.workspace_mut(source).remove(id);
            mon.workspace_mut(workspace).push_tail(id);
        }

        self.dirty.insert((monitor, source));
        self.dirty.insert((monitor, workspace));
    }

    /// Promote to sequence head; the previous master becomes position 1.
    pub fn set_master(&mut self, id: ClientId) {
        let Some(client) = self.clients.get(&id) else {
            return;
        };
        let (monitor, workspace) = (client.monitor, client.workspace);
        if let Some(mon) = self.monitors.get_mut(monitor) {
            mon.workspace_mut(workspace).set_master(id);
        }
        self.dirty.insert((monitor, workspace));
    }

    /// Exchange the sequence positions of two clients of the same workspace.
    pub fn swap(&mut self, a: ClientId, b: ClientId) {
        let Some((ma, wa)) = self.clients.get(&a).map(|c| (c.monitor, c.workspace)) else {
            return;
        };
        let Some((mb, wb)) = self.clients.get(&b).map(|c| (c.monitor, c.workspace)) else {
            return;
        };
        if (ma, wa) != (mb, wb) {
            return;
        }
        if let Some(mon) = self.monitors.get_mut(ma) {
            mon.workspace_mut(wa).swap(a, b);
        }
        self.dirty.insert((ma, wa));
    }

    /// Toggle the floating flag, snapshotting/restoring geometry. Returns
    /// the new floating state, or `None` for a defined no-op (unknown id or
    /// fullscreen client).
    pub fn toggle_floating(&mut self, id: ClientId) -> Option<bool> {
        let client = self.clients.get_mut(&id)?;
        if client.is_fullscreen() {
            return None;
        }

        let floating = if client.is_floating() {
            client.flags.remove(ClientFlags::FLOATING);
            client.apply_restore();
            false
        } else {
            client.snapshot_restore();
            client.flags.insert(ClientFlags::FLOATING);
            true
        };

        self.dirty.insert((client.monitor, client.workspace));
        Some(floating)
    }

    /// Toggle fullscreen, snapshotting/restoring geometry. The client keeps
    /// its sequence position throughout, so leaving fullscreen re-enters the
    /// tiling grid at the prior relative position. Returns the new state.
    pub fn toggle_fullscreen(&mut self, id: ClientId) -> Option<bool> {
        let monitor_geo = {
            let client = self.clients.get(&id)?;
            self.monitors.get(client.monitor)?.geometry
        };

        let client = self.clients.get_mut(&id)?;
        let fullscreen = if client.is_fullscreen() {
            client.flags.remove(ClientFlags::FULLSCREEN);
            client.apply_restore();
            false
        } else {
            client.snapshot_restore();
            client.flags.insert(ClientFlags::FULLSCREEN);
            client.geometry = monitor_geo;
            true
        };

        self.dirty.insert((client.monitor, client.workspace));
        Some(fullscreen)
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Whether the client is on its monitor's active workspace and mapped.
    pub fn is_visible(&self, client: &Client) -> bool {
        client.is_mapped()
            && self
                .monitors
                .get(client.monitor)
                .is_some_and(|m| m.active_workspace == client.workspace)
    }

    /// Topmost visible client containing the point. Fullscreen clients win,
    /// then floating (most recently managed first), then tiled.
    pub fn client_at(&self, x: i32, y: i32) -> Option<ClientId> {
        let monitor = self.monitors.get(self.monitor_at(x, y))?;
        let workspace = monitor.workspace(monitor.active_workspace);

        // Fullscreen covers floaters, floaters cover the grid. Within a
        // rank, the later sequence entry wins.
        let mut best: Option<(u8, ClientId)> = None;
        for id in workspace.sequence.iter().rev() {
            let Some(client) = self.clients.get(id) else {
                continue;
            };
            if !client.is_mapped() || !client.geometry.contains(x, y) {
                continue;
            }
            let rank = if client.is_fullscreen() {
                2
            } else if client.is_floating() {
                1
            } else {
                0
            };
            if best.map_or(true, |(r, _)| rank > r) {
                best = Some((rank, *id));
            }
        }
        best.map(|(_, id)| id)
    }

    /// Drain the dirty set in deterministic order.
    pub fn take_dirty(&mut self) -> Vec<(usize, usize)> {
        std::mem::take(&mut self.dirty).into_iter().collect()
    }
}
