//! Slat — a master-stack tiling window manager engine.
//!
//! This crate contains all window manager logic (client registry, layout,
//! drag interaction, binding dispatch) with zero dependencies on display
//! protocols. A backend translates protocol events into [`DisplayEvent`]s,
//! feeds them to [`Manager::handle_event`], and applies the returned
//! [`DisplayAction`]s to the display server.
//!
//! # Quick start
//! ```
//! use slat::client::{SizeHints, WindowHandle};
//! use slat::state::Geometry;
//! use slat::{Config, DisplayEvent, Manager};
//!
//! let mut wm = Manager::new(Config::default());
//!
//! // The backend reports the monitor layout, then a window.
//! wm.handle_event(DisplayEvent::MonitorsChanged {
//!     geometries: vec![Geometry::new(0, 0, 1920, 1080)],
//! });
//! let actions = wm.handle_event(DisplayEvent::MapRequest {
//!     handle: WindowHandle(0x1a),
//!     class: "term".into(),
//!     geometry: Geometry::new(0, 0, 800, 600),
//!     size_hints: SizeHints::default(),
//! });
//! assert!(!actions.is_empty());
//! ```

pub mod client;
pub mod config;
pub mod drag;
pub mod event;
pub mod input;
pub mod invariants;
pub mod layout;
pub mod state;
pub mod workspace;

// Primary API types at the crate root.
pub use client::{ClientId, WindowHandle};
pub use config::Config;
pub use event::{DisplayAction, DisplayEvent};
pub use input::{Action, BindingAction, Modifiers};
pub use state::{Geometry, State};

use std::time::Duration;

use tracing::{debug, info, warn};

use client::{Client, ClientFlags, SizeHints};
use config::BorderColors;
use drag::{DragMode, DragSession};
use input::{Bindings, KeySym, MouseButton};
use layout::LayoutParams;
use state::NUM_WORKSPACES;

/// The window manager engine.
///
/// Owns all state. The backend drives it via [`handle_event`](Self::handle_event)
/// and [`exec`](Self::exec), then applies the returned actions. Exactly one
/// event is processed start-to-finish at a time; no operation suspends
/// mid-mutation.
pub struct Manager {
    /// All window-manager state.
    pub state: State,
    /// Compiled binding table, replaced wholesale on reload.
    bindings: Bindings,
    /// Resolved border colors.
    colors: BorderColors,
    /// Exit requested.
    pub should_exit: bool,
}

impl Manager {
    /// Create a new engine with the given configuration.
    pub fn new(config: Config) -> Self {
        let config = config.sanitized();
        let bindings = Bindings::compile(&config.bindings);
        let colors = BorderColors::resolve(&config.colors);
        Self {
            state: State::new(config),
            bindings,
            colors,
            should_exit: false,
        }
    }

    // ── Event handling (backend → engine) ────────────────────────────

    /// Process one display-server event. Returns the actions the backend
    /// must apply.
    pub fn handle_event(&mut self, event: DisplayEvent) -> Vec<DisplayAction> {
        let mut actions = Vec::new();

        match event {
            DisplayEvent::MapRequest {
                handle,
                class,
                geometry,
                size_hints,
            } => self.on_map_request(handle, class, geometry, size_hints, &mut actions),

            DisplayEvent::Unmapped { handle } | DisplayEvent::Destroyed { handle } => {
                self.on_window_gone(handle, &mut actions);
            }

            DisplayEvent::ConfigureRequest { handle, geometry } => {
                self.on_configure_request(handle, geometry, &mut actions);
            }

            DisplayEvent::KeyPress { modifiers, key } => {
                self.on_key_press(modifiers, key, &mut actions);
            }

            DisplayEvent::ButtonPress {
                modifiers,
                button,
                x,
                y,
            } => self.on_button_press(modifiers, button, x, y, &mut actions),

            DisplayEvent::ButtonRelease { button } => {
                self.on_button_release(button, &mut actions);
            }

            DisplayEvent::PointerMotion { x, y } => self.on_pointer_motion(x, y, &mut actions),

            DisplayEvent::PointerEnter { handle } => {
                self.on_pointer_enter(handle, &mut actions);
            }

            DisplayEvent::GrabLost => self.abort_drag(&mut actions),

            DisplayEvent::MonitorsChanged { geometries } => {
                self.state.update_monitors(geometries);
            }
        }

        self.flush_dirty(&mut actions);
        self.check_invariants();
        actions
    }

    /// Invoke one core action (the binding surface). Safe with no client
    /// focused.
    pub fn exec(&mut self, action: Action) -> Vec<DisplayAction> {
        debug!(?action, "exec");
        let mut actions = Vec::new();
        self.dispatch_action(action, &mut actions);
        self.flush_dirty(&mut actions);
        self.check_invariants();
        actions
    }

    /// Swap in a freshly loaded configuration between events.
    pub fn reload_config(&mut self, config: Config) -> Vec<DisplayAction> {
        info!("applying new configuration");
        let config = config.sanitized();
        self.bindings = Bindings::compile(&config.bindings);
        self.colors = BorderColors::resolve(&config.colors);
        self.state.gaps = config.gaps;
        for (i, monitor) in self.state.monitors.iter_mut().enumerate() {
            monitor.master_width = config.master_width_for(i);
            for (ws, workspace) in monitor.workspaces.iter_mut().enumerate() {
                if let Some(name) = config.workspaces.get(ws) {
                    workspace.name = name.clone();
                }
            }
        }
        self.state.config = config;

        let mut actions = Vec::new();
        for &id in self.state.clients.keys() {
            let color = if self.state.focus.focused == Some(id) {
                self.colors.focused
            } else {
                self.colors.unfocused
            };
            actions.push(DisplayAction::SetBorderColor { id, color });
        }
        for m in 0..self.state.monitors.len() {
            let active = self.state.monitors[m].active_workspace;
            self.state.dirty.insert((m, active));
        }
        self.flush_dirty(&mut actions);
        self.check_invariants();
        actions
    }

    pub fn focused_client(&self) -> Option<ClientId> {
        self.state.focus.focused
    }

    // ── Window lifecycle ─────────────────────────────────────────────

    fn on_map_request(
        &mut self,
        handle: WindowHandle,
        class: String,
        geometry: Geometry,
        size_hints: SizeHints,
        actions: &mut Vec<DisplayAction>,
    ) {
        if self.state.monitors.is_empty() {
            warn!(%handle, "no monitors detected, leaving window unmanaged");
            return;
        }
        if self.state.client_id(handle).is_some() {
            debug!(%handle, "map request for an already managed window");
            return;
        }

        let (px, py) = self.state.pointer;
        let monitor = self.state.monitor_at(px, py);
        let workspace = self.state.monitors[monitor].active_workspace;
        let floating = self.state.config.should_float(&class) || self.state.global_floating;

        let id = match self
            .state
            .insert(handle, class, size_hints, geometry, monitor, workspace)
        {
            Ok(id) => id,
            Err(e) => {
                warn!(%handle, "refusing to manage window: {e}");
                return;
            }
        };

        let monitor_geo = self.state.monitors[monitor].geometry;
        let params = self.layout_params(monitor);
        if let Some(client) = self.state.clients.get_mut(&id) {
            client.flags.insert(ClientFlags::MAPPED);
            if floating {
                client.flags.insert(ClientFlags::FLOATING);
            }
            if client.is_fixed() {
                // Fixed windows keep their natural size, centered once at map.
                let usable = layout::usable_area(monitor_geo, &params);
                let (cx, cy) = usable.center();
                let centered = Geometry::new(
                    cx - (client.geometry.width / 2) as i32,
                    cy - (client.geometry.height / 2) as i32,
                    client.geometry.width,
                    client.geometry.height,
                );
                client.geometry = centered.clamp_within(monitor_geo);
            }
        }

        actions.push(DisplayAction::Show { id });
        if let Some(client) = self.state.clients.get(&id) {
            if !client.is_tiling_eligible() {
                actions.push(DisplayAction::SetGeometry {
                    id,
                    geometry: client.geometry,
                });
            }
        }

        if self.state.config.new_win_focus {
            self.refocus(Some(id), actions);
        } else {
            actions.push(DisplayAction::SetBorderColor {
                id,
                color: self.colors.unfocused,
            });
        }
    }

    /// A window vanished (client unmap or destroy). Stale references from a
    /// drag in progress are dropped within the same event.
    fn on_window_gone(&mut self, handle: WindowHandle, actions: &mut Vec<DisplayAction>) {
        let Some(id) = self.state.client_id(handle) else {
            return;
        };

        if self.state.drag.as_ref().is_some_and(|s| s.client == id) {
            self.abort_drag(actions);
        } else if let Some(session) = &mut self.state.drag {
            if session.swap_target == Some(id) {
                session.swap_target = None;
            }
        }

        let prev = self.state.focus.focused;
        self.state.remove(id);
        if prev == Some(id) {
            self.announce_focus(actions);
        }
    }

    fn on_configure_request(
        &mut self,
        handle: WindowHandle,
        geometry: Geometry,
        actions: &mut Vec<DisplayAction>,
    ) {
        let Some(id) = self.state.client_id(handle) else {
            // Unmanaged windows configure themselves.
            actions.push(DisplayAction::PassThroughConfigure { handle, geometry });
            return;
        };

        let Some(client) = self.state.clients.get_mut(&id) else {
            return;
        };

        if client.is_fixed() || client.is_floating() {
            client.set_geometry(geometry);
            actions.push(DisplayAction::SetGeometry {
                id,
                geometry: client.geometry,
            });
        } else {
            // The manager owns tiled geometry; answer with the authoritative
            // rectangle instead.
            let pair = (client.monitor, client.workspace);
            self.state.dirty.insert(pair);
        }
    }

    // ── Key dispatch ─────────────────────────────────────────────────

    fn on_key_press(
        &mut self,
        modifiers: Modifiers,
        key: KeySym,
        actions: &mut Vec<DisplayAction>,
    ) {
        let Some(binding) = self.bindings.resolve(modifiers, key).cloned() else {
            return;
        };

        match binding {
            BindingAction::Spawn(command) => {
                actions.push(DisplayAction::Spawn { command });
            }
            BindingAction::Invoke(action) => self.dispatch_action(action, actions),
            BindingAction::ChangeWorkspace(ws) => {
                let (px, py) = self.state.pointer;
                let monitor = self.state.monitor_at(px, py);
                self.change_workspace(monitor, ws, actions);
            }
            BindingAction::MoveToWorkspace(ws) => self.send_to_workspace(ws, actions),
        }
    }

    fn dispatch_action(&mut self, action: Action, actions: &mut Vec<DisplayAction>) {
        match action {
            Action::CloseFocused => {
                if let Some(id) = self.state.focus.focused {
                    actions.push(DisplayAction::RequestClose { id });
                }
            }
            Action::FocusNext => self.cycle_focus(true, actions),
            Action::FocusPrev => self.cycle_focus(false, actions),
            Action::MoveMasterNext | Action::MoveMasterPrev => {
                let Some((monitor, workspace)) = self.focused_pair() else {
                    return;
                };
                let Some(mon) = self.state.monitors.get_mut(monitor) else {
                    return;
                };
                let ws = mon.workspace_mut(workspace);
                if action == Action::MoveMasterNext {
                    ws.rotate_next();
                } else {
                    ws.rotate_prev();
                }
                self.state.dirty.insert((monitor, workspace));
            }
            Action::SetMaster => {
                if let Some(id) = self.state.focus.focused {
                    self.state.set_master(id);
                }
            }
            Action::IncGaps => self.adjust_gaps(2, actions),
            Action::DecGaps => self.adjust_gaps(-2, actions),
            Action::ResizeMasterAdd => self.resize_master(1.0),
            Action::ResizeMasterSub => self.resize_master(-1.0),
            Action::ToggleFloating => {
                if let Some(id) = self.state.focus.focused {
                    if self.state.toggle_floating(id) == Some(true) {
                        actions.push(DisplayAction::Raise { id });
                    }
                }
            }
            Action::ToggleFloatingGlobal => self.toggle_floating_global(actions),
            Action::ToggleFullscreen => {
                let Some(id) = self.state.focus.focused else {
                    return;
                };
                if self.state.toggle_fullscreen(id).is_some() {
                    if let Some(client) = self.state.clients.get(&id) {
                        actions.push(DisplayAction::SetGeometry {
                            id,
                            geometry: client.geometry,
                        });
                        if client.is_fullscreen() {
                            actions.push(DisplayAction::Raise { id });
                        }
                    }
                }
            }
            Action::ReloadConfig => actions.push(DisplayAction::ReloadConfig),
            Action::Quit => {
                self.should_exit = true;
                actions.push(DisplayAction::Quit);
            }
        }
    }

    // ── Pointer dispatch ─────────────────────────────────────────────

    fn on_button_press(
        &mut self,
        modifiers: Modifiers,
        button: MouseButton,
        x: i32,
        y: i32,
        actions: &mut Vec<DisplayAction>,
    ) {
        self.state.pointer = (x, y);
        let modkey = self.state.config.modkey_mask();

        let mode = if modifiers == modkey && button == MouseButton::Left {
            Some(DragMode::Move)
        } else if modifiers == modkey | Modifiers::SHIFT && button == MouseButton::Left {
            Some(DragMode::Swap)
        } else if modifiers == modkey && button == MouseButton::Right {
            Some(DragMode::Resize)
        } else {
            None
        };

        let Some(mode) = mode else {
            // Plain click: focus what is under the pointer.
            if button == MouseButton::Left {
                if let Some(id) = self.state.client_at(x, y) {
                    self.refocus(Some(id), actions);
                }
            }
            return;
        };

        let Some(id) = self.state.client_at(x, y) else {
            return;
        };
        let Some(client) = self.state.clients.get(&id) else {
            return;
        };
        if client.is_fullscreen() {
            return;
        }
        if mode == DragMode::Swap && !client.is_tiling_eligible() {
            return;
        }

        let geometry = client.geometry;
        self.state.drag = Some(DragSession::new(id, mode, (x, y), geometry));
        actions.push(DisplayAction::Raise { id });
    }

    fn on_pointer_motion(&mut self, x: i32, y: i32, actions: &mut Vec<DisplayAction>) {
        self.state.pointer = (x, y);

        let Some(mut session) = self.state.drag.take() else {
            return;
        };

        let throttle = Duration::from_millis(self.state.config.motion_throttle_ms);
        if !session.should_process(throttle) {
            self.state.drag = Some(session);
            return;
        }

        match session.mode {
            DragMode::Move | DragMode::Resize => {
                if let Some(candidate) = self.drag_candidate(&mut session, (x, y)) {
                    actions.push(DisplayAction::SetGeometry {
                        id: session.client,
                        geometry: candidate,
                    });
                }
            }
            DragMode::Swap => self.update_swap_target(&mut session, (x, y), actions),
        }

        self.state.drag = Some(session);
    }

    /// Compute, snap, and record the next candidate geometry of a
    /// move/resize drag. The registry is not touched until release.
    fn drag_candidate(
        &self,
        session: &mut DragSession,
        pointer: (i32, i32),
    ) -> Option<Geometry> {
        let client = self.state.clients.get(&session.client)?;
        let monitor_idx = client.monitor;
        let monitor = self.state.monitors.get(monitor_idx)?;
        let usable = layout::usable_area(monitor.geometry, &self.layout_params(monitor_idx));

        let others: Vec<Geometry> = self
            .state
            .clients
            .values()
            .filter(|&c| {
                c.id != session.client && c.monitor == monitor_idx && self.state.is_visible(c)
            })
            .map(|c| c.geometry)
            .collect();

        let snap = self.state.config.snap_distance;
        let candidate = match session.mode {
            DragMode::Move => drag::snap_move(session.move_candidate(pointer), usable, &others, snap),
            DragMode::Resize => {
                let raw = drag::snap_resize(session.resize_candidate(pointer), usable, &others, snap);
                let (w, h) = client.size_hints.constrain(raw.width, raw.height);
                Geometry::new(raw.x, raw.y, w, h)
            }
            DragMode::Swap => return None,
        };

        session.candidate = Some(candidate);
        Some(candidate)
    }

    /// Swap-drag motion is advisory: it only picks the drop target.
    fn update_swap_target(
        &self,
        session: &mut DragSession,
        pointer: (i32, i32),
        actions: &mut Vec<DisplayAction>,
    ) {
        let dragged_pair = self
            .state
            .clients
            .get(&session.client)
            .map(|c| (c.monitor, c.workspace));

        let target = self
            .state
            .client_at(pointer.0, pointer.1)
            .filter(|&id| id != session.client)
            .filter(|id| {
                self.state.clients.get(id).is_some_and(|c| {
                    c.is_tiling_eligible() && Some((c.monitor, c.workspace)) == dragged_pair
                })
            });

        if target == session.swap_target {
            return;
        }

        if let Some(old) = session.swap_target {
            actions.push(DisplayAction::SetBorderColor {
                id: old,
                color: self.normal_border(old),
            });
        }
        if let Some(new) = target {
            actions.push(DisplayAction::SetBorderColor {
                id: new,
                color: self.colors.swap,
            });
        }
        session.swap_target = target;
    }

    fn on_button_release(&mut self, _button: MouseButton, actions: &mut Vec<DisplayAction>) {
        let Some(session) = self.state.drag.take() else {
            return;
        };

        match session.mode {
            DragMode::Move | DragMode::Resize => {
                let Some(candidate) = session.candidate else {
                    return;
                };
                if let Some(client) = self.state.clients.get_mut(&session.client) {
                    // Dragging a tiled client detaches it from the grid; the
                    // remaining sequence keeps its order.
                    if !client.is_floating() && !client.is_fullscreen() {
                        client.snapshot_restore();
                        client.flags.insert(ClientFlags::FLOATING);
                    }
                    client.set_geometry(candidate);
                    let pair = (client.monitor, client.workspace);
                    actions.push(DisplayAction::SetGeometry {
                        id: session.client,
                        geometry: client.geometry,
                    });
                    self.state.dirty.insert(pair);
                }
            }
            DragMode::Swap => {
                if let Some(target) = session.swap_target {
                    actions.push(DisplayAction::SetBorderColor {
                        id: target,
                        color: self.normal_border(target),
                    });
                    self.state.swap(session.client, target);
                }
            }
        }
    }

    /// Abort an in-progress drag without committing anything.
    fn abort_drag(&mut self, actions: &mut Vec<DisplayAction>) {
        let Some(session) = self.state.drag.take() else {
            return;
        };

        if let Some(target) = session.swap_target {
            if self.state.clients.contains_key(&target) {
                actions.push(DisplayAction::SetBorderColor {
                    id: target,
                    color: self.normal_border(target),
                });
            }
        }

        if matches!(session.mode, DragMode::Move | DragMode::Resize)
            && session.candidate.is_some()
            && self.state.clients.contains_key(&session.client)
        {
            actions.push(DisplayAction::SetGeometry {
                id: session.client,
                geometry: session.start_geometry,
            });
        }
    }

    fn on_pointer_enter(&mut self, handle: WindowHandle, actions: &mut Vec<DisplayAction>) {
        // Windows move under a dragged pointer; those enters are noise.
        if self.state.drag.is_some() {
            return;
        }
        if let Some(id) = self.state.client_id(handle) {
            if self
                .state
                .clients
                .get(&id)
                .is_some_and(|c| self.state.is_visible(c))
            {
                self.refocus(Some(id), actions);
            }
        }
    }

    // ── Workspaces ───────────────────────────────────────────────────

    fn change_workspace(&mut self, monitor: usize, ws: usize, actions: &mut Vec<DisplayAction>) {
        let Some(mon) = self.state.monitors.get(monitor) else {
            return;
        };
        if ws >= NUM_WORKSPACES || mon.active_workspace == ws {
            return;
        }

        let old_ids = mon.workspace(mon.active_workspace).sequence.clone();
        let new_ids = mon.workspace(ws).sequence.clone();
        self.state.monitors[monitor].active_workspace = ws;

        for id in &old_ids {
            if let Some(client) = self.state.clients.get_mut(id) {
                client.flags.remove(ClientFlags::MAPPED);
            }
            actions.push(DisplayAction::Hide { id: *id });
        }
        for id in &new_ids {
            if let Some(client) = self.state.clients.get_mut(id) {
                client.flags.insert(ClientFlags::MAPPED);
            }
            actions.push(DisplayAction::Show { id: *id });
        }

        self.state.dirty.insert((monitor, ws));

        // Prefer the most recently focused client of the target workspace.
        let next = self
            .state
            .focus
            .history
            .iter()
            .rev()
            .copied()
            .find(|id| new_ids.contains(id))
            .or_else(|| new_ids.first().copied());
        self.refocus(next, actions);
    }

    fn send_to_workspace(&mut self, ws: usize, actions: &mut Vec<DisplayAction>) {
        let Some(id) = self.state.focus.focused else {
            return;
        };
        let Some(client) = self.state.clients.get(&id) else {
            return;
        };
        if ws >= NUM_WORKSPACES || client.workspace == ws {
            return;
        }

        let monitor = client.monitor;
        let source = client.workspace;
        self.state.move_to_workspace(id, ws);

        let target_visible = self
            .state
            .monitors
            .get(monitor)
            .is_some_and(|m| m.active_workspace == ws);
        if !target_visible {
            if let Some(client) = self.state.clients.get_mut(&id) {
                client.flags.remove(ClientFlags::MAPPED);
            }
            actions.push(DisplayAction::Hide { id });
            let next = self
                .state
                .monitors
                .get(monitor)
                .and_then(|m| m.workspace(source).master());
            self.refocus(next, actions);
        }
    }

    // ── Focus ────────────────────────────────────────────────────────

    fn cycle_focus(&mut self, forward: bool, actions: &mut Vec<DisplayAction>) {
        let Some(current) = self.state.focus.focused else {
            return;
        };
        let Some((monitor, workspace)) = self.focused_pair() else {
            return;
        };

        let Some(mon) = self.state.monitors.get(monitor) else {
            return;
        };
        let ws = mon.workspace(workspace);
        let mut candidate = current;
        let mut found = false;
        // Walk the sequence at most once, skipping unmapped entries.
        for _ in 0..ws.len() {
            let next = if forward {
                ws.next_after(candidate)
            } else {
                ws.prev_before(candidate)
            };
            let Some(next) = next else {
                return;
            };
            candidate = next;
            if candidate == current {
                return;
            }
            if self
                .state
                .clients
                .get(&candidate)
                .is_some_and(Client::is_mapped)
            {
                found = true;
                break;
            }
        }

        if found {
            self.refocus(Some(candidate), actions);
        }
    }

    /// Transfer focus, emitting border, input-focus, raise, and warp
    /// actions. `None` reverts focus to nothing.
    fn refocus(&mut self, new: Option<ClientId>, actions: &mut Vec<DisplayAction>) {
        let old = self.state.focus.focused;
        if old == new {
            return;
        }

        if let Some(old_id) = old {
            if self.state.clients.contains_key(&old_id) {
                actions.push(DisplayAction::SetBorderColor {
                    id: old_id,
                    color: self.colors.unfocused,
                });
            }
        }

        match new {
            Some(id) if self.state.clients.contains_key(&id) => {
                self.state.focus.set_focused(id);
                self.announce_focus(actions);
            }
            _ => {
                self.state.focus.clear();
                actions.push(DisplayAction::SetInputFocus { id: None });
            }
        }
    }

    /// Emit the actions that make the current focus visible to the user.
    fn announce_focus(&self, actions: &mut Vec<DisplayAction>) {
        match self.state.focus.focused {
            Some(id) => {
                let Some(client) = self.state.clients.get(&id) else {
                    return;
                };
                actions.push(DisplayAction::SetBorderColor {
                    id,
                    color: self.colors.focused,
                });
                actions.push(DisplayAction::SetInputFocus { id: Some(id) });
                actions.push(DisplayAction::Raise { id });
                if self.state.config.warp_cursor {
                    let (x, y) = client.geometry.center();
                    actions.push(DisplayAction::WarpPointer { x, y });
                }
            }
            None => actions.push(DisplayAction::SetInputFocus { id: None }),
        }
    }

    // ── Actions on the layout ────────────────────────────────────────

    fn adjust_gaps(&mut self, delta: i32, _actions: &mut Vec<DisplayAction>) {
        let gaps = self.state.gaps as i32 + delta;
        self.state.gaps = gaps.clamp(0, 64) as u32;
        for m in 0..self.state.monitors.len() {
            let active = self.state.monitors[m].active_workspace;
            self.state.dirty.insert((m, active));
        }
    }

    fn resize_master(&mut self, direction: f64) {
        let monitor = match self.focused_pair() {
            Some((m, _)) => m,
            None => {
                let (px, py) = self.state.pointer;
                self.state.monitor_at(px, py)
            }
        };
        let Some(mon) = self.state.monitors.get_mut(monitor) else {
            return;
        };
        let step = self.state.config.resize_master_amt * direction;
        mon.master_width = (mon.master_width + step).clamp(layout::MF_MIN, layout::MF_MAX);
        let active = mon.active_workspace;
        self.state.dirty.insert((monitor, active));
    }

    fn toggle_floating_global(&mut self, actions: &mut Vec<DisplayAction>) {
        self.state.global_floating = !self.state.global_floating;
        let enable = self.state.global_floating;
        let ids: Vec<ClientId> = self.state.clients.keys().copied().collect();
        for id in ids {
            let Some(client) = self.state.clients.get(&id) else {
                continue;
            };
            if client.is_floating() != enable {
                if self.state.toggle_floating(id) == Some(true) {
                    actions.push(DisplayAction::Raise { id });
                }
            }
        }
    }

    // ── Layout plumbing ──────────────────────────────────────────────

    fn layout_params(&self, monitor: usize) -> LayoutParams {
        LayoutParams {
            gaps: self.state.gaps,
            border_width: self.state.config.border_width,
            master_width: self
                .state
                .monitors
                .get(monitor)
                .map_or(self.state.config.master_width, |m| m.master_width),
            orientation: self.state.config.stack,
        }
    }

    /// Recompute layout for every dirty, currently visible
    /// (monitor, workspace) pair and emit the geometry updates.
    fn flush_dirty(&mut self, actions: &mut Vec<DisplayAction>) {
        for (m, ws) in self.state.take_dirty() {
            let Some(monitor) = self.state.monitors.get(m) else {
                continue;
            };
            if monitor.active_workspace != ws {
                continue;
            }

            let monitor_geo = monitor.geometry;
            let params = self.layout_params(m);
            let sequence = monitor.workspace(ws).sequence.clone();
            let order: Vec<ClientId> = sequence
                .iter()
                .filter(|&id| {
                    self.state
                        .clients
                        .get(id)
                        .is_some_and(Client::is_tiling_eligible)
                })
                .copied()
                .collect();

            for (id, geometry) in layout::arrange(&order, monitor_geo, &params) {
                if let Some(client) = self.state.clients.get_mut(&id) {
                    client.geometry = geometry;
                    actions.push(DisplayAction::SetGeometry { id, geometry });
                }
            }

            // Fullscreen clients stay glued to the monitor rectangle even
            // when it changed underneath them.
            for id in sequence {
                if let Some(client) = self.state.clients.get_mut(&id) {
                    if client.is_fullscreen() && client.is_mapped() {
                        client.geometry = monitor_geo;
                        actions.push(DisplayAction::SetGeometry {
                            id,
                            geometry: monitor_geo,
                        });
                    }
                }
            }
        }
    }

    // ── Helpers ──────────────────────────────────────────────────────

    fn focused_pair(&self) -> Option<(usize, usize)> {
        let id = self.state.focus.focused?;
        let client = self.state.clients.get(&id)?;
        Some((client.monitor, client.workspace))
    }

    fn normal_border(&self, id: ClientId) -> u32 {
        if self.state.focus.focused == Some(id) {
            self.colors.focused
        } else {
            self.colors.unfocused
        }
    }

    #[cfg(debug_assertions)]
    fn check_invariants(&self) {
        if let Err(e) = invariants::validate(&self.state) {
            warn!("invariant violation after event: {e}");
            debug_assert!(false, "invariant violation: {e}");
        }
    }

    #[cfg(not(debug_assertions))]
    fn check_invariants(&self) {}
}
