//! The display-server boundary.
//!
//! [`DisplayEvent`] is what the backend tells the manager; [`DisplayAction`]
//! is what the manager tells the backend to apply. The backend translates
//! protocol events (X11 `MapRequest`, `MotionNotify`, ...) into these
//! variants and owns the handle ↔ id mapping; the manager never touches the
//! wire protocol.

use crate::client::{ClientId, SizeHints, WindowHandle};
use crate::input::{KeySym, Modifiers, MouseButton};
use crate::state::Geometry;

/// Events delivered by the backend, one at a time.
#[derive(Debug, Clone)]
pub enum DisplayEvent {
    /// A top-level window eligible for management wants to be mapped.
    /// Override-redirect and window-type filtering already happened in the
    /// backend.
    MapRequest {
        handle: WindowHandle,
        class: String,
        geometry: Geometry,
        size_hints: SizeHints,
    },

    /// A window was unmapped by its owning application. Manager-initiated
    /// hides are not reported back as events.
    Unmapped { handle: WindowHandle },

    /// A window was destroyed.
    Destroyed { handle: WindowHandle },

    /// A window asked for a specific geometry.
    ConfigureRequest {
        handle: WindowHandle,
        geometry: Geometry,
    },

    /// A key chord was pressed.
    KeyPress { modifiers: Modifiers, key: KeySym },

    /// A pointer button was pressed at the given root position.
    ButtonPress {
        modifiers: Modifiers,
        button: MouseButton,
        x: i32,
        y: i32,
    },

    /// A pointer button was released.
    ButtonRelease { button: MouseButton },

    /// The pointer moved to the given root position.
    PointerMotion { x: i32, y: i32 },

    /// The pointer entered a window (drives focus-follows-mouse).
    PointerEnter { handle: WindowHandle },

    /// The pointer grab was lost mid-drag; aborts without committing.
    GrabLost,

    /// The monitor layout changed; geometries are in detection order.
    MonitorsChanged { geometries: Vec<Geometry> },
}

/// Actions the backend must apply to the display server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayAction {
    /// Move/resize a managed window.
    SetGeometry { id: ClientId, geometry: Geometry },

    /// Honor a configure request from an unmanaged window verbatim.
    PassThroughConfigure {
        handle: WindowHandle,
        geometry: Geometry,
    },

    /// Map (show) a managed window.
    Show { id: ClientId },

    /// Unmap (hide) a managed window without unmanaging it.
    Hide { id: ClientId },

    /// Raise a window to the top of the stacking order.
    Raise { id: ClientId },

    /// Paint the window border in the given `0xRRGGBB` color.
    SetBorderColor { id: ClientId, color: u32 },

    /// Set keyboard input focus, or revert to none.
    SetInputFocus { id: Option<ClientId> },

    /// Move the pointer to the given root position.
    WarpPointer { x: i32, y: i32 },

    /// Ask a window to close (WM_DELETE-style, the window may refuse).
    RequestClose { id: ClientId },

    /// Spawn an external command; fire-and-forget, never awaited.
    Spawn { command: Vec<String> },

    /// Re-read the config file and hand the result to
    /// [`Manager::reload_config`](crate::Manager::reload_config).
    ReloadConfig,

    /// Shut the session down.
    Quit,
}
