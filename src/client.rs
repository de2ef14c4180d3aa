//! Managed client windows.
//!
//! Protocol-agnostic client representation. No display-server handles are
//! dereferenced here; the backend owns the mapping between its native
//! window type and [`WindowHandle`].

use bitflags::bitflags;

use crate::state::Geometry;

/// Opaque native window handle as reported by the display server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub u64);

impl std::fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// Stable, unique identifier for a managed client.
///
/// Allocated monotonically by the registry. Every structure that refers to a
/// client (sequences, focus, drag state) holds a `ClientId`, never a raw
/// handle, so removal can invalidate all references in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub u64);

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "client:{}", self.0)
    }
}

bitflags! {
    /// Client state flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ClientFlags: u8 {
        /// Size hints forbid resizing; excluded from tiling math.
        const FIXED      = 0b0001;
        /// Free-form geometry, excluded from the tiling grid.
        const FLOATING   = 0b0010;
        /// Occupies the full monitor rectangle.
        const FULLSCREEN = 0b0100;
        /// Currently visible on its monitor.
        const MAPPED     = 0b1000;
    }
}

/// Window size constraints from the display server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizeHints {
    pub min_width: Option<u32>,
    pub min_height: Option<u32>,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
}

impl SizeHints {
    /// A window whose minimum and maximum sizes coincide cannot be resized.
    pub fn is_fixed(&self) -> bool {
        matches!(
            (self.min_width, self.max_width, self.min_height, self.max_height),
            (Some(min_w), Some(max_w), Some(min_h), Some(max_h))
                if min_w == max_w && min_h == max_h
        )
    }

    /// Constrain a size to these hints.
    pub fn constrain(&self, width: u32, height: u32) -> (u32, u32) {
        let mut w = width;
        let mut h = height;

        if let Some(min) = self.min_width {
            w = w.max(min);
        }
        if let Some(max) = self.max_width {
            w = w.min(max);
        }
        if let Some(min) = self.min_height {
            h = h.max(min);
        }
        if let Some(max) = self.max_height {
            h = h.min(max);
        }

        (w, h)
    }
}

/// A managed client window.
#[derive(Debug, Clone)]
pub struct Client {
    pub id: ClientId,
    pub handle: WindowHandle,
    pub class: String,
    pub geometry: Geometry,
    /// Geometry captured on entering floating/fullscreen, applied verbatim
    /// on toggle-off. `Some` only while one of those flags is set.
    pub restore: Option<Geometry>,
    pub monitor: usize,
    pub workspace: usize,
    pub flags: ClientFlags,
    pub size_hints: SizeHints,
}

impl Client {
    pub fn new(id: ClientId, handle: WindowHandle, class: String) -> Self {
        Self {
            id,
            handle,
            class,
            geometry: Geometry::default(),
            restore: None,
            monitor: 0,
            workspace: 0,
            flags: ClientFlags::empty(),
            size_hints: SizeHints::default(),
        }
    }

    pub fn is_mapped(&self) -> bool {
        self.flags.contains(ClientFlags::MAPPED)
    }

    pub fn is_floating(&self) -> bool {
        self.flags.contains(ClientFlags::FLOATING)
    }

    pub fn is_fullscreen(&self) -> bool {
        self.flags.contains(ClientFlags::FULLSCREEN)
    }

    pub fn is_fixed(&self) -> bool {
        self.flags.contains(ClientFlags::FIXED)
    }

    /// Mapped, not fixed, not floating, not fullscreen: participates in the
    /// master-stack arrangement of its workspace.
    pub fn is_tiling_eligible(&self) -> bool {
        self.is_mapped() && !self.is_fixed() && !self.is_floating() && !self.is_fullscreen()
    }

    /// Capture the current geometry for a later toggle-off, unless a
    /// snapshot already exists.
    pub fn snapshot_restore(&mut self) {
        if self.restore.is_none() {
            self.restore = Some(self.geometry);
        }
    }

    /// Write the restore geometry back verbatim and drop the snapshot.
    pub fn apply_restore(&mut self) {
        if let Some(saved) = self.restore.take() {
            self.geometry = saved;
        }
    }

    /// Set geometry respecting size hints.
    pub fn set_geometry(&mut self, geometry: Geometry) {
        let (w, h) = self.size_hints.constrain(geometry.width, geometry.height);
        self.geometry = Geometry::new(geometry.x, geometry.y, w, h);
    }
}
