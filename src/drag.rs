//! Pointer-driven drag sessions.
//!
//! A [`DragSession`] records everything at button-press time: the client,
//! the pointer position, and the client's geometry. Every motion recomputes
//! a candidate from those initial values rather than accumulating per-event
//! deltas, so a drag cannot drift. The absent session is the idle state.

use std::time::{Duration, Instant};

use crate::client::ClientId;
use crate::layout::MIN_WINDOW_SIZE;
use crate::state::Geometry;

/// What a drag does on release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    /// Reposition the client; commits geometry and floats a tiled client.
    Move,
    /// Resize from the bottom-right corner; same commit semantics.
    Resize,
    /// Exchange tiling positions with the client under the pointer.
    Swap,
}

/// An in-progress pointer drag.
#[derive(Debug, Clone)]
pub struct DragSession {
    pub client: ClientId,
    pub mode: DragMode,
    pub start_pointer: (i32, i32),
    pub start_geometry: Geometry,
    /// Last candidate produced by a processed motion; committed on release.
    pub candidate: Option<Geometry>,
    /// Current drop target of a swap drag, advisory until release.
    pub swap_target: Option<ClientId>,
    last_motion: Option<Instant>,
}

impl DragSession {
    pub fn new(client: ClientId, mode: DragMode, pointer: (i32, i32), geometry: Geometry) -> Self {
        Self {
            client,
            mode,
            start_pointer: pointer,
            start_geometry: geometry,
            candidate: None,
            swap_target: None,
            last_motion: None,
        }
    }

    /// Motion throttle: at most one processed motion per `throttle`
    /// interval, by monotonic-clock comparison. A zero interval disables
    /// coalescing.
    pub fn should_process(&mut self, throttle: Duration) -> bool {
        if throttle.is_zero() {
            return true;
        }
        let now = Instant::now();
        match self.last_motion {
            Some(prev) if now.duration_since(prev) < throttle => false,
            _ => {
                self.last_motion = Some(now);
                true
            }
        }
    }

    /// Candidate geometry for a move drag at the given pointer position.
    pub fn move_candidate(&self, pointer: (i32, i32)) -> Geometry {
        let (dx, dy) = self.delta(pointer);
        Geometry::new(
            self.start_geometry.x + dx,
            self.start_geometry.y + dy,
            self.start_geometry.width,
            self.start_geometry.height,
        )
    }

    /// Candidate geometry for a resize drag; the bottom-right corner follows
    /// the pointer, floored at the minimum usable size.
    pub fn resize_candidate(&self, pointer: (i32, i32)) -> Geometry {
        let (dx, dy) = self.delta(pointer);
        let width = (self.start_geometry.width as i64 + i64::from(dx))
            .max(i64::from(MIN_WINDOW_SIZE)) as u32;
        let height = (self.start_geometry.height as i64 + i64::from(dy))
            .max(i64::from(MIN_WINDOW_SIZE)) as u32;
        Geometry::new(self.start_geometry.x, self.start_geometry.y, width, height)
    }

    fn delta(&self, pointer: (i32, i32)) -> (i32, i32) {
        (
            pointer.0 - self.start_pointer.0,
            pointer.1 - self.start_pointer.1,
        )
    }
}

/// Snap a moved rectangle's edges to nearby edges, independently per axis.
///
/// Targets are the usable monitor bounds plus the edges of every other
/// visible window. For each axis the closest target within `snap` wins;
/// the rectangle keeps its size.
pub fn snap_move(candidate: Geometry, bounds: Geometry, others: &[Geometry], snap: u32) -> Geometry {
    if snap == 0 {
        return candidate;
    }

    let mut xs = vec![bounds.x, bounds.right()];
    let mut ys = vec![bounds.y, bounds.bottom()];
    for other in others {
        xs.push(other.x);
        xs.push(other.right());
        ys.push(other.y);
        ys.push(other.bottom());
    }

    let x = snap_axis(candidate.x, candidate.right(), &xs, snap)
        .map_or(candidate.x, |(edge, target)| match edge {
            SnappedEdge::Low => target,
            SnappedEdge::High => target - candidate.width as i32,
        });
    let y = snap_axis(candidate.y, candidate.bottom(), &ys, snap)
        .map_or(candidate.y, |(edge, target)| match edge {
            SnappedEdge::Low => target,
            SnappedEdge::High => target - candidate.height as i32,
        });

    Geometry::new(x, y, candidate.width, candidate.height)
}

/// Snap a resized rectangle's dragged (right/bottom) edges, preserving the
/// origin and flooring at the minimum usable size.
pub fn snap_resize(
    candidate: Geometry,
    bounds: Geometry,
    others: &[Geometry],
    snap: u32,
) -> Geometry {
    if snap == 0 {
        return candidate;
    }

    let mut xs = vec![bounds.x, bounds.right()];
    let mut ys = vec![bounds.y, bounds.bottom()];
    for other in others {
        xs.push(other.x);
        xs.push(other.right());
        ys.push(other.y);
        ys.push(other.bottom());
    }

    let width = closest(candidate.right(), &xs, snap)
        .map_or(candidate.width, |target| {
            (target - candidate.x).max(MIN_WINDOW_SIZE as i32) as u32
        });
    let height = closest(candidate.bottom(), &ys, snap)
        .map_or(candidate.height, |target| {
            (target - candidate.y).max(MIN_WINDOW_SIZE as i32) as u32
        });

    Geometry::new(candidate.x, candidate.y, width, height)
}

#[derive(Clone, Copy)]
enum SnappedEdge {
    Low,
    High,
}

/// Closest target within range for either end of one axis; ties go to the
/// low edge.
fn snap_axis(low: i32, high: i32, targets: &[i32], snap: u32) -> Option<(SnappedEdge, i32)> {
    let low_hit = closest(low, targets, snap);
    let high_hit = closest(high, targets, snap);
    match (low_hit, high_hit) {
        (Some(l), Some(h)) => {
            if (high - h).abs() < (low - l).abs() {
                Some((SnappedEdge::High, h))
            } else {
                Some((SnappedEdge::Low, l))
            }
        }
        (Some(l), None) => Some((SnappedEdge::Low, l)),
        (None, Some(h)) => Some((SnappedEdge::High, h)),
        (None, None) => None,
    }
}

fn closest(value: i32, targets: &[i32], snap: u32) -> Option<i32> {
    targets
        .iter()
        .copied()
        .filter(|t| (value - t).unsigned_abs() <= snap)
        .min_by_key(|t| (value - t).unsigned_abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> DragSession {
        DragSession::new(
            ClientId(1),
            DragMode::Move,
            (500, 500),
            Geometry::new(100, 100, 400, 300),
        )
    }

    #[test]
    fn move_candidate_tracks_delta_from_start() {
        let s = session();
        assert_eq!(
            s.move_candidate((530, 480)),
            Geometry::new(130, 80, 400, 300)
        );
        // Same pointer position always yields the same candidate.
        assert_eq!(s.move_candidate((530, 480)), s.move_candidate((530, 480)));
    }

    #[test]
    fn resize_candidate_floors_at_minimum() {
        let mut s = session();
        s.mode = DragMode::Resize;
        let shrunk = s.resize_candidate((-2000, -2000));
        assert_eq!(shrunk.width, MIN_WINDOW_SIZE);
        assert_eq!(shrunk.height, MIN_WINDOW_SIZE);
        assert_eq!((shrunk.x, shrunk.y), (100, 100));
    }

    #[test]
    fn zero_throttle_never_coalesces() {
        let mut s = session();
        assert!(s.should_process(Duration::ZERO));
        assert!(s.should_process(Duration::ZERO));
    }

    #[test]
    fn throttle_coalesces_rapid_motion() {
        let mut s = session();
        assert!(s.should_process(Duration::from_secs(60)));
        assert!(!s.should_process(Duration::from_secs(60)));
    }

    #[test]
    fn snap_to_monitor_bound_within_distance() {
        let bounds = Geometry::new(0, 0, 1920, 1080);
        let snapped = snap_move(Geometry::new(6, 300, 400, 300), bounds, &[], 8);
        assert_eq!(snapped.x, 0);
        assert_eq!(snapped.y, 300, "y axis must snap independently");

        let unsnapped = snap_move(Geometry::new(20, 300, 400, 300), bounds, &[], 8);
        assert_eq!(unsnapped.x, 20);
    }

    #[test]
    fn snap_right_edge_to_neighbour_left_edge() {
        let bounds = Geometry::new(0, 0, 1920, 1080);
        let neighbour = Geometry::new(1000, 0, 400, 400);
        let snapped = snap_move(
            Geometry::new(595, 200, 400, 300),
            bounds,
            &[neighbour],
            8,
        );
        // right edge 995 is within 8 of the neighbour's left edge 1000
        assert_eq!(snapped.x, 600);
    }

    #[test]
    fn snap_resize_adjusts_dragged_edges_only() {
        let bounds = Geometry::new(0, 0, 1920, 1080);
        let snapped = snap_resize(Geometry::new(100, 100, 395, 300), bounds, &[Geometry::new(500, 0, 200, 200)], 8);
        assert_eq!((snapped.x, snapped.y), (100, 100));
        assert_eq!(snapped.width, 400, "right edge 495 snaps to 500");
        assert_eq!(snapped.height, 300);
    }
}
