//! Master-stack layout engine.
//!
//! [`arrange`] is a pure function of the tiling-eligible sequence for one
//! (monitor, workspace) pair and the layout parameters. Calling it twice on
//! the same input yields bit-identical rectangles; all mutation lives in the
//! registry, never here.

use serde::{Deserialize, Serialize};

use crate::client::ClientId;
use crate::state::Geometry;

/// Lower bound for the master area ratio.
pub const MF_MIN: f64 = 0.05;
/// Upper bound for the master area ratio.
pub const MF_MAX: f64 = 0.95;
/// Smallest width/height a window can be tiled or resized to.
pub const MIN_WINDOW_SIZE: u32 = 32;

/// How the stack partitions its share of the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StackOrientation {
    /// Stack clients form a column right of the master (heights split).
    #[default]
    Vertical,
    /// Stack clients form a row right of the master (widths split).
    Horizontal,
}

/// Inputs to one arrangement, snapshotted by the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParams {
    pub gaps: u32,
    pub border_width: u32,
    pub master_width: f64,
    pub orientation: StackOrientation,
}

impl LayoutParams {
    /// Screen-edge inset: gaps plus the border stroke.
    pub fn margin(&self) -> u32 {
        self.gaps + self.border_width
    }

    /// Extra shrink applied to a lone window so its border stays inside the
    /// usable area.
    pub fn out_in(&self) -> u32 {
        2 * self.border_width
    }
}

/// The monitor rectangle inset by the margin on all sides.
pub fn usable_area(monitor: Geometry, params: &LayoutParams) -> Geometry {
    monitor.inset(params.margin())
}

/// Compute master-stack geometry for `order` within `monitor`.
///
/// `order` must contain only tiling-eligible clients, in sequence order
/// (head is the master). Fixed, floating, and fullscreen clients are the
/// caller's business.
pub fn arrange(
    order: &[ClientId],
    monitor: Geometry,
    params: &LayoutParams,
) -> Vec<(ClientId, Geometry)> {
    let usable = usable_area(monitor, params);

    match order {
        [] => Vec::new(),
        [only] => {
            let out_in = params.out_in();
            let geo = Geometry::new(
                usable.x,
                usable.y,
                usable.width.saturating_sub(out_in).max(1),
                usable.height.saturating_sub(out_in).max(1),
            );
            vec![(*only, geo.clamp_within(usable))]
        }
        [master, stack @ ..] => {
            let mut out = Vec::with_capacity(order.len());

            let ratio = params.master_width.clamp(MF_MIN, MF_MAX);
            let raw = (f64::from(usable.width) * ratio) as u32;
            let max_master = usable
                .width
                .saturating_sub(MIN_WINDOW_SIZE + params.gaps)
                .max(1);
            let master_w = raw
                .saturating_sub(params.gaps / 2)
                .min(max_master)
                .max(MIN_WINDOW_SIZE.min(max_master));

            out.push((
                *master,
                Geometry::new(usable.x, usable.y, master_w, usable.height).clamp_within(usable),
            ));

            let stack_x = usable.x + master_w as i32 + params.gaps as i32;
            let stack_w = usable.width.saturating_sub(master_w + params.gaps).max(1);
            out.extend(arrange_stack(
                stack,
                Geometry::new(stack_x, usable.y, stack_w, usable.height),
                usable,
                params,
            ));

            out
        }
    }
}

/// Evenly partition `area` among the stack clients along the configured
/// orientation. The last client absorbs the integer remainder.
fn arrange_stack(
    stack: &[ClientId],
    area: Geometry,
    usable: Geometry,
    params: &LayoutParams,
) -> Vec<(ClientId, Geometry)> {
    let n = stack.len() as u32;
    let total_gap = params.gaps * (n - 1);
    let mut out = Vec::with_capacity(stack.len());

    match params.orientation {
        StackOrientation::Vertical => {
            let share = area.height.saturating_sub(total_gap) / n;
            let mut y = area.y;
            for (i, &id) in stack.iter().enumerate() {
                let h = if i as u32 == n - 1 {
                    area.height.saturating_sub(total_gap + share * (n - 1))
                } else {
                    share
                }
                .max(1);
                out.push((id, Geometry::new(area.x, y, area.width, h).clamp_within(usable)));
                y += h as i32 + params.gaps as i32;
            }
        }
        StackOrientation::Horizontal => {
            let share = area.width.saturating_sub(total_gap) / n;
            let mut x = area.x;
            for (i, &id) in stack.iter().enumerate() {
                let w = if i as u32 == n - 1 {
                    area.width.saturating_sub(total_gap + share * (n - 1))
                } else {
                    share
                }
                .max(1);
                out.push((id, Geometry::new(x, area.y, w, area.height).clamp_within(usable)));
                x += w as i32 + params.gaps as i32;
            }
        }
    }

    out
}
