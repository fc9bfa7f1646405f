//! Radial layout of child nodes.
//!
//! Children of a node are spread evenly over a half circle centred on the
//! parent and facing away from it (towards negative x). The radius grows
//! with the child count so neighbouring children stay at least
//! `fixed_step` apart.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Default spacing between neighbouring children.
pub const DEFAULT_FIXED_STEP: f64 = 400.0;

/// A position in graph space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate (grows downwards)
    pub y: f64,
}

impl Point {
    /// Creates a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Layout settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Minimum distance kept between neighbouring children
    pub fixed_step: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            fixed_step: DEFAULT_FIXED_STEP,
        }
    }
}

/// Angle between neighbouring children of a node with `child_count` children.
pub fn delta_angle(child_count: usize) -> f64 {
    PI / child_count as f64
}

/// Radius of the arc holding `child_count` children.
///
/// Returns 0 when there are no children.
pub fn arc_radius(child_count: usize, fixed_step: f64) -> f64 {
    if child_count == 0 {
        return 0.0;
    }
    let delta = delta_angle(child_count);
    fixed_step / (1.0 - delta.cos()).abs().max(delta.sin().abs())
}

/// Computes the positions of `child_count` children around `parent`.
///
/// # Example
///
/// ```
/// use refscope::graph::{layout_children, Point};
///
/// let points = layout_children(Point::new(0.0, 0.0), 1, 400.0);
/// assert_eq!(points.len(), 1);
/// assert!((points[0].x + 200.0).abs() < 1e-9);
/// assert!(points[0].y.abs() < 1e-9);
/// ```
pub fn layout_children(parent: Point, child_count: usize, fixed_step: f64) -> Vec<Point> {
    if child_count == 0 {
        return Vec::new();
    }

    let delta = delta_angle(child_count);
    let last_angle = delta * if child_count == 1 { 0.0 } else { (child_count - 1) as f64 };
    let radius = arc_radius(child_count, fixed_step);
    let start = PI - last_angle / 2.0;

    (0..child_count)
        .map(|i| {
            let angle = i as f64 * delta + start;
            Point::new(
                parent.x + radius * angle.cos(),
                parent.y - radius * angle.sin(),
            )
        })
        .collect()
}
