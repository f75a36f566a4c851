//! Layout-engine response types: computed placement and routed geometry.

use serde::{Deserialize, Serialize};

/// A 2D point in the final drawing's coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl Point {
    /// Creates a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Computed placement for one layout child.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacedChild {
    /// The child id this placement corresponds to (see
    /// [`crate::request::LayoutChild::id`]).
    pub id: String,
    /// Top-left corner in the final drawing's coordinate space.
    pub position: Point,
}

/// Computed route for one layout edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutedEdge {
    /// The edge id this route corresponds to.
    pub id: String,
    /// First point of the routed polyline.
    pub start_point: Point,
    /// Intermediate points where the route changes direction but the
    /// connectivity remains two-way.
    pub bend_points: Vec<Point>,
    /// Last point of the routed polyline.
    pub end_point: Point,
    /// Points along this edge the layout engine reports as true T/cross
    /// junctions, if it reports any at all. An engine that never reports
    /// junction points on a dummy's incident edges leaves reconciliation's
    /// anchor selection degenerate; see [`crate::reconcile`] for the
    /// sentinel fallback this implementation chooses.
    pub junction_points: Option<Vec<Point>>,
}

/// The full result handed back by the layout engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutResponse {
    /// Overall drawing width.
    pub width: f64,
    /// Overall drawing height.
    pub height: f64,
    /// Placements, one per request child (dummies included).
    pub children: Vec<PlacedChild>,
    /// Routes, one per request edge.
    pub edges: Vec<RoutedEdge>,
}
