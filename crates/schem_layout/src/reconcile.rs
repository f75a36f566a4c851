//! Post-layout reconciliation.
//!
//! The external layout engine routes every [`LayoutEdge`] independently and
//! knows nothing about dummy cells being a fiction — to it a `$d_`-prefixed
//! id is just another child. This stage reads the routed geometry back,
//! picks one incident edge per dummy as the *anchor* whose first junction
//! point is the true fan-out point, rewrites every other incident edge's
//! dummy-side terminus onto that point, and decides whether the point is a
//! genuine T/cross junction or just a degenerate two-way bend.
//!
//! After this stage runs, no dummy id survives anywhere in the output: the
//! dummy was only ever a routing fiction, and the polylines that touched it
//! now simply share a coordinate.

use crate::request::{is_dummy_id, LayoutRequest};
use crate::response::{LayoutResponse, Point, RoutedEdge};
use indexmap::IndexMap;
use schem_common::{Diagnostic, DiagnosticSink};
use std::collections::HashSet;
use thiserror::Error;

/// Safety cap on the number of dummies processed in one reconciliation
/// pass. Not a documented limit — a pathological netlist that somehow
/// produced more fan-out points than this terminates reconciliation
/// early rather than looping; remaining dummy ids are left unresolved
/// and reported as a warning rather than panicking.
pub const MAX_DUMMY_ITERATIONS: usize = 10_000;

/// A fatal geometry error: the layout engine returned a route this pipeline
/// cannot render as an orthogonal polyline. Indicates a bug in the layout
/// engine, not a problem with the netlist or skin.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeometryError {
    /// Two consecutive points on a route coincide.
    #[error("start and end are the same")]
    ZeroLength,
    /// Two consecutive points on a route are neither horizontally nor
    /// vertically aligned.
    #[error("start and end aren't orthogonal")]
    NotOrthogonal,
}

/// One routed, dummy-free edge ready for the Drawing Assembler: a sequence
/// of points from `start_point` through `bend_points` to `end_point`, with
/// no reference back to any cell or dummy id (the Drawing Assembler places
/// cells from [`LayoutResponse::children`]/[`LayoutRequest::children`]
/// directly; an edge's own endpoints carry only geometry).
#[derive(Debug, Clone, PartialEq)]
pub struct DrawingEdge {
    /// The edge id this route corresponds to.
    pub id: String,
    /// First point of the routed polyline.
    pub start_point: Point,
    /// Intermediate bend points, in order.
    pub bend_points: Vec<Point>,
    /// Last point of the routed polyline.
    pub end_point: Point,
}

/// The fully reconciled result: dummy-free edges plus the deduplicated set
/// of coordinates that are genuine T/cross junctions and should be drawn
/// as dots.
#[derive(Debug, Clone, Default)]
pub struct ReconciledDrawing {
    /// Every edge, geometry-only, dummy termini rewritten to their true
    /// fan-out point.
    pub edges: Vec<DrawingEdge>,
    /// Deduplicated coordinates where three or more directions leave —
    /// every other synthesized fan-out point was a degenerate two-way
    /// bend and is not included here.
    pub junctions: Vec<Point>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Reconciles a layout response against the request that produced it:
/// removes every dummy cell's incident edges' shared terminus, folding them
/// onto the true fan-out point, and classifies each resulting point as a
/// real junction or a degenerate bend.
///
/// Validates every edge's geometry is a well-formed orthogonal polyline
/// before doing anything else — see [`GeometryError`].
pub fn reconcile(request: &LayoutRequest, response: &LayoutResponse, diagnostics: &DiagnosticSink) -> Result<ReconciledDrawing, GeometryError> {
    let mut geometry: IndexMap<String, RoutedEdge> = IndexMap::new();
    for edge in &response.edges {
        validate_orthogonal(edge)?;
        geometry.insert(edge.id.clone(), edge.clone());
    }

    let mut dummy_edges: IndexMap<String, Vec<String>> = IndexMap::new();
    for edge in &request.edges {
        if is_dummy_id(&edge.source.cell_id) {
            dummy_edges.entry(edge.source.cell_id.clone()).or_default().push(edge.id.clone());
        }
        if is_dummy_id(&edge.target.cell_id) {
            dummy_edges.entry(edge.target.cell_id.clone()).or_default().push(edge.id.clone());
        }
    }

    let dummy_positions: IndexMap<&str, Point> = response.children.iter().map(|c| (c.id.as_str(), c.position)).collect();

    let topology: IndexMap<&str, &crate::request::LayoutEdge> = request.edges.iter().map(|e| (e.id.as_str(), e)).collect();

    let mut junctions = Vec::new();
    let mut processed = 0usize;

    for (dummy_id, edge_ids) in &dummy_edges {
        if processed >= MAX_DUMMY_ITERATIONS {
            diagnostics.emit(Diagnostic::warning(format!(
                "reconciliation stopped after {MAX_DUMMY_ITERATIONS} dummies; '{dummy_id}' and any remaining fan-out points are unresolved"
            )));
            break;
        }
        processed += 1;

        let dummy_is_source = topology[edge_ids[0].as_str()].source.cell_id == *dummy_id;
        let anchor_id = select_anchor(edge_ids, &geometry, dummy_is_source);
        let fallback = dummy_positions.get(dummy_id.as_str()).copied().unwrap_or(Point::new(0.0, 0.0));
        let fan_out_point = anchor_junction_point(&geometry[anchor_id], fallback);

        let mut directions = Vec::with_capacity(edge_ids.len());
        for edge_id in edge_ids {
            let topo = topology[edge_id.as_str()];
            let edge_is_source = topo.source.cell_id == *dummy_id;
            let routed = geometry.get_mut(edge_id).expect("edge id from request exists in response");

            if edge_is_source {
                routed.start_point = fan_out_point;
            } else {
                routed.end_point = fan_out_point;
            }
            routed.bend_points.retain(|p| !points_eq(p, &fan_out_point));

            directions.push(direction_away_from(routed, edge_is_source, fan_out_point));
        }

        let distinct: HashSet<Direction> = directions.into_iter().collect();
        if distinct.len() != 2 {
            junctions.push(fan_out_point);
        }
    }

    dedupe_points(&mut junctions);

    let edges = response
        .edges
        .iter()
        .map(|e| {
            let routed = &geometry[&e.id];
            DrawingEdge {
                id: routed.id.clone(),
                start_point: routed.start_point,
                bend_points: routed.bend_points.clone(),
                end_point: routed.end_point,
            }
        })
        .collect();

    Ok(ReconciledDrawing { edges, junctions })
}

/// Picks the anchor among a dummy's incident edges: the edge whose
/// junction-point placement best matches the true fan-out geometry. When
/// the dummy is a source, the *first* junction coinciding with an early
/// bend index wins; when a target, the *last* junction coinciding with a
/// late bend index wins. Edges reporting no junction points at all are
/// deprioritized with a sentinel so an edge that does report one is always
/// preferred.
fn select_anchor<'a>(edge_ids: &'a [String], geometry: &IndexMap<String, RoutedEdge>, dummy_is_source: bool) -> &'a str {
    edge_ids
        .iter()
        .map(|id| (id.as_str(), anchor_score(&geometry[id], dummy_is_source)))
        .min_by_key(|(_, score)| *score)
        .map(|(id, _)| id)
        .unwrap_or_else(|| edge_ids[0].as_str())
}

fn anchor_score(edge: &RoutedEdge, dummy_is_source: bool) -> usize {
    let Some(junctions) = edge.junction_points.as_ref().filter(|j| !j.is_empty()) else {
        return usize::MAX;
    };

    if dummy_is_source {
        let first = junctions.first().expect("non-empty");
        bend_index_of(edge, first).unwrap_or(usize::MAX)
    } else {
        let last = junctions.last().expect("non-empty");
        match bend_index_of(edge, last) {
            Some(idx) => edge.bend_points.len().saturating_sub(1).saturating_sub(idx),
            None => usize::MAX,
        }
    }
}

fn bend_index_of(edge: &RoutedEdge, point: &Point) -> Option<usize> {
    edge.bend_points.iter().position(|p| points_eq(p, point))
}

/// The true fan-out point for the chosen anchor: its first junction point,
/// or `fallback` (the dummy's own placed position) when the anchor reports
/// none — the degenerate case the layout engine leaves unresolved per the
/// spec's open question on missing `junctionPoints`.
fn anchor_junction_point(anchor: &RoutedEdge, fallback: Point) -> Point {
    anchor
        .junction_points
        .as_ref()
        .and_then(|j| j.first())
        .copied()
        .unwrap_or(fallback)
}

fn direction_away_from(edge: &RoutedEdge, edge_is_source: bool, from: Point) -> Direction {
    let next = if edge_is_source {
        edge.bend_points.first().copied().unwrap_or(edge.end_point)
    } else {
        edge.bend_points.last().copied().unwrap_or(edge.start_point)
    };
    direction_between(from, next)
}

fn direction_between(from: Point, to: Point) -> Direction {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    if dx.abs() >= dy.abs() {
        if dx >= 0.0 {
            Direction::Right
        } else {
            Direction::Left
        }
    } else if dy >= 0.0 {
        Direction::Down
    } else {
        Direction::Up
    }
}

fn points_eq(a: &Point, b: &Point) -> bool {
    a.x == b.x && a.y == b.y
}

fn dedupe_points(points: &mut Vec<Point>) {
    let mut seen: Vec<Point> = Vec::with_capacity(points.len());
    points.retain(|p| {
        if seen.iter().any(|s| points_eq(s, p)) {
            false
        } else {
            seen.push(*p);
            true
        }
    });
}

fn validate_orthogonal(edge: &RoutedEdge) -> Result<(), GeometryError> {
    let mut points = Vec::with_capacity(edge.bend_points.len() + 2);
    points.push(edge.start_point);
    points.extend(edge.bend_points.iter().copied());
    points.push(edge.end_point);

    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if points_eq(&a, &b) {
            return Err(GeometryError::ZeroLength);
        }
        if a.x != b.x && a.y != b.y {
            return Err(GeometryError::NotOrthogonal);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{EdgeEndpoint, LayoutChild, LayoutEdge, LayoutPort};
    use crate::response::PlacedChild;

    fn dummy_request(n_riders: usize) -> LayoutRequest {
        let mut children = vec![LayoutChild {
            id: "drv".to_string(),
            width: 10.0,
            height: 10.0,
            ports: vec![LayoutPort { pid: "Y".to_string(), x: 10.0, y: 5.0 }],
            labels: Vec::new(),
        }];
        children.push(LayoutChild {
            id: "$d_0".to_string(),
            width: 0.0,
            height: 0.0,
            ports: vec![LayoutPort { pid: ".p".to_string(), x: 0.0, y: 0.0 }],
            labels: Vec::new(),
        });
        let mut edges = Vec::new();
        for i in 0..n_riders {
            let rider_id = format!("r{i}");
            children.push(LayoutChild {
                id: rider_id.clone(),
                width: 10.0,
                height: 10.0,
                ports: vec![LayoutPort { pid: "A".to_string(), x: 0.0, y: 5.0 }],
                labels: Vec::new(),
            });
            edges.push(LayoutEdge {
                id: format!("e{i}"),
                source: EdgeEndpoint { cell_id: "$d_0".to_string(), port_id: ".p".to_string() },
                target: EdgeEndpoint { cell_id: rider_id, port_id: "A".to_string() },
                forward_priority: false,
            });
        }
        LayoutRequest { id: "top".to_string(), children, edges }
    }

    fn response_with_junctions(j: Point, ends: &[Point]) -> LayoutResponse {
        let edges = ends
            .iter()
            .enumerate()
            .map(|(i, end)| RoutedEdge {
                id: format!("e{i}"),
                start_point: Point::new(20.0, 5.0),
                bend_points: vec![j],
                end_point: *end,
                junction_points: Some(vec![j]),
            })
            .collect();
        LayoutResponse {
            width: 100.0,
            height: 100.0,
            children: vec![
                PlacedChild { id: "drv".to_string(), position: Point::new(0.0, 0.0) },
                PlacedChild { id: "$d_0".to_string(), position: j },
            ],
            edges,
        }
    }

    #[test]
    fn three_way_fanout_keeps_a_junction_and_drops_dummy() {
        let request = dummy_request(3);
        let j = Point::new(20.0, 5.0);
        // one edge continues right, one drops straight down, one rises straight up: 3 distinct directions.
        let response = response_with_junctions(j, &[Point::new(50.0, 5.0), Point::new(20.0, 35.0), Point::new(20.0, -25.0)]);
        let diagnostics = DiagnosticSink::new();

        let result = reconcile(&request, &response, &diagnostics).unwrap();

        assert_eq!(result.junctions.len(), 1);
        assert_eq!(result.edges.len(), 3);
        for edge in &result.edges {
            assert_eq!(edge.start_point, j);
            assert!(edge.bend_points.is_empty());
        }
    }

    #[test]
    fn two_way_fanout_is_a_degenerate_bend_not_a_junction() {
        let request = dummy_request(2);
        let j = Point::new(20.0, 5.0);
        // one edge continues right, the other straight down: exactly 2 distinct directions.
        let response = response_with_junctions(j, &[Point::new(50.0, 5.0), Point::new(20.0, 35.0)]);
        let diagnostics = DiagnosticSink::new();

        let result = reconcile(&request, &response, &diagnostics).unwrap();

        assert!(result.junctions.is_empty());
        assert_eq!(result.edges.len(), 2);
    }

    #[test]
    fn missing_junction_points_falls_back_to_dummy_position() {
        let request = dummy_request(3);
        let j = Point::new(20.0, 5.0);
        let mut response = response_with_junctions(j, &[Point::new(50.0, 5.0), Point::new(20.0, 35.0), Point::new(20.0, -25.0)]);
        for edge in &mut response.edges {
            edge.junction_points = None;
        }
        let diagnostics = DiagnosticSink::new();

        let result = reconcile(&request, &response, &diagnostics).unwrap();

        assert_eq!(result.junctions, vec![j]);
    }

    #[test]
    fn zero_length_step_is_a_fatal_geometry_error() {
        let request = LayoutRequest { id: "top".to_string(), children: Vec::new(), edges: Vec::new() };
        let response = LayoutResponse {
            width: 0.0,
            height: 0.0,
            children: Vec::new(),
            edges: vec![RoutedEdge {
                id: "e0".to_string(),
                start_point: Point::new(1.0, 1.0),
                bend_points: Vec::new(),
                end_point: Point::new(1.0, 1.0),
                junction_points: None,
            }],
        };
        let diagnostics = DiagnosticSink::new();
        assert_eq!(reconcile(&request, &response, &diagnostics), Err(GeometryError::ZeroLength));
    }

    #[test]
    fn diagonal_step_is_a_fatal_geometry_error() {
        let request = LayoutRequest { id: "top".to_string(), children: Vec::new(), edges: Vec::new() };
        let response = LayoutResponse {
            width: 0.0,
            height: 0.0,
            children: Vec::new(),
            edges: vec![RoutedEdge {
                id: "e0".to_string(),
                start_point: Point::new(0.0, 0.0),
                bend_points: Vec::new(),
                end_point: Point::new(1.0, 1.0),
                junction_points: None,
            }],
        };
        let diagnostics = DiagnosticSink::new();
        assert_eq!(reconcile(&request, &response, &diagnostics), Err(GeometryError::NotOrthogonal));
    }

    #[test]
    fn non_dummy_edges_pass_through_unchanged() {
        let request = LayoutRequest {
            id: "top".to_string(),
            children: Vec::new(),
            edges: vec![LayoutEdge {
                id: "e0".to_string(),
                source: EdgeEndpoint { cell_id: "a".to_string(), port_id: "Y".to_string() },
                target: EdgeEndpoint { cell_id: "b".to_string(), port_id: "A".to_string() },
                forward_priority: true,
            }],
        };
        let response = LayoutResponse {
            width: 10.0,
            height: 10.0,
            children: Vec::new(),
            edges: vec![RoutedEdge {
                id: "e0".to_string(),
                start_point: Point::new(0.0, 0.0),
                bend_points: Vec::new(),
                end_point: Point::new(10.0, 0.0),
                junction_points: None,
            }],
        };
        let diagnostics = DiagnosticSink::new();
        let result = reconcile(&request, &response, &diagnostics).unwrap();
        assert_eq!(result.edges.len(), 1);
        assert!(result.junctions.is_empty());
    }
}
