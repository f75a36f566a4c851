//! The asynchronous layout-engine boundary.
//!
//! This is the pipeline's only async seam: everything before building a
//! [`LayoutRequest`] and everything after reading a [`LayoutResponse`] runs
//! synchronously on the caller's task. [`LayoutEngine`] is object-safe so
//! callers can hold it behind `&dyn LayoutEngine` and swap engines at
//! runtime without a generic parameter threading through the whole
//! pipeline.

use crate::request::LayoutRequest;
use crate::response::LayoutResponse;
use async_trait::async_trait;

/// Boxed error type returned by a [`LayoutEngine`], since the trait must
/// stay object-safe.
pub type LayoutEngineError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// An external orthogonal layered-graph layout engine, consumed as an
/// opaque request/response service.
#[async_trait]
pub trait LayoutEngine: Send + Sync {
    /// Computes placement and routing for `request`.
    async fn layout(&self, request: LayoutRequest) -> Result<LayoutResponse, LayoutEngineError>;
}

/// A deterministic, in-process [`LayoutEngine`] used for testing the
/// pipeline without a real layout service. Places children left-to-right
/// on a single row spaced by their width and routes every edge as a single
/// straight polyline between its two fixed port anchors, with no bend or
/// junction points — callers that need to exercise dummy-fan-out
/// reconciliation build a [`LayoutResponse`] fixture directly instead of
/// going through this engine.
#[derive(Debug, Default)]
pub struct StubLayoutEngine {
    /// Horizontal gap inserted between consecutive placed children.
    pub gap: f64,
}

impl StubLayoutEngine {
    /// Creates a stub engine with the default 20-unit gap.
    pub fn new() -> Self {
        Self { gap: 20.0 }
    }
}

#[async_trait]
impl LayoutEngine for StubLayoutEngine {
    async fn layout(&self, request: LayoutRequest) -> Result<LayoutResponse, LayoutEngineError> {
        use crate::response::{PlacedChild, Point, RoutedEdge};
        use std::collections::HashMap;

        let mut placements = Vec::with_capacity(request.children.len());
        let mut positions: HashMap<String, Point> = HashMap::new();
        let mut cursor_x = 0.0;
        let max_height = request.children.iter().map(|c| c.height).fold(0.0_f64, f64::max);

        for child in &request.children {
            let position = Point::new(cursor_x, (max_height - child.height) / 2.0);
            positions.insert(child.id.clone(), position);
            placements.push(PlacedChild {
                id: child.id.clone(),
                position,
            });
            cursor_x += child.width + self.gap;
        }

        let mut ports_by_child: HashMap<&str, HashMap<&str, (f64, f64)>> = HashMap::new();
        for child in &request.children {
            let entry = ports_by_child.entry(child.id.as_str()).or_default();
            for port in &child.ports {
                entry.insert(port.pid.as_str(), (port.x, port.y));
            }
        }

        let mut edges = Vec::with_capacity(request.edges.len());
        for edge in &request.edges {
            let resolve = |cell_id: &str, port_id: &str| -> Point {
                let base = positions.get(cell_id).copied().unwrap_or(Point::new(0.0, 0.0));
                let offset = ports_by_child.get(cell_id).and_then(|p| p.get(port_id)).copied().unwrap_or((0.0, 0.0));
                Point::new(base.x + offset.0, base.y + offset.1)
            };
            let start = resolve(&edge.source.cell_id, &edge.source.port_id);
            let end = resolve(&edge.target.cell_id, &edge.target.port_id);
            edges.push(RoutedEdge {
                id: edge.id.clone(),
                start_point: start,
                bend_points: Vec::new(),
                end_point: end,
                junction_points: None,
            });
        }

        Ok(LayoutResponse {
            width: cursor_x,
            height: max_height,
            children: placements,
            edges,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{EdgeEndpoint, LayoutChild, LayoutEdge, LayoutPort};

    #[tokio::test]
    async fn stub_places_children_left_to_right() {
        let request = LayoutRequest {
            id: "top".to_string(),
            children: vec![
                LayoutChild {
                    id: "a".to_string(),
                    width: 30.0,
                    height: 20.0,
                    ports: vec![LayoutPort { pid: "Y".to_string(), x: 30.0, y: 10.0 }],
                    labels: Vec::new(),
                },
                LayoutChild {
                    id: "b".to_string(),
                    width: 30.0,
                    height: 20.0,
                    ports: vec![LayoutPort { pid: "A".to_string(), x: 0.0, y: 10.0 }],
                    labels: Vec::new(),
                },
            ],
            edges: vec![LayoutEdge {
                id: "e0".to_string(),
                source: EdgeEndpoint { cell_id: "a".to_string(), port_id: "Y".to_string() },
                target: EdgeEndpoint { cell_id: "b".to_string(), port_id: "A".to_string() },
                forward_priority: true,
            }],
        };

        let engine = StubLayoutEngine::new();
        let response = engine.layout(request).await.unwrap();

        assert_eq!(response.children.len(), 2);
        assert!(response.children[1].position.x > response.children[0].position.x);
        assert_eq!(response.edges.len(), 1);
        assert_eq!(response.edges[0].start_point.x, 30.0);
    }

    #[tokio::test]
    async fn stub_is_usable_as_a_trait_object() {
        let engine: Box<dyn LayoutEngine> = Box::new(StubLayoutEngine::new());
        let request = LayoutRequest { id: "empty".to_string(), children: Vec::new(), edges: Vec::new() };
        let response = engine.layout(request).await.unwrap();
        assert_eq!(response.children.len(), 0);
    }
}
