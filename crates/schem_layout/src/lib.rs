//! Layout request construction, the async layout-engine boundary, and
//! post-layout reconciliation.
//!
//! `request` builds the flat, dummy-augmented graph the external layout
//! engine consumes. `engine` defines that engine as an opaque async
//! trait plus a deterministic stub for tests. `reconcile` reads the
//! engine's response back and removes the dummy artifacts, folding each
//! dummy's incident edges into a shared fan-out point.

#![warn(missing_docs)]

pub mod engine;
pub mod reconcile;
pub mod request;
pub mod response;

pub use engine::{LayoutEngine, LayoutEngineError, StubLayoutEngine};
pub use reconcile::{reconcile, DrawingEdge, GeometryError, ReconciledDrawing};
pub use request::{build_request, is_dummy_id, EdgeEndpoint, LayoutChild, LayoutEdge, LayoutLabel, LayoutPort, LayoutRequest, DUMMY_PREFIX};
pub use response::{LayoutResponse, PlacedChild, Point, RoutedEdge};
