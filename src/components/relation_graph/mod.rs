//! Canvas-based relationship graph: force layout, pan/zoom viewport, and
//! pixel-exact picking through an invisible identity-color twin canvas.

mod color_pool;
mod component;
mod picking;
mod queue;
mod render;
mod simulation;
mod state;
mod tooltip;
mod types;
mod viewport;

pub use color_pool::{ColorPool, ColorPoolError, IdentityColor};
pub use component::RelationGraphCanvas;
pub use queue::TickQueue;
pub use simulation::Simulation;
pub use tooltip::{RelationshipCache, RelationshipInfo, RelationshipKey, RelationshipQuery};
pub use types::{GraphData, GraphLink, GraphNode, PickTarget};
pub use viewport::{ViewTransform, Viewport};
