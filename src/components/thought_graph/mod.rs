mod component;
mod layout;
mod render;
mod state;
mod store;
mod types;

pub use component::ThoughtGraphCanvas;
pub use layout::{BASE_RADIUS, RADIUS_JITTER, ring_layout};
pub use render::{DrawCommand, draw_commands, node_color, node_radius, paint};
pub use state::{HIT_THRESHOLD, HitMode, InteractionController, SelectedNode, Selection, hit_test};
pub use store::SnapshotStore;
pub use types::{
	DecodeReport, GraphEdge, GraphNode, GraphPayload, GraphSnapshot, NodeKind, Point, PositionMap,
	Surface,
};
