use std::collections::HashMap;
use std::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Category of a graph node. Drives radius and palette at render time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
	/// A captured thought.
	Thought,
	/// A person entity.
	Person,
	/// A project entity.
	Project,
	/// A topic entity.
	Topic,
	/// Any other extracted entity.
	Entity,
	/// Unknown or missing label.
	#[default]
	Other,
}

impl NodeKind {
	/// Maps a backend label (`"Thought"`, `"person"`, ...) onto a kind.
	/// Unknown labels collapse into [`NodeKind::Other`].
	pub fn from_label(label: &str) -> Self {
		const KNOWN: [(&str, NodeKind); 5] = [
			("thought", NodeKind::Thought),
			("person", NodeKind::Person),
			("project", NodeKind::Project),
			("topic", NodeKind::Topic),
			("entity", NodeKind::Entity),
		];
		KNOWN
			.iter()
			.find(|(name, _)| name.eq_ignore_ascii_case(label.trim()))
			.map(|&(_, kind)| kind)
			.unwrap_or(NodeKind::Other)
	}

	/// Display label.
	pub fn as_str(self) -> &'static str {
		match self {
			NodeKind::Thought => "Thought",
			NodeKind::Person => "Person",
			NodeKind::Project => "Project",
			NodeKind::Topic => "Topic",
			NodeKind::Entity => "Entity",
			NodeKind::Other => "Other",
		}
	}
}

/// Validated graph node.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
	/// Stable node id.
	pub id: String,
	/// Node category.
	pub kind: NodeKind,
	/// Display name.
	pub label: String,
	/// Backend-specific data, passed through as-is.
	pub attributes: Option<Map<String, Value>>,
}

impl GraphNode {
	/// Node without attributes.
	pub fn new(id: impl Into<String>, kind: NodeKind, label: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			kind,
			label: label.into(),
			attributes: None,
		}
	}
}

/// Directed edge. Duplicates are legal; endpoints may be dangling.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphEdge {
	/// Id of the origin node.
	pub source_id: String,
	/// Id of the destination node.
	pub target_id: String,
	/// Relation name; free-form.
	pub kind: String,
	/// Defaults to `1.0`.
	pub weight: f64,
}

impl GraphEdge {
	/// Edge with the default weight.
	pub fn new(
		source_id: impl Into<String>,
		target_id: impl Into<String>,
		kind: impl Into<String>,
	) -> Self {
		Self {
			source_id: source_id.into(),
			target_id: target_id.into(),
			kind: kind.into(),
			weight: 1.0,
		}
	}
}

/// Immutable point-in-time graph. Replaced wholesale on every fetch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphSnapshot {
	/// Nodes in backend order. Ids are unique.
	pub nodes: Vec<GraphNode>,
	/// Edges in backend order.
	pub edges: Vec<GraphEdge>,
	/// Clock time the payload arrived.
	pub fetched_at: Duration,
}

impl GraphSnapshot {
	/// Snapshot with no nodes, edges or fetch time.
	pub fn empty() -> Self {
		Self::default()
	}

	/// Snapshot taken at `fetched_at`.
	pub fn new(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>, fetched_at: Duration) -> Self {
		Self {
			nodes,
			edges,
			fetched_at,
		}
	}

	/// Builds a snapshot from a raw payload, dropping malformed entries.
	pub fn from_payload(payload: GraphPayload, fetched_at: Duration) -> Self {
		let (nodes, edges, report) = payload.decode();
		if report.dropped_nodes > 0 || report.dropped_edges > 0 {
			warn!(
				"dropped {} malformed node(s) and {} malformed edge(s) from graph payload",
				report.dropped_nodes, report.dropped_edges
			);
		}
		Self::new(nodes, edges, fetched_at)
	}

	/// True when there are no nodes.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Looks a node up by id.
	pub fn node(&self, id: &str) -> Option<&GraphNode> {
		self.nodes.iter().find(|node| node.id == id)
	}
}

/// A point in surface coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	/// Horizontal offset from the left edge.
	pub x: f64,
	/// Vertical offset from the top edge.
	pub y: f64,
}

impl Point {
	/// Point at `(x, y)`.
	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Euclidean distance.
	pub fn distance_to(self, other: Point) -> f64 {
		(self.x - other.x).hypot(self.y - other.y)
	}
}

/// Node id to position.
pub type PositionMap = HashMap<String, Point>;

/// Logical drawing surface.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Surface {
	/// Width in surface units.
	pub width: f64,
	/// Height in surface units.
	pub height: f64,
}

impl Default for Surface {
	fn default() -> Self {
		Self {
			width: 800.0,
			height: 600.0,
		}
	}
}

impl Surface {
	/// Midpoint of the surface.
	pub fn center(&self) -> Point {
		Point::new(self.width / 2.0, self.height / 2.0)
	}
}

/// Graph payload as delivered by the transport, before validation.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct GraphPayload {
	/// Unvalidated node objects.
	#[serde(default)]
	pub nodes: Vec<Value>,
	/// Unvalidated edge objects.
	#[serde(default)]
	pub edges: Vec<Value>,
}

/// Counts of entries dropped while decoding a [`GraphPayload`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecodeReport {
	/// Node entries that failed validation.
	pub dropped_nodes: usize,
	/// Edge entries that failed validation.
	pub dropped_edges: usize,
}

#[derive(Deserialize)]
struct WireNode {
	id: String,
	label: String,
	#[serde(rename = "type", alias = "kind", default)]
	kind: Option<String>,
	#[serde(alias = "attributes", default)]
	data: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
struct WireEdge {
	#[serde(rename = "source", alias = "sourceId")]
	source_id: String,
	#[serde(rename = "target", alias = "targetId")]
	target_id: String,
	#[serde(rename = "type", alias = "kind", default)]
	kind: Option<String>,
	#[serde(default)]
	weight: Option<f64>,
}

impl GraphPayload {
	/// Validates every entry; malformed ones are counted and skipped.
	pub fn decode(self) -> (Vec<GraphNode>, Vec<GraphEdge>, DecodeReport) {
		let mut report = DecodeReport::default();

		let nodes = self
			.nodes
			.into_iter()
			.filter_map(|raw| match serde_json::from_value::<WireNode>(raw) {
				Ok(wire) => Some(GraphNode {
					id: wire.id,
					kind: wire
						.kind
						.as_deref()
						.map(NodeKind::from_label)
						.unwrap_or_default(),
					label: wire.label,
					attributes: wire.data,
				}),
				Err(_) => {
					report.dropped_nodes += 1;
					None
				}
			})
			.collect();

		let edges = self
			.edges
			.into_iter()
			.filter_map(|raw| match serde_json::from_value::<WireEdge>(raw) {
				Ok(wire) => Some(GraphEdge {
					source_id: wire.source_id,
					target_id: wire.target_id,
					kind: wire.kind.unwrap_or_default(),
					weight: wire.weight.unwrap_or(1.0),
				}),
				Err(_) => {
					report.dropped_edges += 1;
					None
				}
			})
			.collect();

		(nodes, edges, report)
	}
}
