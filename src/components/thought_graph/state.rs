use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::types::{GraphSnapshot, NodeKind, Point, PositionMap};

/// Default pointer hit radius.
pub const HIT_THRESHOLD: f64 = 15.0;

/// Single selection. The renderer outlines it and the details panel reads
/// it; both go through this one value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Selection {
	/// Nothing selected.
	#[default]
	None,
	/// Id of the selected node.
	Selected(String),
}

impl Selection {
	/// Id of the selected node.
	pub fn selected_id(&self) -> Option<&str> {
		match self {
			Selection::None => None,
			Selection::Selected(id) => Some(id),
		}
	}

	/// True when `id` is the selected node.
	pub fn is_selected(&self, id: &str) -> bool {
		self.selected_id() == Some(id)
	}

	/// Detail view of the selected node, if it exists in `snapshot`.
	pub fn details(&self, snapshot: &GraphSnapshot) -> Option<SelectedNode> {
		let node = snapshot.node(self.selected_id()?)?;
		Some(SelectedNode {
			id: node.id.clone(),
			label: node.label.clone(),
			kind: node.kind,
			attributes: node.attributes.clone(),
		})
	}
}

/// What an external details panel displays. Attributes are passed through
/// uninterpreted.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectedNode {
	/// Stable node id.
	pub id: String,
	/// Display name.
	pub label: String,
	/// Node category.
	pub kind: NodeKind,
	/// Backend data, uninterpreted.
	pub attributes: Option<Map<String, Value>>,
}

/// How a pointer position is resolved to a node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitMode {
	/// First node in snapshot order within the threshold.
	#[default]
	FirstMatch,
	/// Closest node within the threshold; ties go to the earlier node.
	Nearest,
}

/// Node under `pointer`, if any lies within `threshold`.
pub fn hit_test<'a>(
	snapshot: &'a GraphSnapshot,
	positions: &PositionMap,
	pointer: Point,
	threshold: f64,
	mode: HitMode,
) -> Option<&'a str> {
	let mut candidates = snapshot.nodes.iter().filter_map(|node| {
		let distance = positions.get(&node.id)?.distance_to(pointer);
		(distance < threshold).then_some((node.id.as_str(), distance))
	});

	match mode {
		HitMode::FirstMatch => candidates.next().map(|(id, _)| id),
		HitMode::Nearest => candidates
			.fold(None::<(&str, f64)>, |best, hit| match best {
				Some((_, d)) if d <= hit.1 => best,
				_ => Some(hit),
			})
			.map(|(id, _)| id),
	}
}

/// Owns the selection and turns pointer input into transitions.
#[derive(Clone, Debug)]
pub struct InteractionController {
	selection: Selection,
	threshold: f64,
	mode: HitMode,
}

impl Default for InteractionController {
	fn default() -> Self {
		Self::new(HIT_THRESHOLD, HitMode::default())
	}
}

impl InteractionController {
	/// Controller with nothing selected.
	pub fn new(threshold: f64, mode: HitMode) -> Self {
		Self {
			selection: Selection::None,
			threshold,
			mode,
		}
	}

	/// Current selection.
	pub fn selection(&self) -> &Selection {
		&self.selection
	}

	/// Pointer coordinates must already be surface-local.
	pub fn handle_pointer(
		&mut self,
		snapshot: &GraphSnapshot,
		positions: &PositionMap,
		px: f64,
		py: f64,
	) -> &Selection {
		let hit = hit_test(snapshot, positions, Point::new(px, py), self.threshold, self.mode);
		self.selection = match hit {
			Some(id) if self.selection.is_selected(id) => Selection::None,
			Some(id) => Selection::Selected(id.to_owned()),
			None => Selection::None,
		};
		&self.selection
	}
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;
	use crate::components::thought_graph::types::GraphNode;

	fn fixture() -> (GraphSnapshot, PositionMap) {
		let snapshot = GraphSnapshot::new(
			vec![
				GraphNode::new("a", NodeKind::Thought, "A"),
				GraphNode::new("b", NodeKind::Person, "B"),
				GraphNode::new("c", NodeKind::Project, "C"),
			],
			Vec::new(),
			Default::default(),
		);
		let positions = PositionMap::from([
			("a".to_owned(), Point::new(100.0, 100.0)),
			("b".to_owned(), Point::new(110.0, 100.0)),
			("c".to_owned(), Point::new(300.0, 300.0)),
		]);
		(snapshot, positions)
	}

	#[test]
	fn second_hit_on_same_node_toggles_off() {
		let (snapshot, positions) = fixture();
		let mut controller = InteractionController::default();

		let first = controller.handle_pointer(&snapshot, &positions, 305.0, 305.0).clone();
		assert_eq!(first, Selection::Selected("c".into()));
		let second = controller.handle_pointer(&snapshot, &positions, 305.0, 305.0).clone();
		assert_eq!(second, Selection::None);
	}

	#[test]
	fn hit_on_other_node_moves_selection() {
		let (snapshot, positions) = fixture();
		let mut controller = InteractionController::default();
		controller.handle_pointer(&snapshot, &positions, 300.0, 300.0);
		let moved = controller.handle_pointer(&snapshot, &positions, 95.0, 100.0);
		assert_eq!(moved, &Selection::Selected("a".into()));
	}

	#[test]
	fn miss_clears_selection() {
		let (snapshot, positions) = fixture();
		let mut controller = InteractionController::default();
		controller.handle_pointer(&snapshot, &positions, 110.0, 100.0);
		assert_eq!(controller.selection(), &Selection::Selected("a".into()));

		let cleared = controller.handle_pointer(&snapshot, &positions, 500.0, 100.0);
		assert_eq!(cleared, &Selection::None);
		let still = controller.handle_pointer(&snapshot, &positions, 500.0, 100.0);
		assert_eq!(still, &Selection::None);
	}

	#[rstest]
	#[case(14.9, true)]
	#[case(15.0, false)]
	#[case(20.0, false)]
	fn threshold_is_strict(#[case] offset: f64, #[case] hits: bool) {
		let (snapshot, positions) = fixture();
		let hit = hit_test(
			&snapshot,
			&positions,
			Point::new(300.0 + offset, 300.0),
			HIT_THRESHOLD,
			HitMode::FirstMatch,
		);
		assert_eq!(hit.is_some(), hits);
	}

	#[test]
	fn first_match_prefers_snapshot_order_over_distance() {
		let (snapshot, positions) = fixture();
		// 8px from a, 2px from b
		let pointer = Point::new(108.0, 100.0);
		let hit = hit_test(&snapshot, &positions, pointer, HIT_THRESHOLD, HitMode::FirstMatch);
		assert_eq!(hit, Some("a"));
	}

	#[test]
	fn nearest_match_picks_closest() {
		let (snapshot, positions) = fixture();
		let pointer = Point::new(108.0, 100.0);
		let hit = hit_test(&snapshot, &positions, pointer, HIT_THRESHOLD, HitMode::Nearest);
		assert_eq!(hit, Some("b"));
	}

	#[test]
	fn nearest_match_ties_keep_snapshot_order() {
		let (snapshot, positions) = fixture();
		let pointer = Point::new(105.0, 100.0);
		let hit = hit_test(&snapshot, &positions, pointer, HIT_THRESHOLD, HitMode::Nearest);
		assert_eq!(hit, Some("a"));
	}

	#[test]
	fn nodes_without_position_are_not_hit() {
		let (snapshot, mut positions) = fixture();
		positions.remove("c");
		let pointer = Point::new(300.0, 300.0);
		let hit = hit_test(&snapshot, &positions, pointer, HIT_THRESHOLD, HitMode::Nearest);
		assert_eq!(hit, None);
	}

	#[test]
	fn details_expose_label_kind_and_raw_attributes() {
		let (mut snapshot, _) = fixture();
		let mut attributes = Map::new();
		attributes.insert("role".into(), Value::from("reviewer"));
		snapshot.nodes[1].attributes = Some(attributes.clone());

		let details = Selection::Selected("b".into()).details(&snapshot).unwrap();
		assert_eq!(details.label, "B");
		assert_eq!(details.kind, NodeKind::Person);
		assert_eq!(details.attributes, Some(attributes));

		assert!(Selection::Selected("gone".into()).details(&snapshot).is_none());
		assert!(Selection::None.details(&snapshot).is_none());
	}
}
