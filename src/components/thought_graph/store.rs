use std::rc::Rc;

use log::debug;
use rand::Rng;

use super::layout::ring_layout;
use super::types::{GraphSnapshot, PositionMap, Surface};

/// Holds the latest snapshot and the layout derived from it.
///
/// Replacement is a reference swap, so readers never observe a partially
/// updated graph. The layout is computed lazily and dropped on every `set`.
pub struct SnapshotStore {
	snapshot: Rc<GraphSnapshot>,
	positions: Option<Rc<PositionMap>>,
	surface: Surface,
}

impl SnapshotStore {
	/// Empty store sized to `surface`.
	pub fn new(surface: Surface) -> Self {
		Self {
			snapshot: Rc::new(GraphSnapshot::empty()),
			positions: None,
			surface,
		}
	}

	/// Last-fetch-wins replacement.
	pub fn set(&mut self, snapshot: Rc<GraphSnapshot>) {
		self.snapshot = snapshot;
		self.positions = None;
	}

	/// True when `snapshot` is the very instance already held.
	pub fn holds(&self, snapshot: &Rc<GraphSnapshot>) -> bool {
		Rc::ptr_eq(&self.snapshot, snapshot)
	}

	/// Shared handle to the held snapshot.
	pub fn current(&self) -> Rc<GraphSnapshot> {
		Rc::clone(&self.snapshot)
	}

	/// Surface the layout is computed for.
	pub fn surface(&self) -> Surface {
		self.surface
	}

	/// Layout for the held snapshot, recomputed only after a `set`.
	pub fn positions<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Rc<PositionMap> {
		if let Some(positions) = &self.positions {
			return Rc::clone(positions);
		}
		let positions = if self.snapshot.is_empty() {
			PositionMap::new()
		} else {
			debug!("laying out {} node(s)", self.snapshot.nodes.len());
			ring_layout(&self.snapshot, self.surface, rng)
		};
		let positions = Rc::new(positions);
		self.positions = Some(Rc::clone(&positions));
		positions
	}
}
