use std::f64::consts::PI;

use rand::Rng;

use super::types::{GraphSnapshot, Point, PositionMap, Surface};

/// Smallest ring radius.
pub const BASE_RADIUS: f64 = 150.0;
/// Upper bound of the random radius added per node.
pub const RADIUS_JITTER: f64 = 100.0;

/// Places every node on a ring around the surface center.
///
/// Node `i` of `n` sits at angle `2π·i/n`. The radius is `BASE_RADIUS`
/// plus a jitter drawn from `[0, RADIUS_JITTER)` per node and per call, so
/// two layouts of the same snapshot differ unless `rng` is seeded.
pub fn ring_layout<R: Rng + ?Sized>(
	snapshot: &GraphSnapshot,
	surface: Surface,
	rng: &mut R,
) -> PositionMap {
	let n = snapshot.nodes.len();
	let center = surface.center();
	let mut positions = PositionMap::with_capacity(n);

	for (i, node) in snapshot.nodes.iter().enumerate() {
		let angle = (i as f64 / n as f64) * 2.0 * PI;
		let radius = BASE_RADIUS + rng.gen_range(0.0..RADIUS_JITTER);
		positions.insert(
			node.id.clone(),
			Point::new(
				center.x + radius * angle.cos(),
				center.y + radius * angle.sin(),
			),
		);
	}
	positions
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	use super::*;
	use crate::components::thought_graph::types::{GraphNode, NodeKind};

	fn snapshot_of(n: usize) -> GraphSnapshot {
		let nodes = (0..n)
			.map(|i| GraphNode::new(format!("n{i}"), NodeKind::Topic, format!("Node {i}")))
			.collect();
		GraphSnapshot::new(nodes, Vec::new(), Default::default())
	}

	#[test]
	fn empty_snapshot_yields_empty_map() {
		let positions =
			ring_layout(&snapshot_of(0), Surface::default(), &mut StdRng::seed_from_u64(1));
		assert!(positions.is_empty());
	}

	#[test]
	fn first_node_sits_on_positive_x_axis() {
		let surface = Surface::default();
		let positions = ring_layout(&snapshot_of(4), surface, &mut StdRng::seed_from_u64(9));
		let first = positions["n0"];
		assert!((first.y - surface.center().y).abs() < 1e-9);
		assert!(first.x >= surface.center().x + BASE_RADIUS);
	}

	#[test]
	fn jitter_is_resampled_per_recomputation() {
		let snapshot = snapshot_of(12);
		let mut rng = StdRng::seed_from_u64(42);
		let first = ring_layout(&snapshot, Surface::default(), &mut rng);
		let second = ring_layout(&snapshot, Surface::default(), &mut rng);
		assert_ne!(first, second);
	}

	#[test]
	fn same_seed_reproduces_layout() {
		let snapshot = snapshot_of(6);
		let a = ring_layout(&snapshot, Surface::default(), &mut StdRng::seed_from_u64(3));
		let b = ring_layout(&snapshot, Surface::default(), &mut StdRng::seed_from_u64(3));
		assert_eq!(a, b);
	}

	proptest! {
		#[test]
		fn every_node_on_its_ring_slot(n in 1usize..64, seed in any::<u64>()) {
			let surface = Surface { width: 800.0, height: 600.0 };
			let snapshot = snapshot_of(n);
			let positions = ring_layout(&snapshot, surface, &mut StdRng::seed_from_u64(seed));
			prop_assert_eq!(positions.len(), n);

			let center = surface.center();
			for (i, node) in snapshot.nodes.iter().enumerate() {
				let p = positions[&node.id];
				let (dx, dy) = (p.x - center.x, p.y - center.y);
				let radius = dx.hypot(dy);
				prop_assert!(radius > BASE_RADIUS - 1e-9 && radius < BASE_RADIUS + RADIUS_JITTER + 1e-9);

				let expected = (i as f64 / n as f64) * 2.0 * PI;
				let angle = dy.atan2(dx).rem_euclid(2.0 * PI);
				let diff = (angle - expected).abs();
				prop_assert!(diff < 1e-9 || (2.0 * PI - diff) < 1e-9);
			}
		}
	}
}
