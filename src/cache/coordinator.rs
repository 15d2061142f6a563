use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info};

use super::{Clock, Query, QueryCache, QueryKey, StalePolicy};
use crate::api::{BrainStats, GraphSource, ThoughtReceipt};
use crate::components::thought_graph::GraphSnapshot;
use crate::error::FetchError;

/// "Still interested" flag tied to one mount of a view. Results landing
/// after `unmount` are discarded.
#[derive(Clone, Debug)]
pub struct Mount(Arc<AtomicBool>);

impl Default for Mount {
	fn default() -> Self {
		Self::new()
	}
}

impl Mount {
	/// A live mount.
	pub fn new() -> Self {
		Self(Arc::new(AtomicBool::new(true)))
	}

	/// Marks the view as gone. Clones observe it too.
	pub fn unmount(&self) {
		self.0.store(false, Ordering::Relaxed);
	}

	/// False once any clone has been unmounted.
	pub fn is_alive(&self) -> bool {
		self.0.load(Ordering::Relaxed)
	}
}

/// Feeds the graph view and its sibling stats from one cache.
pub struct GraphCoordinator {
	cache: QueryCache,
	source: Rc<dyn GraphSource>,
	policy: StalePolicy,
}

impl GraphCoordinator {
	/// Empty cache over `source`.
	pub fn new(source: Rc<dyn GraphSource>, clock: Rc<dyn Clock>, policy: StalePolicy) -> Self {
		Self {
			cache: QueryCache::new(clock),
			source,
			policy,
		}
	}

	/// Cached graph, refetched when stale or invalidated.
	pub async fn graph(&self) -> Query<GraphSnapshot> {
		let source = Rc::clone(&self.source);
		let clock = Rc::clone(self.cache.clock());
		self.cache
			.get(QueryKey::Graph, self.policy, move || {
				let request = source.fetch_graph();
				let clock = Rc::clone(&clock);
				async move {
					let payload = request.await?;
					Ok::<_, FetchError>(GraphSnapshot::from_payload(payload, clock.now()))
				}
			})
			.await
	}

	/// Cached stats, with the same policy as the graph.
	pub async fn stats(&self) -> Query<BrainStats> {
		let source = Rc::clone(&self.source);
		self.cache
			.get(QueryKey::Stats, self.policy, move || source.fetch_stats())
			.await
	}

	/// Graph read on behalf of a mounted view; `None` once it is gone.
	pub async fn load_graph(&self, mount: &Mount) -> Option<Query<GraphSnapshot>> {
		let query = self.graph().await;
		if !mount.is_alive() {
			debug!("view unmounted before graph landed, discarding");
			return None;
		}
		Some(query)
	}

	/// Whatever graph is held, without fetching.
	pub fn peek_graph(&self) -> Query<GraphSnapshot> {
		self.cache.peek(&QueryKey::Graph)
	}

	/// Invalidate-on-write hook for a successful thought submission.
	pub fn thought_submitted(&self) {
		info!("thought submitted, expiring graph and stats");
		self.cache.invalidate(&[QueryKey::Graph, QueryKey::Stats]);
	}

	/// Posts a thought and, only on success, expires the cached resources.
	pub async fn submit_thought(&self, thought: &str) -> Result<ThoughtReceipt, FetchError> {
		let receipt = self.source.submit_thought(thought.to_owned()).await?;
		self.thought_submitted();
		Ok(receipt)
	}
}
