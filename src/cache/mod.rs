//! Keyed client-side query cache.
//!
//! Every resource (graph, stats, ...) is cached under a [`QueryKey`] with
//! the same policy: served from memory while inside the staleness window,
//! refetched once the window lapses or the key is invalidated. Concurrent
//! reads of a stale key share one request.

mod clock;
mod coordinator;

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::rc::{Rc, Weak};
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::{LocalBoxFuture, Shared};
use log::{debug, info, warn};

pub use clock::{BrowserClock, Clock};
#[cfg(test)]
pub use clock::ManualClock;
pub use coordinator::{GraphCoordinator, Mount};

use crate::error::FetchError;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum QueryKey {
	Graph,
	Stats,
}

impl fmt::Display for QueryKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			QueryKey::Graph => f.write_str("graph"),
			QueryKey::Stats => f.write_str("stats"),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StalePolicy {
	pub stale_after: Duration,
	/// Extra attempts after the first failure.
	pub retries: u32,
}

impl Default for StalePolicy {
	fn default() -> Self {
		Self {
			stale_after: Duration::from_secs(60),
			retries: 1,
		}
	}
}

/// Result of a cache read: whatever data is held plus the last error.
///
/// A failed refresh keeps the previous data, so `data` and `error` can
/// both be set.
#[derive(Debug)]
pub struct Query<T> {
	pub data: Option<Rc<T>>,
	pub error: Option<FetchError>,
	pub fetched_at: Option<Duration>,
}

impl<T> Clone for Query<T> {
	fn clone(&self) -> Self {
		Self {
			data: self.data.clone(),
			error: self.error.clone(),
			fetched_at: self.fetched_at,
		}
	}
}

impl<T> Query<T> {
	pub fn status(&self) -> LoadStatus {
		match (&self.data, &self.error) {
			(_, Some(err)) => LoadStatus::Failed {
				message: err.to_string(),
				showing_stale: self.data.is_some(),
			},
			(Some(_), None) => LoadStatus::Ready,
			(None, None) => LoadStatus::Loading,
		}
	}
}

/// What the view shows around the canvas.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LoadStatus {
	#[default]
	Loading,
	Ready,
	Failed {
		message: String,
		showing_stale: bool,
	},
}

type CachedValue = Rc<dyn Any>;
type InFlight = Shared<LocalBoxFuture<'static, Result<CachedValue, FetchError>>>;
type Entries = RefCell<HashMap<QueryKey, Entry>>;

#[derive(Default)]
struct Entry {
	value: Option<CachedValue>,
	fetched_at: Option<Duration>,
	error: Option<FetchError>,
	/// Bumped by every invalidation.
	generation: u64,
	/// Generation the held value was requested under.
	value_generation: Option<u64>,
	in_flight: Option<InFlight>,
	/// Generation the outstanding fetch was started under.
	in_flight_generation: u64,
}

impl Entry {
	fn is_fresh(&self, now: Duration, stale_after: Duration) -> bool {
		self.value.is_some()
			&& self.value_generation == Some(self.generation)
			&& self
				.fetched_at
				.is_some_and(|at| now.saturating_sub(at) < stale_after)
	}

	fn settle(&mut self, result: &Result<CachedValue, FetchError>, requested: u64, now: Duration) {
		self.in_flight = None;
		match result {
			Ok(value) => {
				self.value = Some(Rc::clone(value));
				self.fetched_at = Some(now);
				self.value_generation = Some(requested);
				self.error = None;
			}
			Err(err) => self.error = Some(err.clone()),
		}
	}

	fn query<T: 'static>(&self) -> Query<T> {
		Query {
			data: self.value.clone().and_then(|value| value.downcast::<T>().ok()),
			error: self.error.clone(),
			fetched_at: self.fetched_at,
		}
	}
}

#[derive(Clone)]
pub struct QueryCache {
	entries: Rc<Entries>,
	clock: Rc<dyn Clock>,
}

impl QueryCache {
	pub fn new(clock: Rc<dyn Clock>) -> Self {
		Self {
			entries: Rc::new(RefCell::new(HashMap::new())),
			clock,
		}
	}

	pub fn clock(&self) -> &Rc<dyn Clock> {
		&self.clock
	}

	/// Reads `key`, fetching through `fetcher` when the held value is
	/// missing, stale or invalidated. A read that arrives while a fetch for
	/// the same key is outstanding awaits that fetch instead of starting
	/// another one. If the outstanding fetch predates an invalidation, the
	/// read waits for it to land and then fetches again.
	pub async fn get<T, F, Fut>(&self, key: QueryKey, policy: StalePolicy, fetcher: F) -> Query<T>
	where
		T: 'static,
		F: FnMut() -> Fut + 'static,
		Fut: Future<Output = Result<T, FetchError>> + 'static,
	{
		let mut fetcher = Some(fetcher);
		loop {
			let (pending, outdated) = {
				let mut entries = self.entries.borrow_mut();
				let entry = entries.entry(key.clone()).or_default();
				if let Some(in_flight) = &entry.in_flight {
					let outdated = entry.in_flight_generation != entry.generation;
					if outdated {
						debug!("in-flight {key} fetch predates invalidation, waiting to refetch");
					} else {
						debug!("joining in-flight {key} fetch");
					}
					(in_flight.clone(), outdated)
				} else if entry.is_fresh(self.clock.now(), policy.stale_after) {
					debug!("{key} served from cache");
					return entry.query();
				} else {
					let Some(fetcher) = fetcher.take() else {
						return entry.query();
					};
					let fetch = start_fetch(
						Rc::downgrade(&self.entries),
						Rc::clone(&self.clock),
						key.clone(),
						entry.generation,
						policy.retries,
						fetcher,
					);
					entry.in_flight = Some(fetch.clone());
					entry.in_flight_generation = entry.generation;
					(fetch, false)
				}
			};

			// The outcome is recorded in the entry by the fetch itself.
			let _ = pending.await;
			if !outdated {
				return self.peek(&key);
			}
		}
	}

	/// Current contents of `key` without fetching.
	pub fn peek<T: 'static>(&self, key: &QueryKey) -> Query<T> {
		self.entries
			.borrow()
			.get(key)
			.map(|entry| entry.query())
			.unwrap_or(Query {
				data: None,
				error: None,
				fetched_at: None,
			})
	}

	pub fn is_fetching(&self, key: &QueryKey) -> bool {
		self.entries
			.borrow()
			.get(key)
			.is_some_and(|entry| entry.in_flight.is_some())
	}

	/// Forces the next read of each key to refetch. Data already held stays
	/// readable through [`QueryCache::peek`].
	pub fn invalidate(&self, keys: &[QueryKey]) {
		let mut entries = self.entries.borrow_mut();
		for key in keys {
			debug!("invalidating {key}");
			entries.entry(key.clone()).or_default().generation += 1;
		}
	}
}

fn start_fetch<T, F, Fut>(
	entries: Weak<Entries>,
	clock: Rc<dyn Clock>,
	key: QueryKey,
	requested: u64,
	retries: u32,
	mut fetcher: F,
) -> InFlight
where
	T: 'static,
	F: FnMut() -> Fut + 'static,
	Fut: Future<Output = Result<T, FetchError>> + 'static,
{
	async move {
		let result = fetch_with_retry(&key, retries, &mut fetcher)
			.await
			.map(|value| Rc::new(value) as CachedValue);
		match &result {
			Ok(_) => info!("{key} fetched"),
			Err(err) => warn!("{key} fetch failed, keeping previous data: {err}"),
		}
		if let Some(entries) = entries.upgrade() {
			entries
				.borrow_mut()
				.entry(key)
				.or_default()
				.settle(&result, requested, clock.now());
		}
		result
	}
	.boxed_local()
	.shared()
}

async fn fetch_with_retry<T, F, Fut>(
	key: &QueryKey,
	retries: u32,
	fetcher: &mut F,
) -> Result<T, FetchError>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T, FetchError>>,
{
	let mut attempt = 0;
	loop {
		match fetcher().await {
			Ok(value) => return Ok(value),
			Err(err) if attempt < retries => {
				attempt += 1;
				warn!("{key} fetch failed ({err}), retry {attempt}/{retries}");
			}
			Err(err) => return Err(err),
		}
	}
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;

	use super::*;

	type Fetch = LocalBoxFuture<'static, Result<u32, FetchError>>;

	struct Counter(Rc<Cell<u32>>);

	impl Counter {
		fn new() -> Self {
			Self(Rc::new(Cell::new(0)))
		}

		fn get(&self) -> u32 {
			self.0.get()
		}

		/// Fetcher that yields once and then returns the call number.
		fn fetcher(&self) -> impl FnMut() -> Fetch + 'static {
			self.slow_fetcher(1)
		}

		/// Fetcher that stays in flight for `yields` scheduler turns.
		fn slow_fetcher(&self, yields: u32) -> impl FnMut() -> Fetch + 'static {
			let calls = Rc::clone(&self.0);
			move || {
				let calls = Rc::clone(&calls);
				async move {
					for _ in 0..yields {
						tokio::task::yield_now().await;
					}
					calls.set(calls.get() + 1);
					Ok::<_, FetchError>(calls.get())
				}
				.boxed_local()
			}
		}

		/// Fetcher that fails the first `failures` calls.
		fn flaky(&self, failures: u32) -> impl FnMut() -> Fetch + 'static {
			let calls = Rc::clone(&self.0);
			move || {
				let calls = Rc::clone(&calls);
				async move {
					calls.set(calls.get() + 1);
					if calls.get() <= failures {
						Err(FetchError::Transport("connection reset".into()))
					} else {
						Ok(calls.get())
					}
				}
				.boxed_local()
			}
		}
	}

	fn cache() -> (QueryCache, ManualClock) {
		let clock = ManualClock::default();
		(QueryCache::new(Rc::new(clock.clone())), clock)
	}

	#[tokio::test]
	async fn fresh_inside_window_stale_after() {
		let (cache, clock) = cache();
		let counter = Counter::new();
		let policy = StalePolicy::default();

		let first = cache.get(QueryKey::Graph, policy, counter.fetcher()).await;
		assert_eq!(first.data.as_deref(), Some(&1));

		clock.advance(Duration::from_secs(59));
		let cached = cache.get(QueryKey::Graph, policy, counter.fetcher()).await;
		assert_eq!(cached.data.as_deref(), Some(&1));
		assert_eq!(counter.get(), 1);

		clock.advance(Duration::from_secs(2));
		let refreshed = cache.get(QueryKey::Graph, policy, counter.fetcher()).await;
		assert_eq!(refreshed.data.as_deref(), Some(&2));
		assert_eq!(counter.get(), 2);
	}

	#[tokio::test]
	async fn invalidation_bypasses_window() {
		let (cache, _clock) = cache();
		let counter = Counter::new();
		let policy = StalePolicy::default();

		cache.get(QueryKey::Graph, policy, counter.fetcher()).await;
		cache.invalidate(&[QueryKey::Graph]);
		let refetched = cache.get(QueryKey::Graph, policy, counter.fetcher()).await;
		assert_eq!(refetched.data.as_deref(), Some(&2));

		let cached = cache.get(QueryKey::Graph, policy, counter.fetcher()).await;
		assert_eq!(cached.data.as_deref(), Some(&2));
		assert_eq!(counter.get(), 2);
	}

	#[tokio::test]
	async fn invalidation_is_per_key() {
		let (cache, _clock) = cache();
		let graph = Counter::new();
		let stats = Counter::new();
		let policy = StalePolicy::default();

		cache.get(QueryKey::Graph, policy, graph.fetcher()).await;
		cache.get(QueryKey::Stats, policy, stats.fetcher()).await;
		cache.invalidate(&[QueryKey::Stats]);
		cache.get(QueryKey::Graph, policy, graph.fetcher()).await;
		cache.get(QueryKey::Stats, policy, stats.fetcher()).await;

		assert_eq!(graph.get(), 1);
		assert_eq!(stats.get(), 2);
	}

	#[tokio::test]
	async fn concurrent_reads_share_one_fetch() {
		let (cache, _clock) = cache();
		let counter = Counter::new();
		let policy = StalePolicy::default();

		let (a, b) = futures_util::join!(
			cache.get(QueryKey::Graph, policy, counter.fetcher()),
			cache.get(QueryKey::Graph, policy, counter.fetcher()),
		);
		assert_eq!(counter.get(), 1);
		assert!(Rc::ptr_eq(a.data.as_ref().unwrap(), b.data.as_ref().unwrap()));
		assert!(!cache.is_fetching(&QueryKey::Graph));
	}

	#[tokio::test]
	async fn invalidation_during_fetch_leaves_result_stale() {
		let (cache, _clock) = cache();
		let counter = Counter::new();
		let policy = StalePolicy::default();

		let (landed, ()) = futures_util::join!(
			cache.get(QueryKey::Graph, policy, counter.fetcher()),
			async { cache.invalidate(&[QueryKey::Graph]) },
		);
		assert_eq!(landed.data.as_deref(), Some(&1));

		let next = cache.get(QueryKey::Graph, policy, counter.fetcher()).await;
		assert_eq!(next.data.as_deref(), Some(&2));
	}

	#[tokio::test]
	async fn read_after_invalidation_does_not_join_outdated_fetch() {
		let (cache, _clock) = cache();
		let counter = Counter::new();
		let policy = StalePolicy::default();

		let (before, after) = futures_util::join!(
			cache.get(QueryKey::Graph, policy, counter.slow_fetcher(3)),
			async {
				tokio::task::yield_now().await;
				cache.invalidate(&[QueryKey::Graph]);
				cache.get(QueryKey::Graph, policy, counter.slow_fetcher(3)).await
			},
		);
		assert_eq!(before.data.as_deref(), Some(&1));
		assert_eq!(after.data.as_deref(), Some(&2));
		assert_eq!(counter.get(), 2);
	}

	#[tokio::test]
	async fn reads_after_invalidation_share_the_refetch() {
		let (cache, _clock) = cache();
		let counter = Counter::new();
		let policy = StalePolicy::default();

		let (_, second, third) = futures_util::join!(
			cache.get(QueryKey::Graph, policy, counter.slow_fetcher(3)),
			async {
				tokio::task::yield_now().await;
				cache.invalidate(&[QueryKey::Graph]);
				cache.get(QueryKey::Graph, policy, counter.slow_fetcher(3)).await
			},
			async {
				tokio::task::yield_now().await;
				cache.get(QueryKey::Graph, policy, counter.slow_fetcher(3)).await
			},
		);
		assert_eq!(second.data.as_deref(), Some(&2));
		assert_eq!(third.data.as_deref(), Some(&2));
		assert_eq!(counter.get(), 2);
	}

	#[tokio::test]
	async fn one_retry_recovers() {
		let (cache, _clock) = cache();
		let counter = Counter::new();

		let query = cache.get(QueryKey::Graph, StalePolicy::default(), counter.flaky(1)).await;
		assert_eq!(query.data.as_deref(), Some(&2));
		assert!(query.error.is_none());
		assert_eq!(query.status(), LoadStatus::Ready);
	}

	#[tokio::test]
	async fn gives_up_after_one_retry() {
		let (cache, _clock) = cache();
		let counter = Counter::new();

		let query = cache.get(QueryKey::Graph, StalePolicy::default(), counter.flaky(5)).await;
		assert_eq!(counter.get(), 2);
		assert!(query.data.is_none());
		assert_eq!(
			query.status(),
			LoadStatus::Failed {
				message: "transport error: connection reset".into(),
				showing_stale: false,
			}
		);
	}

	#[tokio::test]
	async fn failed_refresh_keeps_previous_data() {
		let (cache, clock) = cache();
		let counter = Counter::new();
		let policy = StalePolicy::default();

		cache.get(QueryKey::Graph, policy, counter.flaky(0)).await;
		clock.advance(Duration::from_secs(61));

		let failing = Counter::new();
		let query = cache.get(QueryKey::Graph, policy, failing.flaky(2)).await;
		assert_eq!(query.data.as_deref(), Some(&1));
		assert!(query.error.is_some());
		assert!(matches!(
			query.status(),
			LoadStatus::Failed {
				showing_stale: true,
				..
			}
		));
	}

	#[test]
	fn peek_before_any_fetch_is_loading() {
		let (cache, _clock) = cache();
		let query: Query<u32> = cache.peek(&QueryKey::Graph);
		assert_eq!(query.status(), LoadStatus::Loading);
	}
}
