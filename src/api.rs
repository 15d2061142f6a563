//! HTTP boundary to the backend.

use futures_util::FutureExt;
use futures_util::future::LocalBoxFuture;
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::components::thought_graph::GraphPayload;
use crate::error::FetchError;

/// Aggregate counts shown next to the graph.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BrainStats {
	/// Captured thoughts.
	pub thoughts: u64,
	/// Extracted entities of any kind.
	pub entities: u64,
	/// Distinct categories.
	pub categories: u64,
	/// Action items not yet resolved.
	pub pending_actions: u64,
	/// Person entities.
	pub people: u64,
	/// Project entities.
	pub projects: u64,
}

/// Acknowledgement for a submitted thought.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ThoughtReceipt {
	/// Id assigned to the stored thought.
	#[serde(default)]
	pub thought_id: String,
	/// Free-form reply from the backend.
	#[serde(default)]
	pub response: String,
}

#[derive(Serialize)]
struct ThoughtRequest<'a> {
	thought: &'a str,
}

/// Source of the remote resources the view consumes.
///
/// Futures are `!Send`: everything runs on the UI thread.
pub trait GraphSource {
	/// Raw graph payload.
	fn fetch_graph(&self) -> LocalBoxFuture<'static, Result<GraphPayload, FetchError>>;
	/// Aggregate counts.
	fn fetch_stats(&self) -> LocalBoxFuture<'static, Result<BrainStats, FetchError>>;
	/// Posts a new thought.
	fn submit_thought(
		&self,
		thought: String,
	) -> LocalBoxFuture<'static, Result<ThoughtReceipt, FetchError>>;
}

/// [`GraphSource`] over the backend's REST API.
#[derive(Clone, Debug)]
pub struct HttpGraphSource {
	client: reqwest::Client,
	base: String,
}

impl HttpGraphSource {
	/// `base` is the API origin, e.g. `http://localhost:8000`.
	pub fn new(base: &str) -> Self {
		Self {
			client: reqwest::Client::new(),
			base: base.trim_end_matches('/').to_owned(),
		}
	}

	fn url(&self, path: &str) -> String {
		format!("{}{}", self.base, path)
	}

	fn get_json<T: DeserializeOwned + 'static>(
		&self,
		path: &str,
	) -> LocalBoxFuture<'static, Result<T, FetchError>> {
		debug!("GET {path}");
		let request = self.client.get(self.url(path));
		async move {
			let response = request.send().await?.error_for_status()?;
			Ok::<_, FetchError>(response.json::<T>().await?)
		}
		.boxed_local()
	}
}

impl GraphSource for HttpGraphSource {
	fn fetch_graph(&self) -> LocalBoxFuture<'static, Result<GraphPayload, FetchError>> {
		self.get_json("/graph")
	}

	fn fetch_stats(&self) -> LocalBoxFuture<'static, Result<BrainStats, FetchError>> {
		self.get_json("/brain/stats")
	}

	/// Posts a new thought.
	fn submit_thought(
		&self,
		thought: String,
	) -> LocalBoxFuture<'static, Result<ThoughtReceipt, FetchError>> {
		let request = self
			.client
			.post(self.url("/think"))
			.json(&ThoughtRequest { thought: &thought });
		async move {
			let response = request.send().await?.error_for_status()?;
			Ok::<_, FetchError>(response.json::<ThoughtReceipt>().await?)
		}
		.boxed_local()
	}
}
