//! View configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::cache::StalePolicy;
use crate::components::thought_graph::{HitMode, Surface};

/// Settings for the graph view. Missing fields take their defaults, so an
/// empty JSON object is a valid config.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GraphViewConfig {
	/// Backend origin, without a trailing slash.
	pub api_base: String,
	/// Logical drawing surface size.
	pub surface: Surface,
	/// Age after which cached data is refetched on read.
	pub stale_after_secs: u64,
	/// Extra fetch attempts after the first failure.
	pub retries: u32,
	/// Pointer hit radius in surface units.
	pub hit_threshold: f64,
	/// Tie-breaking rule for overlapping nodes.
	pub hit_mode: HitMode,
}

impl Default for GraphViewConfig {
	fn default() -> Self {
		Self {
			api_base: "http://localhost:8000".into(),
			surface: Surface::default(),
			stale_after_secs: 60,
			retries: 1,
			hit_threshold: 15.0,
			hit_mode: HitMode::FirstMatch,
		}
	}
}

impl GraphViewConfig {
	/// Parses a config object; absent fields fall back to defaults.
	pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(raw)
	}

	/// Cache policy derived from these settings.
	pub fn stale_policy(&self) -> StalePolicy {
		StalePolicy {
			stale_after: Duration::from_secs(self.stale_after_secs),
			retries: self.retries,
		}
	}
}
