//! Error kinds surfaced by the transport boundary.

use thiserror::Error;

/// A failed fetch of a remote resource.
///
/// Cloneable so a single in-flight result can be handed to every caller
/// that joined the same request.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FetchError {
	/// Request never produced a response.
	#[error("transport error: {0}")]
	Transport(String),
	/// Non-success HTTP status.
	#[error("server responded with status {status}")]
	Status { status: u16 },
	/// Body did not match the expected shape.
	#[error("could not decode response: {0}")]
	Decode(String),
}

impl From<reqwest::Error> for FetchError {
	fn from(err: reqwest::Error) -> Self {
		if err.is_decode() {
			Self::Decode(err.to_string())
		} else if let Some(status) = err.status() {
			Self::Status {
				status: status.as_u16(),
			}
		} else {
			Self::Transport(err.to_string())
		}
	}
}
