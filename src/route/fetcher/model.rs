pub use crate::{ingest::CycleSummary, scheduler::Status};

use schemars::JsonSchema;
use serde::Serialize;

/// The outcome of a start or stop request.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ControlResponse {
	/// Whether the request changed the state of the fetcher.
	pub changed: bool,
	/// The state of the fetcher after the request.
	pub status: Status,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct StatusResponse {
	pub status: Status,
	/// Seconds between the end of one cycle and the start of the next.
	pub interval_seconds: u64,
}
