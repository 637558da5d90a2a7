use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;

use crate::{error, ingest, source, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("fetch cycle failed: {0}")]
	Cycle(#[from] ingest::Error),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/start", post_with(start_fetcher, start_fetcher_docs))
		.api_route("/stop", post_with(stop_fetcher, stop_fetcher_docs))
		.api_route("/status", get_with(get_status, get_status_docs))
		.api_route("/run", post_with(run_cycle, run_cycle_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::Cycle(ingest::Error::Upstream(..)) => StatusCode::BAD_GATEWAY,
			Self::Cycle(ingest::Error::Storage(..)) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	fn errors(&self) -> Vec<error::Message<'_>> {
		match self {
			Self::Cycle(ingest::Error::Upstream(source::Error::Status { status, .. })) => {
				error::Message::new("upstream_unavailable")
					.detail("status", status.as_u16())
					.into_vec()
			}
			Self::Cycle(ingest::Error::Upstream(..)) => {
				error::Message::new("upstream_unavailable").into_vec()
			}
			Self::Cycle(ingest::Error::Storage(..)) => Vec::new(),
		}
	}
}
