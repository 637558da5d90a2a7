use axum::extract::State;
use macros::route;

use crate::{extract::Json, openapi::tag, Fetcher};

use super::{model, RouteError};

/// Start fetcher
/// Starts the background fetcher, which runs a cycle right away and then
/// once per interval. Does nothing if it is already running.
#[route(tag = tag::FETCHER)]
pub async fn start_fetcher(State(fetcher): State<Fetcher>) -> Json<model::ControlResponse> {
	let changed = fetcher.start();

	Json(model::ControlResponse {
		changed,
		status: fetcher.status(),
	})
}

/// Stop fetcher
/// Stops the background fetcher, waiting for a running cycle to reach a
/// safe point first.
#[route(tag = tag::FETCHER)]
pub async fn stop_fetcher(State(fetcher): State<Fetcher>) -> Json<model::ControlResponse> {
	let changed = fetcher.stop().await;

	Json(model::ControlResponse {
		changed,
		status: fetcher.status(),
	})
}

/// Get fetcher status
#[route(tag = tag::FETCHER)]
pub async fn get_status(State(fetcher): State<Fetcher>) -> Json<model::StatusResponse> {
	Json(model::StatusResponse {
		status: fetcher.status(),
		interval_seconds: fetcher.interval().as_secs(),
	})
}

/// Run fetch cycle
/// Runs a single fetch cycle immediately and returns its summary. This is
/// independent of the background fetcher.
#[route(tag = tag::FETCHER, response(status = 502, description = "The external source is unavailable."))]
pub async fn run_cycle(
	State(fetcher): State<Fetcher>,
) -> Result<Json<model::CycleSummary>, RouteError> {
	let summary = fetcher.run_once().await.map_err(super::Error::Cycle)?;

	Ok(Json(summary))
}
