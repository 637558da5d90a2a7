use aide::axum::{routing::get_with, ApiRouter};

use crate::AppState;

pub mod model;
pub mod route;

pub type RouteError = crate::error::RouteError<std::convert::Infallible>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new().api_route(
		"/posts",
		get_with(list_documents, list_documents_docs).delete_with(clear_store, clear_store_docs),
	)
}
