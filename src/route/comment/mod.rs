use aide::axum::{routing::get_with, ApiRouter};
use axum::http::StatusCode;

use crate::{error, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown comment {0}")]
	UnknownComment(i64),
}

pub type RouteError = error::RouteError<Error>;

/// Comment routes, which live under the same prefix as the post routes.
pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route(
			"/comments/search",
			get_with(search_comments, search_comments_docs),
		)
		.api_route("/comments/:id", get_with(get_comment, get_comment_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownComment(..) => StatusCode::NOT_FOUND,
		}
	}

	fn errors(&self) -> Vec<error::Message<'_>> {
		match self {
			Self::UnknownComment(comment) => error::Message::new("unknown_comment")
				.detail("comment", *comment)
				.into_vec(),
		}
	}
}
