use aide::axum::{routing::get_with, ApiRouter};
use axum::http::StatusCode;

use crate::{error, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown post {0}")]
	UnknownPost(i64),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/count", get_with(count_posts, count_posts_docs))
		.api_route(
			"/:id",
			get_with(get_post, get_post_docs).put_with(update_post, update_post_docs),
		)
		.api_route(
			"/:id/comments",
			get_with(get_post_comments, get_post_comments_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownPost(..) => StatusCode::NOT_FOUND,
		}
	}

	fn errors(&self) -> Vec<error::Message<'_>> {
		match self {
			Self::UnknownPost(post) => error::Message::new("unknown_post")
				.detail("post", *post)
				.into_vec(),
		}
	}
}
