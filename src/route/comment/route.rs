use axum::extract::State;
use macros::route;

use crate::{
	extract::{Json, Path, Query},
	openapi::tag,
	store::Store,
};

use super::{model, Error, RouteError};

/// Search comments
/// Finds comments whose body contains the query, ignoring case. At most
/// `limit` comments are returned, but every match is counted.
#[route(tag = tag::COMMENT)]
pub async fn search_comments(
	State(store): State<Store>,
	Query(query): Query<model::SearchInput>,
) -> Result<Json<model::CommentSearchResponse>, RouteError> {
	let search = store.search_comments(&query.query, query.limit).await?;

	tracing::debug!(
		query = %query.query,
		total_count = search.total_count,
		"searched comments"
	);

	Ok(Json(model::CommentSearchResponse {
		comments: search.comments,
		total_count: search.total_count,
		query: query.query,
	}))
}

/// Get comment
/// Returns a single comment by its identity.
#[route(tag = tag::COMMENT, response(status = 404, description = "Unknown comment."))]
pub async fn get_comment(
	State(store): State<Store>,
	Path(path): Path<model::IdInput>,
) -> Result<Json<model::Comment>, RouteError> {
	let comment = store.find_comment(path.id).await?;

	Ok(Json(comment.ok_or(Error::UnknownComment(path.id))?))
}
