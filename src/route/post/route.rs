use axum::extract::State;
use chrono::Utc;
use macros::route;

use crate::{
	extract::{Json, Path, Query},
	openapi::tag,
	store::Store,
};

use super::{model, Error, RouteError};

/// Get post
/// Returns a single post by its identity, along with its number of comments.
#[route(tag = tag::POST, response(status = 404, description = "Unknown post."))]
pub async fn get_post(
	State(store): State<Store>,
	Path(path): Path<model::IdInput>,
) -> Result<Json<model::PostResponse>, RouteError> {
	let post = store.find_post(path.id).await?;

	Ok(Json(post.ok_or(Error::UnknownPost(path.id))?.into()))
}

/// Get post comments
/// Returns every comment of a single post, in the order they were fetched.
#[route(tag = tag::POST, response(status = 404, description = "Unknown post."))]
pub async fn get_post_comments(
	State(store): State<Store>,
	Path(path): Path<model::IdInput>,
) -> Result<Json<Vec<model::Comment>>, RouteError> {
	let post = store.find_post(path.id).await?;

	Ok(Json(post.ok_or(Error::UnknownPost(path.id))?.comments))
}

/// Update post
/// Replaces the body of a post and records when it was edited.
#[route(tag = tag::POST, response(status = 404, description = "Unknown post."))]
pub async fn update_post(
	State(store): State<Store>,
	Path(path): Path<model::IdInput>,
	Json(input): Json<model::UpdatePostInput>,
) -> Result<Json<model::MessageResponse>, RouteError> {
	let updated = store
		.update_post_body(path.id, input.body.trim(), Utc::now())
		.await?;

	if !updated {
		return Err(Error::UnknownPost(path.id).into());
	}

	tracing::info!(post_id = path.id, "updated post body");

	Ok(Json(model::MessageResponse::new(format!(
		"post {} updated",
		path.id
	))))
}

/// Count posts
/// Counts the posts created within an optional, inclusive date range.
#[route(tag = tag::POST)]
pub async fn count_posts(
	State(store): State<Store>,
	Query(query): Query<model::CountInput>,
) -> Result<Json<model::PostCountResponse>, RouteError> {
	let count = store.count_posts(query.range()).await?;

	Ok(Json(model::PostCountResponse {
		count,
		start_date: query.start_date,
		end_date: query.end_date,
	}))
}
