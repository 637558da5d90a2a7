use axum::extract::State;
use macros::route;

use crate::{extract::Json, openapi::tag, store::Store};

use super::{model, RouteError};

/// List documents
/// Returns every stored post document with its embedded comments, ordered
/// by post identity.
#[route(tag = tag::STORE)]
pub async fn list_documents(
	State(store): State<Store>,
) -> Result<Json<Vec<model::Post>>, RouteError> {
	Ok(Json(store.all_posts().await?))
}

/// Clear store
/// Deletes every stored post document. Posts that are still listed by the
/// external source will be fetched again by later cycles.
#[route(tag = tag::STORE)]
pub async fn clear_store(State(store): State<Store>) -> Result<Json<model::ClearResponse>, RouteError> {
	let deleted = store.clear().await?;

	tracing::warn!(deleted, "cleared the document store");

	Ok(Json(model::ClearResponse { deleted }))
}
