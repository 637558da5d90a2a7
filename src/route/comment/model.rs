pub use crate::{
	model::Comment,
	route::model::{IdInput, SearchInput},
};

use schemars::JsonSchema;
use serde::Serialize;

#[derive(Debug, Serialize, JsonSchema)]
pub struct CommentSearchResponse {
	/// The matching comments, ordered by post and then by position.
	pub comments: Vec<Comment>,
	/// The number of matching comments, which may exceed the number returned.
	pub total_count: u64,
	/// The query as it was received.
	pub query: String,
}
