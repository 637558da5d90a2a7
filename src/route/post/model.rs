pub use crate::{
	model::Comment,
	route::model::{validate_not_blank, CountInput, IdInput, MessageResponse},
};

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::model::Post;

/// A stored post, without its comments.
#[derive(Debug, Serialize, JsonSchema)]
pub struct PostResponse {
	/// The identity assigned by the external source.
	pub post_id: i64,
	pub user_id: i64,
	pub title: String,
	pub body: String,
	pub created_at: DateTime<Utc>,
	/// When the body was last edited, if ever.
	pub updated_at: Option<DateTime<Utc>>,
	/// The number of comments on the post.
	pub comment_count: usize,
}

impl From<Post> for PostResponse {
	fn from(post: Post) -> Self {
		Self {
			post_id: post.post_id,
			user_id: post.user_id,
			title: post.title,
			body: post.body,
			created_at: post.created_at,
			updated_at: post.updated_at,
			comment_count: post.comments.len(),
		}
	}
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct UpdatePostInput {
	/// The new body of the post. Surrounding whitespace is removed.
	#[validate(length(min = 1, max = 5000), custom(function = "validate_not_blank"))]
	pub body: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct PostCountResponse {
	pub count: u64,
	pub start_date: Option<DateTime<Utc>>,
	pub end_date: Option<DateTime<Utc>>,
}
