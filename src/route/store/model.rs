pub use crate::model::Post;

use schemars::JsonSchema;
use serde::Serialize;

#[derive(Debug, Serialize, JsonSchema)]
pub struct ClearResponse {
	/// The number of post documents removed.
	pub deleted: u64,
}
