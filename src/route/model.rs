use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::model::DateRange;

/// These can be removed when [`serde`] supports
/// literal defaults: <https://github.com/serde-rs/serde/issues/368>
#[inline]
fn hundred() -> usize {
	100
}

pub fn validate_not_blank(text: &str) -> Result<(), ValidationError> {
	if text.trim().is_empty() {
		return Err(ValidationError::new("blank"));
	}

	Ok(())
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct IdInput {
	/// The identity assigned by the external source.
	#[validate(range(min = 1))]
	pub id: i64,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct SearchInput {
	/// Text to look for in comment bodies, ignoring case.
	#[validate(length(min = 1, max = 256), custom(function = "validate_not_blank"))]
	pub query: String,
	/// The maximum number of comments to return.
	#[validate(range(min = 1, max = 1000))]
	#[serde(default = "hundred")]
	pub limit: usize,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct CountInput {
	/// Only count posts created at or after this time.
	pub start_date: Option<DateTime<Utc>>,
	/// Only count posts created at or before this time.
	pub end_date: Option<DateTime<Utc>>,
}

impl CountInput {
	pub fn range(&self) -> DateRange {
		DateRange {
			start: self.start_date,
			end: self.end_date,
		}
	}
}

/// A plain confirmation message.
#[derive(Debug, Serialize, JsonSchema)]
pub struct MessageResponse {
	pub message: String,
}

impl MessageResponse {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
		}
	}
}
