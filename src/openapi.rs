use std::borrow::Cow;

use aide::{openapi::Tag, transform::TransformOpenApi};

use crate::{error, extract::Json};

pub mod tag {
	pub const POST: &str = "Post";
	pub const COMMENT: &str = "Comment";
	pub const FETCHER: &str = "Fetcher";
	pub const STORE: &str = "Store";
}

pub fn docs(api: TransformOpenApi) -> TransformOpenApi {
	api.title("Posts Ingest Open API")
		.summary("Blog posts and comments ingested from an external source")
		.description(
			"Serves posts and comments copied from a JSONPlaceholder-style API by a \
			 background fetcher, which can be controlled through the fetcher routes.",
		)
		.tag(Tag {
			name: tag::POST.into(),
			description: Some("Stored posts".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::COMMENT.into(),
			description: Some("Comments embedded in stored posts".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::FETCHER.into(),
			description: Some("Background fetcher control".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::STORE.into(),
			description: Some("Raw access to the document store".into()),
			..Default::default()
		})
		.default_response_with::<Json<error::ErrorResponse<'static>>, _>(|res| {
			res.example(error::ErrorResponse {
				success: false,
				errors: vec![error::Message {
					content: "error message".into(),
					field: Some("optional field".into()),
					details: Some(Cow::Owned({
						let mut map = error::Map::new();
						map.insert("key".into(), serde_json::json!("value"));
						map
					})),
				}],
			})
		})
}
