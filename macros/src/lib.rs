mod route;

use proc_macro::TokenStream;

/// Generates an `aide` operation transform for a handler, named after the
/// handler with the suffix `_docs`.
///
/// The first line of the doc comment becomes the operation summary and the
/// remaining lines its description.
///
/// ```ignore
/// /// Get post
/// /// Returns a single post by its identity.
/// #[route(tag = tag::POST, response(status = 404, description = "Unknown post."))]
/// pub async fn get_post(/* ... */) {}
///
/// // later
/// get_with(get_post, get_post_docs)
/// ```
#[proc_macro_attribute]
pub fn route(args: TokenStream, input: TokenStream) -> TokenStream {
	route::from_input(args, input)
}
