pub mod comment;
pub mod docs;
pub mod fetcher;
pub mod model;
pub mod post;
pub mod store;
