pub mod auth;
pub mod authz;
pub mod comment;
pub mod post;
pub mod taxonomy;

pub use auth::AuthService;
pub use comment::CommentService;
pub use post::PostService;
pub use taxonomy::TaxonomyService;
