use axum::Router;

use crate::{ratelimit, AppState};

pub mod admin;
pub mod auth;
pub mod comment;
pub mod model;
pub mod post;
pub mod reaction;

/// Where mutating routes send the client back to.
pub const LISTING_PATH: &str = "/";

/// Builds every route of the application.
///
/// `login_limit` is left out in tests, since the limiter keys on the
/// peer address.
pub fn routes(login_limit: Option<ratelimit::Config>) -> Router<AppState> {
	Router::new()
		.merge(auth::routes(login_limit))
		.merge(post::routes())
		.merge(reaction::routes())
		.merge(comment::routes())
		.nest("/admin", admin::routes())
}
