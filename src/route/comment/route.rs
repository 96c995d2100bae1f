use axum::{extract::State, response::Redirect};

use crate::{
	extract::{Form, Path, Session},
	flash::{Flashes, Level},
	route::{model::IdInput, LISTING_PATH},
	Database,
};

use super::{log, model, RouteError};

/// Adds a comment from the current user, then returns to the listing.
pub async fn add_comment(
	State(database): State<Database>,
	session: Session,
	mut flashes: Flashes,
	Path(post): Path<IdInput>,
	Form(input): Form<model::CommentInput>,
) -> Result<(Flashes, Redirect), RouteError> {
	if log::add_comment(&database, post.id, session.user.id, &input.content).await? {
		tracing::debug!(post_id = post.id, user_id = session.user.id, "comment added");
		flashes.push(Level::Success, "Comment added!");
	}

	Ok((flashes, Redirect::to(LISTING_PATH)))
}
