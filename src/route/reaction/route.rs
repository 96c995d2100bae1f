use axum::{extract::State, response::Redirect};

use crate::{extract::{Path, Session}, route::LISTING_PATH, Database};

use super::{ledger, model, RouteError};

/// Sets the reaction of the current user to a post, then returns to the listing.
pub async fn react(
	State(database): State<Database>,
	session: Session,
	Path(input): Path<model::ReactionInput>,
) -> Result<Redirect, RouteError> {
	ledger::set_reaction(&database, input.id, session.user.id, input.action).await?;

	tracing::debug!(
		post_id = input.id,
		user_id = session.user.id,
		value = input.action.as_str(),
		"reaction recorded"
	);

	Ok(Redirect::to(LISTING_PATH))
}
