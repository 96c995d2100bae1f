//! At most one reaction per (post, user).
//!
//! The `UNIQUE (post_id, user_id)` constraint backs this up, and the write is
//! a single upsert, so two racing requests from the same user end up as one
//! row holding whichever value was written last.

use crate::{error, Database};

use super::{
	model::{Reaction, Tally},
	Error, RouteError,
};

/// Records `value` as the reaction of `user_id` to `post_id`, replacing any
/// earlier one. The caller is not told whether a row was created or updated.
///
/// This is one statement on the pool, so concurrent writers only wait on
/// SQLite's busy timeout. The user comes from a live session, so a foreign
/// key violation means the post is missing.
pub async fn set_reaction(
	database: &Database,
	post_id: i64,
	user_id: i64,
	value: Reaction,
) -> Result<(), RouteError> {
	sqlx::query(
		r#"
			INSERT INTO post_like (post_id, user_id, value) VALUES (?1, ?2, ?3)
			ON CONFLICT (post_id, user_id) DO UPDATE SET value = excluded.value
		"#,
	)
	.bind(post_id)
	.bind(user_id)
	.bind(value.as_str())
	.execute(database)
	.await
	.map_err(|error| {
		if error::is_foreign_key_violation(&error) {
			Error::UnknownPost(post_id).into()
		} else {
			RouteError::from(error)
		}
	})?;

	Ok(())
}

pub async fn tally(database: &Database, post_id: i64) -> Result<Tally, sqlx::Error> {
	sqlx::query_as::<_, Tally>(
		r#"
			SELECT
				COALESCE(SUM(value = 'like'), 0) AS likes,
				COALESCE(SUM(value = 'dislike'), 0) AS dislikes
			FROM post_like
			WHERE post_id = ?
		"#,
	)
	.bind(post_id)
	.fetch_one(database)
	.await
}
