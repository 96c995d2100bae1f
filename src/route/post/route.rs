use axum::{extract::State, response::Redirect, Json};

use crate::{
	extract::{Form, MaybeSession, Path, Session},
	flash::{Flashes, Level},
	guard::{self, Admins, Publishers, RequireRole},
	route::{comment::log, reaction::ledger, LISTING_PATH},
	Database,
};

use super::{model, Error, RouteError};

const SELECT_POSTS: &str = r#"
	SELECT post.id, post.title, post.content, post.author_id, post.created_at,
		"user".username AS author
	FROM post
	JOIN "user" ON "user".id = post.author_id
"#;

async fn find_post(database: &Database, post_id: i64) -> Result<model::Post, RouteError> {
	let post = sqlx::query_as::<_, model::Post>(&format!("{SELECT_POSTS} WHERE post.id = ?"))
		.bind(post_id)
		.fetch_optional(database)
		.await?;

	Ok(post.ok_or(Error::UnknownPost(post_id))?)
}

async fn view(database: &Database, post: model::Post) -> Result<model::PostView, RouteError> {
	Ok(model::PostView {
		tally: ledger::tally(database, post.id).await?,
		comments: log::comments_for(database, post.id).await?,
		post,
	})
}

/// Returns every post with its reactions and comments, oldest first,
/// along with the current user and pending messages.
pub async fn get_posts(
	State(database): State<Database>,
	session: MaybeSession,
	mut flashes: Flashes,
) -> Result<(Flashes, Json<model::Listing>), RouteError> {
	let posts = sqlx::query_as::<_, model::Post>(&format!("{SELECT_POSTS} ORDER BY post.id"))
		.fetch_all(&database)
		.await?;

	let mut views = Vec::with_capacity(posts.len());

	for post in posts {
		views.push(view(&database, post).await?);
	}

	let messages = flashes.take();

	Ok((
		flashes,
		Json(model::Listing {
			user: session.0.map(|session| session.user),
			messages,
			posts: views,
		}),
	))
}

/// Returns a single post by its id.
pub async fn get_post(
	State(database): State<Database>,
	Path(path): Path<model::IdInput>,
) -> Result<Json<model::PostView>, RouteError> {
	let post = find_post(&database, path.id).await?;

	Ok(Json(view(&database, post).await?))
}

/// Creates a new post owned by the current user.
pub async fn create_post(
	State(database): State<Database>,
	guard: RequireRole<Publishers>,
	mut flashes: Flashes,
	Form(input): Form<model::PostInput>,
) -> Result<(Flashes, Redirect), RouteError> {
	let user = guard.session.user;
	let post_id: i64 = sqlx::query_scalar(
		r#"
			INSERT INTO post (title, content, author_id)
			VALUES (?, ?, ?)
			RETURNING id
		"#,
	)
	.bind(&input.title)
	.bind(&input.content)
	.bind(user.id)
	.fetch_one(&database)
	.await?;

	tracing::info!(post_id, user_id = user.id, "post created");
	flashes.push(Level::Success, "Post created!");

	Ok((flashes, Redirect::to(LISTING_PATH)))
}

/// Updates a post. Only its author or an admin may do so.
pub async fn update_post(
	State(database): State<Database>,
	session: Session,
	mut flashes: Flashes,
	Path(path): Path<model::IdInput>,
	Form(input): Form<model::PostInput>,
) -> Result<(Flashes, Redirect), RouteError> {
	let post = find_post(&database, path.id).await?;

	guard::require_owner_or_admin(&session.user, post.author_id)?;

	sqlx::query("UPDATE post SET title = ?, content = ? WHERE id = ?")
		.bind(&input.title)
		.bind(&input.content)
		.bind(post.id)
		.execute(&database)
		.await?;

	tracing::info!(post_id = post.id, user_id = session.user.id, "post updated");
	flashes.push(Level::Success, "Post updated!");

	Ok((flashes, Redirect::to(LISTING_PATH)))
}

/// Deletes a post together with its reactions and comments.
pub async fn delete_post(
	State(database): State<Database>,
	guard: RequireRole<Admins>,
	mut flashes: Flashes,
	Path(path): Path<model::IdInput>,
) -> Result<(Flashes, Redirect), RouteError> {
	let mut tx = database.begin().await?;

	sqlx::query("DELETE FROM post_like WHERE post_id = ?")
		.bind(path.id)
		.execute(&mut *tx)
		.await?;

	sqlx::query("DELETE FROM comment WHERE post_id = ?")
		.bind(path.id)
		.execute(&mut *tx)
		.await?;

	let status = sqlx::query("DELETE FROM post WHERE id = ?")
		.bind(path.id)
		.execute(&mut *tx)
		.await?;

	if status.rows_affected() == 0 {
		return Err(Error::UnknownPost(path.id).into());
	}

	tx.commit().await?;

	tracing::info!(post_id = path.id, user_id = guard.session.user.id, "post deleted");
	flashes.push(Level::Success, "Post deleted!");

	Ok((flashes, Redirect::to(LISTING_PATH)))
}
