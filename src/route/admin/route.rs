use axum::{
	extract::State,
	http::header,
	response::{IntoResponse, Redirect},
	Json,
};

use crate::{
	extract::Form,
	flash::Flashes,
	guard::{Admins, RequireRole},
	model::User,
	AppState, Database, Export,
};

use super::{model, roster, Error, RouteError};

const ROSTER_PATH: &str = "/admin/users";

/// Returns every user, without digests, and any pending messages.
pub async fn get_users(
	State(database): State<Database>,
	_: RequireRole<Admins>,
	mut flashes: Flashes,
) -> Result<(Flashes, Json<model::RosterView>), RouteError> {
	let users = sqlx::query_as::<_, User>(r#"SELECT * FROM "user" ORDER BY id"#)
		.fetch_all(&database)
		.await?;
	let messages = flashes.take();

	Ok((flashes, Json(model::RosterView { users, messages })))
}

/// Applies a roster submission, then returns to the roster.
pub async fn update_users(
	State(state): State<AppState>,
	guard: RequireRole<Admins>,
	mut flashes: Flashes,
	Form(input): Form<model::RosterInput>,
) -> Result<(Flashes, Redirect), RouteError> {
	let messages = roster::apply(
		&state.database,
		&state.hasher,
		state.duplicate_username,
		&input,
	)
	.await?;

	tracing::info!(admin_id = guard.session.user.id, "roster submitted");
	flashes.extend(messages);

	Ok((flashes, Redirect::to(ROSTER_PATH)))
}

/// Sends the raw database file as an attachment.
pub async fn export_database(
	State(Export(path)): State<Export>,
	guard: RequireRole<Admins>,
) -> Result<impl IntoResponse, RouteError> {
	let path = path.ok_or(Error::NoDatabaseFile)?;
	let bytes = match tokio::fs::read(&path).await {
		Ok(bytes) => bytes,
		Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
			return Err(Error::NoDatabaseFile.into());
		}
		Err(error) => return Err(Error::Export(error).into()),
	};

	let filename = path
		.file_name()
		.and_then(|name| name.to_str())
		.unwrap_or("blog.db");

	tracing::warn!(admin_id = guard.session.user.id, "database exported");

	Ok((
		[
			(header::CONTENT_TYPE, "application/vnd.sqlite3".to_string()),
			(
				header::CONTENT_DISPOSITION,
				format!("attachment; filename=\"{filename}\""),
			),
		],
		bytes,
	))
}
