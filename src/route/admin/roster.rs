//! Bulk edits of the user roster.
//!
//! Digests are salted with the user's id, so a new user is created in two
//! phases: the row is inserted with [`PLACEHOLDER`] and committed, which
//! assigns the id, and only then is the real digest derived and stored.
//! Between the two commits the user exists but no password can match it.

use std::str::FromStr;

use sqlx::SqliteConnection;

use crate::{
	flash::{Flash, Level},
	hash::{Hasher, PLACEHOLDER},
	model::{Role, User},
	Database,
};

use super::{model::RosterInput, Error, RouteError};

/// What to do when a new user is submitted under a username that exists.
///
/// Both policies report "Username already exists.". `Overwrite` then
/// replaces the existing user's digest and role, which hands that account
/// to whoever submitted the form, so it must be opted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
	#[default]
	Reject,
	Overwrite,
}

impl FromStr for DuplicatePolicy {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"reject" => Ok(Self::Reject),
			"overwrite" => Ok(Self::Overwrite),
			_ => Err(()),
		}
	}
}

#[derive(Debug)]
pub struct NewUser {
	pub username: String,
	pub password: String,
	pub role: Role,
}

/// Changes to a single existing user. `None` leaves the column as it is.
#[derive(Debug, PartialEq, Eq)]
pub struct UserUpdate {
	pub id: i64,
	pub username: Option<String>,
	pub role: Option<Role>,
	pub password: Option<String>,
}

impl UserUpdate {
	fn is_empty(&self) -> bool {
		self.username.is_none() && self.role.is_none() && self.password.is_none()
	}
}

#[derive(Debug, Default)]
pub struct Plan {
	pub updates: Vec<UserUpdate>,
	pub new_user: Option<NewUser>,
	pub messages: Vec<Flash>,
}

fn parse_role(value: &str, messages: &mut Vec<Flash>) -> Option<Role> {
	let role = value.parse().ok();

	if role.is_none() {
		messages.push(Flash::new(Level::Warning, format!("Unknown role \"{value}\".")));
	}

	role
}

/// Works out which of `users` the form changes, and whether it asks for a
/// new user. Values equal to the current ones are not changes.
pub fn plan(users: &[User], input: &RosterInput) -> Plan {
	let mut plan = Plan::default();

	for user in users {
		let update = UserUpdate {
			id: user.id,
			username: input
				.get(&format!("username_{}", user.id))
				.filter(|username| *username != user.username)
				.map(str::to_string),
			role: input
				.get(&format!("role_{}", user.id))
				.and_then(|role| parse_role(role, &mut plan.messages))
				.filter(|role| *role != user.role),
			password: input
				.get(&format!("password_{}", user.id))
				.map(str::to_string),
		};

		if !update.is_empty() {
			plan.updates.push(update);
		}
	}

	if let (Some(username), Some(password), Some(role)) = (
		input.get("new_username"),
		input.get("new_password"),
		input.get("new_role"),
	) {
		plan.new_user = parse_role(role, &mut plan.messages).map(|role| NewUser {
			username: username.to_string(),
			password: password.to_string(),
			role,
		});
	}

	plan
}

fn username_taken(error: sqlx::Error, username: &str) -> RouteError {
	let unique = error
		.as_database_error()
		.is_some_and(|error| error.is_unique_violation());

	if unique {
		Error::UsernameTaken(username.to_string()).into()
	} else {
		error.into()
	}
}

/// First phase of the create: inserts the row with the placeholder digest.
async fn insert_placeholder(conn: &mut SqliteConnection, user: &NewUser) -> Result<i64, RouteError> {
	sqlx::query_scalar(
		r#"INSERT INTO "user" (username, password, role) VALUES (?, ?, ?) RETURNING id"#,
	)
	.bind(&user.username)
	.bind(PLACEHOLDER)
	.bind(user.role.as_str())
	.fetch_one(conn)
	.await
	.map_err(|error| username_taken(error, &user.username))
}

/// Second phase of the create: stores the digest salted with the new id.
async fn store_digest(
	database: &Database,
	hasher: &Hasher,
	id: i64,
	password: &str,
) -> Result<(), RouteError> {
	let digest = hasher.derive(password, id).map_err(Error::Argon)?;

	sqlx::query(r#"UPDATE "user" SET password = ? WHERE id = ?"#)
		.bind(digest)
		.bind(id)
		.execute(database)
		.await?;

	Ok(())
}

/// Creates a single user, committing once for each phase.
///
/// Only tests seed users this way; the roster form runs the same two phases
/// inside [`apply`].
#[cfg(test)]
pub async fn create_user(
	database: &Database,
	hasher: &Hasher,
	user: &NewUser,
) -> Result<i64, RouteError> {
	let mut tx = database.begin().await?;
	let id = insert_placeholder(&mut tx, user).await?;

	tx.commit().await?;
	store_digest(database, hasher, id, &user.password).await?;

	tracing::info!(user_id = id, role = %user.role, "user created");

	Ok(id)
}

/// Applies a roster submission and returns the messages to show.
///
/// The updates of existing users and the first phase of a new user commit
/// together. A rename onto a taken username aborts the whole submission.
pub async fn apply(
	database: &Database,
	hasher: &Hasher,
	policy: DuplicatePolicy,
	input: &RosterInput,
) -> Result<Vec<Flash>, RouteError> {
	let mut tx = database.begin().await?;

	let users = sqlx::query_as::<_, User>(r#"SELECT * FROM "user" ORDER BY id"#)
		.fetch_all(&mut *tx)
		.await?;

	let Plan {
		updates,
		new_user,
		mut messages,
	} = plan(&users, input);

	for update in &updates {
		let digest = update
			.password
			.as_deref()
			.map(|password| hasher.derive(password, update.id))
			.transpose()
			.map_err(Error::Argon)?;

		sqlx::query(
			r#"
				UPDATE "user" SET
					username = COALESCE(?, username),
					role = COALESCE(?, role),
					password = COALESCE(?, password)
				WHERE id = ?
			"#,
		)
		.bind(update.username.as_deref())
		.bind(update.role.map(Role::as_str))
		.bind(digest)
		.bind(update.id)
		.execute(&mut *tx)
		.await
		.map_err(|error| username_taken(error, update.username.as_deref().unwrap_or_default()))?;

		tracing::info!(
			user_id = update.id,
			renamed = update.username.is_some(),
			role = update.role.map(Role::as_str),
			password_rotated = update.password.is_some(),
			"user updated"
		);
	}

	let mut created = None;

	if let Some(new_user) = new_user {
		let existing: Option<i64> = sqlx::query_scalar(r#"SELECT id FROM "user" WHERE username = ?"#)
			.bind(&new_user.username)
			.fetch_optional(&mut *tx)
			.await?;

		match existing {
			None => {
				let id = insert_placeholder(&mut tx, &new_user).await?;

				created = Some((id, new_user));
			}
			Some(id) => {
				messages.push(Flash::new(Level::Danger, "Username already exists."));

				if policy == DuplicatePolicy::Overwrite {
					let digest = hasher.derive(&new_user.password, id).map_err(Error::Argon)?;

					sqlx::query(r#"UPDATE "user" SET password = ?, role = ? WHERE id = ?"#)
						.bind(digest)
						.bind(new_user.role.as_str())
						.bind(id)
						.execute(&mut *tx)
						.await?;

					tracing::warn!(user_id = id, "existing user overwritten by roster create");
				}
			}
		}
	}

	tx.commit().await?;

	if let Some((id, new_user)) = created {
		store_digest(database, hasher, id, &new_user.password).await?;
		messages.push(Flash::new(Level::Success, "New user created."));

		tracing::info!(user_id = id, role = %new_user.role, "user created");
	}

	messages.push(Flash::new(Level::Success, "User updates saved."));

	Ok(messages)
}
