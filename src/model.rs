use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// The role of a user. Unknown roles read from the database are
/// treated as [`Role::Reader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	Admin,
	Author,
	#[default]
	Reader,
}

impl Role {
	pub const ALL: [Role; 3] = [Role::Admin, Role::Author, Role::Reader];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Admin => "admin",
			Self::Author => "author",
			Self::Reader => "reader",
		}
	}
}

impl FromStr for Role {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|role| role.as_str() == s)
			.ok_or(())
	}
}

impl From<String> for Role {
	fn from(value: String) -> Self {
		value.parse().unwrap_or_default()
	}
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A model representing a single user.
///
/// The `password` field holds the salted digest and is never serialized.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
	pub id: i64,
	pub username: String,
	/// Salted with `id`, see [`crate::hash`].
	#[serde(skip_serializing)]
	pub password: String,
	#[sqlx(try_from = "String")]
	pub role: Role,
}
