use std::env;

use crate::{hash::Scheme, route::admin::roster::DuplicatePolicy};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://blog.db?mode=rwc";
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{0} must be set")]
	Missing(&'static str),
	#[error("{name} has an invalid value: {value}")]
	Invalid { name: &'static str, value: String },
}

/// Process configuration, read once at startup.
///
/// Nothing here is global: the salt secret ends up inside the
/// [`crate::hash::Hasher`] and everything else is passed to the router.
#[derive(Debug, Clone)]
pub struct Config {
	pub database_url: String,
	pub port: u16,
	pub salt_secret: String,
	pub password_scheme: Scheme,
	pub duplicate_username: DuplicatePolicy,
}

impl Config {
	pub fn from_env() -> Result<Self, Error> {
		Self::from_lookup(|name| env::var(name).ok())
	}

	pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
	where
		F: Fn(&str) -> Option<String>,
	{
		let port = match lookup("PORT") {
			Some(value) => value.parse().map_err(|_| Error::Invalid {
				name: "PORT",
				value,
			})?,
			None => DEFAULT_PORT,
		};

		let salt_secret = lookup("SALT_STRING").ok_or(Error::Missing("SALT_STRING"))?;

		let password_scheme = match lookup("PASSWORD_SCHEME") {
			Some(value) => value.parse().map_err(|()| Error::Invalid {
				name: "PASSWORD_SCHEME",
				value,
			})?,
			None => Scheme::default(),
		};

		let duplicate_username = match lookup("DUPLICATE_USERNAME") {
			Some(value) => value.parse().map_err(|()| Error::Invalid {
				name: "DUPLICATE_USERNAME",
				value,
			})?,
			None => DuplicatePolicy::default(),
		};

		Ok(Self {
			database_url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
			port,
			salt_secret,
			password_scheme,
			duplicate_username,
		})
	}
}
