use std::{path::PathBuf, str::FromStr};

use sqlx::{
	migrate::Migrator,
	sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use crate::Database;

pub static MIGRATOR: Migrator = sqlx::migrate!();

/// Opens the pool and brings the schema up to date.
pub async fn connect(url: &str) -> Result<Database, sqlx::Error> {
	let options = SqliteConnectOptions::from_str(url)?.foreign_keys(true);
	let database = SqlitePoolOptions::new().connect_with(options).await?;

	MIGRATOR.run(&database).await?;

	tracing::info!(url, "database ready");

	Ok(database)
}

/// Returns the on-disk file behind a SQLite URL, or `None` for in-memory databases.
pub fn file_path(url: &str) -> Option<PathBuf> {
	let path = url
		.strip_prefix("sqlite://")
		.or_else(|| url.strip_prefix("sqlite:"))?;
	let path = path.split('?').next().unwrap_or_default();

	if path.is_empty() || path == ":memory:" || url.contains("mode=memory") {
		return None;
	}

	Some(PathBuf::from(path))
}
