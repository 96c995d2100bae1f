//! Append-only comments on posts.

use crate::{error, Database};

use super::{model::Comment, Error, RouteError};

/// Appends a comment, returning whether anything was stored.
///
/// Blank content, including whitespace only, is ignored before the post is
/// even looked up. The insert is a single statement on the pool, and a
/// missing post shows up as a foreign key violation.
pub async fn add_comment(
	database: &Database,
	post_id: i64,
	user_id: i64,
	content: &str,
) -> Result<bool, RouteError> {
	if content.trim().is_empty() {
		return Ok(false);
	}

	sqlx::query("INSERT INTO comment (content, post_id, user_id) VALUES (?, ?, ?)")
		.bind(content)
		.bind(post_id)
		.bind(user_id)
		.execute(database)
		.await
		.map_err(|error| {
			if error::is_foreign_key_violation(&error) {
				Error::UnknownPost(post_id).into()
			} else {
				RouteError::from(error)
			}
		})?;

	Ok(true)
}

/// Comments on a post in the order they were made.
pub async fn comments_for(database: &Database, post_id: i64) -> Result<Vec<Comment>, sqlx::Error> {
	sqlx::query_as::<_, Comment>(
		r#"
			SELECT comment.id, comment.post_id, comment.user_id, comment.content,
				"user".username AS author
			FROM comment
			JOIN "user" ON "user".id = comment.user_id
			WHERE comment.post_id = ?
			ORDER BY comment.id
		"#,
	)
	.bind(post_id)
	.fetch_all(database)
	.await
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::test::*;

	#[tokio::test]
	async fn test_blank_is_ignored() {
		let database = pool().await;
		let reader = insert_user(&database, "reader", "pw", Role::Reader).await;

		// Blank content never reaches the post lookup.
		assert!(!add_comment(&database, 42, reader.id, "").await.unwrap());
		assert!(!add_comment(&database, 42, reader.id, " \t\n").await.unwrap());
		assert!(matches!(
			add_comment(&database, 42, reader.id, "hi").await,
			Err(RouteError::Route(Error::UnknownPost(42)))
		));
	}

	#[tokio::test]
	async fn test_concurrent_comments() {
		let path = std::env::temp_dir().join(format!("{}.db", uuid::Uuid::new_v4()));
		let database = crate::database::connect(&format!("sqlite://{}?mode=rwc", path.display()))
			.await
			.unwrap();
		let author = insert_user(&database, "writer", "pw", Role::Author).await;
		let post = insert_post(&database, &author, "Post").await;
		let mut tasks = Vec::new();

		for i in 0..80 {
			let database = database.clone();
			let user_id = author.id;

			tasks.push(tokio::spawn(async move {
				add_comment(&database, post, user_id, &format!("comment {i}"))
					.await
					.is_ok()
			}));
		}

		for task in tasks {
			assert!(task.await.unwrap());
		}

		assert_eq!(comments_for(&database, post).await.unwrap().len(), 80);

		database.close().await;

		for suffix in ["", "-wal", "-shm"] {
			let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
		}
	}

	#[tokio::test]
	async fn test_insertion_order() {
		let database = pool().await;
		let author = insert_user(&database, "writer", "pw", Role::Author).await;
		let reader = insert_user(&database, "reader", "pw", Role::Reader).await;
		let post = insert_post(&database, &author, "Post").await;

		assert!(add_comment(&database, post, reader.id, "first").await.unwrap());
		assert!(add_comment(&database, post, author.id, "second").await.unwrap());
		assert!(add_comment(&database, post, reader.id, "first").await.unwrap());

		let comments = comments_for(&database, post).await.unwrap();

		assert_eq!(
			comments
				.iter()
				.map(|comment| (comment.author.as_str(), comment.content.as_str()))
				.collect::<Vec<_>>(),
			vec![("reader", "first"), ("writer", "second"), ("reader", "first")]
		);
	}
}
