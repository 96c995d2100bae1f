use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Comment {
	pub id: i64,
	pub post_id: i64,
	pub user_id: i64,
	/// Username of the commenter.
	pub author: String,
	pub content: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CommentInput {
	#[serde(default)]
	pub content: String,
}
