pub use crate::route::model::IdInput;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
	flash::Flash,
	model::User,
	route::{comment::model::Comment, reaction::model::Tally},
};

/// A single post, created by an author or an admin.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Post {
	pub id: i64,
	pub title: String,
	/// The body of the post.
	pub content: String,
	/// The user that created the post.
	pub author_id: i64,
	/// The username of the author.
	pub author: String,
	pub created_at: chrono::NaiveDateTime,
}

/// A post together with its reactions and comments.
#[derive(Debug, Serialize)]
pub struct PostView {
	#[serde(flatten)]
	pub post: Post,
	#[serde(flatten)]
	pub tally: Tally,
	pub comments: Vec<Comment>,
}

/// The listing view.
#[derive(Debug, Serialize)]
pub struct Listing {
	pub user: Option<User>,
	pub messages: Vec<Flash>,
	pub posts: Vec<PostView>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PostInput {
	#[validate(length(min = 1, max = 100))]
	pub title: String,
	#[validate(length(min = 1))]
	pub content: String,
}
