use serde::{Deserialize, Serialize};
use validator::Validate;

/// A user's reaction to a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reaction {
	Like,
	Dislike,
}

impl Reaction {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Like => "like",
			Self::Dislike => "dislike",
		}
	}
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReactionInput {
	/// The post being reacted to.
	#[validate(range(min = 1))]
	pub id: i64,
	pub action: Reaction,
}

/// Reaction counts for a single post.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Tally {
	pub likes: i64,
	pub dislikes: i64,
}
