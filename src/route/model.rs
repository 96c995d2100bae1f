use serde::Deserialize;
use validator::Validate;

/// A single numeric id taken from the path.
#[derive(Debug, Deserialize, Validate)]
pub struct IdInput {
	#[validate(range(min = 1))]
	pub id: i64,
}
