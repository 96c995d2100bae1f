use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{flash::Flash, model::User};

/// No length rules here: a password that is too short for the rules of the
/// day must still fail with the generic message, not a validation error.
#[derive(Deserialize, Validate)]
pub struct LoginInput {
	pub username: String,
	pub password: String,
}

#[derive(Deserialize, Validate)]
pub struct ChangePasswordInput {
	#[serde(default)]
	pub old_password: String,
	#[serde(default)]
	#[validate(length(max = 128))]
	pub new_password: String,
}

#[derive(Serialize)]
pub struct Me {
	pub user: User,
	pub messages: Vec<Flash>,
}
