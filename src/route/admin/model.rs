use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{flash::Flash, model::User};

/// The roster form, keyed by `username_{id}`, `role_{id}`, `password_{id}`
/// and `new_username`, `new_password`, `new_role`.
///
/// Every field is optional and an empty value means "leave unchanged".
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(transparent)]
pub struct RosterInput {
	pub fields: HashMap<String, String>,
}

impl RosterInput {
	/// The value of `key`, unless it is missing or empty.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.fields
			.get(key)
			.map(String::as_str)
			.filter(|value| !value.is_empty())
	}
}

#[derive(Debug, Serialize)]
pub struct RosterView {
	pub users: Vec<User>,
	pub messages: Vec<Flash>,
}
