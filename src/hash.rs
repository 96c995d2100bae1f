//! Password digests.
//!
//! Digests are salted with `"{user_id}{secret}"`, so a digest can only be
//! computed once the user row (and its id) exists. The `legacy` scheme is a
//! single MD5 pass, which matches the digests already stored by the previous
//! deployment. It is fast and its salt is derived from a public sequential id,
//! so it offers little protection if the database leaks. The `argon2` scheme
//! keeps the same salt but is memory-hard; its digests are not compatible with
//! `legacy` ones.

use std::{str::FromStr, sync::Arc};

use argon2::Argon2;
use md5::{Digest, Md5};

/// Output length of the `argon2` scheme, in bytes (before hex encoding).
pub const KEY_LENGTH: usize = 32;

/// Stored while a freshly inserted user has no id-derived digest yet.
/// It is not valid hex, so no password can ever match it.
pub const PLACEHOLDER: &str = "!pending";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
	#[default]
	Legacy,
	Argon2,
}

impl FromStr for Scheme {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"legacy" | "md5" => Ok(Self::Legacy),
			"argon2" => Ok(Self::Argon2),
			_ => Err(()),
		}
	}
}

#[derive(Clone)]
pub struct Hasher {
	secret: Arc<str>,
	scheme: Scheme,
	argon: Argon2<'static>,
}

impl Hasher {
	pub fn new(secret: impl Into<Arc<str>>, scheme: Scheme) -> Self {
		Self {
			secret: secret.into(),
			scheme,
			argon: Argon2::default(),
		}
	}

	pub fn scheme(&self) -> Scheme {
		self.scheme
	}

	fn salt(&self, user_id: i64) -> String {
		format!("{user_id}{}", self.secret)
	}

	/// Derives the stored digest for `password` belonging to `user_id`.
	pub fn derive(&self, password: &str, user_id: i64) -> Result<String, argon2::Error> {
		let salt = self.salt(user_id);

		match self.scheme {
			Scheme::Legacy => {
				let mut md5 = Md5::new();

				md5.update(password.as_bytes());
				md5.update(salt.as_bytes());

				Ok(hex::encode(md5.finalize()))
			}
			Scheme::Argon2 => {
				let mut hash = [0; KEY_LENGTH];

				self.argon
					.hash_password_into(password.as_bytes(), salt.as_bytes(), &mut hash)?;

				Ok(hex::encode(hash))
			}
		}
	}

	/// Digest of the password without a user id in the salt.
	///
	/// Never stored and never compared against a stored digest. Login runs it
	/// when no user matches the submitted username, so it costs what a real
	/// check costs: a plain MD5 under `legacy`, and the full Argon2id
	/// derivation against id `0` under `argon2`.
	pub fn derive_unsalted(&self, password: &str) -> Result<String, argon2::Error> {
		match self.scheme {
			Scheme::Legacy => Ok(hex::encode(Md5::digest(password.as_bytes()))),
			Scheme::Argon2 => self.derive(password, 0),
		}
	}

	/// Recomputes the salted digest and compares it against `stored`.
	pub fn verify(&self, password: &str, user_id: i64, stored: &str) -> Result<bool, argon2::Error> {
		let derived = self.derive(password, user_id)?;

		Ok(digests_match(&derived, stored))
	}
}

/// Compares two digests without short-circuiting on the first mismatch.
fn digests_match(a: &str, b: &str) -> bool {
	a.len() == b.len() && a.bytes().zip(b.bytes()).fold(0, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_legacy_digest_is_compatible() {
		let hasher = Hasher::new("pepper", Scheme::Legacy);

		// md5("admintaha" + "1" + "pepper")
		assert_eq!(
			hasher.derive("admintaha", 1).unwrap(),
			"f998fba8b6ede20242a1d7d558eadc7d"
		);
		assert_eq!(
			hasher.derive_unsalted("admintaha").unwrap(),
			"95bb52ea52ae65559df3e01aa914293e"
		);
	}

	#[test]
	fn test_unsalted_costs_a_full_derivation() {
		let hasher = Hasher::new("a-static-secret", Scheme::Argon2);
		let unsalted = hasher.derive_unsalted("hunter2").unwrap();

		assert_eq!(unsalted, hasher.derive("hunter2", 0).unwrap());
		assert_eq!(unsalted.len(), KEY_LENGTH * 2);
	}

	#[test]
	fn test_derive_is_deterministic_and_id_bound() {
		for scheme in [Scheme::Legacy, Scheme::Argon2] {
			let hasher = Hasher::new("a-static-secret", scheme);

			let first = hasher.derive("hunter2", 7).unwrap();
			let second = hasher.derive("hunter2", 7).unwrap();
			let other = hasher.derive("hunter2", 8).unwrap();

			assert_eq!(first, second);
			assert_ne!(first, other);
			assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
		}
	}

	#[test]
	fn test_digest_length_is_fixed() {
		let legacy = Hasher::new("s", Scheme::Legacy);
		let argon = Hasher::new("a-static-secret", Scheme::Argon2);

		assert_eq!(legacy.derive("", 1).unwrap().len(), 32);
		assert_eq!(legacy.derive("a much longer password", 1234).unwrap().len(), 32);
		assert_eq!(argon.derive("x", 1).unwrap().len(), KEY_LENGTH * 2);
	}

	#[test]
	fn test_secret_changes_digest() {
		let a = Hasher::new("one", Scheme::Legacy);
		let b = Hasher::new("two", Scheme::Legacy);

		assert_ne!(a.derive("pw", 1).unwrap(), b.derive("pw", 1).unwrap());
	}

	#[test]
	fn test_verify() {
		let hasher = Hasher::new("pepper", Scheme::Legacy);
		let stored = hasher.derive("correct", 3).unwrap();

		assert!(hasher.verify("correct", 3, &stored).unwrap());
		assert!(!hasher.verify("wrong", 3, &stored).unwrap());
		assert!(!hasher.verify("correct", 4, &stored).unwrap());
		assert!(!hasher.verify("correct", 3, PLACEHOLDER).unwrap());
	}

	#[test]
	fn test_schemes_are_not_interchangeable() {
		let legacy = Hasher::new("a-static-secret", Scheme::Legacy);
		let argon = Hasher::new("a-static-secret", Scheme::Argon2);
		let stored = legacy.derive("pw", 1).unwrap();

		assert!(!argon.verify("pw", 1, &stored).unwrap());
	}

	#[test]
	fn test_scheme_from_str() {
		assert_eq!("legacy".parse(), Ok(Scheme::Legacy));
		assert_eq!("md5".parse(), Ok(Scheme::Legacy));
		assert_eq!("argon2".parse(), Ok(Scheme::Argon2));
		assert_eq!("bcrypt".parse::<Scheme>(), Err(()));
	}
}
