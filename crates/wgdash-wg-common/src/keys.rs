// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use base64::prelude::*;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const KEY_LEN: usize = 32;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KeyError {
	#[error("invalid base64: {0}")]
	InvalidBase64(String),

	#[error("invalid key length: expected {KEY_LEN} bytes, got {0}")]
	InvalidLength(usize),
}

/// A WireGuard (Curve25519) public key.
///
/// Parsing accepts only standard padded base64 that decodes to exactly
/// [`KEY_LEN`] bytes, so a `PublicKey` never contains shell metacharacters
/// other than `+`, `/` and `=`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PublicKey([u8; KEY_LEN]);

impl PublicKey {
	pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
		Self(bytes)
	}

	pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
		&self.0
	}

	pub fn from_base64(s: &str) -> Result<Self, KeyError> {
		let bytes = BASE64_STANDARD
			.decode(s.trim())
			.map_err(|e| KeyError::InvalidBase64(e.to_string()))?;
		let len = bytes.len();
		let bytes: [u8; KEY_LEN] = bytes
			.try_into()
			.map_err(|_| KeyError::InvalidLength(len))?;
		Ok(Self(bytes))
	}

	pub fn to_base64(&self) -> String {
		BASE64_STANDARD.encode(self.0)
	}
}

impl fmt::Display for PublicKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.to_base64())
	}
}

impl fmt::Debug for PublicKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("PublicKey").field(&self.to_base64()).finish()
	}
}

impl FromStr for PublicKey {
	type Err = KeyError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::from_base64(s)
	}
}

impl Serialize for PublicKey {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&self.to_base64())
	}
}

impl<'de> Deserialize<'de> for PublicKey {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let s = String::deserialize(deserializer)?;
		Self::from_base64(&s).map_err(serde::de::Error::custom)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn base64_roundtrip() {
		let key = PublicKey::from_bytes([7u8; KEY_LEN]);
		let encoded = key.to_base64();
		assert_eq!(encoded.len(), 44);
		assert_eq!(PublicKey::from_base64(&encoded).unwrap(), key);
	}

	#[test]
	fn surrounding_whitespace_is_ignored() {
		let key = PublicKey::from_bytes([1u8; KEY_LEN]);
		let padded = format!("  {}\n", key);
		assert_eq!(padded.parse::<PublicKey>().unwrap(), key);
	}

	#[test]
	fn rejects_wrong_length() {
		let short = BASE64_STANDARD.encode([0u8; 16]);
		assert_eq!(
			PublicKey::from_base64(&short),
			Err(KeyError::InvalidLength(16))
		);
	}

	#[test]
	fn rejects_shell_metacharacters() {
		assert!(matches!(
			PublicKey::from_base64("abc; rm -rf /"),
			Err(KeyError::InvalidBase64(_))
		));
	}

	#[test]
	fn serde_as_string() {
		let key = PublicKey::from_bytes([9u8; KEY_LEN]);
		let json = serde_json::to_string(&key).unwrap();
		assert_eq!(json, format!("\"{}\"", key.to_base64()));
		let back: PublicKey = serde_json::from_str(&json).unwrap();
		assert_eq!(back, key);
	}
}
