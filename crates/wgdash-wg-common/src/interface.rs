// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Linux IFNAMSIZ minus the trailing NUL.
const MAX_LEN: usize = 15;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InterfaceNameError {
	#[error("interface name must not be empty")]
	Empty,

	#[error("interface name longer than {MAX_LEN} bytes: {0}")]
	TooLong(String),

	#[error("interface name contains invalid character {ch:?}: {name}")]
	InvalidChar { name: String, ch: char },
}

/// Name of a WireGuard network interface, e.g. `wg0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InterfaceName(String);

impl InterfaceName {
	pub fn new(name: impl Into<String>) -> Result<Self, InterfaceNameError> {
		let name = name.into();
		if name.is_empty() {
			return Err(InterfaceNameError::Empty);
		}
		if name.len() > MAX_LEN {
			return Err(InterfaceNameError::TooLong(name));
		}
		if let Some(ch) = name
			.chars()
			.find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '=' | '+' | '.' | '-')))
		{
			return Err(InterfaceNameError::InvalidChar { name, ch });
		}
		Ok(Self(name))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for InterfaceName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl FromStr for InterfaceName {
	type Err = InterfaceNameError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}

impl Serialize for InterfaceName {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&self.0)
	}
}

impl<'de> Deserialize<'de> for InterfaceName {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let s = String::deserialize(deserializer)?;
		Self::new(s).map_err(serde::de::Error::custom)
	}
}
