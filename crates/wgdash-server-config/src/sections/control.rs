// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Control channel configuration section.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;

const DEFAULT_SSH_PORT: u16 = 22;
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ControlMode {
	/// Run `wg` on this host.
	#[default]
	Local,
	/// Run `wg` on a remote host over SSH.
	Ssh,
}

impl std::str::FromStr for ControlMode {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"local" => Ok(Self::Local),
			"ssh" => Ok(Self::Ssh),
			other => Err(format!("unknown control mode '{other}'")),
		}
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ControlConfigLayer {
	pub mode: Option<ControlMode>,
	pub host: Option<String>,
	pub port: Option<u16>,
	pub user: Option<String>,
	pub identity_file: Option<PathBuf>,
	pub timeout_secs: Option<u64>,
	pub connect_timeout_secs: Option<u64>,
	pub exclusive: Option<bool>,
}

impl ControlConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.mode.is_some() {
			self.mode = other.mode;
		}
		if other.host.is_some() {
			self.host = other.host;
		}
		if other.port.is_some() {
			self.port = other.port;
		}
		if other.user.is_some() {
			self.user = other.user;
		}
		if other.identity_file.is_some() {
			self.identity_file = other.identity_file;
		}
		if other.timeout_secs.is_some() {
			self.timeout_secs = other.timeout_secs;
		}
		if other.connect_timeout_secs.is_some() {
			self.connect_timeout_secs = other.connect_timeout_secs;
		}
		if other.exclusive.is_some() {
			self.exclusive = other.exclusive;
		}
	}

	pub fn finalize(self) -> Result<ControlConfig, ConfigError> {
		let mode = self.mode.unwrap_or_default();
		let timeout_secs = self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
		let connect_timeout_secs = self
			.connect_timeout_secs
			.unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS);

		if timeout_secs == 0 {
			return Err(ConfigError::Validation(
				"control.timeout_secs must be greater than zero".to_string(),
			));
		}
		if connect_timeout_secs == 0 {
			return Err(ConfigError::Validation(
				"control.connect_timeout_secs must be greater than zero".to_string(),
			));
		}

		let ssh = match mode {
			ControlMode::Local => None,
			ControlMode::Ssh => {
				let (Some(host), Some(user)) = (self.host, self.user) else {
					return Err(ConfigError::Validation(
						"control.mode = \"ssh\" requires control.host and control.user".to_string(),
					));
				};
				Some(SshTarget {
					host,
					port: self.port.unwrap_or(DEFAULT_SSH_PORT),
					user,
					identity_file: self.identity_file,
				})
			}
		};

		Ok(ControlConfig {
			mode,
			ssh,
			timeout_secs,
			connect_timeout_secs,
			exclusive: self.exclusive.unwrap_or(false),
		})
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SshTarget {
	pub host: String,
	pub port: u16,
	pub user: String,
	pub identity_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ControlConfig {
	pub mode: ControlMode,
	/// Set exactly when `mode` is [`ControlMode::Ssh`].
	pub ssh: Option<SshTarget>,
	pub timeout_secs: u64,
	pub connect_timeout_secs: u64,
	/// Serialize every command through one lock.
	pub exclusive: bool,
}
