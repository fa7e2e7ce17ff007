// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! WireGuard interface configuration section.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use wgdash_wg_common::InterfaceName;

use crate::error::ConfigError;

const DEFAULT_INTERFACE: &str = "wg0";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WireguardConfigLayer {
	pub interface: Option<String>,
	/// Defaults to `/etc/wireguard/<interface>.conf`.
	pub config_path: Option<PathBuf>,
	pub use_sudo: Option<bool>,
}

impl WireguardConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.interface.is_some() {
			self.interface = other.interface;
		}
		if other.config_path.is_some() {
			self.config_path = other.config_path;
		}
		if other.use_sudo.is_some() {
			self.use_sudo = other.use_sudo;
		}
	}

	pub fn finalize(self) -> Result<WireguardConfig, ConfigError> {
		let name = self.interface.unwrap_or_else(|| DEFAULT_INTERFACE.to_string());
		let interface = InterfaceName::new(name).map_err(|e| ConfigError::InvalidValue {
			key: "wireguard.interface".to_string(),
			message: e.to_string(),
		})?;
		let config_path = self
			.config_path
			.unwrap_or_else(|| PathBuf::from(format!("/etc/wireguard/{interface}.conf")));

		Ok(WireguardConfig {
			interface,
			config_path,
			use_sudo: self.use_sudo.unwrap_or(true),
		})
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WireguardConfig {
	pub interface: InterfaceName,
	pub config_path: PathBuf,
	/// Prefix `wg` and config file access with `sudo -n`.
	pub use_sudo: bool,
}
