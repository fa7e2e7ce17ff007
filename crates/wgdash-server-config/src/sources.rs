// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: built-in defaults, TOML files and environment
//! variables.

use std::path::PathBuf;
use std::str::FromStr;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::{
	ControlConfigLayer, HttpConfigLayer, LoggingConfigLayer, StoreConfigLayer,
	WireguardConfigLayer,
};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		Ok(ServerConfigLayer::default())
	}
}

/// A TOML file. A missing file contributes nothing.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/wgdash/server.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variables, `WGDASH_<SECTION>_<FIELD>`.
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		load_from(&|name: &str| std::env::var(name).ok())
	}
}

type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Builds a layer from `lookup`, which maps variable names to values.
pub(crate) fn load_from(lookup: Lookup<'_>) -> Result<ServerConfigLayer, ConfigError> {
	let env = Env(lookup);
	Ok(ServerConfigLayer {
		http: Some(HttpConfigLayer {
			host: env.var("WGDASH_HOST"),
			port: env.parse("WGDASH_PORT")?,
		}),
		wireguard: Some(WireguardConfigLayer {
			interface: env.var("WGDASH_WG_INTERFACE"),
			config_path: env.var("WGDASH_WG_CONFIG_PATH").map(PathBuf::from),
			use_sudo: env.bool("WGDASH_WG_USE_SUDO"),
		}),
		control: Some(ControlConfigLayer {
			mode: env.parse("WGDASH_CONTROL_MODE")?,
			host: env.var("WGDASH_SSH_HOST"),
			port: env.parse("WGDASH_SSH_PORT")?,
			user: env.var("WGDASH_SSH_USER"),
			identity_file: env.var("WGDASH_SSH_IDENTITY_FILE").map(PathBuf::from),
			timeout_secs: env.parse("WGDASH_CONTROL_TIMEOUT_SECS")?,
			connect_timeout_secs: env.parse("WGDASH_CONTROL_CONNECT_TIMEOUT_SECS")?,
			exclusive: env.bool("WGDASH_CONTROL_EXCLUSIVE"),
		}),
		store: Some(StoreConfigLayer {
			path: env.var("WGDASH_STORE_PATH").map(PathBuf::from),
		}),
		logging: Some(LoggingConfigLayer {
			level: env.var("WGDASH_LOG_LEVEL"),
			format: env.parse("WGDASH_LOG_FORMAT")?,
		}),
	})
}

struct Env<'a>(Lookup<'a>);

impl Env<'_> {
	fn var(&self, name: &str) -> Option<String> {
		(self.0)(name).filter(|s| !s.is_empty())
	}

	fn bool(&self, name: &str) -> Option<bool> {
		self.var(name)
			.map(|v| v.eq_ignore_ascii_case("true") || v == "1")
	}

	fn parse<T>(&self, name: &str) -> Result<Option<T>, ConfigError>
	where
		T: FromStr,
		T::Err: std::fmt::Display,
	{
		match self.var(name) {
			Some(v) => v.parse().map(Some).map_err(|e| ConfigError::InvalidValue {
				key: name.to_string(),
				message: format!("'{v}': {e}"),
			}),
			None => Ok(None),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::sections::{ControlMode, LogFormat};
	use std::collections::HashMap;

	fn layer_from(vars: &[(&str, &str)]) -> Result<ServerConfigLayer, ConfigError> {
		let map: HashMap<String, String> = vars
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		load_from(&|name: &str| map.get(name).cloned())
	}

	#[test]
	fn test_env_overrides() {
		let layer = layer_from(&[
			("WGDASH_PORT", "9090"),
			("WGDASH_WG_INTERFACE", "wg1"),
			("WGDASH_WG_USE_SUDO", "0"),
			("WGDASH_CONTROL_MODE", "ssh"),
			("WGDASH_SSH_HOST", "vpn.example.com"),
			("WGDASH_CONTROL_EXCLUSIVE", "true"),
			("WGDASH_LOG_FORMAT", "json"),
		])
		.unwrap();

		assert_eq!(layer.http.unwrap().port, Some(9090));
		let wg = layer.wireguard.unwrap();
		assert_eq!(wg.interface.as_deref(), Some("wg1"));
		assert_eq!(wg.use_sudo, Some(false));
		let control = layer.control.unwrap();
		assert_eq!(control.mode, Some(ControlMode::Ssh));
		assert_eq!(control.exclusive, Some(true));
		assert_eq!(layer.logging.unwrap().format, Some(LogFormat::Json));
	}

	#[test]
	fn test_empty_values_are_unset() {
		let layer = layer_from(&[("WGDASH_HOST", "")]).unwrap();
		assert_eq!(layer.http.unwrap().host, None);
	}

	#[test]
	fn test_invalid_number_names_variable() {
		let err = layer_from(&[("WGDASH_PORT", "eighty")]).unwrap_err();
		match err {
			ConfigError::InvalidValue { key, .. } => assert_eq!(key, "WGDASH_PORT"),
			other => panic!("unexpected error: {other:?}"),
		}
	}

	#[test]
	fn test_missing_toml_is_empty_layer() {
		let dir = tempfile::tempdir().unwrap();
		let layer = TomlSource::new(dir.path().join("absent.toml")).load().unwrap();
		assert_eq!(layer, ServerConfigLayer::default());
	}

	#[test]
	fn test_invalid_toml_is_error() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("server.toml");
		std::fs::write(&path, "[http\nport = ").unwrap();
		assert!(matches!(
			TomlSource::new(&path).load(),
			Err(ConfigError::TomlParse { .. })
		));
	}
}
