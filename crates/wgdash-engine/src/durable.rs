// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Backends for the wg-quick config file that survives daemon restarts.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use wgdash_control::{CommandSpec, ControlChannel, ControlChannelError};
use wgdash_wg_common::{ConfigFileError, WgConfig};

#[derive(Debug, Error)]
pub enum DurableConfigError {
	#[error("I/O error on {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error(transparent)]
	Malformed(#[from] ConfigFileError),

	#[error(transparent)]
	Channel(#[from] ControlChannelError),

	/// A write failed ambiguously and reading the file back failed too.
	#[error("outcome of config write unknown: {source} (verification failed: {verify})")]
	OutcomeUnknown {
		#[source]
		source: ControlChannelError,
		verify: ControlChannelError,
	},
}

#[async_trait]
pub trait DurableConfig: Send + Sync {
	async fn load(&self) -> Result<WgConfig, DurableConfigError>;

	/// Replaces the file with `config`. Readers see either the old or the
	/// new file.
	async fn store(&self, config: &WgConfig) -> Result<(), DurableConfigError>;

	fn describe(&self) -> String;
}

#[async_trait]
impl<D: DurableConfig + ?Sized> DurableConfig for Arc<D> {
	async fn load(&self) -> Result<WgConfig, DurableConfigError> {
		(**self).load().await
	}

	async fn store(&self, config: &WgConfig) -> Result<(), DurableConfigError> {
		(**self).store(config).await
	}

	fn describe(&self) -> String {
		(**self).describe()
	}
}

/// A config file on this host, edited directly.
#[derive(Debug, Clone)]
pub struct LocalConfigFile {
	path: PathBuf,
}

impl LocalConfigFile {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn io_error(&self, source: std::io::Error) -> DurableConfigError {
		DurableConfigError::Io {
			path: self.path.clone(),
			source,
		}
	}
}

#[async_trait]
impl DurableConfig for LocalConfigFile {
	async fn load(&self) -> Result<WgConfig, DurableConfigError> {
		let text = tokio::fs::read_to_string(&self.path)
			.await
			.map_err(|e| self.io_error(e))?;
		Ok(WgConfig::parse(&text)?)
	}

	#[instrument(skip_all, fields(path = %self.path.display()))]
	async fn store(&self, config: &WgConfig) -> Result<(), DurableConfigError> {
		let mut tmp = self.path.clone().into_os_string();
		tmp.push(".tmp");
		let tmp = PathBuf::from(tmp);
		let contents = config.to_string();

		#[cfg(unix)]
		{
			use tokio::fs::OpenOptions;
			use tokio::io::AsyncWriteExt;

			let mut file = OpenOptions::new()
				.write(true)
				.create(true)
				.truncate(true)
				.mode(0o600)
				.open(&tmp)
				.await
				.map_err(|e| self.io_error(e))?;
			file.write_all(contents.as_bytes())
				.await
				.map_err(|e| self.io_error(e))?;
			file.sync_all().await.map_err(|e| self.io_error(e))?;
		}

		#[cfg(not(unix))]
		{
			tokio::fs::write(&tmp, contents.as_bytes())
				.await
				.map_err(|e| self.io_error(e))?;
		}

		tokio::fs::rename(&tmp, &self.path)
			.await
			.map_err(|e| self.io_error(e))?;
		debug!("config file written");
		Ok(())
	}

	fn describe(&self) -> String {
		self.path.display().to_string()
	}
}

/// A config file reached through the control channel, for remote hosts.
pub struct ChannelConfigFile<C> {
	channel: C,
	path: PathBuf,
}

impl<C: ControlChannel> ChannelConfigFile<C> {
	pub fn new(channel: C, path: impl Into<PathBuf>) -> Self {
		Self {
			channel,
			path: path.into(),
		}
	}

	async fn read_text(&self) -> Result<String, ControlChannelError> {
		let out = self
			.channel
			.run(&CommandSpec::ReadConfig {
				path: self.path.clone(),
			})
			.await?;
		Ok(out.stdout)
	}
}

#[async_trait]
impl<C: ControlChannel> DurableConfig for ChannelConfigFile<C> {
	async fn load(&self) -> Result<WgConfig, DurableConfigError> {
		let text = self.read_text().await?;
		Ok(WgConfig::parse(&text)?)
	}

	#[instrument(skip_all, fields(path = %self.path.display()))]
	async fn store(&self, config: &WgConfig) -> Result<(), DurableConfigError> {
		let contents = config.to_string();
		let command = CommandSpec::WriteConfig {
			path: self.path.clone(),
			contents: contents.clone(),
		};

		match self.channel.run(&command).await {
			Ok(_) => Ok(()),
			Err(e) if e.is_ambiguous() => {
				// The write is a rename on the far side; reading back tells
				// whether it landed.
				warn!(error = %e, "config write outcome ambiguous, reading back");
				match self.read_text().await {
					Ok(current) if current == contents => {
						debug!("config write verified");
						Ok(())
					}
					Ok(_) => Err(e.into()),
					Err(verify) => Err(DurableConfigError::OutcomeUnknown { source: e, verify }),
				}
			}
			Err(e) => Err(e.into()),
		}
	}

	fn describe(&self) -> String {
		format!("{} on {}", self.path.display(), self.channel.describe())
	}
}
