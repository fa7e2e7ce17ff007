// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::durable::DurableConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use wgdash_control::ControlChannelError;
use wgdash_store::{PeerId, StoreError};
use wgdash_wg_common::{ConfigFileError, PublicKey};

/// The half of a composite enable/disable that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
	/// The change to the running interface.
	Live,
	/// The change to the config file.
	Durable,
}

impl fmt::Display for Step {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Live => f.write_str("live"),
			Self::Durable => f.write_str("durable"),
		}
	}
}

#[derive(Debug, Error)]
pub enum EngineError {
	#[error("peer not found: {0}")]
	NotFound(String),

	#[error("peer name must not be empty")]
	EmptyName,

	#[error("a peer with public key {0} already exists")]
	DuplicatePublicKey(PublicKey),

	#[error(transparent)]
	Channel(#[from] ControlChannelError),

	#[error(transparent)]
	MalformedConfig(#[from] ConfigFileError),

	/// One half of an enable/disable took effect and the other did not.
	/// Repeating the same request completes the missing half.
	#[error("peer {peer_id}: {step} step failed while setting enabled={desired}: {source}")]
	PartialFailure {
		peer_id: PeerId,
		step: Step,
		desired: bool,
		#[source]
		source: Box<EngineError>,
	},

	/// A mutating command failed ambiguously and the follow-up read that
	/// should have settled it failed as well.
	#[error("outcome of {command} unknown: {source} (verification failed: {verify})")]
	OutcomeUnknown {
		command: &'static str,
		#[source]
		source: ControlChannelError,
		verify: ControlChannelError,
	},

	#[error(transparent)]
	Durable(DurableConfigError),

	#[error(transparent)]
	Store(StoreError),
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Transport-neutral classification of [`EngineError`], for mapping onto
/// status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
	NotFound,
	EmptyName,
	Conflict,
	Unreachable,
	AuthFailed,
	CommandFailed,
	Timeout,
	OutcomeUnknown,
	MalformedConfig,
	PartialFailure,
	Internal,
}

impl EngineError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::NotFound(_) => ErrorKind::NotFound,
			Self::EmptyName => ErrorKind::EmptyName,
			Self::DuplicatePublicKey(_) => ErrorKind::Conflict,
			Self::Channel(e) => channel_kind(e),
			Self::MalformedConfig(_) => ErrorKind::MalformedConfig,
			Self::PartialFailure { .. } => ErrorKind::PartialFailure,
			Self::OutcomeUnknown { .. } => ErrorKind::OutcomeUnknown,
			Self::Durable(DurableConfigError::Channel(e)) => channel_kind(e),
			Self::Durable(DurableConfigError::Malformed(_)) => ErrorKind::MalformedConfig,
			Self::Durable(DurableConfigError::OutcomeUnknown { .. }) => ErrorKind::OutcomeUnknown,
			Self::Durable(_) | Self::Store(_) => ErrorKind::Internal,
		}
	}
}

fn channel_kind(e: &ControlChannelError) -> ErrorKind {
	match e {
		ControlChannelError::Unreachable { .. } => ErrorKind::Unreachable,
		ControlChannelError::AuthFailed(_) => ErrorKind::AuthFailed,
		ControlChannelError::CommandFailed { .. } => ErrorKind::CommandFailed,
		ControlChannelError::Timeout(_) => ErrorKind::Timeout,
	}
}

impl From<StoreError> for EngineError {
	fn from(e: StoreError) -> Self {
		match e {
			StoreError::NotFound(id) => Self::NotFound(id),
			StoreError::EmptyName => Self::EmptyName,
			StoreError::DuplicatePublicKey(key) => Self::DuplicatePublicKey(key),
			other => Self::Store(other),
		}
	}
}

impl From<DurableConfigError> for EngineError {
	fn from(e: DurableConfigError) -> Self {
		match e {
			DurableConfigError::Malformed(e) => Self::MalformedConfig(e),
			other => Self::Durable(other),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::time::Duration;

	#[test]
	fn kinds_follow_taxonomy() {
		assert_eq!(
			EngineError::from(StoreError::NotFound("7".into())).kind(),
			ErrorKind::NotFound
		);
		assert_eq!(EngineError::from(StoreError::EmptyName).kind(), ErrorKind::EmptyName);
		assert_eq!(
			EngineError::Channel(ControlChannelError::Timeout(Duration::from_secs(1))).kind(),
			ErrorKind::Timeout
		);
		assert_eq!(
			EngineError::from(DurableConfigError::Malformed(ConfigFileError::Malformed {
				line: 3,
				reason: "junk".into()
			}))
			.kind(),
			ErrorKind::MalformedConfig
		);
		assert_eq!(
			EngineError::Durable(DurableConfigError::Channel(ControlChannelError::unreachable(
				"down"
			)))
			.kind(),
			ErrorKind::Unreachable
		);
		assert_eq!(
			EngineError::from(DurableConfigError::OutcomeUnknown {
				source: ControlChannelError::Timeout(Duration::from_secs(1)),
				verify: ControlChannelError::unreachable("down"),
			})
			.kind(),
			ErrorKind::OutcomeUnknown
		);
	}

	#[test]
	fn partial_failure_names_step() {
		let err = EngineError::PartialFailure {
			peer_id: PeerId::from("1"),
			step: Step::Durable,
			desired: false,
			source: Box::new(EngineError::Channel(ControlChannelError::unreachable("down"))),
		};
		assert_eq!(err.kind(), ErrorKind::PartialFailure);
		assert!(err.to_string().contains("durable step failed"));
	}
}
