// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ControlChannelError {
	/// The session could not be established or broke down. `after_send` is
	/// set when the command may already have reached the remote side.
	#[error("control channel unreachable: {message}")]
	Unreachable { message: String, after_send: bool },

	#[error("authentication failed: {0}")]
	AuthFailed(String),

	#[error("command failed (exit code {}): {stderr}", exit_code.map(|c| c.to_string()).unwrap_or_else(|| "none".to_string()))]
	CommandFailed {
		exit_code: Option<i32>,
		stderr: String,
	},

	#[error("command timed out after {0:?}")]
	Timeout(Duration),
}

impl ControlChannelError {
	pub fn unreachable(message: impl Into<String>) -> Self {
		Self::Unreachable {
			message: message.into(),
			after_send: false,
		}
	}

	/// Whether a mutating command that failed this way may still have been
	/// applied.
	pub fn is_ambiguous(&self) -> bool {
		match self {
			Self::Timeout(_) => true,
			Self::Unreachable { after_send, .. } => *after_send,
			Self::AuthFailed(_) | Self::CommandFailed { .. } => false,
		}
	}

	/// Classifies a non-zero exit by its stderr.
	pub(crate) fn from_exit(exit_code: Option<i32>, stderr: String) -> Self {
		const AUTH_MARKERS: [&str; 4] = [
			"a password is required",
			"a terminal is required",
			"Permission denied",
			"Operation not permitted",
		];
		if AUTH_MARKERS.iter().any(|m| stderr.contains(m)) {
			Self::AuthFailed(stderr)
		} else {
			Self::CommandFailed { exit_code, stderr }
		}
	}
}

pub type Result<T> = std::result::Result<T, ControlChannelError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ambiguity() {
		assert!(ControlChannelError::Timeout(Duration::from_secs(1)).is_ambiguous());
		assert!(!ControlChannelError::unreachable("down").is_ambiguous());
		assert!(ControlChannelError::Unreachable {
			message: "reset".into(),
			after_send: true
		}
		.is_ambiguous());
		assert!(!ControlChannelError::AuthFailed("no".into()).is_ambiguous());
	}

	#[test]
	fn sudo_prompt_is_auth_failure() {
		let err = ControlChannelError::from_exit(Some(1), "sudo: a password is required".into());
		assert!(matches!(err, ControlChannelError::AuthFailed(_)));

		let err = ControlChannelError::from_exit(Some(1), "Unable to access interface: No such device".into());
		assert_eq!(
			err,
			ControlChannelError::CommandFailed {
				exit_code: Some(1),
				stderr: "Unable to access interface: No such device".into()
			}
		);
	}

	#[test]
	fn display_includes_exit_code() {
		let err = ControlChannelError::CommandFailed {
			exit_code: Some(2),
			stderr: "boom".into(),
		};
		assert_eq!(err.to_string(), "command failed (exit code 2): boom");
	}
}
