// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::command::CommandSpec;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOutput {
	pub stdout: String,
	pub stderr: String,
}

#[async_trait]
pub trait ControlChannel: Send + Sync {
	/// Runs one command. Read commands may be retried freely; a mutating
	/// command that fails with an ambiguous error must be verified, not
	/// re-issued.
	async fn run(&self, command: &CommandSpec) -> Result<RawOutput>;

	/// Releases any held session. The next `run` re-establishes it.
	async fn shutdown(&self) {}

	/// Human-readable target, for logs and health output.
	fn describe(&self) -> String;
}

#[async_trait]
impl<C: ControlChannel + ?Sized> ControlChannel for Arc<C> {
	async fn run(&self, command: &CommandSpec) -> Result<RawOutput> {
		(**self).run(command).await
	}

	async fn shutdown(&self) {
		(**self).shutdown().await
	}

	fn describe(&self) -> String {
		(**self).describe()
	}
}
