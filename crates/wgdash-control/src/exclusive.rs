// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::channel::{ControlChannel, RawOutput};
use crate::command::CommandSpec;
use crate::error::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::trace;

/// Serializes every command through one lock, for transports that cannot
/// carry concurrent commands.
pub struct ExclusiveChannel<C> {
	inner: C,
	gate: Mutex<()>,
}

impl<C: ControlChannel> ExclusiveChannel<C> {
	pub fn new(inner: C) -> Self {
		Self {
			inner,
			gate: Mutex::new(()),
		}
	}
}

#[async_trait]
impl<C: ControlChannel> ControlChannel for ExclusiveChannel<C> {
	async fn run(&self, command: &CommandSpec) -> Result<RawOutput> {
		let _guard = self.gate.lock().await;
		trace!(command = command.label(), "acquired exclusive channel");
		self.inner.run(command).await
	}

	async fn shutdown(&self) {
		let _guard = self.gate.lock().await;
		self.inner.shutdown().await
	}

	fn describe(&self) -> String {
		format!("{} (exclusive)", self.inner.describe())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::Arc;
	use std::time::Duration;
	use wgdash_wg_common::InterfaceName;

	#[derive(Default)]
	struct Probe {
		active: AtomicUsize,
		max_active: AtomicUsize,
	}

	#[async_trait]
	impl ControlChannel for Probe {
		async fn run(&self, _command: &CommandSpec) -> Result<RawOutput> {
			let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
			self.max_active.fetch_max(now, Ordering::SeqCst);
			tokio::time::sleep(Duration::from_millis(20)).await;
			self.active.fetch_sub(1, Ordering::SeqCst);
			Ok(RawOutput::default())
		}

		fn describe(&self) -> String {
			"fake".into()
		}
	}

	#[tokio::test]
	async fn commands_never_overlap() {
		let channel = Arc::new(ExclusiveChannel::new(Probe::default()));
		let command = CommandSpec::Dump {
			interface: InterfaceName::new("wg0").unwrap(),
		};

		let mut handles = Vec::new();
		for _ in 0..5 {
			let channel = Arc::clone(&channel);
			let command = command.clone();
			handles.push(tokio::spawn(async move { channel.run(&command).await }));
		}
		for handle in handles {
			handle.await.unwrap().unwrap();
		}

		assert_eq!(channel.inner.max_active.load(Ordering::SeqCst), 1);
		assert_eq!(channel.describe(), "fake (exclusive)");
	}
}
