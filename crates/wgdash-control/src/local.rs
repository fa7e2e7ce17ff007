// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::channel::{ControlChannel, RawOutput};
use crate::command::{CommandRenderer, CommandSpec};
use crate::error::{ControlChannelError, Result};
use crate::exec::{run_process, ExecError};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Runs commands as child processes on this host.
#[derive(Debug, Clone)]
pub struct LocalChannel {
	renderer: CommandRenderer,
	timeout: Duration,
}

impl LocalChannel {
	pub fn new(renderer: CommandRenderer, timeout: Duration) -> Self {
		Self { renderer, timeout }
	}
}

#[async_trait]
impl ControlChannel for LocalChannel {
	#[instrument(skip_all, fields(command = command.label()))]
	async fn run(&self, command: &CommandSpec) -> Result<RawOutput> {
		let invocation = self.renderer.render(command);

		let output = run_process(
			&invocation.program,
			&invocation.args,
			invocation.stdin.as_deref(),
			self.timeout,
		)
		.await
		.map_err(|e| match e {
			ExecError::Spawn(e) => {
				warn!(program = %invocation.program, error = %e, "failed to spawn");
				ControlChannelError::unreachable(format!("failed to spawn {}: {e}", invocation.program))
			}
			ExecError::Io(e) => ControlChannelError::Unreachable {
				message: format!("lost contact with {}: {e}", invocation.program),
				after_send: true,
			},
			ExecError::Timeout => ControlChannelError::Timeout(self.timeout),
		})?;

		if !output.success {
			debug!(exit_code = ?output.exit_code, stderr = %output.stderr, "command failed");
			return Err(ControlChannelError::from_exit(output.exit_code, output.stderr));
		}

		Ok(RawOutput {
			stdout: output.stdout,
			stderr: output.stderr,
		})
	}

	fn describe(&self) -> String {
		"local".to_string()
	}
}

#[cfg(all(test, unix))]
mod tests {
	use super::*;
	use std::os::unix::fs::PermissionsExt;
	use std::path::Path;
	use wgdash_wg_common::{InterfaceName, PublicKey, KEY_LEN};

	fn write_script(dir: &Path, body: &str) -> String {
		let path = dir.join("fake-wg");
		std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
		std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
		path.display().to_string()
	}

	fn dump() -> CommandSpec {
		CommandSpec::Dump {
			interface: InterfaceName::new("wg0").unwrap(),
		}
	}

	#[tokio::test]
	async fn returns_stdout_on_success() {
		let channel = LocalChannel::new(CommandRenderer::new("echo", false), Duration::from_secs(5));

		let out = channel.run(&dump()).await.unwrap();
		assert_eq!(out.stdout, "show wg0 dump\n");
	}

	#[tokio::test]
	async fn nonzero_exit_is_command_failed() {
		let channel = LocalChannel::new(CommandRenderer::new("false", false), Duration::from_secs(5));

		let err = channel
			.run(&CommandSpec::RemovePeer {
				interface: InterfaceName::new("wg0").unwrap(),
				public_key: PublicKey::from_bytes([1u8; KEY_LEN]),
			})
			.await
			.unwrap_err();
		assert_eq!(
			err,
			ControlChannelError::CommandFailed {
				exit_code: Some(1),
				stderr: String::new()
			}
		);
	}

	#[tokio::test]
	async fn slow_command_times_out() {
		let dir = tempfile::tempdir().unwrap();
		let wg = write_script(dir.path(), "sleep 5");
		let channel = LocalChannel::new(CommandRenderer::new(wg, false), Duration::from_millis(100));

		let err = channel.run(&dump()).await.unwrap_err();
		assert!(matches!(err, ControlChannelError::Timeout(_)));
		assert!(err.is_ambiguous());
	}

	#[tokio::test]
	async fn missing_binary_is_unreachable() {
		let channel = LocalChannel::new(
			CommandRenderer::new("/nonexistent/wgdash-wg", false),
			Duration::from_secs(1),
		);
		let err = channel.run(&dump()).await.unwrap_err();
		assert!(matches!(
			err,
			ControlChannelError::Unreachable {
				after_send: false,
				..
			}
		));
	}

	#[tokio::test]
	async fn write_and_read_config_roundtrip() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("wg0.conf");
		let channel = LocalChannel::new(CommandRenderer::default(), Duration::from_secs(5));

		channel
			.run(&CommandSpec::WriteConfig {
				path: path.clone(),
				contents: "[Interface]\nListenPort = 51820\n".into(),
			})
			.await
			.unwrap();

		let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
		assert_eq!(mode, 0o600);
		assert!(!dir.path().join("wg0.conf.tmp").exists());

		let out = channel
			.run(&CommandSpec::ReadConfig { path })
			.await
			.unwrap();
		assert_eq!(out.stdout, "[Interface]\nListenPort = 51820\n");
	}
}
