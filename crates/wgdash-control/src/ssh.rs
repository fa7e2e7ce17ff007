// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Remote control channel over OpenSSH.
//!
//! The channel owns one multiplexed master connection (`ControlMaster`),
//! opened lazily on the first command and kept in a private temp directory.
//! Commands are sent through the master socket, so they can run
//! concurrently without paying for a handshake each time.
//!
//! A transport failure (ssh exit status 255) or a timeout tears the master
//! down; the next command opens a fresh one instead of reusing a session in
//! an unknown state.

use crate::channel::{ControlChannel, RawOutput};
use crate::command::{CommandRenderer, CommandSpec};
use crate::error::{ControlChannelError, Result};
use crate::exec::{run_process, ExecError};
use crate::quote;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

const SSH_TRANSPORT_FAILURE: i32 = 255;
const MASTER_EXIT_TIMEOUT: Duration = Duration::from_secs(5);
/// Idle lifetime of the master once no client is attached. A master left
/// behind by a crashed process exits on its own after this.
const MASTER_PERSIST: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub struct SshConfig {
	pub host: String,
	pub port: u16,
	pub user: String,
	pub identity_file: Option<PathBuf>,
	pub connect_timeout: Duration,
	pub command_timeout: Duration,
}

impl SshConfig {
	pub fn new(host: impl Into<String>, user: impl Into<String>) -> Self {
		Self {
			host: host.into(),
			port: 22,
			user: user.into(),
			identity_file: None,
			connect_timeout: Duration::from_secs(5),
			command_timeout: Duration::from_secs(10),
		}
	}

	fn target(&self) -> String {
		format!("{}@{}", self.user, self.host)
	}

	fn common_args(&self) -> Vec<String> {
		let mut args = vec![
			"-o".to_string(),
			"BatchMode=yes".to_string(),
			"-o".to_string(),
			format!("ConnectTimeout={}", self.connect_timeout.as_secs().max(1)),
			"-p".to_string(),
			self.port.to_string(),
		];
		if let Some(identity) = &self.identity_file {
			args.push("-i".to_string());
			args.push(identity.display().to_string());
		}
		args
	}
}

struct SshSession {
	control_path: PathBuf,
	// Removing the directory also removes the socket.
	_dir: TempDir,
}

pub struct SshChannel {
	config: SshConfig,
	renderer: CommandRenderer,
	session: Mutex<Option<SshSession>>,
}

impl SshChannel {
	pub fn new(config: SshConfig, renderer: CommandRenderer) -> Self {
		Self {
			config,
			renderer,
			session: Mutex::new(None),
		}
	}

	/// Returns the control socket of a live master, opening one if needed.
	async fn ensure_session(&self) -> Result<PathBuf> {
		let mut guard = self.session.lock().await;
		if let Some(session) = guard.as_ref() {
			return Ok(session.control_path.clone());
		}

		let session = self.open_master().await?;
		let path = session.control_path.clone();
		*guard = Some(session);
		Ok(path)
	}

	#[instrument(skip(self), fields(target = %self.config.target()))]
	async fn open_master(&self) -> Result<SshSession> {
		let dir = tempfile::Builder::new()
			.prefix("wgdash-ssh-")
			.tempdir()
			.map_err(|e| ControlChannelError::unreachable(format!("failed to create control dir: {e}")))?;
		let control_path = dir.path().join("master.sock");
		let log_path = dir.path().join("master.log");
		let args = self.master_args(&control_path, &log_path);

		// `-f` forks after authentication and the background master keeps
		// any inherited pipes open, so only the exit status is awaited here.
		let status = tokio::time::timeout(
			self.config.connect_timeout + MASTER_EXIT_TIMEOUT,
			Command::new("ssh")
				.args(&args)
				.stdin(Stdio::null())
				.stdout(Stdio::null())
				.stderr(Stdio::null())
				.kill_on_drop(true)
				.status(),
		)
		.await
		.map_err(|_| ControlChannelError::Timeout(self.config.connect_timeout))?
		.map_err(|e| ControlChannelError::unreachable(format!("failed to spawn ssh: {e}")))?;

		if !status.success() {
			let log = tokio::fs::read_to_string(&log_path)
				.await
				.unwrap_or_default()
				.trim()
				.to_string();
			warn!(exit_code = ?status.code(), log = %log, "failed to open ssh master");
			return Err(if log.contains("Permission denied") {
				ControlChannelError::AuthFailed(log)
			} else {
				ControlChannelError::unreachable(if log.is_empty() {
					format!("ssh exited with {status}")
				} else {
					log
				})
			});
		}

		info!("ssh master connection established");
		Ok(SshSession {
			control_path,
			_dir: dir,
		})
	}

	fn master_args(&self, control_path: &Path, log_path: &Path) -> Vec<String> {
		let mut args = vec![
			"-M".to_string(),
			"-N".to_string(),
			"-f".to_string(),
			"-S".to_string(),
			control_path.display().to_string(),
			"-E".to_string(),
			log_path.display().to_string(),
			"-o".to_string(),
			format!("ControlPersist={}", MASTER_PERSIST.as_secs()),
		];
		args.extend(self.config.common_args());
		args.push(self.config.target());
		args
	}

	/// Stops the master (if any). Safe to call repeatedly.
	///
	/// With `failed` set, only the session owning that control socket is
	/// stopped; a master opened since by another command is left alone.
	async fn reset_session(&self, failed: Option<&Path>) {
		let session = {
			let mut guard = self.session.lock().await;
			let stale = matches!(
				(guard.as_ref(), failed),
				(Some(current), Some(failed)) if current.control_path != failed
			);
			if stale {
				None
			} else {
				guard.take()
			}
		};
		let Some(session) = session else {
			return;
		};

		let args = vec![
			"-S".to_string(),
			session.control_path.display().to_string(),
			"-O".to_string(),
			"exit".to_string(),
			self.config.target(),
		];
		if let Err(ExecError::Timeout) = run_process("ssh", &args, None, MASTER_EXIT_TIMEOUT).await {
			warn!("timed out stopping ssh master");
		}
		debug!("ssh master connection released");
	}
}

#[async_trait]
impl ControlChannel for SshChannel {
	#[instrument(skip_all, fields(command = command.label(), target = %self.config.target()))]
	async fn run(&self, command: &CommandSpec) -> Result<RawOutput> {
		let control_path = self.ensure_session().await?;
		let invocation = self.renderer.render(command);

		let mut args = vec![
			"-S".to_string(),
			control_path.display().to_string(),
			"-o".to_string(),
			"ControlMaster=no".to_string(),
		];
		args.extend(self.config.common_args());
		args.push(self.config.target());
		args.push("--".to_string());
		args.push(quote::join(&invocation.argv()));

		let result = run_process(
			"ssh",
			&args,
			invocation.stdin.as_deref(),
			self.config.command_timeout,
		)
		.await;

		let output = match result {
			Ok(output) => output,
			Err(ExecError::Spawn(e)) => {
				return Err(ControlChannelError::unreachable(format!("failed to spawn ssh: {e}")));
			}
			Err(ExecError::Io(e)) => {
				self.reset_session(Some(&control_path)).await;
				return Err(ControlChannelError::Unreachable {
					message: format!("ssh I/O error: {e}"),
					after_send: true,
				});
			}
			Err(ExecError::Timeout) => {
				warn!("command timed out, dropping ssh session");
				self.reset_session(Some(&control_path)).await;
				return Err(ControlChannelError::Timeout(self.config.command_timeout));
			}
		};

		if output.exit_code == Some(SSH_TRANSPORT_FAILURE) {
			warn!(stderr = %output.stderr, "ssh transport failure, dropping session");
			self.reset_session(Some(&control_path)).await;
			return Err(if output.stderr.contains("Permission denied") {
				ControlChannelError::AuthFailed(output.stderr)
			} else {
				ControlChannelError::Unreachable {
					message: output.stderr,
					after_send: true,
				}
			});
		}

		if !output.success {
			debug!(exit_code = ?output.exit_code, stderr = %output.stderr, "remote command failed");
			return Err(ControlChannelError::from_exit(output.exit_code, output.stderr));
		}

		Ok(RawOutput {
			stdout: output.stdout,
			stderr: output.stderr,
		})
	}

	async fn shutdown(&self) {
		self.reset_session(None).await;
	}

	fn describe(&self) -> String {
		format!("ssh://{}:{}", self.config.target(), self.config.port)
	}
}

impl std::fmt::Debug for SshChannel {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SshChannel")
			.field("target", &self.config.target())
			.field("port", &self.config.port)
			.finish()
	}
}
