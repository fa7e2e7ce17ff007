// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, trace};

pub(crate) struct ProcessOutput {
	pub exit_code: Option<i32>,
	pub success: bool,
	pub stdout: String,
	pub stderr: String,
}

pub(crate) enum ExecError {
	/// The process could not be started at all.
	Spawn(std::io::Error),
	/// The process started but collecting its output failed.
	Io(std::io::Error),
	Timeout,
}

/// Runs `program` to completion, feeding `stdin` if given. The child is
/// killed when `limit` elapses.
pub(crate) async fn run_process(
	program: &str,
	args: &[String],
	stdin: Option<&str>,
	limit: Duration,
) -> Result<ProcessOutput, ExecError> {
	trace!(program, args = %args.join(" "), "spawning process");

	let mut child = Command::new(program)
		.args(args)
		.stdin(if stdin.is_some() {
			Stdio::piped()
		} else {
			Stdio::null()
		})
		.stdout(Stdio::piped())
		.stderr(Stdio::piped())
		.kill_on_drop(true)
		.spawn()
		.map_err(ExecError::Spawn)?;

	if let (Some(input), Some(mut handle)) = (stdin, child.stdin.take()) {
		let input = input.to_owned();
		tokio::spawn(async move {
			if let Err(e) = handle.write_all(input.as_bytes()).await {
				debug!(error = %e, "failed to write child stdin");
			}
		});
	}

	let output = tokio::time::timeout(limit, child.wait_with_output())
		.await
		.map_err(|_| ExecError::Timeout)?
		.map_err(ExecError::Io)?;

	Ok(ProcessOutput {
		exit_code: output.status.code(),
		success: output.status.success(),
		stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
		stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
	})
}
