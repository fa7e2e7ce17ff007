// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use ipnet::IpNet;
use std::path::PathBuf;
use wgdash_wg_common::{InterfaceName, PublicKey};

/// Writes stdin to `$1.tmp` with a private umask, then renames it over `$1`.
const WRITE_SCRIPT: &str = r#"umask 077 && cat > "$1.tmp" && mv "$1.tmp" "$1""#;

/// The complete set of operations the control plane accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandSpec {
	Dump {
		interface: InterfaceName,
	},
	RemovePeer {
		interface: InterfaceName,
		public_key: PublicKey,
	},
	SetPeer {
		interface: InterfaceName,
		public_key: PublicKey,
		allowed_ips: Vec<IpNet>,
	},
	ReadConfig {
		path: PathBuf,
	},
	WriteConfig {
		path: PathBuf,
		contents: String,
	},
}

impl CommandSpec {
	pub fn is_mutating(&self) -> bool {
		matches!(
			self,
			Self::RemovePeer { .. } | Self::SetPeer { .. } | Self::WriteConfig { .. }
		)
	}

	/// Short name for logs.
	pub fn label(&self) -> &'static str {
		match self {
			Self::Dump { .. } => "dump",
			Self::RemovePeer { .. } => "remove-peer",
			Self::SetPeer { .. } => "set-peer",
			Self::ReadConfig { .. } => "read-config",
			Self::WriteConfig { .. } => "write-config",
		}
	}
}

/// A rendered command: program, arguments and optional stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
	pub program: String,
	pub args: Vec<String>,
	pub stdin: Option<String>,
}

impl Invocation {
	pub fn argv(&self) -> Vec<String> {
		std::iter::once(self.program.clone())
			.chain(self.args.iter().cloned())
			.collect()
	}
}

/// Turns a [`CommandSpec`] into an [`Invocation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRenderer {
	wg_program: String,
	use_sudo: bool,
}

impl Default for CommandRenderer {
	fn default() -> Self {
		Self {
			wg_program: "wg".to_string(),
			use_sudo: false,
		}
	}
}

impl CommandRenderer {
	pub fn new(wg_program: impl Into<String>, use_sudo: bool) -> Self {
		Self {
			wg_program: wg_program.into(),
			use_sudo,
		}
	}

	pub fn render(&self, command: &CommandSpec) -> Invocation {
		let (program, args, stdin): (String, Vec<String>, Option<String>) = match command {
			CommandSpec::Dump { interface } => (
				self.wg_program.clone(),
				vec!["show".into(), interface.to_string(), "dump".into()],
				None,
			),
			CommandSpec::RemovePeer {
				interface,
				public_key,
			} => (
				self.wg_program.clone(),
				vec![
					"set".into(),
					interface.to_string(),
					"peer".into(),
					public_key.to_base64(),
					"remove".into(),
				],
				None,
			),
			CommandSpec::SetPeer {
				interface,
				public_key,
				allowed_ips,
			} => (
				self.wg_program.clone(),
				vec![
					"set".into(),
					interface.to_string(),
					"peer".into(),
					public_key.to_base64(),
					"allowed-ips".into(),
					allowed_ips
						.iter()
						.map(|net| net.to_string())
						.collect::<Vec<_>>()
						.join(","),
				],
				None,
			),
			CommandSpec::ReadConfig { path } => {
				("cat".into(), vec![path.display().to_string()], None)
			}
			CommandSpec::WriteConfig { path, contents } => (
				"sh".into(),
				vec![
					"-c".into(),
					WRITE_SCRIPT.into(),
					"wgdash-write".into(),
					path.display().to_string(),
				],
				Some(contents.clone()),
			),
		};

		if self.use_sudo {
			let mut sudo_args = vec!["-n".to_string(), program];
			sudo_args.extend(args);
			Invocation {
				program: "sudo".into(),
				args: sudo_args,
				stdin,
			}
		} else {
			Invocation {
				program,
				args,
				stdin,
			}
		}
	}
}
