// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Scripted control plane for engine tests.

use async_trait::async_trait;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use wgdash_control::{CommandSpec, ControlChannel, ControlChannelError, RawOutput};
use wgdash_wg_common::PublicKey;

const INTERFACE_LINE: &str = "cHJpdmF0ZQ==\tcHVibGlj\t51820\toff";
const MUTATING: [&str; 3] = ["remove-peer", "set-peer", "write-config"];

struct Fault {
	label: &'static str,
	/// Matching commands to let through before this fault fires.
	skip: usize,
	error: ControlChannelError,
	apply: bool,
}

#[derive(Default)]
struct State {
	live: BTreeMap<String, String>,
	config: String,
	events: Vec<&'static str>,
	faults: VecDeque<Fault>,
	down: bool,
}

/// Keeps a fake interface (dump lines keyed by public key) and a fake
/// config file, and records every command it receives.
#[derive(Clone, Default)]
pub(crate) struct FakeChannel {
	state: Arc<Mutex<State>>,
}

impl FakeChannel {
	pub(crate) fn new(config: &str) -> Self {
		let channel = Self::default();
		channel.lock().config = config.to_string();
		channel
	}

	fn lock(&self) -> std::sync::MutexGuard<'_, State> {
		self.state.lock().unwrap()
	}

	/// Adds a raw dump line, keyed by its first field.
	pub(crate) fn push_dump_line(&self, line: &str) {
		let key = line.split('\t').next().unwrap_or_default().to_string();
		self.lock().live.insert(key, line.to_string());
	}

	/// Makes the next command with `label` fail with `error`. With `apply`
	/// the command still takes effect, like a reply lost in transit.
	pub(crate) fn fail_next(&self, label: &'static str, error: ControlChannelError, apply: bool) {
		self.fail_after(label, 0, error, apply);
	}

	/// Like [`fail_next`](Self::fail_next), but lets `skip` matching
	/// commands succeed first.
	pub(crate) fn fail_after(
		&self,
		label: &'static str,
		skip: usize,
		error: ControlChannelError,
		apply: bool,
	) {
		self.lock().faults.push_back(Fault {
			label,
			skip,
			error,
			apply,
		});
	}

	pub(crate) fn set_down(&self, down: bool) {
		self.lock().down = down;
	}

	pub(crate) fn events(&self) -> Vec<&'static str> {
		self.lock().events.clone()
	}

	pub(crate) fn clear_events(&self) {
		self.lock().events.clear();
	}

	pub(crate) fn mutations(&self) -> usize {
		self.lock()
			.events
			.iter()
			.filter(|e| MUTATING.contains(e))
			.count()
	}

	pub(crate) fn is_live(&self, key: &PublicKey) -> bool {
		self.lock().live.contains_key(&key.to_base64())
	}

	pub(crate) fn config_text(&self) -> String {
		self.lock().config.clone()
	}

	fn apply(state: &mut State, command: &CommandSpec) -> RawOutput {
		let mut out = RawOutput::default();
		match command {
			CommandSpec::Dump { .. } => {
				let mut text = format!("{INTERFACE_LINE}\n");
				for line in state.live.values() {
					text.push_str(line);
					text.push('\n');
				}
				out.stdout = text;
			}
			CommandSpec::RemovePeer { public_key, .. } => {
				state.live.remove(&public_key.to_base64());
			}
			CommandSpec::SetPeer {
				public_key,
				allowed_ips,
				..
			} => {
				let ips = allowed_ips
					.iter()
					.map(|n| n.to_string())
					.collect::<Vec<_>>()
					.join(",");
				let key = public_key.to_base64();
				state
					.live
					.insert(key.clone(), format!("{key}\t(none)\t(none)\t{ips}\t0\t0\t0\toff"));
			}
			CommandSpec::ReadConfig { .. } => out.stdout = state.config.clone(),
			CommandSpec::WriteConfig { contents, .. } => state.config = contents.clone(),
		}
		out
	}
}

#[async_trait]
impl ControlChannel for FakeChannel {
	async fn run(&self, command: &CommandSpec) -> wgdash_control::Result<RawOutput> {
		let mut state = self.lock();
		let label = command.label();
		state.events.push(label);

		if state.down {
			return Err(ControlChannelError::unreachable("fake channel down"));
		}
		if let Some(idx) = state.faults.iter().position(|f| f.label == label) {
			if state.faults[idx].skip > 0 {
				state.faults[idx].skip -= 1;
				return Ok(Self::apply(&mut state, command));
			}
			if let Some(fault) = state.faults.remove(idx) {
				if fault.apply {
					Self::apply(&mut state, command);
				}
				return Err(fault.error);
			}
		}
		Ok(Self::apply(&mut state, command))
	}

	fn describe(&self) -> String {
		"fake".to_string()
	}
}
