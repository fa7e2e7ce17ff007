// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Reconciliation of live interface state, durable config and peer records.
//!
//! Enabling writes the config file first and then adds the peer to the
//! running interface; disabling removes it from the running interface
//! first and then from the file. Each half is skipped when it already
//! matches, so repeating a request that ended in
//! [`EngineError::PartialFailure`] completes only the missing half.
//!
//! A mutating command is never retried. When it fails ambiguously (the
//! command may have been applied) the engine re-reads the dump to find
//! out what happened.

use crate::clock::{Clock, SystemClock};
use crate::durable::DurableConfig;
use crate::error::{EngineError, Result, Step};
use crate::locks::PeerLocks;
use crate::view::{ChannelHealth, Peer, PeerListing};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use wgdash_control::{CommandSpec, ControlChannel, ControlChannelError};
use wgdash_store::{NewPeerRecord, PeerId, PeerRecord, PeerRecordStore};
use wgdash_wg_common::{parse_dump, InterfaceName, LivePeer, WgConfig};

type LiveState = HashMap<String, LivePeer>;

pub struct ReconciliationEngine {
	interface: InterfaceName,
	channel: Arc<dyn ControlChannel>,
	store: Arc<dyn PeerRecordStore>,
	durable: Arc<dyn DurableConfig>,
	clock: Arc<dyn Clock>,
	peer_locks: PeerLocks,
	/// Held across load-modify-store of the config file, which is shared
	/// by all peers.
	config_lock: Mutex<()>,
}

impl ReconciliationEngine {
	pub fn new(
		interface: InterfaceName,
		channel: Arc<dyn ControlChannel>,
		store: Arc<dyn PeerRecordStore>,
		durable: Arc<dyn DurableConfig>,
	) -> Self {
		Self {
			interface,
			channel,
			store,
			durable,
			clock: Arc::new(SystemClock),
			peer_locks: PeerLocks::default(),
			config_lock: Mutex::new(()),
		}
	}

	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;
		self
	}

	pub fn interface(&self) -> &InterfaceName {
		&self.interface
	}

	pub fn channel(&self) -> &Arc<dyn ControlChannel> {
		&self.channel
	}

	async fn read_live(&self) -> std::result::Result<LiveState, ControlChannelError> {
		let out = self
			.channel
			.run(&CommandSpec::Dump {
				interface: self.interface.clone(),
			})
			.await?;
		Ok(parse_dump(&out.stdout))
	}

	/// Every record merged with live state. Channel failures degrade the
	/// listing instead of failing it.
	#[instrument(skip(self), fields(interface = %self.interface))]
	pub async fn list_peers(&self) -> Result<PeerListing> {
		let now = self.clock.now();
		let records = self.store.list().await?;

		let (live, channel) = match self.read_live().await {
			Ok(live) => (live, ChannelHealth::Ok),
			Err(e) => {
				warn!(error = %e, "control channel unavailable, listing peers as disconnected");
				(LiveState::new(), ChannelHealth::degraded(&e))
			}
		};

		let peers = records
			.iter()
			.map(|record| Peer::project(record, live.get(&record.public_key.to_base64()), now))
			.collect();
		Ok(PeerListing { peers, channel })
	}

	pub async fn channel_health(&self) -> ChannelHealth {
		match self.read_live().await {
			Ok(_) => ChannelHealth::Ok,
			Err(e) => ChannelHealth::degraded(&e),
		}
	}

	/// View of one record after a change. A failing dump leaves the
	/// view disconnected rather than failing the change that preceded it.
	async fn project_best_effort(&self, record: &PeerRecord) -> Peer {
		let now = self.clock.now();
		match self.read_live().await {
			Ok(live) => Peer::project(record, live.get(&record.public_key.to_base64()), now),
			Err(e) => {
				warn!(peer_id = %record.id, error = %e, "could not refresh live state");
				Peer::project(record, None, now)
			}
		}
	}

	#[instrument(skip(self, new_name), fields(peer_id = %id))]
	pub async fn rename_peer(&self, id: &PeerId, new_name: &str) -> Result<Peer> {
		let record = self.store.rename(id, new_name).await?;
		debug!(name = %record.name, "peer renamed");
		Ok(self.project_best_effort(&record).await)
	}

	/// Provisions a record. The peer starts disabled.
	#[instrument(skip(self, new), fields(public_key = %new.public_key))]
	pub async fn create_peer(&self, new: NewPeerRecord) -> Result<Peer> {
		let record = self.store.create(new).await?;
		info!(peer_id = %record.id, internal_ip = %record.internal_ip, "peer record created");
		Ok(self.project_best_effort(&record).await)
	}

	#[instrument(skip(self), fields(peer_id = %id, interface = %self.interface))]
	pub async fn set_peer_enabled(&self, id: &PeerId, enabled: bool) -> Result<Peer> {
		let _guard = self.peer_locks.acquire(id).await;

		let record = self.store.get(id).await?;
		let key = record.public_key.to_base64();
		let now = self.clock.now();
		let live = self.read_live().await?;
		let live_enabled = live.contains_key(&key);
		let durable_enabled = self.durable.load().await?.contains_peer(&record.public_key);

		if live_enabled == enabled && durable_enabled == enabled {
			debug!(enabled, "peer already in requested state");
			return Ok(Peer::project(&record, live.get(&key), now));
		}

		if enabled {
			self.enable(&record, live_enabled, durable_enabled).await?;
		} else {
			self.disable(&record, live_enabled, durable_enabled).await?;
		}
		info!(public_key = %key, enabled, "peer state changed");

		// The change is applied; a failing read from here on only costs
		// the live details of the view.
		Ok(self.project_best_effort(&record).await)
	}

	async fn enable(&self, record: &PeerRecord, live: bool, durable: bool) -> Result<()> {
		if !durable {
			let allowed = [record.internal_ip];
			if let Err(e) = self
				.edit_config(|config| config.add_peer(&record.public_key, &allowed))
				.await
			{
				return Err(partial_if(live, record, Step::Durable, true, e));
			}
		}

		if !live {
			let command = CommandSpec::SetPeer {
				interface: self.interface.clone(),
				public_key: record.public_key,
				allowed_ips: vec![record.internal_ip],
			};
			if let Err(e) = self.mutate_live(&command, record, true).await {
				return Err(partial_if(true, record, Step::Live, true, e));
			}
		}
		Ok(())
	}

	async fn disable(&self, record: &PeerRecord, live: bool, durable: bool) -> Result<()> {
		if live {
			let command = CommandSpec::RemovePeer {
				interface: self.interface.clone(),
				public_key: record.public_key,
			};
			if let Err(e) = self.mutate_live(&command, record, false).await {
				return Err(partial_if(!durable, record, Step::Live, false, e));
			}
		}

		if durable {
			if let Err(e) = self
				.edit_config(|config| config.remove_peer(&record.public_key))
				.await
			{
				return Err(partial_if(true, record, Step::Durable, false, e));
			}
		}
		Ok(())
	}

	/// Runs a mutating live command once. An ambiguous failure is settled by
	/// reading the dump back.
	async fn mutate_live(
		&self,
		command: &CommandSpec,
		record: &PeerRecord,
		want_present: bool,
	) -> Result<()> {
		let err = match self.channel.run(command).await {
			Ok(_) => return Ok(()),
			Err(e) if e.is_ambiguous() => e,
			Err(e) => return Err(e.into()),
		};

		warn!(command = command.label(), error = %err, "mutation outcome ambiguous, verifying");
		match self.read_live().await {
			Ok(live) if live.contains_key(&record.public_key.to_base64()) == want_present => {
				info!(command = command.label(), "mutation verified as applied");
				Ok(())
			}
			Ok(_) => Err(err.into()),
			Err(verify) => Err(EngineError::OutcomeUnknown {
				command: command.label(),
				source: err,
				verify,
			}),
		}
	}

	/// Load-modify-store of the config file under the config lock. `edit`
	/// returns whether it changed anything.
	async fn edit_config<F>(&self, edit: F) -> Result<()>
	where
		F: FnOnce(&mut WgConfig) -> bool + Send,
	{
		let _guard = self.config_lock.lock().await;
		let mut config = self.durable.load().await?;
		if edit(&mut config) {
			self.durable.store(&config).await?;
			debug!(target = %self.durable.describe(), "config file updated");
		}
		Ok(())
	}
}

/// Wraps `err` as a partial failure when the other half is already in the
/// desired state.
fn partial_if(
	other_half_done: bool,
	record: &PeerRecord,
	step: Step,
	desired: bool,
	err: EngineError,
) -> EngineError {
	if !other_half_done {
		return err;
	}
	warn!(peer_id = %record.id, %step, desired, error = %err, "peer left half-applied");
	EngineError::PartialFailure {
		peer_id: record.id.clone(),
		step,
		desired,
		source: Box::new(err),
	}
}
