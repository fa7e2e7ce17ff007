// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::engine::ReconciliationEngine;
use crate::error::Result;
use crate::view::{ChannelHealth, Peer, PeerListing};
use std::sync::Arc;
use wgdash_store::{NewPeerRecord, PeerId};

/// The operations API layers may call. Cheap to clone.
#[derive(Clone)]
pub struct PeerService {
	engine: Arc<ReconciliationEngine>,
}

impl PeerService {
	pub fn new(engine: ReconciliationEngine) -> Self {
		Self {
			engine: Arc::new(engine),
		}
	}

	pub async fn list_peers(&self) -> Result<PeerListing> {
		self.engine.list_peers().await
	}

	pub async fn set_peer_enabled(&self, id: &PeerId, enabled: bool) -> Result<Peer> {
		self.engine.set_peer_enabled(id, enabled).await
	}

	pub async fn rename_peer(&self, id: &PeerId, name: &str) -> Result<Peer> {
		self.engine.rename_peer(id, name).await
	}

	pub async fn create_peer(&self, new: NewPeerRecord) -> Result<Peer> {
		self.engine.create_peer(new).await
	}

	pub async fn channel_health(&self) -> ChannelHealth {
		self.engine.channel_health().await
	}

	/// Describes the control channel target, for logs.
	pub fn channel_target(&self) -> String {
		self.engine.channel().describe()
	}

	/// Releases the control channel session.
	pub async fn shutdown(&self) {
		self.engine.channel().shutdown().await;
	}
}
