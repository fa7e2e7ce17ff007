// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::error::{Result, StoreError};
use crate::model::{NewPeerRecord, PeerId, PeerRecord};
use crate::records::RecordSet;
use crate::store::PeerRecordStore;
use async_trait::async_trait;
use tokio::sync::RwLock;
use wgdash_wg_common::PublicKey;

/// Non-durable store, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryPeerStore {
	records: RwLock<RecordSet>,
}

impl MemoryPeerStore {
	pub fn new() -> Self {
		Self {
			records: RwLock::new(RecordSet::new()),
		}
	}

	/// Builds a store holding exactly `records`, which must have unique ids
	/// and public keys.
	pub fn with_records(records: Vec<PeerRecord>) -> Result<Self> {
		let set = RecordSet::from_records(records).map_err(|message| StoreError::Corrupt {
			path: "<memory>".into(),
			message,
		})?;
		Ok(Self {
			records: RwLock::new(set),
		})
	}
}

#[async_trait]
impl PeerRecordStore for MemoryPeerStore {
	async fn list(&self) -> Result<Vec<PeerRecord>> {
		Ok(self.records.read().await.records().to_vec())
	}

	async fn get(&self, id: &PeerId) -> Result<PeerRecord> {
		self.records.read().await.get(id).cloned()
	}

	async fn get_by_public_key(&self, key: &PublicKey) -> Result<PeerRecord> {
		self.records.read().await.get_by_public_key(key).cloned()
	}

	async fn rename(&self, id: &PeerId, new_name: &str) -> Result<PeerRecord> {
		self.records.write().await.rename(id, new_name)
	}

	async fn create(&self, new: NewPeerRecord) -> Result<PeerRecord> {
		self.records.write().await.create(new)
	}
}
