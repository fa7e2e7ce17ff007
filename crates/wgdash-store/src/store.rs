// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::error::Result;
use crate::model::{NewPeerRecord, PeerId, PeerRecord};
use async_trait::async_trait;
use std::sync::Arc;
use wgdash_wg_common::PublicKey;

/// Durable mapping from peer id to its metadata.
///
/// Implementations must make `rename` and `create` atomic with respect to
/// concurrent readers: a reader sees either the old or the new record set,
/// never a partial write.
#[async_trait]
pub trait PeerRecordStore: Send + Sync {
	/// All records in insertion order.
	async fn list(&self) -> Result<Vec<PeerRecord>>;

	async fn get(&self, id: &PeerId) -> Result<PeerRecord>;

	async fn get_by_public_key(&self, key: &PublicKey) -> Result<PeerRecord>;

	/// Sets the display name. The name is trimmed; an empty result is
	/// rejected and the record is left unchanged.
	async fn rename(&self, id: &PeerId, new_name: &str) -> Result<PeerRecord>;

	async fn create(&self, new: NewPeerRecord) -> Result<PeerRecord>;
}

#[async_trait]
impl<S: PeerRecordStore + ?Sized> PeerRecordStore for Arc<S> {
	async fn list(&self) -> Result<Vec<PeerRecord>> {
		(**self).list().await
	}

	async fn get(&self, id: &PeerId) -> Result<PeerRecord> {
		(**self).get(id).await
	}

	async fn get_by_public_key(&self, key: &PublicKey) -> Result<PeerRecord> {
		(**self).get_by_public_key(key).await
	}

	async fn rename(&self, id: &PeerId, new_name: &str) -> Result<PeerRecord> {
		(**self).rename(id, new_name).await
	}

	async fn create(&self, new: NewPeerRecord) -> Result<PeerRecord> {
		(**self).create(new).await
	}
}
