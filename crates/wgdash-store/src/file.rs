// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::error::{Result, StoreError};
use crate::model::{NewPeerRecord, PeerId, PeerRecord};
use crate::records::RecordSet;
use crate::store::PeerRecordStore;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};
use wgdash_wg_common::PublicKey;

/// Stores all records in one JSON document.
///
/// The file is read once at open. Every change is applied to a copy,
/// written to `<path>.tmp` and renamed into place while the write lock is
/// held; the in-memory set is only replaced once the rename succeeds, so a
/// failed write leaves both memory and disk on the previous version.
#[derive(Debug)]
pub struct JsonFilePeerStore {
	path: PathBuf,
	records: RwLock<RecordSet>,
}

impl JsonFilePeerStore {
	/// Loads the store at `path`. A missing file is an empty store; an
	/// unreadable or invalid file is an error.
	#[instrument(skip_all, fields(path = %path.as_ref().display()))]
	pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref().to_path_buf();

		let records = match tokio::fs::read_to_string(&path).await {
			Ok(contents) => {
				let set: RecordSet = serde_json::from_str(&contents)?;
				set.check().map_err(|message| StoreError::Corrupt {
					path: path.clone(),
					message,
				})?;
				info!(peers = set.records().len(), "loaded peer store");
				set
			}
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				info!("peer store not found, starting empty");
				RecordSet::new()
			}
			Err(source) => return Err(StoreError::Io { path, source }),
		};

		Ok(Self {
			path,
			records: RwLock::new(records),
		})
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	async fn persist(&self, set: &RecordSet) -> Result<()> {
		let io_err = |source| StoreError::Io {
			path: self.path.clone(),
			source,
		};

		if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
			tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
		}

		let json = serde_json::to_string_pretty(set)?;
		let mut tmp = self.path.clone().into_os_string();
		tmp.push(".tmp");
		let tmp = PathBuf::from(tmp);

		// Contents reach the disk before the rename makes them visible.
		let mut file = tokio::fs::File::create(&tmp).await.map_err(io_err)?;
		file.write_all(json.as_bytes()).await.map_err(io_err)?;
		file.sync_all().await.map_err(io_err)?;
		drop(file);
		tokio::fs::rename(&tmp, &self.path).await.map_err(io_err)?;
		debug!(path = %self.path.display(), "peer store written");
		Ok(())
	}

	/// Applies `change` to a copy of the set, persists it, then publishes it.
	async fn update<F>(&self, change: F) -> Result<PeerRecord>
	where
		F: FnOnce(&mut RecordSet) -> Result<PeerRecord> + Send,
	{
		let mut guard = self.records.write().await;
		let mut next = guard.clone();
		let record = change(&mut next)?;
		self.persist(&next).await?;
		*guard = next;
		Ok(record)
	}
}

#[async_trait]
impl PeerRecordStore for JsonFilePeerStore {
	async fn list(&self) -> Result<Vec<PeerRecord>> {
		Ok(self.records.read().await.records().to_vec())
	}

	async fn get(&self, id: &PeerId) -> Result<PeerRecord> {
		self.records.read().await.get(id).cloned()
	}

	async fn get_by_public_key(&self, key: &PublicKey) -> Result<PeerRecord> {
		self.records.read().await.get_by_public_key(key).cloned()
	}

	#[instrument(skip(self), fields(peer_id = %id))]
	async fn rename(&self, id: &PeerId, new_name: &str) -> Result<PeerRecord> {
		self.update(|set| set.rename(id, new_name)).await
	}

	#[instrument(skip(self, new), fields(public_key = %new.public_key))]
	async fn create(&self, new: NewPeerRecord) -> Result<PeerRecord> {
		self.update(|set| set.create(new)).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;
	use wgdash_wg_common::KEY_LEN;

	fn new_record(byte: u8, name: &str, ip: &str) -> NewPeerRecord {
		NewPeerRecord {
			public_key: PublicKey::from_bytes([byte; KEY_LEN]),
			name: name.to_string(),
			internal_ip: ip.parse().unwrap(),
		}
	}

	async fn create_test_store() -> (JsonFilePeerStore, TempDir) {
		let tmp = TempDir::new().unwrap();
		let store = JsonFilePeerStore::open(tmp.path().join("state").join("peers.json"))
			.await
			.unwrap();
		(store, tmp)
	}

	#[tokio::test]
	async fn missing_file_is_empty_store() {
		let (store, _tmp) = create_test_store().await;
		assert!(store.list().await.unwrap().is_empty());
		assert!(!store.path().exists());
	}

	#[tokio::test]
	async fn records_survive_reopen() {
		let (store, _tmp) = create_test_store().await;
		let laptop = store
			.create(new_record(1, "John's MacBook Pro", "10.0.0.2/32"))
			.await
			.unwrap();
		store
			.create(new_record(2, "Phone", "10.0.0.3/32"))
			.await
			.unwrap();
		store.rename(&laptop.id, "Work Laptop").await.unwrap();

		let reopened = JsonFilePeerStore::open(store.path()).await.unwrap();
		let peers = reopened.list().await.unwrap();
		assert_eq!(peers.len(), 2);
		assert_eq!(peers[0].id, laptop.id);
		assert_eq!(peers[0].name, "Work Laptop");
		assert_eq!(peers[1].name, "Phone");
	}

	#[tokio::test]
	async fn blank_rename_leaves_file_untouched() {
		let (store, _tmp) = create_test_store().await;
		let record = store
			.create(new_record(1, "laptop", "10.0.0.2/32"))
			.await
			.unwrap();
		let before = std::fs::read_to_string(store.path()).unwrap();

		let err = store.rename(&record.id, "  ").await.unwrap_err();
		assert!(matches!(err, StoreError::EmptyName));
		assert_eq!(std::fs::read_to_string(store.path()).unwrap(), before);
		assert_eq!(store.get(&record.id).await.unwrap().name, "laptop");
	}

	#[tokio::test]
	async fn rename_unknown_id_is_not_found() {
		let (store, _tmp) = create_test_store().await;
		let err = store
			.rename(&PeerId::from("nope"), "name")
			.await
			.unwrap_err();
		assert!(matches!(err, StoreError::NotFound(_)));
	}

	#[tokio::test]
	async fn no_temp_file_left_behind() {
		let (store, tmp) = create_test_store().await;
		store
			.create(new_record(1, "laptop", "10.0.0.2/32"))
			.await
			.unwrap();

		let leftovers: Vec<_> = std::fs::read_dir(tmp.path().join("state"))
			.unwrap()
			.filter_map(|e| e.ok())
			.filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
			.collect();
		assert!(leftovers.is_empty());
	}

	#[tokio::test]
	async fn stale_temp_file_is_overwritten() {
		let tmp = TempDir::new().unwrap();
		let path = tmp.path().join("peers.json");
		// Leftover from an interrupted write, longer than the next document.
		std::fs::write(tmp.path().join("peers.json.tmp"), "x".repeat(64 * 1024)).unwrap();

		let store = JsonFilePeerStore::open(&path).await.unwrap();
		let record = store
			.create(new_record(1, "laptop", "10.0.0.2/32"))
			.await
			.unwrap();

		assert!(!tmp.path().join("peers.json.tmp").exists());
		let reopened = JsonFilePeerStore::open(&path).await.unwrap();
		assert_eq!(reopened.get(&record.id).await.unwrap().name, "laptop");
	}

	#[tokio::test]
	async fn failed_write_keeps_previous_state() {
		let tmp = TempDir::new().unwrap();
		let path = tmp.path().join("peers.json");
		let store = JsonFilePeerStore::open(&path).await.unwrap();
		store
			.create(new_record(1, "laptop", "10.0.0.2/32"))
			.await
			.unwrap();

		// A directory squatting on the temp path makes the write fail.
		std::fs::create_dir(tmp.path().join("peers.json.tmp")).unwrap();
		assert!(store
			.create(new_record(2, "phone", "10.0.0.3/32"))
			.await
			.is_err());
		assert_eq!(store.list().await.unwrap().len(), 1);
	}

	#[tokio::test]
	async fn accepts_bare_addresses_on_load() {
		let tmp = TempDir::new().unwrap();
		let path = tmp.path().join("peers.json");
		let key = PublicKey::from_bytes([9u8; KEY_LEN]);
		std::fs::write(
			&path,
			format!(
				r#"{{"peers":[{{"id":"1","publicKey":"{key}","name":"Router","internalIp":"10.0.0.9"}}]}}"#
			),
		)
		.unwrap();

		let store = JsonFilePeerStore::open(&path).await.unwrap();
		let record = store.get_by_public_key(&key).await.unwrap();
		assert_eq!(record.internal_ip.to_string(), "10.0.0.9/32");
	}

	#[tokio::test]
	async fn invalid_file_is_an_error() {
		let tmp = TempDir::new().unwrap();
		let path = tmp.path().join("peers.json");
		std::fs::write(&path, "{ not json").unwrap();
		assert!(matches!(
			JsonFilePeerStore::open(&path).await,
			Err(StoreError::Serialization(_))
		));
	}

	#[tokio::test]
	async fn duplicate_keys_in_file_are_corrupt() {
		let tmp = TempDir::new().unwrap();
		let path = tmp.path().join("peers.json");
		let key = PublicKey::from_bytes([9u8; KEY_LEN]);
		std::fs::write(
			&path,
			format!(
				r#"{{"peers":[
					{{"id":"1","publicKey":"{key}","name":"a","internalIp":"10.0.0.2/32"}},
					{{"id":"2","publicKey":"{key}","name":"b","internalIp":"10.0.0.3/32"}}
				]}}"#
			),
		)
		.unwrap();
		assert!(matches!(
			JsonFilePeerStore::open(&path).await,
			Err(StoreError::Corrupt { .. })
		));
	}
}
