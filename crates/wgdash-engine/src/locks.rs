// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use wgdash_store::PeerId;

/// Mutual exclusion keyed by peer id. Entries live only while some task
/// holds or waits for them.
#[derive(Debug, Default)]
pub(crate) struct PeerLocks {
	locks: Mutex<HashMap<PeerId, Arc<AsyncMutex<()>>>>,
}

pub(crate) struct PeerLockGuard<'a> {
	owner: &'a PeerLocks,
	id: PeerId,
	guard: Option<OwnedMutexGuard<()>>,
}

impl PeerLocks {
	fn map(&self) -> MutexGuard<'_, HashMap<PeerId, Arc<AsyncMutex<()>>>> {
		self.locks.lock().unwrap_or_else(|e| e.into_inner())
	}

	pub(crate) async fn acquire(&self, id: &PeerId) -> PeerLockGuard<'_> {
		let lock = Arc::clone(self.map().entry(id.clone()).or_default());
		let guard = lock.lock_owned().await;
		PeerLockGuard {
			owner: self,
			id: id.clone(),
			guard: Some(guard),
		}
	}

	#[cfg(test)]
	fn len(&self) -> usize {
		self.map().len()
	}
}

impl Drop for PeerLockGuard<'_> {
	fn drop(&mut self) {
		drop(self.guard.take());
		let mut map = self.owner.map();
		if map
			.get(&self.id)
			.is_some_and(|lock| Arc::strong_count(lock) == 1)
		{
			map.remove(&self.id);
		}
	}
}
