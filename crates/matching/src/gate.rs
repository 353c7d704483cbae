// Copyright 2026 bourse authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Arc;

use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

/// Commit gate shared by the order book store and the ledger store
///
/// Submissions already serialize against each other through per-row locks;
/// the gate exists for observers. A settlement transaction holds the gate
/// in *shared* mode while it applies its mutations, so transactions on
/// disjoint rows still commit concurrently. A snapshot reader takes the
/// gate *exclusively*, which drains every in-flight apply phase and blocks
/// new ones for the duration of the copy. An observer therefore never sees
/// a taker's order row without the holding updates that settled it, or
/// vice versa.
#[derive(Clone, Default)]
pub struct CommitGate {
	inner: Arc<RwLock<()>>,
}

impl CommitGate {
	pub fn new() -> Self {
		Self::default()
	}

	/// Enter the apply phase of a settlement transaction (shared)
	pub async fn begin_apply(&self) -> ApplyPermit {
		ApplyPermit {
			_guard: self.inner.clone().read_owned().await,
		}
	}

	/// Take a consistent snapshot of store state (exclusive)
	pub async fn snapshot(&self) -> SnapshotPermit {
		SnapshotPermit {
			_guard: self.inner.clone().write_owned().await,
		}
	}
}

/// Held by a settlement transaction for the duration of its mutations
pub struct ApplyPermit {
	_guard: OwnedRwLockReadGuard<()>,
}

/// Held by a reader that needs an atomic view across both stores
pub struct SnapshotPermit {
	_guard: OwnedRwLockWriteGuard<()>,
}
