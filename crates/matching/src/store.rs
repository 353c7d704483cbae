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

use std::sync::{
	Arc,
	atomic::{AtomicU64, Ordering},
};
use std::time::Duration;

use bourse_sdk::types::{Order, OrderId, Side, TraderId};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::gate::CommitGate;
use crate::types::{NewOrder, StoreError};

/// One order row in the book store
///
/// Everything except `fulfilled` is immutable after insertion, so
/// candidate selection can read rows without taking the lock. `fulfilled`
/// is an atomic for lock-free display reads; it is only ever written while
/// the row lock is held, and only upward.
#[derive(Debug)]
pub struct OrderRow {
	pub id: OrderId,
	pub trader_id: TraderId,
	pub ticker: String,
	pub side: Side,
	pub price: u64,
	pub quantity: u64,
	pub created_at: DateTime<Utc>,
	fulfilled: AtomicU64,
	lock: Arc<Mutex<()>>,
}

impl OrderRow {
	/// Cumulative quantity already matched
	pub fn fulfilled(&self) -> u64 {
		self.fulfilled.load(Ordering::Acquire)
	}

	/// Quantity still open (`quantity - fulfilled`)
	pub fn remaining(&self) -> u64 {
		self.quantity - self.fulfilled()
	}

	/// Copy the row into its wire representation
	pub fn to_order(&self) -> Order {
		Order {
			id: self.id,
			trader_id: self.trader_id,
			ticker: self.ticker.clone(),
			side: self.side,
			price: self.price,
			quantity: self.quantity,
			fulfilled: self.fulfilled(),
			created_at: self.created_at,
		}
	}
}

/// An order row held under its exclusive lock
///
/// Returned by [`OrderBookStore::lock_eligible`]; the lock is released
/// when the guard is dropped, whether the enclosing transaction commits
/// or aborts. Mutation is only possible through the guard, which is how
/// `0 <= fulfilled <= quantity` stays enforced.
pub struct LockedOrder {
	row: Arc<OrderRow>,
	_guard: OwnedMutexGuard<()>,
}

impl LockedOrder {
	pub fn id(&self) -> OrderId {
		self.row.id
	}

	pub fn trader_id(&self) -> TraderId {
		self.row.trader_id
	}

	pub fn price(&self) -> u64 {
		self.row.price
	}

	pub fn quantity(&self) -> u64 {
		self.row.quantity
	}

	pub fn fulfilled(&self) -> u64 {
		self.row.fulfilled()
	}

	pub fn remaining(&self) -> u64 {
		self.row.remaining()
	}

	/// Raise the row's `fulfilled` by `delta`
	///
	/// `fulfilled` only ever increases; a delta that would push it past
	/// `quantity` is a planning bug and is rejected without mutating.
	pub fn apply_fill(&mut self, delta: u64) -> Result<(), StoreError> {
		let fulfilled = self.row.fulfilled();
		if delta > self.row.quantity - fulfilled {
			return Err(StoreError::Overfill {
				order_id: self.row.id,
				fulfilled,
				quantity: self.row.quantity,
				delta,
			});
		}
		self.row
			.fulfilled
			.store(fulfilled + delta, Ordering::Release);
		Ok(())
	}
}

/// Store of every order ever submitted
///
/// Rows are inserted by the settlement coordinator inside its apply phase
/// and never deleted; a fully matched order simply stops qualifying as a
/// counter-order because `fulfilled == quantity`.
pub struct OrderBookStore {
	orders: DashMap<OrderId, Arc<OrderRow>>,
	next_id: AtomicU64,
	gate: CommitGate,
}

impl OrderBookStore {
	pub fn new(gate: CommitGate) -> Self {
		Self {
			orders: DashMap::new(),
			next_id: AtomicU64::new(1),
			gate,
		}
	}

	/// Reserve the next order id
	///
	/// The id is assigned before matching so fill events can reference the
	/// taker, and doubles as the creation sequence number for time
	/// priority. An aborted submission leaves a gap, never a duplicate.
	pub fn reserve_id(&self) -> OrderId {
		self.next_id.fetch_add(1, Ordering::SeqCst)
	}

	/// Insert a new order row with the given reserved id
	///
	/// `fulfilled` is 0 for an order that crossed nothing, or the
	/// plan-derived value when the order matched on submission. Callers
	/// insert inside their apply phase; insertion is the publication point
	/// of the whole transaction.
	pub fn insert_order(&self, id: OrderId, order: &NewOrder, fulfilled: u64) -> Arc<OrderRow> {
		debug_assert!(fulfilled <= order.quantity);

		let row = Arc::new(OrderRow {
			id,
			trader_id: order.trader_id,
			ticker: order.ticker.clone(),
			side: order.side,
			price: order.price,
			quantity: order.quantity,
			created_at: Utc::now(),
			fulfilled: AtomicU64::new(fulfilled),
			lock: Arc::new(Mutex::new(())),
		});
		self.orders.insert(id, row.clone());
		row
	}

	/// Lock the resting orders an incoming order may match against
	///
	/// Eligibility: same ticker, opposite side, still open, different
	/// trader, and price-compatible (resting ask at or below a bid's
	/// limit; resting bid at or above an ask's limit).
	///
	/// Qualifying rows are sorted by price-time priority - best maker
	/// price first, earliest id among ties - and locked in that order,
	/// stopping as soon as the locked set can cover `needed`. Fewer locks
	/// held is strictly better, so no fixed cap is applied beyond that.
	///
	/// Deadlock discipline: bids lock ask rows and asks lock bid rows, so
	/// two concurrent submissions never wait on each other's order-row
	/// sets in opposite orders; same-side submissions acquire the same
	/// counter set in the same deterministic order. Each acquisition is
	/// bounded by `timeout`; on expiry every lock taken so far is released
	/// and the caller gets [`StoreError::LockTimeout`] to retry.
	pub async fn lock_eligible(
		&self,
		taker: &NewOrder,
		needed: u64,
		timeout: Duration,
	) -> Result<Vec<LockedOrder>, StoreError> {
		let counter_side = taker.side.opposite();

		let mut candidates: Vec<Arc<OrderRow>> = self
			.orders
			.iter()
			.filter(|entry| {
				let row = entry.value();
				row.ticker == taker.ticker
					&& row.side == counter_side
					&& row.trader_id != taker.trader_id
					&& row.fulfilled() < row.quantity
					&& match taker.side {
						Side::Bid => row.price <= taker.price,
						Side::Ask => row.price >= taker.price,
					}
			})
			.map(|entry| entry.value().clone())
			.collect();

		// Price priority: cheapest ask first for a bid, highest bid first
		// for an ask. Ascending id breaks ties (time priority).
		match taker.side {
			Side::Bid => candidates.sort_by(|a, b| a.price.cmp(&b.price).then(a.id.cmp(&b.id))),
			Side::Ask => candidates.sort_by(|a, b| b.price.cmp(&a.price).then(a.id.cmp(&b.id))),
		}

		let mut locked = Vec::new();
		let mut available: u64 = 0;

		for row in candidates {
			if available >= needed {
				break;
			}

			let guard = tokio::time::timeout(timeout, row.lock.clone().lock_owned())
				.await
				.map_err(|_| StoreError::LockTimeout)?;

			let locked_row = LockedOrder { row, _guard: guard };

			// The unlocked pre-filter may be stale: the row can have been
			// filled while we waited for its lock.
			if locked_row.remaining() == 0 {
				continue;
			}

			available += locked_row.remaining();
			locked.push(locked_row);
		}

		debug!(
			ticker = %taker.ticker,
			side = ?taker.side,
			locked = locked.len(),
			available,
			needed,
			"Locked eligible counter-orders"
		);

		Ok(locked)
	}

	/// Consistent snapshot of every order, in insertion order
	///
	/// Takes the commit gate exclusively so the copy never interleaves
	/// with a transaction's apply phase. Calling this twice with no
	/// intervening submission returns identical results.
	pub async fn list_orders(&self) -> Vec<Order> {
		let _permit = self.gate.snapshot().await;

		let mut orders: Vec<Order> = self
			.orders
			.iter()
			.map(|entry| entry.value().to_order())
			.collect();
		orders.sort_by_key(|order| order.id);
		orders
	}

	/// Look up one order (display read, no locks)
	pub fn get_order(&self, id: OrderId) -> Option<Order> {
		self.orders.get(&id).map(|row| row.to_order())
	}

	pub fn order_count(&self) -> usize {
		self.orders.len()
	}
}
