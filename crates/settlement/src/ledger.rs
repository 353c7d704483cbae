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
	atomic::{AtomicI64, AtomicU64, Ordering},
};
use std::time::Duration;

use bourse_matching::CommitGate;
use bourse_sdk::types::{Holding, Trader, TraderId};
use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::info;

/// Error types for ledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
	#[error("Timed out waiting for a holding row lock")]
	LockTimeout,
	#[error("Unknown trader: {0}")]
	UnknownTrader(TraderId),
	#[error("Amount too large")]
	AmountTooLarge,
}

/// One holding row: a trader's quantity of one asset (or cash)
///
/// Quantity is an atomic for lock-free display reads; it is only written
/// while the row lock is held. Rows are created lazily on first use and
/// never deleted.
#[derive(Debug)]
struct HoldingRow {
	trader_id: TraderId,
	ticker: String,
	quantity: AtomicI64,
	lock: Arc<Mutex<()>>,
}

impl HoldingRow {
	fn to_holding(&self) -> Holding {
		Holding {
			trader_id: self.trader_id,
			ticker: self.ticker.clone(),
			quantity: self.quantity.load(Ordering::Acquire),
		}
	}
}

/// A holding row held under its exclusive lock
///
/// Mutation is only possible through the guard; dropping it releases the
/// lock on every exit path, commit or abort.
pub struct LockedHolding {
	row: Arc<HoldingRow>,
	_guard: OwnedMutexGuard<()>,
}

impl LockedHolding {
	pub fn trader_id(&self) -> TraderId {
		self.row.trader_id
	}

	pub fn ticker(&self) -> &str {
		&self.row.ticker
	}

	pub fn quantity(&self) -> i64 {
		self.row.quantity.load(Ordering::Acquire)
	}

	/// Credit this holding
	pub fn deposit(&mut self, amount: i64) -> Result<(), LedgerError> {
		let updated = self
			.quantity()
			.checked_add(amount)
			.ok_or(LedgerError::AmountTooLarge)?;
		self.row.quantity.store(updated, Ordering::Release);
		Ok(())
	}

	/// Debit this holding
	///
	/// Bids are admission-checked against cash before any debit, so cash
	/// never goes negative. Asset debits from asks are deliberately not
	/// checked (observed-behavior parity), so a short sale drives the
	/// holding below zero rather than failing.
	pub fn withdraw(&mut self, amount: i64) -> Result<(), LedgerError> {
		let updated = self
			.quantity()
			.checked_sub(amount)
			.ok_or(LedgerError::AmountTooLarge)?;
		self.row.quantity.store(updated, Ordering::Release);
		Ok(())
	}
}

/// Store of traders and their holdings
pub struct LedgerStore {
	traders: DashMap<TraderId, Trader>,
	next_trader_id: AtomicU64,
	holdings: DashMap<(TraderId, String), Arc<HoldingRow>>,
	gate: CommitGate,
}

impl LedgerStore {
	pub fn new(gate: CommitGate) -> Self {
		Self {
			traders: DashMap::new(),
			next_trader_id: AtomicU64::new(1),
			holdings: DashMap::new(),
			gate,
		}
	}

	/// Register a new trader
	pub fn register_trader(&self, name: impl Into<String>) -> Trader {
		let id = self.next_trader_id.fetch_add(1, Ordering::SeqCst);
		let trader = Trader {
			id,
			name: name.into(),
		};
		self.traders.insert(id, trader.clone());
		info!(trader_id = id, name = %trader.name, "Registered trader");
		trader
	}

	pub fn get_trader(&self, id: TraderId) -> Option<Trader> {
		self.traders.get(&id).map(|t| t.clone())
	}

	/// A trader's quantity for one ticker, 0 if no row exists
	///
	/// Unlocked read; used for display and for the fast-fail admission
	/// pre-check. The authoritative balance check happens again under the
	/// row lock before anything is mutated.
	pub fn balance(&self, trader_id: TraderId, ticker: &str) -> i64 {
		self.holdings
			.get(&(trader_id, ticker.to_string()))
			.map(|row| row.quantity.load(Ordering::Acquire))
			.unwrap_or(0)
	}

	/// Consistent snapshot of one holding row
	///
	/// Takes the commit gate exclusively so the read never lands in the
	/// middle of a transaction's apply phase.
	pub async fn holding(&self, trader_id: TraderId, ticker: &str) -> Holding {
		let _permit = self.gate.snapshot().await;

		self.holdings
			.get(&(trader_id, ticker.to_string()))
			.map(|row| row.to_holding())
			.unwrap_or(Holding {
				trader_id,
				ticker: ticker.to_string(),
				quantity: 0,
			})
	}

	/// Consistent snapshot of every holding row
	///
	/// Rows come back in ascending `(trader_id, ticker)` order. Like
	/// [`LedgerStore::holding`], the copy runs under the exclusive commit
	/// gate so it never catches a transaction mid-apply.
	pub async fn holdings(&self) -> Vec<Holding> {
		let _permit = self.gate.snapshot().await;

		let mut rows: Vec<Holding> = self
			.holdings
			.iter()
			.map(|entry| entry.value().to_holding())
			.collect();
		rows.sort_by(|a, b| {
			a.trader_id
				.cmp(&b.trader_id)
				.then_with(|| a.ticker.cmp(&b.ticker))
		});
		rows
	}

	/// Credit a trader's holding (administrative deposit)
	///
	/// This is how cash and assets enter the system; matches only move
	/// them between holders.
	pub async fn credit(
		&self,
		trader_id: TraderId,
		ticker: &str,
		amount: u64,
	) -> Result<Holding, LedgerError> {
		if self.get_trader(trader_id).is_none() {
			return Err(LedgerError::UnknownTrader(trader_id));
		}
		let amount = i64::try_from(amount).map_err(|_| LedgerError::AmountTooLarge)?;

		let row = self.row(trader_id, ticker);
		let _guard = row.lock.clone().lock_owned().await;
		let _permit = self.gate.begin_apply().await;

		let updated = row
			.quantity
			.load(Ordering::Acquire)
			.checked_add(amount)
			.ok_or(LedgerError::AmountTooLarge)?;
		row.quantity.store(updated, Ordering::Release);
		info!(trader_id, ticker, amount, balance = updated, "Credited holding");

		Ok(row.to_holding())
	}

	/// Lock a set of holding rows for the duration of a transaction
	///
	/// Keys are deduplicated and locked in ascending `(trader_id, ticker)`
	/// order - the canonical order that, together with order rows always
	/// being locked first, keeps concurrent submissions deadlock-free.
	/// Missing rows are created lazily (first credit/debit creates the
	/// row). Each acquisition is bounded by `timeout`; on expiry every
	/// guard taken so far is released and the whole transaction retries.
	pub async fn lock_holdings(
		&self,
		keys: &[(TraderId, String)],
		timeout: Duration,
	) -> Result<Vec<LockedHolding>, LedgerError> {
		let mut keys: Vec<(TraderId, String)> = keys.to_vec();
		keys.sort();
		keys.dedup();

		let mut locked = Vec::with_capacity(keys.len());
		for (trader_id, ticker) in keys {
			let row = self.row(trader_id, &ticker);
			let guard = tokio::time::timeout(timeout, row.lock.clone().lock_owned())
				.await
				.map_err(|_| LedgerError::LockTimeout)?;
			locked.push(LockedHolding { row, _guard: guard });
		}

		Ok(locked)
	}

	/// Total quantity of a ticker across all traders (conservation checks)
	pub async fn total(&self, ticker: &str) -> i64 {
		let _permit = self.gate.snapshot().await;

		self.holdings
			.iter()
			.filter(|entry| entry.key().1 == ticker)
			.map(|entry| entry.value().quantity.load(Ordering::Acquire))
			.sum()
	}

	fn row(&self, trader_id: TraderId, ticker: &str) -> Arc<HoldingRow> {
		self.holdings
			.entry((trader_id, ticker.to_string()))
			.or_insert_with(|| {
				Arc::new(HoldingRow {
					trader_id,
					ticker: ticker.to_string(),
					quantity: AtomicI64::new(0),
					lock: Arc::new(Mutex::new(())),
				})
			})
			.clone()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	use bourse_sdk::types::CASH_TICKER;

	const TIMEOUT: Duration = Duration::from_millis(100);

	fn ledger() -> LedgerStore {
		LedgerStore::new(CommitGate::new())
	}

	#[tokio::test]
	async fn test_register_assigns_monotonic_ids() {
		let ledger = ledger();
		let ana = ledger.register_trader("ana");
		let barb = ledger.register_trader("barb");

		assert!(barb.id > ana.id);
		assert_eq!(ledger.get_trader(ana.id).unwrap().name, "ana");
	}

	#[tokio::test]
	async fn test_balance_defaults_to_zero() {
		let ledger = ledger();
		let trader = ledger.register_trader("ana");

		assert_eq!(ledger.balance(trader.id, "X"), 0);
		assert_eq!(ledger.holding(trader.id, "X").await.quantity, 0);
	}

	#[tokio::test]
	async fn test_credit_creates_row_lazily() {
		let ledger = ledger();
		let trader = ledger.register_trader("ana");

		let holding = ledger.credit(trader.id, CASH_TICKER, 1000).await.unwrap();
		assert_eq!(holding.quantity, 1000);
		assert_eq!(ledger.balance(trader.id, CASH_TICKER), 1000);
	}

	#[tokio::test]
	async fn test_credit_unknown_trader_rejected() {
		let ledger = ledger();
		let result = ledger.credit(42, CASH_TICKER, 1000).await;
		assert!(matches!(result, Err(LedgerError::UnknownTrader(42))));
	}

	#[tokio::test]
	async fn test_lock_holdings_dedupes_and_sorts() {
		let ledger = ledger();
		let ana = ledger.register_trader("ana");
		let barb = ledger.register_trader("barb");

		let keys = vec![
			(barb.id, "X".to_string()),
			(ana.id, "X".to_string()),
			(barb.id, "X".to_string()),
			(ana.id, CASH_TICKER.to_string()),
		];
		let locked = ledger.lock_holdings(&keys, TIMEOUT).await.unwrap();

		let got: Vec<(TraderId, String)> = locked
			.iter()
			.map(|h| (h.trader_id(), h.ticker().to_string()))
			.collect();
		assert_eq!(
			got,
			vec![
				(ana.id, CASH_TICKER.to_string()),
				(ana.id, "X".to_string()),
				(barb.id, "X".to_string()),
			]
		);
	}

	#[tokio::test]
	async fn test_locked_transfer() {
		let ledger = ledger();
		let ana = ledger.register_trader("ana");
		let barb = ledger.register_trader("barb");
		ledger.credit(ana.id, CASH_TICKER, 100).await.unwrap();

		let keys = vec![
			(ana.id, CASH_TICKER.to_string()),
			(barb.id, CASH_TICKER.to_string()),
		];
		let mut locked = ledger.lock_holdings(&keys, TIMEOUT).await.unwrap();
		locked[0].withdraw(30).unwrap();
		locked[1].deposit(30).unwrap();
		drop(locked);

		assert_eq!(ledger.balance(ana.id, CASH_TICKER), 70);
		assert_eq!(ledger.balance(barb.id, CASH_TICKER), 30);
		assert_eq!(ledger.total(CASH_TICKER).await, 100);
	}

	#[tokio::test]
	async fn test_credit_overflow_rejected() {
		let ledger = ledger();
		let ana = ledger.register_trader("ana");
		ledger
			.credit(ana.id, CASH_TICKER, i64::MAX as u64)
			.await
			.unwrap();

		let result = ledger.credit(ana.id, CASH_TICKER, 1).await;
		assert!(matches!(result, Err(LedgerError::AmountTooLarge)));
		// The rejected credit left the balance untouched
		assert_eq!(ledger.balance(ana.id, CASH_TICKER), i64::MAX);
	}

	#[tokio::test]
	async fn test_locked_deposit_overflow_rejected() {
		let ledger = ledger();
		let ana = ledger.register_trader("ana");
		ledger
			.credit(ana.id, CASH_TICKER, i64::MAX as u64)
			.await
			.unwrap();

		let keys = vec![(ana.id, CASH_TICKER.to_string())];
		let mut locked = ledger.lock_holdings(&keys, TIMEOUT).await.unwrap();
		assert!(matches!(
			locked[0].deposit(1),
			Err(LedgerError::AmountTooLarge)
		));
		assert_eq!(locked[0].quantity(), i64::MAX);
	}

	#[tokio::test]
	async fn test_holdings_snapshot_sorted() {
		let ledger = ledger();
		let ana = ledger.register_trader("ana");
		let barb = ledger.register_trader("barb");
		ledger.credit(barb.id, "X", 5).await.unwrap();
		ledger.credit(ana.id, "X", 1).await.unwrap();
		ledger.credit(ana.id, CASH_TICKER, 100).await.unwrap();

		let rows = ledger.holdings().await;
		let keys: Vec<(TraderId, String)> = rows
			.iter()
			.map(|h| (h.trader_id, h.ticker.clone()))
			.collect();
		assert_eq!(
			keys,
			vec![
				(ana.id, CASH_TICKER.to_string()),
				(ana.id, "X".to_string()),
				(barb.id, "X".to_string()),
			]
		);
	}

	#[tokio::test]
	async fn test_lock_timeout_bounded() {
		let ledger = ledger();
		let ana = ledger.register_trader("ana");

		let keys = vec![(ana.id, CASH_TICKER.to_string())];
		let held = ledger.lock_holdings(&keys, TIMEOUT).await.unwrap();

		let result = ledger
			.lock_holdings(&keys, Duration::from_millis(20))
			.await;
		assert!(matches!(result, Err(LedgerError::LockTimeout)));

		drop(held);
		assert!(ledger.lock_holdings(&keys, TIMEOUT).await.is_ok());
	}
}
