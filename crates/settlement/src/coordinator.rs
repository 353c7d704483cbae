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
use std::time::Duration;

use bourse_matching::{CommitGate, LockedOrder, NewOrder, OrderBookStore, plan};
use bourse_sdk::types::{CASH_TICKER, Order, Side, TraderId};
use tracing::{info, warn};

use crate::config::CoordinatorConfig;
use crate::error::SettlementError;
use crate::ledger::{LedgerStore, LockedHolding};

/// The single entry point for order placement
///
/// Owns both stores and the commit gate they share, and threads every
/// lock guard through one call chain with release on every exit path -
/// success, business-rule rejection, or unexpected failure. A submission
/// either commits all of its effects (new order row, maker `fulfilled`
/// bumps, holding transfers) or none of them.
pub struct SettlementCoordinator {
	book: Arc<OrderBookStore>,
	ledger: Arc<LedgerStore>,
	gate: CommitGate,
	config: CoordinatorConfig,
}

impl SettlementCoordinator {
	pub fn new(config: CoordinatorConfig) -> Self {
		let gate = CommitGate::new();
		Self {
			book: Arc::new(OrderBookStore::new(gate.clone())),
			ledger: Arc::new(LedgerStore::new(gate.clone())),
			gate,
			config,
		}
	}

	/// The order book store (for display queries)
	pub fn book(&self) -> &Arc<OrderBookStore> {
		&self.book
	}

	/// The ledger store (registration, deposits, display queries)
	pub fn ledger(&self) -> &Arc<LedgerStore> {
		&self.ledger
	}

	/// Submit an order: match, settle, and insert as one atomic unit
	///
	/// Lock-contention timeouts abort the whole transaction (no partial
	/// mutation is ever visible) and are retried transparently with a
	/// small backoff; once the retry budget is spent the conflict
	/// surfaces to the caller as a transient failure.
	pub async fn submit(&self, order: NewOrder) -> Result<Order, SettlementError> {
		let notional = self.validate(&order)?;

		let mut attempt = 0;
		loop {
			match self.try_submit(&order, notional).await {
				Err(SettlementError::Conflict) if attempt < self.config.max_retries => {
					attempt += 1;
					warn!(
						trader_id = order.trader_id,
						ticker = %order.ticker,
						attempt,
						"Submission conflicted, retrying"
					);
					tokio::time::sleep(Duration::from_millis(self.config.retry_backoff_ms)).await;
				}
				result => return result,
			}
		}
	}

	fn validate(&self, order: &NewOrder) -> Result<u64, SettlementError> {
		if order.quantity == 0 {
			return Err(SettlementError::InvalidOrder(
				"Quantity must be positive".to_string(),
			));
		}
		if order.price == 0 {
			return Err(SettlementError::InvalidOrder(
				"Price must be positive".to_string(),
			));
		}
		if order.ticker.is_empty() || order.ticker == CASH_TICKER {
			return Err(SettlementError::InvalidOrder(format!(
				"Invalid ticker: {:?}",
				order.ticker
			)));
		}
		if self.ledger.get_trader(order.trader_id).is_none() {
			return Err(SettlementError::UnknownTrader(order.trader_id));
		}

		// The full limit notional bounds every cash movement in the
		// transaction; requiring it to fit in i64 here means no transfer
		// arithmetic can overflow later.
		order
			.price
			.checked_mul(order.quantity)
			.filter(|n| i64::try_from(*n).is_ok())
			.ok_or_else(|| {
				SettlementError::InvalidOrder("Order notional too large".to_string())
			})
	}

	/// One attempt at the atomic matching-and-settlement transaction
	async fn try_submit(&self, order: &NewOrder, notional: u64) -> Result<Order, SettlementError> {
		// Admission pre-check against the unlocked balance. Bids must
		// cover their full limit notional in cash; asks are deliberately
		// not checked against the asset being sold.
		if order.side == Side::Bid
			&& self.ledger.balance(order.trader_id, CASH_TICKER) < notional as i64
		{
			return Err(SettlementError::InsufficientBalance);
		}

		let timeout = Duration::from_millis(self.config.lock_timeout_ms);

		// Lock eligible counter-orders, then plan - read-only - against
		// the locked set.
		let mut counters = self
			.book
			.lock_eligible(order, order.quantity, timeout)
			.await?;
		let taker_id = self.book.reserve_id();
		let fill_plan = plan(taker_id, order, &counters);

		// Lock every holding the plan touches: taker cash and asset,
		// plus each maker's cash and asset. Order rows are already held,
		// and lock_holdings acquires in canonical ascending key order.
		let mut keys: Vec<(TraderId, String)> = vec![
			(order.trader_id, CASH_TICKER.to_string()),
			(order.trader_id, order.ticker.clone()),
		];
		for counter in &counters {
			keys.push((counter.trader_id(), CASH_TICKER.to_string()));
			keys.push((counter.trader_id(), order.ticker.clone()));
		}
		let mut holdings = self.ledger.lock_holdings(&keys, timeout).await?;

		// Final admission check under the lock; the pre-check read may
		// have raced a concurrent debit. Nothing has been mutated yet, so
		// rejecting here just drops every guard.
		if order.side == Side::Bid {
			let cash = holding_index(&holdings, order.trader_id, CASH_TICKER)?;
			if holdings[cash].quantity() < notional as i64 {
				return Err(SettlementError::InsufficientBalance);
			}
		}

		// Apply phase. Held in shared mode: transactions on disjoint rows
		// commit concurrently, while snapshot readers drain all appliers.
		let permit = self.gate.begin_apply().await;

		for fill in &fill_plan.fills {
			let maker_trader = apply_maker_fill(&mut counters, fill.maker_order_id, fill.quantity)?;

			let (buyer, seller) = match order.side {
				Side::Bid => (order.trader_id, maker_trader),
				Side::Ask => (maker_trader, order.trader_id),
			};

			// Asset moves seller -> buyer, cash moves buyer -> seller at
			// the maker's price.
			let quantity = fill.quantity as i64;
			let cash = fill.notional() as i64;

			let idx = holding_index(&holdings, buyer, &order.ticker)?;
			holdings[idx].deposit(quantity)?;
			let idx = holding_index(&holdings, seller, &order.ticker)?;
			holdings[idx].withdraw(quantity)?;
			let idx = holding_index(&holdings, buyer, CASH_TICKER)?;
			holdings[idx].withdraw(cash)?;
			let idx = holding_index(&holdings, seller, CASH_TICKER)?;
			holdings[idx].deposit(cash)?;
		}

		// Insertion publishes the transaction: an observer that can see
		// this row can already see every transfer above.
		let row = self
			.book
			.insert_order(taker_id, order, fill_plan.taker_fulfilled);
		drop(permit);

		info!(
			order_id = taker_id,
			trader_id = order.trader_id,
			ticker = %order.ticker,
			side = ?order.side,
			fulfilled = fill_plan.taker_fulfilled,
			fills = fill_plan.fills.len(),
			"Order settled"
		);

		Ok(row.to_order())
	}
}

/// Find a locked holding by key
///
/// Every key was passed to `lock_holdings`, so a miss is a coordinator
/// bug, surfaced as a storage failure rather than a panic.
fn holding_index(
	holdings: &[LockedHolding],
	trader_id: TraderId,
	ticker: &str,
) -> Result<usize, SettlementError> {
	holdings
		.iter()
		.position(|h| h.trader_id() == trader_id && h.ticker() == ticker)
		.ok_or_else(|| {
			SettlementError::Storage(format!("Holding lock missing for ({trader_id}, {ticker})"))
		})
}

/// Bump a locked maker order's `fulfilled`, returning its trader
///
/// The plan was computed against the same locked rows, so the fill can
/// never overfill; if it somehow does, the error surfaces as a storage
/// failure before any further mutation.
fn apply_maker_fill(
	counters: &mut [LockedOrder],
	maker_order_id: u64,
	quantity: u64,
) -> Result<TraderId, SettlementError> {
	let maker = counters
		.iter_mut()
		.find(|c| c.id() == maker_order_id)
		.ok_or_else(|| {
			SettlementError::Storage(format!("Order lock missing for {maker_order_id}"))
		})?;
	maker.apply_fill(quantity)?;
	Ok(maker.trader_id())
}
