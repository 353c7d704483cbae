//! Integration tests for the settlement coordinator
//!
//! These tests verify the spec-level properties of the
//! matching-and-settlement transaction:
//! - Fill bookkeeping (`0 <= fulfilled <= quantity`, monotone)
//! - Conservation of assets and cash across matches
//! - Admission (bid-side balance check, full limit notional)
//! - Maker-price trades (price improvement favors the taker)
//! - Atomicity under concurrent submission

use std::sync::Arc;

use bourse_matching::NewOrder;
use bourse_sdk::types::{CASH_TICKER, Side, Trader};
use bourse_settlement::{CoordinatorConfig, SettlementCoordinator, SettlementError};

fn coordinator() -> SettlementCoordinator {
	SettlementCoordinator::new(CoordinatorConfig::default())
}

async fn trader_with(
	coordinator: &SettlementCoordinator,
	name: &str,
	holdings: &[(&str, u64)],
) -> Trader {
	let trader = coordinator.ledger().register_trader(name);
	for (ticker, amount) in holdings {
		coordinator
			.ledger()
			.credit(trader.id, ticker, *amount)
			.await
			.unwrap();
	}
	trader
}

fn order(trader: &Trader, ticker: &str, side: Side, price: u64, quantity: u64) -> NewOrder {
	NewOrder {
		trader_id: trader.id,
		ticker: ticker.to_string(),
		side,
		price,
		quantity,
	}
}

#[tokio::test]
async fn test_matching_prices_fill_both_orders() {
	// Scenario A: ask 2@10, then bid 2@10 from another trader
	let coordinator = coordinator();
	let ana = trader_with(&coordinator, "ana", &[("X", 10)]).await;
	let barb = trader_with(&coordinator, "barb", &[(CASH_TICKER, 1000)]).await;

	let ask = coordinator
		.submit(order(&ana, "X", Side::Ask, 10, 2))
		.await
		.unwrap();
	let bid = coordinator
		.submit(order(&barb, "X", Side::Bid, 10, 2))
		.await
		.unwrap();

	let orders = coordinator.book().list_orders().await;
	for placed in orders.iter().filter(|o| o.id == ask.id || o.id == bid.id) {
		assert_eq!(placed.fulfilled, placed.quantity);
	}

	assert_eq!(coordinator.ledger().balance(barb.id, CASH_TICKER), 980);
	assert_eq!(coordinator.ledger().balance(ana.id, CASH_TICKER), 20);
	assert_eq!(coordinator.ledger().balance(barb.id, "X"), 2);
	assert_eq!(coordinator.ledger().balance(ana.id, "X"), 8);
}

#[tokio::test]
async fn test_trade_executes_at_maker_price() {
	// Scenario B: ask 2@8 rests, bid 2@9 crosses; the trade prints at 8
	let coordinator = coordinator();
	let ana = trader_with(&coordinator, "ana", &[("X", 10)]).await;
	let barb = trader_with(&coordinator, "barb", &[(CASH_TICKER, 1000)]).await;

	coordinator
		.submit(order(&ana, "X", Side::Ask, 8, 2))
		.await
		.unwrap();
	let bid = coordinator
		.submit(order(&barb, "X", Side::Bid, 9, 2))
		.await
		.unwrap();

	assert_eq!(bid.fulfilled, 2);
	assert_eq!(coordinator.ledger().balance(barb.id, CASH_TICKER), 984);
	assert_eq!(coordinator.ledger().balance(ana.id, CASH_TICKER), 16);
}

#[tokio::test]
async fn test_insufficient_balance_leaves_no_trace() {
	// Scenario C: bid 1@10 from a trader holding less than 10 in cash
	let coordinator = coordinator();
	let poor = trader_with(&coordinator, "poor", &[(CASH_TICKER, 9)]).await;

	let result = coordinator.submit(order(&poor, "X", Side::Bid, 10, 1)).await;
	assert!(matches!(result, Err(SettlementError::InsufficientBalance)));

	// No order row was created and no holding changed
	assert!(coordinator.book().list_orders().await.is_empty());
	assert_eq!(coordinator.ledger().balance(poor.id, CASH_TICKER), 9);
}

#[tokio::test]
async fn test_bid_admission_uses_full_limit_notional() {
	// The balance check uses price * quantity at the bid's limit, even
	// when the resting ask would fill cheaper (observed-behavior parity).
	let coordinator = coordinator();
	let ana = trader_with(&coordinator, "ana", &[("X", 10)]).await;
	let barb = trader_with(&coordinator, "barb", &[(CASH_TICKER, 17)]).await;

	coordinator
		.submit(order(&ana, "X", Side::Ask, 8, 2))
		.await
		.unwrap();

	// Limit notional 2 * 9 = 18 > 17, although the actual cost would be 16
	let result = coordinator.submit(order(&barb, "X", Side::Bid, 9, 2)).await;
	assert!(matches!(result, Err(SettlementError::InsufficientBalance)));
}

#[tokio::test]
async fn test_ask_is_not_balance_checked() {
	// Asks are never checked against the asset being sold; a short sale
	// settles and drives the asset holding negative.
	let coordinator = coordinator();
	let ana = trader_with(&coordinator, "ana", &[]).await;
	let barb = trader_with(&coordinator, "barb", &[(CASH_TICKER, 1000)]).await;

	coordinator
		.submit(order(&barb, "X", Side::Bid, 10, 1))
		.await
		.unwrap();
	let ask = coordinator
		.submit(order(&ana, "X", Side::Ask, 10, 1))
		.await
		.unwrap();

	assert_eq!(ask.fulfilled, 1);
	assert_eq!(coordinator.ledger().balance(ana.id, "X"), -1);
	assert_eq!(coordinator.ledger().balance(ana.id, CASH_TICKER), 10);
}

#[tokio::test]
async fn test_partial_fill_accumulates() {
	let coordinator = coordinator();
	let ana = trader_with(&coordinator, "ana", &[("X", 10)]).await;
	let barb = trader_with(&coordinator, "barb", &[(CASH_TICKER, 1000)]).await;

	let ask = coordinator
		.submit(order(&ana, "X", Side::Ask, 10, 5))
		.await
		.unwrap();

	let first = coordinator
		.submit(order(&barb, "X", Side::Bid, 10, 2))
		.await
		.unwrap();
	assert_eq!(first.fulfilled, 2);
	assert_eq!(coordinator.book().get_order(ask.id).unwrap().fulfilled, 2);

	let second = coordinator
		.submit(order(&barb, "X", Side::Bid, 10, 3))
		.await
		.unwrap();
	assert_eq!(second.fulfilled, 3);
	assert_eq!(coordinator.book().get_order(ask.id).unwrap().fulfilled, 5);

	assert_eq!(coordinator.ledger().balance(barb.id, "X"), 5);
	assert_eq!(coordinator.ledger().balance(ana.id, CASH_TICKER), 50);
}

#[tokio::test]
async fn test_aggregates_multiple_counter_orders() {
	// Best-priced maker fills first; the bid sweeps 1@8 then 2@9
	let coordinator = coordinator();
	let ana = trader_with(&coordinator, "ana", &[("X", 10)]).await;
	let chris = trader_with(&coordinator, "chris", &[("X", 10)]).await;
	let barb = trader_with(&coordinator, "barb", &[(CASH_TICKER, 1000)]).await;

	coordinator
		.submit(order(&chris, "X", Side::Ask, 9, 2))
		.await
		.unwrap();
	coordinator
		.submit(order(&ana, "X", Side::Ask, 8, 1))
		.await
		.unwrap();

	let bid = coordinator
		.submit(order(&barb, "X", Side::Bid, 10, 3))
		.await
		.unwrap();

	assert_eq!(bid.fulfilled, 3);
	// 1 * 8 + 2 * 9 = 26
	assert_eq!(coordinator.ledger().balance(barb.id, CASH_TICKER), 974);
	assert_eq!(coordinator.ledger().balance(ana.id, CASH_TICKER), 8);
	assert_eq!(coordinator.ledger().balance(chris.id, CASH_TICKER), 18);
}

#[tokio::test]
async fn test_own_orders_are_never_matched() {
	let coordinator = coordinator();
	let ana = trader_with(&coordinator, "ana", &[("X", 10), (CASH_TICKER, 1000)]).await;

	coordinator
		.submit(order(&ana, "X", Side::Ask, 10, 2))
		.await
		.unwrap();
	let bid = coordinator
		.submit(order(&ana, "X", Side::Bid, 10, 2))
		.await
		.unwrap();

	assert_eq!(bid.fulfilled, 0);
	assert_eq!(coordinator.ledger().balance(ana.id, CASH_TICKER), 1000);
}

#[tokio::test]
async fn test_validation_rejections() {
	let coordinator = coordinator();
	let ana = trader_with(&coordinator, "ana", &[(CASH_TICKER, 1000)]).await;

	let zero_quantity = coordinator.submit(order(&ana, "X", Side::Bid, 10, 0)).await;
	assert!(matches!(
		zero_quantity,
		Err(SettlementError::InvalidOrder(_))
	));

	let zero_price = coordinator.submit(order(&ana, "X", Side::Bid, 0, 1)).await;
	assert!(matches!(zero_price, Err(SettlementError::InvalidOrder(_))));

	let cash_ticker = coordinator
		.submit(order(&ana, CASH_TICKER, Side::Bid, 10, 1))
		.await;
	assert!(matches!(cash_ticker, Err(SettlementError::InvalidOrder(_))));

	let ghost = NewOrder {
		trader_id: 999,
		ticker: "X".to_string(),
		side: Side::Ask,
		price: 10,
		quantity: 1,
	};
	assert!(matches!(
		coordinator.submit(ghost).await,
		Err(SettlementError::UnknownTrader(999))
	));
}

#[tokio::test]
async fn test_conservation_across_a_session() {
	let coordinator = coordinator();
	let ana = trader_with(&coordinator, "ana", &[("X", 10), (CASH_TICKER, 1000)]).await;
	let barb = trader_with(&coordinator, "barb", &[("X", 5), (CASH_TICKER, 1000)]).await;
	let chris = trader_with(&coordinator, "chris", &[(CASH_TICKER, 1000)]).await;

	let asset_before = coordinator.ledger().total("X").await;
	let cash_before = coordinator.ledger().total(CASH_TICKER).await;

	coordinator
		.submit(order(&ana, "X", Side::Ask, 10, 4))
		.await
		.unwrap();
	coordinator
		.submit(order(&chris, "X", Side::Bid, 10, 2))
		.await
		.unwrap();
	coordinator
		.submit(order(&barb, "X", Side::Ask, 9, 3))
		.await
		.unwrap();
	coordinator
		.submit(order(&chris, "X", Side::Bid, 12, 4))
		.await
		.unwrap();

	assert_eq!(coordinator.ledger().total("X").await, asset_before);
	assert_eq!(coordinator.ledger().total(CASH_TICKER).await, cash_before);

	// With bid-side admission and seeded sellers, nothing goes negative
	for trader in [&ana, &barb, &chris] {
		assert!(coordinator.ledger().balance(trader.id, CASH_TICKER) >= 0);
		assert!(coordinator.ledger().balance(trader.id, "X") >= 0);
	}

	// Every order respects its fill bounds
	for placed in coordinator.book().list_orders().await {
		assert!(placed.fulfilled <= placed.quantity);
	}
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_submissions_match_exactly_one_pair() {
	// Scenario D: three concurrent submissions where only one pair can
	// match. Whatever the interleaving, exactly that pair fills and the
	// low bid stays open.
	for _ in 0..20 {
		let coordinator = Arc::new(coordinator());
		let ana = trader_with(&coordinator, "ana", &[("S", 10)]).await;
		let barb = trader_with(&coordinator, "barb", &[(CASH_TICKER, 1000)]).await;
		let chris = trader_with(&coordinator, "chris", &[(CASH_TICKER, 1000)]).await;

		let submissions = [
			order(&ana, "S", Side::Ask, 10, 2),
			order(&barb, "S", Side::Bid, 10, 2),
			order(&chris, "S", Side::Bid, 5, 2),
		];
		let mut tasks = Vec::new();
		for submission in submissions {
			let coordinator = coordinator.clone();
			tasks.push(tokio::spawn(
				async move { coordinator.submit(submission).await },
			));
		}
		for task in tasks {
			task.await.unwrap().unwrap();
		}

		let orders = coordinator.book().list_orders().await;
		assert_eq!(orders.len(), 3);

		let filled: u64 = orders.iter().map(|o| o.fulfilled).sum();
		assert_eq!(filled, 4, "exactly one pair of 2 units each");

		let low_bid = orders
			.iter()
			.find(|o| o.trader_id == chris.id)
			.unwrap();
		assert_eq!(low_bid.fulfilled, 0);

		// Settled funds moved between ana and barb only
		assert_eq!(coordinator.ledger().balance(ana.id, CASH_TICKER), 20);
		assert_eq!(coordinator.ledger().balance(barb.id, CASH_TICKER), 980);
		assert_eq!(coordinator.ledger().balance(chris.id, CASH_TICKER), 1000);
		assert_eq!(coordinator.ledger().balance(barb.id, "S"), 2);
	}
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_bids_race_for_one_ask() {
	// Two bids race for a single resting ask; one wins the quantity, the
	// other rests unfilled, and totals stay conserved.
	for _ in 0..20 {
		let coordinator = Arc::new(coordinator());
		let ana = trader_with(&coordinator, "ana", &[("S", 2)]).await;
		let barb = trader_with(&coordinator, "barb", &[(CASH_TICKER, 100)]).await;
		let chris = trader_with(&coordinator, "chris", &[(CASH_TICKER, 100)]).await;

		coordinator
			.submit(order(&ana, "S", Side::Ask, 10, 2))
			.await
			.unwrap();

		let mut tasks = Vec::new();
		for bidder in [&barb, &chris] {
			let coordinator = coordinator.clone();
			let submission = order(bidder, "S", Side::Bid, 10, 2);
			tasks.push(tokio::spawn(
				async move { coordinator.submit(submission).await },
			));
		}
		for task in tasks {
			task.await.unwrap().unwrap();
		}

		let orders = coordinator.book().list_orders().await;
		let ask_row = orders.iter().find(|o| o.trader_id == ana.id).unwrap();
		assert_eq!(ask_row.fulfilled, 2);

		// Exactly one bidder got the asset and paid for it
		let barb_assets = coordinator.ledger().balance(barb.id, "S");
		let chris_assets = coordinator.ledger().balance(chris.id, "S");
		assert_eq!(barb_assets + chris_assets, 2);
		assert!(barb_assets == 2 || chris_assets == 2);
		assert_eq!(coordinator.ledger().total("S").await, 2);
		assert_eq!(coordinator.ledger().total(CASH_TICKER).await, 200);
		assert_eq!(coordinator.ledger().balance(ana.id, CASH_TICKER), 20);
	}
}
