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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Trader identifier, assigned by the ledger store on registration.
pub type TraderId = u64;

/// Order identifier, assigned by the order book store on insertion.
///
/// Order IDs are monotonically increasing and double as the creation
/// sequence number used for the time half of price-time priority.
pub type OrderId = u64;

/// Reserved ticker symbol denoting a trader's cash holding.
pub const CASH_TICKER: &str = "$";

/// Order side (bid = buy, ask = sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
	Bid,
	Ask,
}

impl Side {
	/// The side a resting order must have to be a counter-order
	pub fn opposite(self) -> Side {
		match self {
			Side::Bid => Side::Ask,
			Side::Ask => Side::Bid,
		}
	}
}

/// A registered trader
///
/// Created once via `POST /traders`; immutable thereafter. Orders and
/// holdings reference the trader by id only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trader {
	pub id: TraderId,
	pub name: String,
}

/// Request to register a trader
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterTraderRequest {
	pub name: String,
}

/// Request to place an order
///
/// The `type` field carries the side on the wire, matching the exchange's
/// historical column name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
	pub trader_id: TraderId,
	pub ticker: String,
	#[serde(rename = "type")]
	pub side: Side,
	pub quantity: u64,
	pub price: u64,
}

/// Order state as reported by the gateway
///
/// `fulfilled` is the cumulative quantity already matched. It starts at 0
/// (or at the trade-derived value when the order crosses the book on
/// submission) and only ever increases; `0 <= fulfilled <= quantity` holds
/// at every observable instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
	pub id: OrderId,
	pub trader_id: TraderId,
	pub ticker: String,
	#[serde(rename = "type")]
	pub side: Side,
	pub price: u64,
	pub quantity: u64,
	pub fulfilled: u64,
	pub created_at: DateTime<Utc>,
}

/// Response to `GET /orders`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrdersResponse {
	pub orders: Vec<Order>,
}

/// A trader's holding of one asset (or cash, under [`CASH_TICKER`])
///
/// Quantity is signed: the admission gate only balance-checks bids against
/// cash, so an ask from a trader that never held the asset can legally
/// drive the asset holding below zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holding {
	pub trader_id: TraderId,
	pub ticker: String,
	pub quantity: i64,
}

/// Request to credit a holding (administrative deposit)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositRequest {
	pub amount: u64,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_side_serializes_lowercase() {
		assert_eq!(serde_json::to_string(&Side::Bid).unwrap(), "\"bid\"");
		assert_eq!(serde_json::to_string(&Side::Ask).unwrap(), "\"ask\"");
	}

	#[test]
	fn test_side_opposite() {
		assert_eq!(Side::Bid.opposite(), Side::Ask);
		assert_eq!(Side::Ask.opposite(), Side::Bid);
	}

	#[test]
	fn test_place_order_request_uses_type_field() {
		let request = PlaceOrderRequest {
			trader_id: 7,
			ticker: "X".to_string(),
			side: Side::Bid,
			quantity: 2,
			price: 10,
		};

		let json = serde_json::to_value(&request).unwrap();
		assert_eq!(json["type"], "bid");
		assert_eq!(json["ticker"], "X");
		assert!(json.get("side").is_none());
	}
}
