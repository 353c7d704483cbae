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

use bourse_sdk::types::{OrderId, PlaceOrderRequest, Side, TraderId};
use serde::{Deserialize, Serialize};

/// An order admitted by the gateway and ready to enter the matching
/// pipeline
///
/// This is the incoming (taker) side of a match. It carries no id yet;
/// the settlement coordinator reserves one from the order book store
/// before planning so fill events can reference both orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
	pub trader_id: TraderId,
	pub ticker: String,
	pub side: Side,
	pub price: u64,
	pub quantity: u64,
}

impl From<PlaceOrderRequest> for NewOrder {
	fn from(request: PlaceOrderRequest) -> Self {
		Self {
			trader_id: request.trader_id,
			ticker: request.ticker,
			side: request.side,
			price: request.price,
			quantity: request.quantity,
		}
	}
}

/// One matched quantity/price pair between a taker and a maker order
///
/// The price is always the maker's (resting) price; price improvement
/// favors the taker. This is a named rule, not an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
	pub maker_order_id: OrderId,
	pub taker_order_id: OrderId,
	pub quantity: u64,
	pub price: u64,
}

impl Fill {
	/// Cash moved by this fill (`price * quantity`)
	///
	/// Cannot overflow: the coordinator rejects orders whose full limit
	/// notional overflows before any planning happens, and every fill is
	/// bounded by the taker's limit notional.
	pub fn notional(&self) -> u64 {
		self.price * self.quantity
	}
}

/// The complete, validated outcome of matching one incoming order
///
/// Produced by [`crate::matcher::plan`] without mutating anything, so the
/// settlement coordinator can verify balances before a single row changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillPlan {
	/// Fill events in match order (best-priced, earliest maker first)
	pub fills: Vec<Fill>,
	/// The taker's `fulfilled` value after all fills
	pub taker_fulfilled: u64,
	/// New `fulfilled` value for each matched maker order
	pub maker_fulfilled: Vec<(OrderId, u64)>,
}

impl FillPlan {
	/// Total quantity matched across all fills
	pub fn matched_quantity(&self) -> u64 {
		self.fills.iter().map(|f| f.quantity).sum()
	}
}

/// Error types for order book store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	#[error("Timed out waiting for an order row lock")]
	LockTimeout,
	#[error("Order not found: {0}")]
	OrderNotFound(OrderId),
	#[error("Fill of {delta} would overfill order {order_id} ({fulfilled}/{quantity})")]
	Overfill {
		order_id: OrderId,
		fulfilled: u64,
		quantity: u64,
		delta: u64,
	},
}
