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

use bourse_sdk::types::OrderId;
use tracing::debug;

use crate::store::LockedOrder;
use crate::types::{Fill, FillPlan, NewOrder};

/// Compute the fill plan for an incoming order against a locked counter set
///
/// Pure over its inputs: nothing is mutated, so the settlement coordinator
/// can validate the plan (balances, invariants) before touching any row.
///
/// The counter-orders arrive already sorted by price-time priority; this
/// function walks them in that order, matching `min(needed, available)`
/// against each at the *maker's* price, and stops early once the taker is
/// fully covered. An exactly consumed counter-order ends with
/// `fulfilled == quantity` and drops out of all future eligibility queries
/// on its own.
pub fn plan(taker_id: OrderId, taker: &NewOrder, counters: &[LockedOrder]) -> FillPlan {
	let mut fills = Vec::new();
	let mut maker_fulfilled = Vec::new();
	let mut needed = taker.quantity;

	for counter in counters {
		if needed == 0 {
			break;
		}

		let available = counter.remaining();
		if available == 0 {
			continue;
		}

		let matched = needed.min(available);
		fills.push(Fill {
			maker_order_id: counter.id(),
			taker_order_id: taker_id,
			quantity: matched,
			price: counter.price(),
		});
		maker_fulfilled.push((counter.id(), counter.fulfilled() + matched));
		needed -= matched;
	}

	let taker_fulfilled = taker.quantity - needed;
	debug!(
		taker_id,
		taker_fulfilled,
		fills = fills.len(),
		"Computed fill plan"
	);

	FillPlan {
		fills,
		taker_fulfilled,
		maker_fulfilled,
	}
}
