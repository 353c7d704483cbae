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

//! Bourse Matching
//!
//! This crate provides the order book store and the matching engine for
//! the exchange. The store keeps every order ever submitted behind
//! per-row exclusive locks; the matcher computes a pure, side-effect-free
//! fill plan over a locked set of counter-orders, applying deterministic
//! price-time priority with the maker's price winning every trade.
//!
//! Architecture:
//! - Per-row async locks for resting orders; lock-free atomic reads for
//!   display queries
//! - Counter-orders locked in priority order, bounded waits only
//! - A shared commit gate so snapshot readers never observe a half-applied
//!   transaction

pub mod gate;
pub mod matcher;
pub mod store;
pub mod types;

pub use gate::CommitGate;
pub use matcher::plan;
pub use store::{LockedOrder, OrderBookStore};
pub use types::{Fill, FillPlan, NewOrder, StoreError};
