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

//! Bourse Settlement
//!
//! This crate owns the ledger store (trader registry and holdings) and the
//! settlement coordinator, the single entry point for order placement. A
//! submission runs as one atomic unit: admission check, counter-order
//! locking, pure fill planning, holding transfers, and order insertion
//! either all become visible together or not at all.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod ledger;

pub use config::CoordinatorConfig;
pub use coordinator::SettlementCoordinator;
pub use error::SettlementError;
pub use ledger::{LedgerError, LedgerStore, LockedHolding};
