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

use bourse_matching::StoreError;
use bourse_sdk::types::TraderId;
use thiserror::Error;

use crate::ledger::LedgerError;

/// Error taxonomy for order submission
///
/// `InsufficientBalance` is expected and user-correctable; `Conflict` is
/// transient contention that the coordinator already retried a bounded
/// number of times; everything else is fatal to the current operation.
/// Whatever the failure, no partial mutation is ever visible.
#[derive(Debug, Error)]
pub enum SettlementError {
	#[error("Balance not high enough")]
	InsufficientBalance,
	#[error("Submission conflicted with concurrent transactions")]
	Conflict,
	#[error("Invalid order: {0}")]
	InvalidOrder(String),
	#[error("Unknown trader: {0}")]
	UnknownTrader(TraderId),
	#[error("Storage failure: {0}")]
	Storage(String),
}

impl From<StoreError> for SettlementError {
	fn from(err: StoreError) -> Self {
		match err {
			StoreError::LockTimeout => SettlementError::Conflict,
			other => SettlementError::Storage(other.to_string()),
		}
	}
}

impl From<LedgerError> for SettlementError {
	fn from(err: LedgerError) -> Self {
		match err {
			LedgerError::LockTimeout => SettlementError::Conflict,
			LedgerError::UnknownTrader(id) => SettlementError::UnknownTrader(id),
			other => SettlementError::Storage(other.to_string()),
		}
	}
}
