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

use std::time::Duration;

use reqwest::Client as ReqwestClient;
use thiserror::Error;

use crate::types::{
	DepositRequest, Holding, Order, OrdersResponse, PlaceOrderRequest, RegisterTraderRequest,
	Trader, TraderId,
};

/// Error types for client operations
#[derive(Debug, Error)]
pub enum ClientError {
	#[error("Network error: {0}")]
	Network(String),
	#[error("Serialization error: {0}")]
	Serialization(String),
	#[error("Insufficient balance")]
	InsufficientBalance,
	#[error("Server error: {0}")]
	Server(String),
}

/// Client for interacting with the exchange gateway
///
/// This is an async client interface using reqwest for HTTP communication.
pub struct Client {
	base_url: String,
	client: ReqwestClient,
}

impl Client {
	/// Create a new client with the given base URL
	pub fn new(base_url: impl Into<String>) -> Self {
		let client = ReqwestClient::builder()
			.timeout(Duration::from_secs(30))
			.build()
			.expect("Failed to create HTTP client");

		Self {
			base_url: base_url.into(),
			client,
		}
	}

	/// Create a new client with a custom request timeout
	pub fn with_config(base_url: impl Into<String>, timeout: Duration) -> Self {
		let client = ReqwestClient::builder()
			.timeout(timeout)
			.build()
			.expect("Failed to create HTTP client");

		Self {
			base_url: base_url.into(),
			client,
		}
	}

	/// Register a new trader
	pub async fn register_trader(&self, name: impl Into<String>) -> Result<Trader, ClientError> {
		let url = format!("{}/traders", self.base_url);
		let request = RegisterTraderRequest { name: name.into() };

		let response = self
			.client
			.post(&url)
			.json(&request)
			.send()
			.await
			.map_err(|e| ClientError::Network(format!("Request failed: {}", e)))?;

		Self::parse_json(response).await
	}

	/// Place an order
	///
	/// A bid whose limit notional (`price * quantity`) exceeds the trader's
	/// cash balance is rejected by the gateway with an empty 400 response,
	/// surfaced here as [`ClientError::InsufficientBalance`].
	pub async fn place_order(&self, request: PlaceOrderRequest) -> Result<Order, ClientError> {
		let url = format!("{}/orders", self.base_url);

		let response = self
			.client
			.post(&url)
			.json(&request)
			.send()
			.await
			.map_err(|e| ClientError::Network(format!("Request failed: {}", e)))?;

		if response.status() == reqwest::StatusCode::BAD_REQUEST {
			return Err(ClientError::InsufficientBalance);
		}

		Self::parse_json(response).await
	}

	/// List every order ever submitted, in insertion order
	pub async fn list_orders(&self) -> Result<Vec<Order>, ClientError> {
		let url = format!("{}/orders", self.base_url);

		let response = self
			.client
			.get(&url)
			.send()
			.await
			.map_err(|e| ClientError::Network(format!("Request failed: {}", e)))?;

		let body: OrdersResponse = Self::parse_json(response).await?;
		Ok(body.orders)
	}

	/// Get a trader's holding for one ticker (0 if none recorded)
	pub async fn get_holding(
		&self,
		trader_id: TraderId,
		ticker: &str,
	) -> Result<Holding, ClientError> {
		let url = format!("{}/portfolios/{}/{}", self.base_url, trader_id, ticker);

		let response = self
			.client
			.get(&url)
			.send()
			.await
			.map_err(|e| ClientError::Network(format!("Request failed: {}", e)))?;

		// The gateway returns an array containing the holding row
		let rows: Vec<Holding> = Self::parse_json(response).await?;
		rows.into_iter()
			.next()
			.ok_or_else(|| ClientError::Server("Empty holding response".to_string()))
	}

	/// Credit a trader's holding (administrative deposit)
	pub async fn deposit(
		&self,
		trader_id: TraderId,
		ticker: &str,
		amount: u64,
	) -> Result<Holding, ClientError> {
		let url = format!(
			"{}/portfolios/{}/{}/deposits",
			self.base_url, trader_id, ticker
		);
		let request = DepositRequest { amount };

		let response = self
			.client
			.post(&url)
			.json(&request)
			.send()
			.await
			.map_err(|e| ClientError::Network(format!("Request failed: {}", e)))?;

		Self::parse_json(response).await
	}

	/// Check gateway health
	pub async fn health_check(&self) -> Result<bool, ClientError> {
		let url = format!("{}/health", self.base_url);

		let response = self
			.client
			.get(&url)
			.send()
			.await
			.map_err(|e| ClientError::Network(format!("Request failed: {}", e)))?;

		Ok(response.status().is_success())
	}

	async fn parse_json<T: serde::de::DeserializeOwned>(
		response: reqwest::Response,
	) -> Result<T, ClientError> {
		if !response.status().is_success() {
			let status = response.status();
			let error_text = response
				.text()
				.await
				.unwrap_or_else(|_| format!("HTTP {}", status));
			return Err(ClientError::Server(format!("{}: {}", status, error_text)));
		}

		response
			.json()
			.await
			.map_err(|e| ClientError::Serialization(format!("Failed to parse response: {}", e)))
	}
}

/// Synchronous client wrapper (for compatibility)
///
/// This wraps the async client and runs it in a tokio runtime.
/// For new code, prefer using the async Client directly.
pub struct SyncClient {
	client: Client,
	runtime: tokio::runtime::Runtime,
}

impl SyncClient {
	/// Create a new synchronous client
	pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
		let runtime = tokio::runtime::Runtime::new()
			.map_err(|e| anyhow::anyhow!("Failed to create tokio runtime: {}", e))?;
		Ok(Self {
			client: Client::new(base_url),
			runtime,
		})
	}

	/// Register a trader (synchronous)
	pub fn register_trader(&self, name: impl Into<String>) -> Result<Trader, ClientError> {
		self.runtime.block_on(self.client.register_trader(name))
	}

	/// Place an order (synchronous)
	pub fn place_order(&self, request: PlaceOrderRequest) -> Result<Order, ClientError> {
		self.runtime.block_on(self.client.place_order(request))
	}

	/// List orders (synchronous)
	pub fn list_orders(&self) -> Result<Vec<Order>, ClientError> {
		self.runtime.block_on(self.client.list_orders())
	}

	/// Get a holding (synchronous)
	pub fn get_holding(&self, trader_id: TraderId, ticker: &str) -> Result<Holding, ClientError> {
		self.runtime
			.block_on(self.client.get_holding(trader_id, ticker))
	}
}
