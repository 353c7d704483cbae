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

//! Exchange Gateway Service
//!
//! HTTP front door for the exchange. Traders register, deposit cash and
//! assets, place limit orders, and query the book and their portfolios.
//! Order placement hands off to the settlement coordinator, which runs
//! matching and settlement as one atomic transaction before the response
//! is produced.

mod config;
mod handlers;
mod logging;
mod middleware;
mod routes;
mod server;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::GatewayRuntimeConfig;
use crate::logging::init_logging;
use crate::server::GatewayServer;

#[actix_rt::main]
async fn main() -> Result<()> {
	// Initialize logging first
	init_logging()?;

	let config = GatewayRuntimeConfig::from_env().context("Failed to load gateway configuration")?;
	info!(target: "server", "Starting Bourse Gateway on {}", config.bind_addr);

	let server = GatewayServer::new(config).context("Failed to create gateway server")?;

	info!(target: "server", "Gateway server initialized");

	server.serve().await.context("Failed to start gateway server")?;

	Ok(())
}
