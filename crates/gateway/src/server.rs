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

use actix_web::{App, HttpServer, web};
use anyhow::{Context, Result};
use bourse_settlement::{CoordinatorConfig, SettlementCoordinator};
use tracing::info;

use crate::config::GatewayRuntimeConfig;
use crate::middleware::LoggingMiddleware;
use crate::routes::configure_routes;

/// Gateway server state shared across workers
#[derive(Clone)]
pub struct GatewayState {
	pub coordinator: Arc<SettlementCoordinator>,
}

/// Gateway server
pub struct GatewayServer {
	state: GatewayState,
	config: GatewayRuntimeConfig,
}

impl GatewayServer {
	/// Create a new gateway server with an empty book and ledger
	pub fn new(config: GatewayRuntimeConfig) -> Result<Self> {
		let coordinator_config = CoordinatorConfig::from_env()
			.context("Failed to load settlement coordinator configuration")?;
		let coordinator = Arc::new(SettlementCoordinator::new(coordinator_config));

		Ok(Self {
			state: GatewayState { coordinator },
			config,
		})
	}

	/// Start the HTTP server and serve until shutdown
	pub async fn serve(self) -> Result<()> {
		let state = self.state.clone();
		let max_body_bytes = self.config.max_body_bytes;

		info!(
			target: "server",
			workers = self.config.workers,
			max_body_bytes,
			"Starting HTTP server on {}",
			self.config.bind_addr
		);

		HttpServer::new(move || {
			App::new()
				.app_data(web::Data::new(state.clone()))
				.app_data(web::JsonConfig::default().limit(max_body_bytes))
				.wrap(LoggingMiddleware)
				.configure(configure_routes)
		})
		.workers(self.config.workers)
		.bind(self.config.bind_addr)
		.with_context(|| format!("Failed to bind {}", self.config.bind_addr))?
		.run()
		.await
		.context("HTTP server terminated abnormally")?;

		Ok(())
	}
}
