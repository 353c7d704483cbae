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

use actix_web::web;

use crate::handlers;

/// Configure API routes for the gateway
///
/// This function sets up all HTTP routes for the gateway service:
/// - `/traders` - Trader registration
/// - `/orders` - Order placement and listing
/// - `/portfolios` - Holding listing across all traders
/// - `/portfolios/{trader_id}/{ticker}` - Holding queries and deposits
/// - `/health` - Health check endpoint
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
	cfg.route("/traders", web::post().to(handlers::register_trader))
		.route("/orders", web::post().to(handlers::place_order))
		.route("/orders", web::get().to(handlers::list_orders))
		.route("/portfolios", web::get().to(handlers::list_portfolios))
		.route(
			"/portfolios/{trader_id}/{ticker}",
			web::get().to(handlers::get_holding),
		)
		.route(
			"/portfolios/{trader_id}/{ticker}/deposits",
			web::post().to(handlers::deposit),
		)
		.route("/health", web::get().to(handlers::health));
}
