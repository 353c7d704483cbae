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

use actix_web::{HttpResponse, Responder, web};
use bourse_matching::NewOrder;
use bourse_sdk::types::{
	DepositRequest, OrdersResponse, PlaceOrderRequest, RegisterTraderRequest, TraderId,
};
use bourse_settlement::SettlementError;
use thiserror::Error;
use tracing::warn;

use crate::server::GatewayState;

/// Error types for gateway operations
#[derive(Debug, Error)]
pub enum GatewayError {
	#[error(transparent)]
	Settlement(#[from] SettlementError),
}

impl actix_web::ResponseError for GatewayError {
	fn error_response(&self) -> HttpResponse {
		match self {
			// The historical wire contract: a rejected bid gets a bare 400
			// with the reason only in the status line, never a body.
			GatewayError::Settlement(SettlementError::InsufficientBalance) => {
				HttpResponse::BadRequest().finish()
			}
			GatewayError::Settlement(SettlementError::Conflict) => HttpResponse::ServiceUnavailable()
				.json(serde_json::json!({ "error": self.to_string() })),
			GatewayError::Settlement(
				SettlementError::InvalidOrder(_) | SettlementError::UnknownTrader(_),
			) => HttpResponse::BadRequest().json(serde_json::json!({ "error": self.to_string() })),
			GatewayError::Settlement(SettlementError::Storage(_)) => {
				HttpResponse::InternalServerError()
					.json(serde_json::json!({ "error": self.to_string() }))
			}
		}
	}
}

/// Health check endpoint
pub async fn health() -> impl Responder {
	HttpResponse::Ok().json(serde_json::json!({
		"status": "ok",
		"service": "bourse-gateway"
	}))
}

/// Handle trader registration
pub async fn register_trader(
	state: web::Data<GatewayState>,
	request: web::Json<RegisterTraderRequest>,
) -> Result<HttpResponse, GatewayError> {
	let trader = state.coordinator.ledger().register_trader(request.into_inner().name);
	Ok(HttpResponse::Ok().json(trader))
}

/// Handle order placement
///
/// Submission runs the whole matching-and-settlement transaction before
/// responding; the returned order already carries any fills it picked up
/// crossing the book.
pub async fn place_order(
	state: web::Data<GatewayState>,
	request: web::Json<PlaceOrderRequest>,
) -> Result<HttpResponse, GatewayError> {
	let order = NewOrder::from(request.into_inner());
	match state.coordinator.submit(order).await {
		Ok(placed) => Ok(HttpResponse::Ok().json(placed)),
		Err(err) => {
			warn!(error = %err, "Order rejected");
			Err(err.into())
		}
	}
}

/// Handle the order listing query
pub async fn list_orders(state: web::Data<GatewayState>) -> Result<HttpResponse, GatewayError> {
	let orders = state.coordinator.book().list_orders().await;
	Ok(HttpResponse::Ok().json(OrdersResponse { orders }))
}

/// Handle the portfolio listing query
///
/// Every holding row across all traders, in ascending `(trader_id, ticker)`
/// order.
pub async fn list_portfolios(state: web::Data<GatewayState>) -> Result<HttpResponse, GatewayError> {
	let holdings = state.coordinator.ledger().holdings().await;
	Ok(HttpResponse::Ok().json(holdings))
}

/// Handle a portfolio row query
///
/// The response is an array containing the row (the historical shape);
/// traders with no row for the ticker get a zero-quantity entry.
pub async fn get_holding(
	state: web::Data<GatewayState>,
	path: web::Path<(TraderId, String)>,
) -> Result<HttpResponse, GatewayError> {
	let (trader_id, ticker) = path.into_inner();
	let holding = state.coordinator.ledger().holding(trader_id, &ticker).await;
	Ok(HttpResponse::Ok().json(vec![holding]))
}

/// Handle an administrative deposit
pub async fn deposit(
	state: web::Data<GatewayState>,
	path: web::Path<(TraderId, String)>,
	request: web::Json<DepositRequest>,
) -> Result<HttpResponse, GatewayError> {
	let (trader_id, ticker) = path.into_inner();
	let holding = state
		.coordinator
		.ledger()
		.credit(trader_id, &ticker, request.amount)
		.await
		.map_err(SettlementError::from)?;
	Ok(HttpResponse::Ok().json(holding))
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use actix_web::{App, test, web};
	use bourse_sdk::types::{CASH_TICKER, Holding, Order, Trader};
	use bourse_settlement::{CoordinatorConfig, SettlementCoordinator};
	use serde_json::json;

	use crate::routes::configure_routes;
	use crate::server::GatewayState;

	macro_rules! service {
		() => {{
			let state = GatewayState {
				coordinator: Arc::new(SettlementCoordinator::new(CoordinatorConfig::default())),
			};
			test::init_service(
				App::new()
					.app_data(web::Data::new(state))
					.configure(configure_routes),
			)
			.await
		}};
	}

	macro_rules! register {
		($app:expr, $name:expr) => {{
			let req = test::TestRequest::post()
				.uri("/traders")
				.set_json(json!({ "name": $name }))
				.to_request();
			let trader: Trader = test::call_and_read_body_json(&$app, req).await;
			trader
		}};
	}

	macro_rules! fund {
		($app:expr, $trader:expr, $ticker:expr, $amount:expr) => {{
			let uri = format!("/portfolios/{}/{}/deposits", $trader.id, $ticker);
			let req = test::TestRequest::post()
				.uri(&uri)
				.set_json(json!({ "amount": $amount }))
				.to_request();
			let resp = test::call_service(&$app, req).await;
			assert!(resp.status().is_success());
		}};
	}

	#[actix_web::test]
	async fn test_health() {
		let app = service!();
		let req = test::TestRequest::get().uri("/health").to_request();
		let resp = test::call_service(&app, req).await;
		assert!(resp.status().is_success());
	}

	#[actix_web::test]
	async fn test_bids_following_asks() {
		let app = service!();
		let seller = register!(app, "seller");
		let buyer = register!(app, "buyer");
		fund!(app, seller, "X", 10);
		fund!(app, buyer, CASH_TICKER, 100);

		let ask_req = test::TestRequest::post()
			.uri("/orders")
			.set_json(json!({
				"trader_id": seller.id, "ticker": "X",
				"type": "ask", "quantity": 2, "price": 10
			}))
			.to_request();
		let ask: Order = test::call_and_read_body_json(&app, ask_req).await;
		assert_eq!(ask.fulfilled, 0);

		let bid_req = test::TestRequest::post()
			.uri("/orders")
			.set_json(json!({
				"trader_id": buyer.id, "ticker": "X",
				"type": "bid", "quantity": 2, "price": 10
			}))
			.to_request();
		let bid: Order = test::call_and_read_body_json(&app, bid_req).await;
		assert_eq!(bid.fulfilled, 2);

		// Both sides settled: buyer paid 20 and holds 2 X
		let cash_req = test::TestRequest::get()
			.uri(&format!("/portfolios/{}/{}", buyer.id, CASH_TICKER))
			.to_request();
		let cash: Vec<Holding> = test::call_and_read_body_json(&app, cash_req).await;
		assert_eq!(cash[0].quantity, 80);

		let asset_req = test::TestRequest::get()
			.uri(&format!("/portfolios/{}/X", buyer.id))
			.to_request();
		let assets: Vec<Holding> = test::call_and_read_body_json(&app, asset_req).await;
		assert_eq!(assets[0].quantity, 2);

		let list_req = test::TestRequest::get().uri("/orders").to_request();
		let listed: serde_json::Value = test::call_and_read_body_json(&app, list_req).await;
		assert_eq!(listed["orders"].as_array().map(|o| o.len()), Some(2));
	}

	#[actix_web::test]
	async fn test_insufficient_balance_is_bare_400() {
		let app = service!();
		let buyer = register!(app, "buyer");
		fund!(app, buyer, CASH_TICKER, 5);

		let req = test::TestRequest::post()
			.uri("/orders")
			.set_json(json!({
				"trader_id": buyer.id, "ticker": "X",
				"type": "bid", "quantity": 1, "price": 10
			}))
			.to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status().as_u16(), 400);
		let body = test::read_body(resp).await;
		assert!(body.is_empty());
	}

	#[actix_web::test]
	async fn test_list_portfolios_after_seeding() {
		let app = service!();
		let ana = register!(app, "ana");
		fund!(app, ana, CASH_TICKER, 100);
		fund!(app, ana, "X", 3);

		let req = test::TestRequest::get().uri("/portfolios").to_request();
		let rows: Vec<Holding> = test::call_and_read_body_json(&app, req).await;
		assert_eq!(rows.len(), 2);
		assert!(
			rows.iter()
				.any(|h| h.trader_id == ana.id && h.ticker == "X" && h.quantity == 3)
		);
	}

	#[actix_web::test]
	async fn test_holding_defaults_to_zero_row() {
		let app = service!();
		let trader = register!(app, "fresh");

		let req = test::TestRequest::get()
			.uri(&format!("/portfolios/{}/X", trader.id))
			.to_request();
		let holdings: Vec<Holding> = test::call_and_read_body_json(&app, req).await;
		assert_eq!(holdings.len(), 1);
		assert_eq!(holdings[0].quantity, 0);
	}
}
