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

//! HTTP request logging middleware
//!
//! Every request gets a request ID for log correlation: taken from the
//! `X-Request-Id` header when the client provides one, generated otherwise,
//! and echoed back in the response.

use std::future::{Ready, ready};
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use actix_web::{
	Error,
	dev::{Service, ServiceRequest, ServiceResponse, Transform},
	http::header::{HeaderName, HeaderValue},
};
use tracing::info;
use uuid::Uuid;

/// HTTP header name for request ID
pub const HEADER_REQUEST_ID: &str = "X-Request-Id";

/// Logging middleware for actix-web
pub struct LoggingMiddleware;

impl<S, B> Transform<S, ServiceRequest> for LoggingMiddleware
where
	S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
	S::Future: 'static,
	B: 'static,
{
	type Response = ServiceResponse<B>;
	type Error = Error;
	type InitError = ();
	type Transform = LoggingMiddlewareInner<S>;
	type Future = Ready<Result<Self::Transform, Self::InitError>>;

	fn new_transform(&self, service: S) -> Self::Future {
		ready(Ok(LoggingMiddlewareInner {
			service: Rc::new(service),
		}))
	}
}

pub struct LoggingMiddlewareInner<S> {
	service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for LoggingMiddlewareInner<S>
where
	S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
	S::Future: 'static,
	B: 'static,
{
	type Response = ServiceResponse<B>;
	type Error = Error;
	type Future = Pin<Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>>>>;

	fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
		self.service.poll_ready(cx)
	}

	fn call(&self, req: ServiceRequest) -> Self::Future {
		let service = self.service.clone();
		let method = req.method().clone();
		let path = req.path().to_string();
		let request_id = req
			.headers()
			.get(HEADER_REQUEST_ID)
			.and_then(|v| v.to_str().ok())
			.map(|v| v.to_string())
			.unwrap_or_else(|| Uuid::new_v4().to_string());

		let span = tracing::span!(
			tracing::Level::INFO,
			"http_request",
			method = %method,
			path = %path,
			request_id = %request_id
		);
		let _enter = span.enter();

		Box::pin(async move {
			let start = std::time::Instant::now();
			let res = service.call(req).await;
			let duration = start.elapsed();

			match res {
				Ok(mut response) => {
					if let Ok(value) = HeaderValue::from_str(&request_id) {
						response
							.headers_mut()
							.insert(HeaderName::from_static("x-request-id"), value);
					}
					info!(
						status = response.status().as_u16(),
						duration_ms = duration.as_millis(),
						request_id = %request_id,
						"Request completed"
					);
					Ok(response)
				}
				Err(e) => {
					tracing::error!(
						error = %e,
						duration_ms = duration.as_millis(),
						request_id = %request_id,
						"Request failed"
					);
					Err(e)
				}
			}
		})
	}
}
