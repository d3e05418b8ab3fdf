//! Request correlation and HTTP metrics.
//!
//! [`request_tracking_layer`] runs on every request:
//!
//! 1. Take the `X-Correlation-ID` header, or generate a UUID v4
//! 2. Store it in request extensions for [`CorrelationId`](crate::CorrelationId)
//! 3. Run the handler inside an `http_request` span carrying the ID
//! 4. Echo the ID back in the response header and count the response
//!
//! # Example
//!
//! ```ignore
//! let app = Router::new()
//!     .route("/api/bookings", post(create_booking))
//!     .layer(request_tracking_layer());
//! ```

use axum::{extract::Request, http::HeaderValue, response::Response};
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};
use tracing::Instrument;
use uuid::Uuid;

/// Header name for correlation ID.
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

/// Tags every request with a correlation ID and records HTTP metrics.
#[must_use]
pub const fn request_tracking_layer() -> RequestTrackingLayer {
    RequestTrackingLayer
}

/// See [`request_tracking_layer`].
#[derive(Clone, Copy, Debug)]
pub struct RequestTrackingLayer;

impl<S> Layer<S> for RequestTrackingLayer {
    type Service = RequestTracking<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestTracking { inner }
    }
}

/// Service produced by [`RequestTrackingLayer`].
#[derive(Clone, Debug)]
pub struct RequestTracking<S> {
    inner: S,
}

/// The caller's `X-Correlation-ID` if it is a UUID.
fn incoming_id(req: &Request) -> Option<Uuid> {
    let raw = req.headers().get(CORRELATION_ID_HEADER)?.to_str().ok()?;
    Uuid::parse_str(raw).ok()
}

impl<S> Service<Request> for RequestTracking<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let correlation_id = incoming_id(&req).unwrap_or_else(Uuid::new_v4);
        req.extensions_mut().insert(correlation_id);

        let method = req.method().clone();
        let span = tracing::info_span!(
            "http_request",
            correlation_id = %correlation_id,
            method = %method,
            path = %req.uri().path(),
        );

        let started = Instant::now();
        let handled = self.inner.call(req).instrument(span);

        Box::pin(async move {
            let mut response = handled.await?;

            metrics::counter!(
                "http_requests_total",
                "method" => method.to_string(),
                "status" => response.status().as_u16().to_string()
            )
            .increment(1);
            metrics::histogram!("http_request_duration_seconds")
                .record(started.elapsed().as_secs_f64());

            if let Ok(value) = HeaderValue::from_str(&correlation_id.to_string()) {
                response.headers_mut().insert(CORRELATION_ID_HEADER, value);
            }

            Ok(response)
        })
    }
}
