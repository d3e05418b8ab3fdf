//! Custom Axum extractors.
//!
//! - [`CorrelationId`]: request correlation ID from the middleware or header
//! - [`BearerToken`]: raw token from `Authorization: Bearer <token>`
//! - [`CurrentActor`]: the authenticated caller
//! - [`HostActor`]: the authenticated caller, required to be a host
//! - [`MaintenanceAccess`]: proof the caller holds the maintenance token
//!
//! # Examples
//!
//! ```ignore
//! async fn confirm(
//!     HostActor(host): HostActor,
//!     State(state): State<AppState>,
//!     Path(id): Path<BookingId>,
//! ) -> Result<Json<Data<BookingDetails>>, AppError> {
//!     let details = state.engine.confirm_booking(&host, id).await?;
//!     Ok(Json(Data { data: details }))
//! }
//! ```

use crate::error::AppError;
use crate::middleware::CORRELATION_ID_HEADER;
use crate::state::AppState;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use roombnb_core::types::Actor;
use uuid::Uuid;

/// Header carrying the maintenance secret.
pub const MAINTENANCE_TOKEN_HEADER: &str = "X-Maintenance-Token";

/// Correlation ID for request tracing.
///
/// Prefers the ID the correlation middleware stored, then the
/// `X-Correlation-ID` header, and otherwise generates a new UUID v4.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let correlation_id = parts
            .extensions
            .get::<Uuid>()
            .copied()
            .or_else(|| {
                parts
                    .headers
                    .get(CORRELATION_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| Uuid::parse_str(s).ok())
            })
            .unwrap_or_else(Uuid::new_v4);

        Ok(Self(correlation_id))
    }
}

/// Bearer token extracted from `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Authentication required"))?;

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::unauthorized("Authentication required"))?;

        Ok(Self(token.to_string()))
    }
}

/// The authenticated caller.
///
/// Resolves the bearer token through [`AppState::sessions`]; unknown or
/// expired tokens are rejected with 401 "Invalid token".
#[derive(Debug, Clone, Copy)]
pub struct CurrentActor(pub Actor);

#[async_trait]
impl FromRequestParts<AppState> for CurrentActor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;

        let actor = state.sessions.resolve(&token).await.map_err(|e| {
            AppError::internal("Internal server error").with_source(anyhow::Error::new(e))
        })?;

        actor
            .map(Self)
            .ok_or_else(|| AppError::unauthorized("Invalid token"))
    }
}

/// The authenticated caller, who must hold the host role.
#[derive(Debug, Clone, Copy)]
pub struct HostActor(pub Actor);

#[async_trait]
impl FromRequestParts<AppState> for HostActor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentActor(actor) = CurrentActor::from_request_parts(parts, state).await?;
        if !actor.is_host {
            return Err(AppError::forbidden("Host privileges required"));
        }
        Ok(Self(actor))
    }
}

/// Granted when `X-Maintenance-Token` matches the configured secret.
///
/// Rejected with 403 when the header is absent, wrong, or no secret is
/// configured.
#[derive(Debug, Clone, Copy)]
pub struct MaintenanceAccess;

#[async_trait]
impl FromRequestParts<AppState> for MaintenanceAccess {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let denied = || AppError::forbidden("Maintenance access denied");

        let expected = state.maintenance_token.as_deref().ok_or_else(denied)?;
        let presented = parts
            .headers
            .get(MAINTENANCE_TOKEN_HEADER)
            .map(axum::http::HeaderValue::as_bytes)
            .ok_or_else(denied)?;

        if constant_time_eq::constant_time_eq(presented, expected.as_bytes()) {
            Ok(Self)
        } else {
            tracing::warn!("Rejected maintenance request with wrong token");
            Err(denied())
        }
    }
}
