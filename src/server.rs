// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 The bus-reserve-rs Authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! HTTP surface over the reservation engine.
//!
//! Thin plumbing: each handler extracts the caller from the bearer token,
//! delegates to the engine, and maps [`BookingError`] onto a status code.
//! Error bodies are `{"message": ..., "errors": [...]}`.
//!
//! | Error class | Status |
//! |-------------|--------|
//! | validation  | 400    |
//! | no identity | 401    |
//! | ownership/role | 403 |
//! | missing entity | 404 |
//! | overbooked, seat taken, integrity guard | 409 |

use crate::base::{PassengerId, RouteId, SeatNumber, TicketId, TripId};
use crate::engine::Engine;
use crate::error::BookingError;
use crate::identity::TokenVerifier;
use crate::passenger::{Passenger, PassengerSpec};
use crate::policy::Caller;
use crate::route::{Route, RouteSpec};
use crate::ticket::{Ticket, TicketUpdate, TicketView};
use crate::trip::{TripSnapshot, TripSpec, TripUpdate};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

// === Application State ===

/// Shared state: the engine plus the token verifier.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub verifier: TokenVerifier,
}

// === DTOs ===

/// Request body for booking a seat.
#[derive(Debug, Serialize, Deserialize)]
pub struct BookRequest {
    pub trip_id: TripId,
    pub passenger_id: PassengerId,
    pub seat: SeatNumber,
    pub fare: Decimal,
}

/// Response body for errors: `{"message": ..., "errors": [...]}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    pub errors: Vec<String>,
}

// === Error Handling ===

/// Wrapper for converting [`BookingError`] into HTTP responses.
pub struct AppError(BookingError);

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        use BookingError::*;

        let status = match &self.0 {
            InvalidSeatNumber
            | SeatOutOfRange { .. }
            | FareMismatch { .. }
            | InvalidCapacity
            | InvalidAge
            | InvalidFare
            | MissingField(_) => StatusCode::BAD_REQUEST,
            Unauthenticated => StatusCode::UNAUTHORIZED,
            Forbidden => StatusCode::FORBIDDEN,
            RouteNotFound | TripNotFound | PassengerNotFound | TicketNotFound => {
                StatusCode::NOT_FOUND
            }
            Overbooked
            | SeatAlreadyBooked(_)
            | RouteHasTrips
            | TripHasTickets
            | PassengerHasTickets => StatusCode::CONFLICT,
        };

        tracing::warn!(error = %self.0, status = %status.as_u16(), "request rejected");

        let message = self.0.to_string();
        (
            status,
            Json(ErrorBody {
                errors: vec![message.clone()],
                message,
            }),
        )
            .into_response()
    }
}

/// Resolves the caller from the `Authorization: Bearer` header.
fn caller_from(headers: &HeaderMap, state: &AppState) -> Result<Caller, AppError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(BookingError::Unauthenticated)?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or(BookingError::Unauthenticated)?;
    Ok(state.verifier.verify(token)?)
}

// === Route Handlers ===

async fn create_route(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(spec): Json<RouteSpec>,
) -> Result<(StatusCode, Json<Route>), AppError> {
    let caller = caller_from(&headers, &state)?;
    let route = state.engine.create_route(&caller, spec)?;
    Ok((StatusCode::CREATED, Json(route)))
}

async fn list_routes(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Route>>, AppError> {
    let caller = caller_from(&headers, &state)?;
    Ok(Json(state.engine.list_routes(&caller)))
}

async fn get_route(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u32>,
) -> Result<Json<Route>, AppError> {
    let caller = caller_from(&headers, &state)?;
    Ok(Json(state.engine.get_route(&caller, RouteId(id))?))
}

async fn update_route(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u32>,
    Json(spec): Json<RouteSpec>,
) -> Result<Json<Route>, AppError> {
    let caller = caller_from(&headers, &state)?;
    Ok(Json(state.engine.update_route(&caller, RouteId(id), spec)?))
}

async fn delete_route(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u32>,
) -> Result<StatusCode, AppError> {
    let caller = caller_from(&headers, &state)?;
    state.engine.delete_route(&caller, RouteId(id))?;
    Ok(StatusCode::OK)
}

// === Trip Handlers ===

async fn create_trip(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(spec): Json<TripSpec>,
) -> Result<(StatusCode, Json<TripSnapshot>), AppError> {
    let caller = caller_from(&headers, &state)?;
    let trip = state.engine.create_trip(&caller, spec)?;
    Ok((StatusCode::CREATED, Json(trip)))
}

async fn list_trips(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<TripSnapshot>>, AppError> {
    let caller = caller_from(&headers, &state)?;
    Ok(Json(state.engine.list_trips(&caller)))
}

async fn get_trip(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u32>,
) -> Result<Json<TripSnapshot>, AppError> {
    let caller = caller_from(&headers, &state)?;
    Ok(Json(state.engine.get_trip(&caller, TripId(id))?))
}

async fn update_trip(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u32>,
    Json(update): Json<TripUpdate>,
) -> Result<Json<TripSnapshot>, AppError> {
    let caller = caller_from(&headers, &state)?;
    Ok(Json(state.engine.update_trip(&caller, TripId(id), update)?))
}

async fn delete_trip(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u32>,
) -> Result<StatusCode, AppError> {
    let caller = caller_from(&headers, &state)?;
    state.engine.delete_trip(&caller, TripId(id))?;
    Ok(StatusCode::OK)
}

// === Passenger Handlers ===

async fn create_passenger(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(spec): Json<PassengerSpec>,
) -> Result<(StatusCode, Json<Passenger>), AppError> {
    let caller = caller_from(&headers, &state)?;
    let passenger = state.engine.create_passenger(&caller, spec)?;
    Ok((StatusCode::CREATED, Json(passenger)))
}

async fn list_passengers(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Passenger>>, AppError> {
    let caller = caller_from(&headers, &state)?;
    Ok(Json(state.engine.list_passengers(&caller)))
}

async fn get_passenger(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u32>,
) -> Result<Json<Passenger>, AppError> {
    let caller = caller_from(&headers, &state)?;
    Ok(Json(state.engine.get_passenger(&caller, PassengerId(id))?))
}

async fn update_passenger(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u32>,
    Json(spec): Json<PassengerSpec>,
) -> Result<Json<Passenger>, AppError> {
    let caller = caller_from(&headers, &state)?;
    Ok(Json(
        state.engine.update_passenger(&caller, PassengerId(id), spec)?,
    ))
}

async fn delete_passenger(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u32>,
) -> Result<StatusCode, AppError> {
    let caller = caller_from(&headers, &state)?;
    state.engine.delete_passenger(&caller, PassengerId(id))?;
    Ok(StatusCode::OK)
}

// === Ticket Handlers ===

async fn book_ticket(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<BookRequest>,
) -> Result<(StatusCode, Json<Ticket>), AppError> {
    let caller = caller_from(&headers, &state)?;
    let ticket = state
        .engine
        .book_seat(&caller, req.trip_id, req.passenger_id, req.seat, req.fare)?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

async fn list_tickets(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<TicketView>>, AppError> {
    let caller = caller_from(&headers, &state)?;
    Ok(Json(state.engine.list_ticket_views(&caller)))
}

async fn get_ticket(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u32>,
) -> Result<Json<TicketView>, AppError> {
    let caller = caller_from(&headers, &state)?;
    Ok(Json(state.engine.get_ticket_view(&caller, TicketId(id))?))
}

async fn update_ticket(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u32>,
    Json(update): Json<TicketUpdate>,
) -> Result<Json<Ticket>, AppError> {
    let caller = caller_from(&headers, &state)?;
    Ok(Json(state.engine.update_ticket(&caller, TicketId(id), update)?))
}

async fn cancel_ticket(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u32>,
) -> Result<StatusCode, AppError> {
    let caller = caller_from(&headers, &state)?;
    state.engine.cancel_ticket(&caller, TicketId(id))?;
    Ok(StatusCode::OK)
}

// === Router ===

/// Builds the full API router over the shared state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/routes", post(create_route).get(list_routes))
        .route(
            "/routes/{id}",
            get(get_route).put(update_route).delete(delete_route),
        )
        .route("/trips", post(create_trip).get(list_trips))
        .route(
            "/trips/{id}",
            get(get_trip).put(update_trip).delete(delete_trip),
        )
        .route("/passengers", post(create_passenger).get(list_passengers))
        .route(
            "/passengers/{id}",
            get(get_passenger)
                .put(update_passenger)
                .delete(delete_passenger),
        )
        .route("/tickets", post(book_ticket).get(list_tickets))
        .route(
            "/tickets/{id}",
            get(get_ticket).put(update_ticket).delete(cancel_ticket),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
