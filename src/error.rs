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

//! Error types for reservation processing.

use crate::base::SeatNumber;
use rust_decimal::Decimal;
use thiserror::Error;

/// Reservation processing errors.
///
/// Messages are client-facing and deliberately terse; the HTTP layer maps
/// each variant onto a status code without inspecting internal state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    /// Seat number is zero or otherwise malformed
    #[error("seat number must be positive")]
    InvalidSeatNumber,

    /// Seat number is beyond the bus capacity
    #[error("seat {requested} exceeds bus capacity {capacity}")]
    SeatOutOfRange { requested: u32, capacity: u32 },

    /// Submitted fare does not match the route fare
    #[error("fare mismatch: expected {expected}, got {supplied}")]
    FareMismatch { expected: Decimal, supplied: Decimal },

    /// Route capacity must be at least one seat
    #[error("total seats must be at least 1")]
    InvalidCapacity,

    /// Passenger age must be at least one
    #[error("age must be at least 1")]
    InvalidAge,

    /// Fare must not be negative
    #[error("fare must not be negative")]
    InvalidFare,

    /// Required text field is empty
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Request carries no verifiable identity
    #[error("authentication required")]
    Unauthenticated,

    /// Caller is neither admin nor the owner of the resource
    #[error("not allowed for this account")]
    Forbidden,

    /// Referenced route does not exist
    #[error("route not found")]
    RouteNotFound,

    /// Referenced trip does not exist (or its route is gone)
    #[error("trip not found")]
    TripNotFound,

    /// Referenced passenger does not exist
    #[error("passenger not found")]
    PassengerNotFound,

    /// Referenced ticket does not exist
    #[error("ticket not found")]
    TicketNotFound,

    /// No seats left on the trip
    #[error("no seats left on this trip")]
    Overbooked,

    /// Another live ticket already holds this seat on the trip
    #[error("seat {0} is already booked on this trip")]
    SeatAlreadyBooked(SeatNumber),

    /// Route still has scheduled trips referencing it
    #[error("route still has scheduled trips")]
    RouteHasTrips,

    /// Trip still has live tickets referencing it
    #[error("trip still has booked tickets")]
    TripHasTickets,

    /// Passenger still has live tickets referencing it
    #[error("passenger still has booked tickets")]
    PassengerHasTickets,
}
