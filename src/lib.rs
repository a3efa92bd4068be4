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

//! # Bus Reserve
//!
//! This library provides a role-gated reservation engine for scheduled bus
//! trips: administrators define routes and trip schedules, authenticated
//! riders register passengers and book seats. The engine's central contract
//! is seat-inventory consistency under concurrent booking and cancellation.
//!
//! ## Core Components
//!
//! - [`Engine`]: Central store and orchestrator for routes, trips,
//!   passengers, and tickets
//! - [`Trip`]: Dated departure owning the atomic seat-availability counter
//! - [`SeatIndex`]: Store-level `(trip, seat)` uniqueness constraint
//! - [`Caller`]: Resolved identity driving owner-or-admin access checks
//! - [`BookingError`]: Error taxonomy for every failure class
//!
//! ## Example
//!
//! ```
//! use bus_reserve_rs::{
//!     AccountId, BusCategory, Caller, Engine, Gender, PassengerSpec, RouteSpec,
//!     SeatNumber, TripSpec,
//! };
//! use chrono::{NaiveDate, NaiveTime};
//! use rust_decimal_macros::dec;
//!
//! let engine = Engine::new();
//! let admin = Caller::admin(AccountId(1));
//! let rider = Caller::user(AccountId(2));
//!
//! let route = engine
//!     .create_route(
//!         &admin,
//!         RouteSpec {
//!             category: BusCategory::Ac,
//!             source: "Pune".to_string(),
//!             destination: "Mumbai".to_string(),
//!             total_seats: 40,
//!             fare: dec!(500),
//!         },
//!     )
//!     .unwrap();
//!
//! let trip = engine
//!     .create_trip(
//!         &admin,
//!         TripSpec {
//!             route_id: route.id,
//!             date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
//!             departure_time: NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
//!         },
//!     )
//!     .unwrap();
//!
//! let passenger = engine
//!     .create_passenger(
//!         &rider,
//!         PassengerSpec {
//!             name: "Asha".to_string(),
//!             age: 30,
//!             gender: Gender::Female,
//!             contact: "9876500000".to_string(),
//!             address: None,
//!         },
//!     )
//!     .unwrap();
//!
//! let ticket = engine
//!     .book_seat(&rider, trip.id, passenger.id, SeatNumber(12), dec!(500))
//!     .unwrap();
//! assert_eq!(ticket.seat, SeatNumber(12));
//! assert_eq!(engine.get_trip(&rider, trip.id).unwrap().available_seats, 39);
//! ```
//!
//! ## Thread Safety
//!
//! Entities live in concurrent maps; per-trip reservation is serialized by a
//! store-level atomic conditional decrement, and seat uniqueness by an atomic
//! claim on the seat index. Concurrent bookings of the same last seat resolve
//! to exactly one winner.

mod base;
mod engine;
pub mod error;
pub mod identity;
pub mod passenger;
pub mod policy;
pub mod route;
mod seat_index;
pub mod server;
pub mod ticket;
pub mod trip;

pub use base::{AccountId, PassengerId, RouteId, SeatNumber, TicketId, TripId};
pub use engine::Engine;
pub use error::BookingError;
pub use identity::{Claims, TokenVerifier, issue_token};
pub use passenger::{Gender, Passenger, PassengerSpec};
pub use policy::{Caller, Role};
pub use route::{BusCategory, Route, RouteSpec};
pub use seat_index::SeatIndex;
pub use ticket::{Ticket, TicketUpdate, TicketView};
pub use trip::{Trip, TripSnapshot, TripSpec, TripUpdate};
