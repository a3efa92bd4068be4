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

//! Booked seat records and their read-side projection.

use crate::base::{PassengerId, SeatNumber, TicketId, TripId};
use crate::route::BusCategory;
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A booked seat on a trip.
///
/// `journey_date` and `fare` are snapshots taken at booking time; later route
/// or trip edits do not rewrite sold tickets. Seat, fare, and date are
/// re-editable only by admin through [`TicketUpdate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub trip_id: TripId,
    pub passenger_id: PassengerId,
    pub journey_date: NaiveDate,
    pub seat: SeatNumber,
    pub fare: Decimal,
}

/// Admin-only partial update of a ticket.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct TicketUpdate {
    #[serde(default)]
    pub seat: Option<SeatNumber>,
    #[serde(default)]
    pub fare: Option<Decimal>,
    #[serde(default)]
    pub journey_date: Option<NaiveDate>,
}

/// Ticket joined with its trip and route for response shaping.
///
/// Built by read-side joins over the store; the write path never depends on
/// this denormalized view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketView {
    pub id: TicketId,
    pub trip_id: TripId,
    pub passenger_id: PassengerId,
    pub journey_date: NaiveDate,
    pub departure_time: NaiveTime,
    pub seat: SeatNumber,
    pub fare: Decimal,
    pub source: String,
    pub destination: String,
    pub category: BusCategory,
}
