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

//! Trip scheduling and seat inventory.
//!
//! A [`Trip`] is one dated departure of a route, carrying the only mutable
//! counter in the system. All counter movement goes through
//! [`Trip::reserve_seat`] and [`Trip::release_seat`]; entity updates never
//! touch it.
//!
//! # Atomicity
//!
//! The counter lives behind a `parking_lot::Mutex`, so the conditional
//! decrement ("take a seat only if one is left") is a single atomic operation
//! against the store. Two concurrent reservations of a trip's last seat can
//! never both succeed, and the counter can never go negative.

use crate::base::{RouteId, TripId};
use crate::error::BookingError;
use chrono::{NaiveDate, NaiveTime};
use parking_lot::Mutex;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde::Deserialize;

#[derive(Debug)]
struct TripData {
    route_id: RouteId,
    date: NaiveDate,
    departure_time: NaiveTime,
    total_seats: u32,
    available_seats: u32,
}

impl TripData {
    fn assert_invariants(&self) {
        debug_assert!(
            self.available_seats <= self.total_seats,
            "Invariant violated: available {} exceeds capacity {}",
            self.available_seats,
            self.total_seats
        );
    }

    /// Conditional decrement: takes a seat only if one is left.
    fn reserve(&mut self) -> Result<(), BookingError> {
        if self.available_seats == 0 {
            return Err(BookingError::Overbooked);
        }
        self.available_seats -= 1;
        self.assert_invariants();
        Ok(())
    }

    /// Increment clamped at capacity.
    fn release(&mut self) {
        if self.available_seats < self.total_seats {
            self.available_seats += 1;
        }
        self.assert_invariants();
    }
}

/// Immutable view of a trip, taken under its lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, Deserialize)]
pub struct TripSnapshot {
    pub id: TripId,
    pub route_id: RouteId,
    pub date: NaiveDate,
    pub departure_time: NaiveTime,
    pub total_seats: u32,
    pub available_seats: u32,
}

/// Fields for scheduling a trip. Capacity is snapshotted from the route.
#[derive(Debug, Clone, Copy, serde::Serialize, Deserialize)]
pub struct TripSpec {
    pub route_id: RouteId,
    pub date: NaiveDate,
    pub departure_time: NaiveTime,
}

/// Fields an admin may change on an existing trip.
///
/// The seat counters are deliberately absent: they move only through
/// [`Trip::reserve_seat`] and [`Trip::release_seat`].
#[derive(Debug, Clone, Copy, serde::Serialize, Deserialize)]
pub struct TripUpdate {
    pub date: NaiveDate,
    pub departure_time: NaiveTime,
}

/// One dated departure of a route, with its own seat-availability counter.
#[derive(Debug)]
pub struct Trip {
    id: TripId,
    inner: Mutex<TripData>,
}

impl Trip {
    /// Creates a trip with all seats available.
    ///
    /// `total_seats` is the owning route's capacity, snapshotted here so a
    /// later route edit cannot strand the counter.
    pub fn new(
        id: TripId,
        route_id: RouteId,
        date: NaiveDate,
        departure_time: NaiveTime,
        total_seats: u32,
    ) -> Self {
        Self {
            id,
            inner: Mutex::new(TripData {
                route_id,
                date,
                departure_time,
                total_seats,
                available_seats: total_seats,
            }),
        }
    }

    pub fn id(&self) -> TripId {
        self.id
    }

    pub fn route_id(&self) -> RouteId {
        self.inner.lock().route_id
    }

    pub fn date(&self) -> NaiveDate {
        self.inner.lock().date
    }

    pub fn available_seats(&self) -> u32 {
        self.inner.lock().available_seats
    }

    pub fn total_seats(&self) -> u32 {
        self.inner.lock().total_seats
    }

    pub fn snapshot(&self) -> TripSnapshot {
        let data = self.inner.lock();
        Self::snap(self.id, &data)
    }

    /// Atomically takes one seat.
    ///
    /// Returns the post-decrement snapshot, or [`BookingError::Overbooked`]
    /// if no seat was left. The check and the decrement happen under one
    /// lock acquisition; callers never see a transient negative value.
    pub fn reserve_seat(&self) -> Result<TripSnapshot, BookingError> {
        let mut data = self.inner.lock();
        data.reserve()?;
        Ok(Self::snap(self.id, &data))
    }

    /// Returns one seat, clamped at capacity.
    ///
    /// Unconditional: this is both the cancellation path and the
    /// compensation path when a step after a reservation fails, so it cannot
    /// itself fail. A double release is absorbed by the clamp.
    pub fn release_seat(&self) -> TripSnapshot {
        let mut data = self.inner.lock();
        data.release();
        Self::snap(self.id, &data)
    }

    /// Moves the departure. Counters are untouched.
    pub(crate) fn reschedule(&self, date: NaiveDate, departure_time: NaiveTime) -> TripSnapshot {
        let mut data = self.inner.lock();
        data.date = date;
        data.departure_time = departure_time;
        Self::snap(self.id, &data)
    }

    fn snap(id: TripId, data: &TripData) -> TripSnapshot {
        TripSnapshot {
            id,
            route_id: data.route_id,
            date: data.date,
            departure_time: data.departure_time,
            total_seats: data.total_seats,
            available_seats: data.available_seats,
        }
    }
}

impl Serialize for Trip {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let data = self.inner.lock();
        let mut state = serializer.serialize_struct("Trip", 6)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("route_id", &data.route_id)?;
        state.serialize_field("date", &data.date)?;
        state.serialize_field("departure_time", &data.departure_time)?;
        state.serialize_field("total_seats", &data.total_seats)?;
        state.serialize_field("available_seats", &data.available_seats)?;
        state.end()
    }
}
