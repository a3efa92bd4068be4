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

//! Seat occupancy index with atomic claim semantics.
//!
//! Enforces `(trip, seat)` uniqueness as a store-level constraint. The
//! booking service runs an occupancy precheck first, but that check-then-act
//! is not atomic on its own; the index's entry-API claim is the authoritative
//! check-and-insert that closes the race.

use crate::base::{SeatNumber, TicketId, TripId};
use crate::error::BookingError;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Uniqueness index over live `(trip, seat)` pairs.
///
/// All operations are safe for concurrent access; a claim either installs
/// the ticket as the seat holder or fails without side effects.
#[derive(Debug)]
pub struct SeatIndex {
    seats: DashMap<(TripId, SeatNumber), TicketId>,
}

impl SeatIndex {
    pub fn new() -> Self {
        Self {
            seats: DashMap::new(),
        }
    }

    /// Atomically claims a seat for a ticket.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::SeatAlreadyBooked`] if another live ticket
    /// already holds the seat.
    pub fn claim(
        &self,
        trip: TripId,
        seat: SeatNumber,
        ticket: TicketId,
    ) -> Result<(), BookingError> {
        match self.seats.entry((trip, seat)) {
            Entry::Occupied(_) => Err(BookingError::SeatAlreadyBooked(seat)),
            Entry::Vacant(entry) => {
                entry.insert(ticket);
                Ok(())
            }
        }
    }

    /// Frees a seat on cancellation or as claim compensation.
    pub fn release(&self, trip: TripId, seat: SeatNumber) {
        self.seats.remove(&(trip, seat));
    }

    pub fn is_taken(&self, trip: TripId, seat: SeatNumber) -> bool {
        self.seats.contains_key(&(trip, seat))
    }

    /// Live seats currently claimed on a trip.
    pub fn seats_taken(&self, trip: TripId) -> usize {
        self.seats.iter().filter(|e| e.key().0 == trip).count()
    }
}

impl Default for SeatIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_then_duplicate_claim_fails() {
        let index = SeatIndex::new();
        index
            .claim(TripId(1), SeatNumber(5), TicketId(10))
            .unwrap();

        let result = index.claim(TripId(1), SeatNumber(5), TicketId(11));
        assert_eq!(result, Err(BookingError::SeatAlreadyBooked(SeatNumber(5))));
        assert!(index.is_taken(TripId(1), SeatNumber(5)));
    }

    #[test]
    fn same_seat_on_another_trip_is_free() {
        let index = SeatIndex::new();
        index.claim(TripId(1), SeatNumber(5), TicketId(10)).unwrap();
        index.claim(TripId(2), SeatNumber(5), TicketId(11)).unwrap();
        assert_eq!(index.seats_taken(TripId(1)), 1);
        assert_eq!(index.seats_taken(TripId(2)), 1);
    }

    #[test]
    fn release_frees_the_seat_for_rebooking() {
        let index = SeatIndex::new();
        index.claim(TripId(1), SeatNumber(5), TicketId(10)).unwrap();
        index.release(TripId(1), SeatNumber(5));
        assert!(!index.is_taken(TripId(1), SeatNumber(5)));
        index.claim(TripId(1), SeatNumber(5), TicketId(12)).unwrap();
    }
}
