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

//! Reservation engine.
//!
//! The [`Engine`] is the central component: it owns the entity store (routes,
//! trips, passengers, tickets), drives booking and cancellation against the
//! seat inventory, and guards referential integrity on every delete.
//!
//! # Booking
//!
//! [`Engine::book_seat`] validates in a fixed short-circuit order (structure,
//! existence, authorization, capacity, seat range, fare match, occupancy)
//! before committing through two atomic store primitives: the seat-index
//! claim and the trip's conditional counter decrement. Each commit step
//! compensates the previous one on failure, so a failed booking leaves zero
//! net change.
//!
//! # Thread Safety
//!
//! Entities live in [`DashMap`] collections, allowing concurrent requests to
//! proceed in parallel. Per-trip reservation is serialized by the trip's own
//! lock. No lock is ever held across two entities at once.
//!
//! # Invariants
//!
//! - At every quiescent point, `available_seats == total_seats - live
//!   tickets` for each trip.
//! - Live tickets of a trip hold pairwise-distinct seat numbers.
//! - A route with trips, a trip with tickets, or a passenger with tickets
//!   cannot be deleted.

use crate::base::{AccountId, PassengerId, RouteId, SeatNumber, TicketId, TripId};
use crate::error::BookingError;
use crate::passenger::{Passenger, PassengerSpec};
use crate::policy::Caller;
use crate::route::{Route, RouteSpec};
use crate::seat_index::SeatIndex;
use crate::ticket::{Ticket, TicketUpdate, TicketView};
use crate::trip::{Trip, TripSnapshot, TripSpec, TripUpdate};
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU32, Ordering};

/// Reservation engine managing the four entity collections.
pub struct Engine {
    routes: DashMap<RouteId, Route>,
    trips: DashMap<TripId, Trip>,
    passengers: DashMap<PassengerId, Passenger>,
    tickets: DashMap<TicketId, Ticket>,
    /// Store-level `(trip, seat)` uniqueness constraint.
    seat_index: SeatIndex,
    next_route: AtomicU32,
    next_trip: AtomicU32,
    next_passenger: AtomicU32,
    next_ticket: AtomicU32,
}

impl Engine {
    /// Creates an empty engine.
    pub fn new() -> Self {
        Engine {
            routes: DashMap::new(),
            trips: DashMap::new(),
            passengers: DashMap::new(),
            tickets: DashMap::new(),
            seat_index: SeatIndex::new(),
            next_route: AtomicU32::new(1),
            next_trip: AtomicU32::new(1),
            next_passenger: AtomicU32::new(1),
            next_ticket: AtomicU32::new(1),
        }
    }

    // === Routes (admin-only mutation) ===

    pub fn create_route(&self, caller: &Caller, spec: RouteSpec) -> Result<Route, BookingError> {
        caller.require_admin()?;
        spec.validate()?;

        let id = RouteId(self.next_route.fetch_add(1, Ordering::Relaxed));
        let route = spec.into_route(id);
        self.routes.insert(id, route.clone());
        Ok(route)
    }

    pub fn get_route(&self, _caller: &Caller, id: RouteId) -> Result<Route, BookingError> {
        self.routes
            .get(&id)
            .map(|r| r.clone())
            .ok_or(BookingError::RouteNotFound)
    }

    pub fn list_routes(&self, _caller: &Caller) -> Vec<Route> {
        self.routes.iter().map(|r| r.clone()).collect()
    }

    /// Replaces the route's fields.
    ///
    /// Existing trips keep the capacity they snapshotted at creation and
    /// sold tickets keep their fare; the edit only affects what comes after.
    pub fn update_route(
        &self,
        caller: &Caller,
        id: RouteId,
        spec: RouteSpec,
    ) -> Result<Route, BookingError> {
        caller.require_admin()?;
        spec.validate()?;

        let mut entry = self.routes.get_mut(&id).ok_or(BookingError::RouteNotFound)?;
        *entry = spec.into_route(id);
        Ok(entry.clone())
    }

    pub fn delete_route(&self, caller: &Caller, id: RouteId) -> Result<(), BookingError> {
        caller.require_admin()?;
        if !self.routes.contains_key(&id) {
            return Err(BookingError::RouteNotFound);
        }
        if self.route_in_use(id) {
            return Err(BookingError::RouteHasTrips);
        }
        self.routes
            .remove(&id)
            .map(|_| ())
            .ok_or(BookingError::RouteNotFound)
    }

    // === Trips (admin-only mutation) ===

    /// Schedules a trip on a route, snapshotting the route's capacity.
    pub fn create_trip(
        &self,
        caller: &Caller,
        spec: TripSpec,
    ) -> Result<TripSnapshot, BookingError> {
        caller.require_admin()?;

        let total_seats = self
            .routes
            .get(&spec.route_id)
            .map(|r| r.total_seats)
            .ok_or(BookingError::RouteNotFound)?;

        let id = TripId(self.next_trip.fetch_add(1, Ordering::Relaxed));
        let trip = Trip::new(id, spec.route_id, spec.date, spec.departure_time, total_seats);
        let snapshot = trip.snapshot();
        self.trips.insert(id, trip);
        Ok(snapshot)
    }

    pub fn get_trip(&self, _caller: &Caller, id: TripId) -> Result<TripSnapshot, BookingError> {
        self.trips
            .get(&id)
            .map(|t| t.snapshot())
            .ok_or(BookingError::TripNotFound)
    }

    pub fn list_trips(&self, _caller: &Caller) -> Vec<TripSnapshot> {
        self.trips.iter().map(|t| t.snapshot()).collect()
    }

    /// Moves a trip's departure. Seat counters are not updatable.
    pub fn update_trip(
        &self,
        caller: &Caller,
        id: TripId,
        update: TripUpdate,
    ) -> Result<TripSnapshot, BookingError> {
        caller.require_admin()?;
        let trip = self.trips.get(&id).ok_or(BookingError::TripNotFound)?;
        Ok(trip.reschedule(update.date, update.departure_time))
    }

    pub fn delete_trip(&self, caller: &Caller, id: TripId) -> Result<(), BookingError> {
        caller.require_admin()?;
        if !self.trips.contains_key(&id) {
            return Err(BookingError::TripNotFound);
        }
        if self.trip_in_use(id) {
            return Err(BookingError::TripHasTickets);
        }
        self.trips
            .remove(&id)
            .map(|_| ())
            .ok_or(BookingError::TripNotFound)
    }

    // === Passengers (owner-scoped) ===

    /// Creates a passenger owned by the calling account.
    pub fn create_passenger(
        &self,
        caller: &Caller,
        spec: PassengerSpec,
    ) -> Result<Passenger, BookingError> {
        spec.validate()?;

        let id = PassengerId(self.next_passenger.fetch_add(1, Ordering::Relaxed));
        let passenger = spec.into_passenger(id, caller.account);
        self.passengers.insert(id, passenger.clone());
        Ok(passenger)
    }

    pub fn get_passenger(
        &self,
        caller: &Caller,
        id: PassengerId,
    ) -> Result<Passenger, BookingError> {
        let passenger = self
            .passengers
            .get(&id)
            .ok_or(BookingError::PassengerNotFound)?;
        caller.authorize_owner(passenger.owner)?;
        Ok(passenger.clone())
    }

    /// Lists passengers visible to the caller (own records, or all for admin).
    pub fn list_passengers(&self, caller: &Caller) -> Vec<Passenger> {
        self.passengers
            .iter()
            .filter(|p| caller.can_see(p.owner))
            .map(|p| p.clone())
            .collect()
    }

    pub fn update_passenger(
        &self,
        caller: &Caller,
        id: PassengerId,
        spec: PassengerSpec,
    ) -> Result<Passenger, BookingError> {
        spec.validate()?;

        let mut entry = self
            .passengers
            .get_mut(&id)
            .ok_or(BookingError::PassengerNotFound)?;
        caller.authorize_owner(entry.owner)?;

        // Ownership never transfers on update.
        let owner = entry.owner;
        *entry = spec.into_passenger(id, owner);
        Ok(entry.clone())
    }

    pub fn delete_passenger(&self, caller: &Caller, id: PassengerId) -> Result<(), BookingError> {
        {
            let passenger = self
                .passengers
                .get(&id)
                .ok_or(BookingError::PassengerNotFound)?;
            caller.authorize_owner(passenger.owner)?;
        }
        if self.passenger_in_use(id) {
            return Err(BookingError::PassengerHasTickets);
        }
        self.passengers
            .remove(&id)
            .map(|_| ())
            .ok_or(BookingError::PassengerNotFound)
    }

    // === Booking ===

    /// Books a seat on a trip for a passenger.
    ///
    /// Validation short-circuits in order: seat structure, trip/passenger/
    /// route existence, caller authorization, capacity precheck, seat range,
    /// exact fare match, seat occupancy. The commit is claim-then-reserve:
    /// both steps are atomic, and a reserve failure compensates by releasing
    /// the claim, so no failure path changes inventory or the ticket set.
    ///
    /// # Errors
    ///
    /// - [`BookingError::InvalidSeatNumber`] - seat is zero.
    /// - [`BookingError::TripNotFound`] - trip missing, or its route dangling.
    /// - [`BookingError::PassengerNotFound`] - passenger missing.
    /// - [`BookingError::Forbidden`] - caller neither admin nor owner.
    /// - [`BookingError::Overbooked`] - no seat left on the trip.
    /// - [`BookingError::SeatOutOfRange`] - seat beyond bus capacity.
    /// - [`BookingError::FareMismatch`] - supplied fare differs from route fare.
    /// - [`BookingError::SeatAlreadyBooked`] - another ticket holds the seat.
    pub fn book_seat(
        &self,
        caller: &Caller,
        trip_id: TripId,
        passenger_id: PassengerId,
        seat: SeatNumber,
        fare: Decimal,
    ) -> Result<Ticket, BookingError> {
        if seat.0 == 0 {
            return Err(BookingError::InvalidSeatNumber);
        }

        let trip = self.trips.get(&trip_id).ok_or(BookingError::TripNotFound)?;
        let passenger = self
            .passengers
            .get(&passenger_id)
            .ok_or(BookingError::PassengerNotFound)?;
        // A trip whose owning route is gone is unbookable and reported as
        // not-found, same as a missing trip.
        let route = self
            .routes
            .get(&trip.route_id())
            .ok_or(BookingError::TripNotFound)?;

        caller.authorize_owner(passenger.owner)?;

        // Fast fail; the authoritative capacity check is the atomic
        // decrement below.
        if trip.available_seats() == 0 {
            return Err(BookingError::Overbooked);
        }
        if seat.0 > route.total_seats {
            return Err(BookingError::SeatOutOfRange {
                requested: seat.0,
                capacity: route.total_seats,
            });
        }
        if fare != route.fare {
            return Err(BookingError::FareMismatch {
                expected: route.fare,
                supplied: fare,
            });
        }
        // Occupancy precheck; the race-safe check is the claim below.
        if self.seat_index.is_taken(trip_id, seat) {
            return Err(BookingError::SeatAlreadyBooked(seat));
        }

        let ticket_id = TicketId(self.next_ticket.fetch_add(1, Ordering::Relaxed));

        self.seat_index.claim(trip_id, seat, ticket_id)?;
        let snapshot = match trip.reserve_seat() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                // Compensate the claim so the failed booking leaves no trace.
                self.seat_index.release(trip_id, seat);
                return Err(e);
            }
        };

        let ticket = Ticket {
            id: ticket_id,
            trip_id,
            passenger_id,
            journey_date: snapshot.date,
            seat,
            fare,
        };
        self.tickets.insert(ticket_id, ticket.clone());
        Ok(ticket)
    }

    /// Cancels a ticket and returns its seat to the trip.
    ///
    /// The ticket is removed before the seat is released, so a seat is never
    /// available while a live ticket still holds it.
    pub fn cancel_ticket(&self, caller: &Caller, ticket_id: TicketId) -> Result<(), BookingError> {
        let passenger_id = self
            .tickets
            .get(&ticket_id)
            .map(|t| t.passenger_id)
            .ok_or(BookingError::TicketNotFound)?;
        let owner = self
            .passengers
            .get(&passenger_id)
            .map(|p| p.owner)
            .ok_or(BookingError::PassengerNotFound)?;
        caller.authorize_owner(owner)?;

        // A concurrent cancellation may win the removal race; only the
        // winner releases the seat.
        let Some((_, ticket)) = self.tickets.remove(&ticket_id) else {
            return Err(BookingError::TicketNotFound);
        };
        self.seat_index.release(ticket.trip_id, ticket.seat);
        if let Some(trip) = self.trips.get(&ticket.trip_id) {
            trip.release_seat();
        }
        Ok(())
    }

    // === Tickets (owner-scoped reads, admin-only update) ===

    pub fn get_ticket(&self, caller: &Caller, id: TicketId) -> Result<Ticket, BookingError> {
        let ticket = self.tickets.get(&id).ok_or(BookingError::TicketNotFound)?;
        let owner = self
            .ticket_owner(&ticket)
            .ok_or(BookingError::PassengerNotFound)?;
        caller.authorize_owner(owner)?;
        Ok(ticket.clone())
    }

    pub fn list_tickets(&self, caller: &Caller) -> Vec<Ticket> {
        self.tickets
            .iter()
            .filter(|t| self.ticket_owner(t).is_some_and(|o| caller.can_see(o)))
            .map(|t| t.clone())
            .collect()
    }

    /// Ticket joined with its trip and route, for response shaping.
    pub fn get_ticket_view(&self, caller: &Caller, id: TicketId) -> Result<TicketView, BookingError> {
        let ticket = self.get_ticket(caller, id)?;
        self.view_of(&ticket).ok_or(BookingError::TripNotFound)
    }

    /// Joined views of every ticket visible to the caller.
    pub fn list_ticket_views(&self, caller: &Caller) -> Vec<TicketView> {
        self.list_tickets(caller)
            .iter()
            .filter_map(|t| self.view_of(t))
            .collect()
    }

    /// Admin override of seat, fare, or journey date on a sold ticket.
    ///
    /// A seat move re-validates the range and re-claims through the seat
    /// index, so uniqueness holds even under concurrent bookings. The seat
    /// counter is untouched: the ticket count of the trip does not change.
    pub fn update_ticket(
        &self,
        caller: &Caller,
        id: TicketId,
        update: TicketUpdate,
    ) -> Result<Ticket, BookingError> {
        caller.require_admin()?;

        let (trip_id, old_seat) = {
            let ticket = self.tickets.get(&id).ok_or(BookingError::TicketNotFound)?;
            (ticket.trip_id, ticket.seat)
        };

        let seat_move = match update.seat {
            Some(seat) if seat != old_seat => {
                if seat.0 == 0 {
                    return Err(BookingError::InvalidSeatNumber);
                }
                let trip = self.trips.get(&trip_id).ok_or(BookingError::TripNotFound)?;
                let route = self
                    .routes
                    .get(&trip.route_id())
                    .ok_or(BookingError::TripNotFound)?;
                if seat.0 > route.total_seats {
                    return Err(BookingError::SeatOutOfRange {
                        requested: seat.0,
                        capacity: route.total_seats,
                    });
                }
                self.seat_index.claim(trip_id, seat, id)?;
                Some(seat)
            }
            _ => None,
        };

        let Some(mut ticket) = self.tickets.get_mut(&id) else {
            // Ticket was cancelled while the new seat was being claimed.
            if let Some(seat) = seat_move {
                self.seat_index.release(trip_id, seat);
            }
            return Err(BookingError::TicketNotFound);
        };
        if let Some(seat) = seat_move {
            self.seat_index.release(trip_id, old_seat);
            ticket.seat = seat;
        }
        if let Some(fare) = update.fare {
            ticket.fare = fare;
        }
        if let Some(date) = update.journey_date {
            ticket.journey_date = date;
        }
        Ok(ticket.clone())
    }

    // === Integrity guards ===

    fn route_in_use(&self, id: RouteId) -> bool {
        self.trips.iter().any(|t| t.route_id() == id)
    }

    fn trip_in_use(&self, id: TripId) -> bool {
        self.tickets.iter().any(|t| t.trip_id == id)
    }

    fn passenger_in_use(&self, id: PassengerId) -> bool {
        self.tickets.iter().any(|t| t.passenger_id == id)
    }

    // === Helpers ===

    fn ticket_owner(&self, ticket: &Ticket) -> Option<AccountId> {
        self.passengers.get(&ticket.passenger_id).map(|p| p.owner)
    }

    fn view_of(&self, ticket: &Ticket) -> Option<TicketView> {
        let trip = self.trips.get(&ticket.trip_id)?;
        let snapshot = trip.snapshot();
        let route = self.routes.get(&snapshot.route_id)?;
        Some(TicketView {
            id: ticket.id,
            trip_id: ticket.trip_id,
            passenger_id: ticket.passenger_id,
            journey_date: ticket.journey_date,
            departure_time: snapshot.departure_time,
            seat: ticket.seat,
            fare: ticket.fare,
            source: route.source.clone(),
            destination: route.destination.clone(),
            category: route.category,
        })
    }

    /// Live tickets currently held on a trip.
    ///
    /// Exposed for invariant checking: at every quiescent point,
    /// `available_seats + tickets_on_trip == total_seats`.
    pub fn tickets_on_trip(&self, id: TripId) -> usize {
        self.tickets.iter().filter(|t| t.trip_id == id).count()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
