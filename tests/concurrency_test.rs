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

//! Concurrency tests for the booking engine.
//!
//! These tests race real threads through the booking and cancellation
//! paths and check two things: the seat counter never drifts from the
//! live ticket set, and the locking patterns never cycle. Deadlock
//! detection uses parking_lot's `deadlock_detection` feature.

use bus_reserve_rs::{
    AccountId, BookingError, BusCategory, Caller, Engine, Gender, PassengerId, PassengerSpec,
    RouteSpec, SeatNumber, TripId, TripSpec,
};
use chrono::{NaiveDate, NaiveTime};
use parking_lot::deadlock;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn admin() -> Caller {
    Caller::admin(AccountId(1))
}

fn rider() -> Caller {
    Caller::user(AccountId(2))
}

/// Engine with one trip of the given capacity and one rider-owned passenger.
fn setup(total_seats: u32) -> (Arc<Engine>, TripId, PassengerId) {
    let engine = Engine::new();
    let route = engine
        .create_route(
            &admin(),
            RouteSpec {
                category: BusCategory::Sleeper,
                source: "Nagpur".to_string(),
                destination: "Pune".to_string(),
                total_seats,
                fare: dec!(750),
            },
        )
        .unwrap();
    let trip = engine
        .create_trip(
            &admin(),
            TripSpec {
                route_id: route.id,
                date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                departure_time: NaiveTime::from_hms_opt(21, 0, 0).unwrap(),
            },
        )
        .unwrap();
    let passenger = engine
        .create_passenger(
            &rider(),
            PassengerSpec {
                name: "Asha".to_string(),
                age: 30,
                gender: Gender::Female,
                contact: "9876500000".to_string(),
                address: None,
            },
        )
        .unwrap();
    (Arc::new(engine), trip.id, passenger.id)
}

fn assert_inventory_consistent(engine: &Engine, trip_id: TripId) {
    let snapshot = engine.get_trip(&admin(), trip_id).unwrap();
    assert_eq!(
        snapshot.available_seats as usize + engine.tickets_on_trip(trip_id),
        snapshot.total_seats as usize,
        "seat counter drifted from the live ticket set"
    );
}

// === Deadlock Detection Infrastructure ===

/// Starts a background thread that checks for deadlocks.
/// Returns a handle to stop the detector.
fn start_deadlock_detector() -> Arc<AtomicBool> {
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();

    thread::spawn(move || {
        while running_clone.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(100));
            let deadlocks = deadlock::check_deadlock();
            if !deadlocks.is_empty() {
                eprintln!("\n=== DEADLOCK DETECTED ===");
                for (i, threads) in deadlocks.iter().enumerate() {
                    eprintln!("\nDeadlock #{}", i + 1);
                    for t in threads {
                        eprintln!("Thread ID: {:?}", t.thread_id());
                        eprintln!("Backtrace:\n{:#?}", t.backtrace());
                    }
                }
                panic!("Deadlock detected! See output above for details.");
            }
        }
    });

    running
}

/// Stops the deadlock detector.
fn stop_deadlock_detector(running: Arc<AtomicBool>) {
    running.store(false, Ordering::SeqCst);
    thread::sleep(Duration::from_millis(150)); // Let detector thread exit
}

// === Tests ===

/// Many threads contend for the same seat; exactly one wins.
#[test]
fn same_seat_race_has_a_single_winner() {
    let detector = start_deadlock_detector();
    let (engine, trip_id, passenger_id) = setup(40);

    const NUM_THREADS: usize = 32;
    let mut handles = Vec::with_capacity(NUM_THREADS);

    for _ in 0..NUM_THREADS {
        let engine = engine.clone();
        handles.push(thread::spawn(move || {
            engine.book_seat(&rider(), trip_id, passenger_id, SeatNumber(7), dec!(750))
        }));
    }

    let results: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("Thread panicked"))
        .collect();

    stop_deadlock_detector(detector);

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "exactly one booking of a seat may succeed");
    for result in results.iter().filter(|r| r.is_err()) {
        assert_eq!(
            result.clone().unwrap_err(),
            BookingError::SeatAlreadyBooked(SeatNumber(7))
        );
    }

    assert_eq!(engine.get_trip(&admin(), trip_id).unwrap().available_seats, 39);
    assert_inventory_consistent(&engine, trip_id);
}

/// Threads race for the last seat on a nearly full trip; the counter
/// never goes negative and only one booking lands.
#[test]
fn last_seat_race_never_oversells() {
    let detector = start_deadlock_detector();
    let (engine, trip_id, passenger_id) = setup(1);

    const NUM_THREADS: usize = 16;
    let mut handles = Vec::with_capacity(NUM_THREADS);

    // Each thread asks for a distinct seat number so the only gate is the
    // availability counter itself. Capacity is 1, so seat 1 is the only
    // valid pick; the rest must fail before touching the counter.
    for _ in 0..NUM_THREADS {
        let engine = engine.clone();
        handles.push(thread::spawn(move || {
            engine.book_seat(&rider(), trip_id, passenger_id, SeatNumber(1), dec!(750))
        }));
    }

    let results: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("Thread panicked"))
        .collect();

    stop_deadlock_detector(detector);

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);

    let snapshot = engine.get_trip(&admin(), trip_id).unwrap();
    assert_eq!(snapshot.available_seats, 0);
    assert_inventory_consistent(&engine, trip_id);
}

/// Threads book distinct seats on a trip smaller than the demand.
/// Exactly `capacity` bookings succeed; the rest see Overbooked.
#[test]
fn demand_above_capacity_fills_exactly() {
    let detector = start_deadlock_detector();

    const CAPACITY: u32 = 10;
    const NUM_THREADS: usize = 30;

    let (engine, trip_id, passenger_id) = setup(CAPACITY);
    let mut handles = Vec::with_capacity(NUM_THREADS);

    for i in 0..NUM_THREADS {
        let engine = engine.clone();
        let seat = SeatNumber((i as u32 % CAPACITY) + 1);
        handles.push(thread::spawn(move || {
            engine.book_seat(&rider(), trip_id, passenger_id, seat, dec!(750))
        }));
    }

    let results: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("Thread panicked"))
        .collect();

    stop_deadlock_detector(detector);

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, CAPACITY as usize);

    let snapshot = engine.get_trip(&admin(), trip_id).unwrap();
    assert_eq!(snapshot.available_seats, 0);
    assert_inventory_consistent(&engine, trip_id);
}

/// Book/cancel churn across many threads. Every thread that books a seat
/// cancels it again, so the trip must end exactly where it started.
#[test]
fn book_cancel_churn_preserves_inventory() {
    let detector = start_deadlock_detector();

    const CAPACITY: u32 = 10;
    const NUM_THREADS: usize = 20;
    const OPS_PER_THREAD: usize = 100;

    let (engine, trip_id, passenger_id) = setup(CAPACITY);
    let mut handles = Vec::with_capacity(NUM_THREADS);

    for thread_id in 0..NUM_THREADS {
        let engine = engine.clone();
        handles.push(thread::spawn(move || {
            for i in 0..OPS_PER_THREAD {
                let seat = SeatNumber(((thread_id + i) as u32 % CAPACITY) + 1);
                if let Ok(ticket) =
                    engine.book_seat(&rider(), trip_id, passenger_id, seat, dec!(750))
                {
                    engine
                        .cancel_ticket(&rider(), ticket.id)
                        .expect("owner cancellation of a fresh ticket must succeed");
                }
                thread::yield_now();
            }
        }));
    }

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    stop_deadlock_detector(detector);

    let snapshot = engine.get_trip(&admin(), trip_id).unwrap();
    assert_eq!(snapshot.available_seats, CAPACITY);
    assert_eq!(engine.tickets_on_trip(trip_id), 0);
}

/// Readers iterate trips and tickets while writers book and cancel.
#[test]
fn no_deadlock_iteration_during_mutation() {
    let detector = start_deadlock_detector();

    const CAPACITY: u32 = 20;
    let (engine, trip_id, passenger_id) = setup(CAPACITY);
    let running = Arc::new(AtomicBool::new(true));
    let mut handles = Vec::new();

    for writer_id in 0..5usize {
        let engine = engine.clone();
        let running = running.clone();
        handles.push(thread::spawn(move || {
            let mut count = 0;
            while running.load(Ordering::SeqCst) && count < 200 {
                let seat = SeatNumber(((writer_id * 4 + count) as u32 % CAPACITY) + 1);
                if let Ok(ticket) =
                    engine.book_seat(&rider(), trip_id, passenger_id, seat, dec!(750))
                {
                    engine.cancel_ticket(&rider(), ticket.id).unwrap();
                }
                count += 1;
                thread::yield_now();
            }
        }));
    }

    for _ in 0..5 {
        let engine = engine.clone();
        let running = running.clone();
        handles.push(thread::spawn(move || {
            let mut iterations = 0;
            while running.load(Ordering::SeqCst) && iterations < 100 {
                let _ = engine.list_trips(&admin());
                let _ = engine.list_tickets(&admin());
                let _ = engine.list_ticket_views(&rider());
                iterations += 1;
                thread::yield_now();
            }
        }));
    }

    thread::sleep(Duration::from_millis(300));
    running.store(false, Ordering::SeqCst);

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    stop_deadlock_detector(detector);
    assert_inventory_consistent(&engine, trip_id);
}

/// Mixed operations across several trips with many threads.
#[test]
fn no_deadlock_mixed_operations_across_trips() {
    let detector = start_deadlock_detector();

    const NUM_TRIPS: usize = 5;
    const CAPACITY: u32 = 15;
    const NUM_THREADS: usize = 40;
    const OPS_PER_THREAD: usize = 50;

    let engine = Arc::new(Engine::new());
    let route = engine
        .create_route(
            &admin(),
            RouteSpec {
                category: BusCategory::Deluxe,
                source: "Indore".to_string(),
                destination: "Bhopal".to_string(),
                total_seats: CAPACITY,
                fare: dec!(300),
            },
        )
        .unwrap();

    let mut trip_ids = Vec::with_capacity(NUM_TRIPS);
    for day in 0..NUM_TRIPS {
        let trip = engine
            .create_trip(
                &admin(),
                TripSpec {
                    route_id: route.id,
                    date: NaiveDate::from_ymd_opt(2026, 4, day as u32 + 1).unwrap(),
                    departure_time: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
                },
            )
            .unwrap();
        trip_ids.push(trip.id);
    }

    let passenger = engine
        .create_passenger(
            &rider(),
            PassengerSpec {
                name: "Ravi".to_string(),
                age: 45,
                gender: Gender::Male,
                contact: "9876511111".to_string(),
                address: Some("Indore".to_string()),
            },
        )
        .unwrap();

    let trip_ids = Arc::new(trip_ids);
    let op_counter = Arc::new(AtomicU32::new(0));
    let mut handles = Vec::with_capacity(NUM_THREADS);

    for thread_id in 0..NUM_THREADS {
        let engine = engine.clone();
        let trip_ids = trip_ids.clone();
        let op_counter = op_counter.clone();
        let passenger_id = passenger.id;

        handles.push(thread::spawn(move || {
            for i in 0..OPS_PER_THREAD {
                let op = op_counter.fetch_add(1, Ordering::SeqCst);
                let trip_id = trip_ids[(thread_id + i) % NUM_TRIPS];
                let seat = SeatNumber((op % CAPACITY) + 1);

                match i % 4 {
                    0 | 1 => {
                        if let Ok(ticket) =
                            engine.book_seat(&rider(), trip_id, passenger_id, seat, dec!(300))
                        {
                            if ticket.id.0 % 2 == 0 {
                                engine.cancel_ticket(&rider(), ticket.id).unwrap();
                            }
                        }
                    }
                    2 => {
                        let _ = engine.get_trip(&rider(), trip_id);
                    }
                    _ => {
                        let _ = engine.list_tickets(&rider());
                    }
                }
            }
        }));
    }

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    stop_deadlock_detector(detector);

    for &trip_id in trip_ids.iter() {
        assert_inventory_consistent(&engine, trip_id);
    }
}
