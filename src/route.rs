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

//! Bus route catalog records.

use crate::base::RouteId;
use crate::error::BookingError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Bus category of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BusCategory {
    #[serde(rename = "AC")]
    Ac,
    #[serde(rename = "Non-AC")]
    NonAc,
    Sleeper,
    Deluxe,
}

/// A fixed bus itinerary with capacity and fare.
///
/// Trips snapshot `total_seats` and `fare` at creation and booking time, so
/// editing a route never rewrites live inventory or sold tickets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub id: RouteId,
    pub category: BusCategory,
    pub source: String,
    pub destination: String,
    pub total_seats: u32,
    pub fare: Decimal,
}

/// Fields for creating or replacing a route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteSpec {
    pub category: BusCategory,
    pub source: String,
    pub destination: String,
    pub total_seats: u32,
    pub fare: Decimal,
}

impl RouteSpec {
    pub fn validate(&self) -> Result<(), BookingError> {
        if self.source.trim().is_empty() {
            return Err(BookingError::MissingField("source"));
        }
        if self.destination.trim().is_empty() {
            return Err(BookingError::MissingField("destination"));
        }
        if self.total_seats == 0 {
            return Err(BookingError::InvalidCapacity);
        }
        if self.fare < Decimal::ZERO {
            return Err(BookingError::InvalidFare);
        }
        Ok(())
    }

    pub(crate) fn into_route(self, id: RouteId) -> Route {
        Route {
            id,
            category: self.category,
            source: self.source,
            destination: self.destination,
            total_seats: self.total_seats,
            fare: self.fare,
        }
    }
}
