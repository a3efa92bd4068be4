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

//! Owner-scoped passenger records.

use crate::base::{AccountId, PassengerId};
use crate::error::BookingError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// A traveler record owned by the account that created it.
///
/// Only the owning account or an admin may read, modify, or delete it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passenger {
    pub id: PassengerId,
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    pub contact: String,
    pub address: Option<String>,
    pub owner: AccountId,
}

/// Fields for creating or replacing a passenger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassengerSpec {
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    pub contact: String,
    #[serde(default)]
    pub address: Option<String>,
}

impl PassengerSpec {
    pub fn validate(&self) -> Result<(), BookingError> {
        if self.name.trim().is_empty() {
            return Err(BookingError::MissingField("name"));
        }
        if self.age == 0 {
            return Err(BookingError::InvalidAge);
        }
        if self.contact.trim().is_empty() {
            return Err(BookingError::MissingField("contact"));
        }
        Ok(())
    }

    pub(crate) fn into_passenger(self, id: PassengerId, owner: AccountId) -> Passenger {
        Passenger {
            id,
            name: self.name,
            age: self.age,
            gender: self.gender,
            contact: self.contact,
            address: self.address,
            owner,
        }
    }
}
