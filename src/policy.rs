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

//! Caller identity and access policy.
//!
//! Every engine operation takes a [`Caller`] and runs its checks through this
//! module, so role and ownership rules live in exactly one place:
//!
//! - admins are authorized for everything;
//! - route and trip mutation is admin-only, unconditionally;
//! - passenger and ticket access is owner-or-admin;
//! - listings are scoped to the caller's own records unless admin.

use crate::base::AccountId;
use crate::error::BookingError;
use serde::{Deserialize, Serialize};

/// Role resolved by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

/// Authenticated caller: account id plus resolved role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub account: AccountId,
    pub role: Role,
}

impl Caller {
    pub fn user(account: AccountId) -> Self {
        Self {
            account,
            role: Role::User,
        }
    }

    pub fn admin(account: AccountId) -> Self {
        Self {
            account,
            role: Role::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Owner-or-admin check for passenger and ticket access.
    pub fn authorize_owner(&self, owner: AccountId) -> Result<(), BookingError> {
        if self.is_admin() || self.account == owner {
            Ok(())
        } else {
            Err(BookingError::Forbidden)
        }
    }

    /// Admin-only check for route and trip mutation.
    pub fn require_admin(&self) -> Result<(), BookingError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(BookingError::Forbidden)
        }
    }

    /// Whether a record owned by `owner` is visible in this caller's listings.
    pub fn can_see(&self, owner: AccountId) -> bool {
        self.is_admin() || self.account == owner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_is_authorized_for_any_owner() {
        let caller = Caller::admin(AccountId(1));
        assert!(caller.authorize_owner(AccountId(99)).is_ok());
        assert!(caller.require_admin().is_ok());
        assert!(caller.can_see(AccountId(99)));
    }

    #[test]
    fn user_is_authorized_only_for_own_records() {
        let caller = Caller::user(AccountId(7));
        assert!(caller.authorize_owner(AccountId(7)).is_ok());
        assert_eq!(
            caller.authorize_owner(AccountId(8)),
            Err(BookingError::Forbidden)
        );
        assert!(!caller.can_see(AccountId(8)));
    }

    #[test]
    fn user_cannot_pass_admin_check() {
        let caller = Caller::user(AccountId(7));
        assert_eq!(caller.require_admin(), Err(BookingError::Forbidden));
    }

    #[test]
    fn role_claim_spelling() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"user\"").unwrap(),
            Role::User
        );
    }
}
