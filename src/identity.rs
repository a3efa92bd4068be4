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

//! Identity boundary: bearer-token verification into a caller identity.
//!
//! Credential storage and token issuance live outside this crate; requests
//! arrive with a signed JWT and the engine only needs the `(account, role)`
//! pair it carries. The HMAC secret is injected at process startup, never a
//! compiled-in literal.

use crate::base::AccountId;
use crate::error::BookingError;
use crate::policy::{Caller, Role};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// JWT claims carried by request credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account id of the caller.
    pub sub: u32,
    pub role: Role,
    /// Expiry as a Unix timestamp.
    pub exp: usize,
}

/// Verifies bearer tokens against the injected HMAC secret.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding: DecodingKey,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Decodes and verifies a token into a [`Caller`].
    ///
    /// Any failure (bad signature, expiry, malformed claims) collapses to
    /// [`BookingError::Unauthenticated`]; the reason is not leaked to the
    /// client.
    pub fn verify(&self, token: &str) -> Result<Caller, BookingError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| BookingError::Unauthenticated)?;
        Ok(Caller {
            account: AccountId(data.claims.sub),
            role: data.claims.role,
        })
    }
}

/// Signs a token for the given claims.
///
/// The real issuer is external; this helper exists for local development and
/// test setup.
pub fn issue_token(secret: &str, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}
