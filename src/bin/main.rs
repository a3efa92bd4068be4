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

use bus_reserve_rs::Engine;
use bus_reserve_rs::identity::TokenVerifier;
use bus_reserve_rs::server::{AppState, router};
use clap::Parser;
use std::net::SocketAddr;
use std::process;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Bus Reserve - role-gated seat reservation API
///
/// Serves the reservation engine over HTTP. Callers authenticate with a
/// bearer JWT signed by the external identity provider; the verification
/// secret is injected via flag or environment, never compiled in.
#[derive(Parser, Debug)]
#[command(name = "bus-reserve-rs")]
#[command(about = "A reservation API for scheduled bus trips", long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:3000")]
    listen: SocketAddr,

    /// HMAC secret used to verify bearer tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let state = AppState {
        engine: Arc::new(Engine::new()),
        verifier: TokenVerifier::new(&args.jwt_secret),
    };

    let listener = match TcpListener::bind(args.listen).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Error binding {}: {}", args.listen, e);
            process::exit(1);
        }
    };

    tracing::info!(addr = %args.listen, "bus reservation API listening");

    if let Err(e) = axum::serve(listener, router(state)).await {
        eprintln!("Server error: {}", e);
        process::exit(1);
    }
}
