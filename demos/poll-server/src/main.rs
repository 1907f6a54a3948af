//! Standalone poll server binary.
//!
//! Binds a WebSocket listener and serves poll rooms. Room creation goes
//! through the in-process API here: the server creates one room at startup
//! and prints its join code, which is enough to drive a classroom session
//! from any WebSocket client.
//!
//! Configuration via environment:
//!   POLLCAST_ADDR — listen address (default 0.0.0.0:8080)

use pollcast::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pollcast::init_tracing();

    let addr = std::env::var("POLLCAST_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let server = ServerBuilder::new().bind(&addr).build().await?;

    let api = server.api();
    let code = api.create_room("host").await?;
    eprintln!("poll server listening on {addr}");
    eprintln!("room code: {code}");

    server.run().await?;
    Ok(())
}
