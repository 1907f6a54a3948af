//! # Pollcast
//!
//! Real-time live-polling server. An admin creates a room, participants
//! join it over WebSocket, the admin pushes questions with a countdown,
//! and every connection in the room receives synchronized state events.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use pollcast::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), PollcastError> {
//!     let server = ServerBuilder::new().bind("0.0.0.0:8080").build().await?;
//!     let api = server.api();
//!     let code = api.create_room("Alice").await?;
//!     println!("room code: {code}");
//!     server.run().await
//! }
//! ```

mod api;
mod error;
mod handler;
mod server;
mod ws;

pub use api::PollApi;
pub use error::PollcastError;
pub use server::{PollServer, ServerBuilder};
pub use ws::{WsError, WsListener};

/// Common imports for server binaries and tests.
pub mod prelude {
    pub use crate::{
        PollApi, PollServer, PollcastError, ServerBuilder,
    };
    pub use pollcast_protocol::{
        ClientMessage, QuestionPayload, RoomCode, RoomSnapshot,
        ServerEvent,
    };
    pub use pollcast_room::RoomError;
}

/// Initializes a `tracing` subscriber that reads `RUST_LOG`.
///
/// Convenience for binaries; call once at startup. Falls back to `info`
/// level when `RUST_LOG` is unset.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}
