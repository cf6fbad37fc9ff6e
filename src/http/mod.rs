//! HTTP serving for the admin API.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack, graceful shutdown)
//!     → request.rs (assign / propagate X-Request-ID)
//!     → admin router (Basic auth, handlers)
//!     → JSON response
//! ```

pub mod request;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::AdminServer;
