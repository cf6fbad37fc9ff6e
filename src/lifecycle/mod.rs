//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Compile schema → Build store, drafts, reload hub
//!
//! Reload (reload.rs):
//!     deploy / rollback / SIGHUP / file edit → re-read active mapping
//!     → swap live snapshot → broadcast ReloadEvent to consumers
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain admin requests → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!     SIGHUP → Trigger mapping reload
//! ```

pub mod reload;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use reload::{ReloadEvent, ReloadHub, ReloadReason};
pub use shutdown::Shutdown;
pub use startup::{build_services, Services, StartupError};
