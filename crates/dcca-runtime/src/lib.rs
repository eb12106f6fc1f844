//! Tokio runtime for the credit-control endpoints.
//!
//! The protocol decisions live in `dcca-cc-core`; this crate owns the
//! sockets, the answer timers and the peer-level Diameter housekeeping
//! (capabilities exchange, watchdog, disconnect).

pub mod client_actor;
pub mod peer;
pub mod server;

mod report;

pub use dcca_core::ErrorSeverity;

pub use client_actor::{connect_and_run, run_session, ClientActor, ClientOptions, SessionGuard};
pub use peer::{read_packet, write_message, IdAllocator, PeerIdentity};
pub use server::{serve_connection, CreditControlServer};
