//! Credit-control session logic without any I/O.
//!
//! The runtime feeds [`SessionEvent`]s into a [`CreditControlSession`] and
//! executes the [`SessionAction`]s it returns; the server side calls
//! [`AnswerHandler::handle`] once per inbound request.

pub mod compose;
pub mod handler;
pub mod session;
pub mod types;

pub use compose::{compose, compose_answer, compose_request, granted_units, new_session_id, Role};
pub use handler::{requested_units, AnswerHandler};
pub use session::CreditControlSession;
pub use types::{SessionAction, SessionEvent, SessionOutcome, SessionPhase};
