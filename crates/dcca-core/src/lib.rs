// Error types module
pub mod error;

// Diameter wire format module
pub mod diameter;

// Typed message <-> packet conversion
pub mod codec;

pub mod transport;

// Re-export commonly used types
pub use codec::{decode_envelope, decode_message, encode_message, MAX_GROUP_DEPTH};
pub use diameter::{DiameterAvp, DiameterHeader, DiameterPacket, HEADER_LEN};
pub use error::{DccaError, ErrorSeverity, Result};
pub use transport::Transport;
