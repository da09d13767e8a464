//! Core token and stream logic.
//!
//! This module contains:
//! - Signing: Immutable key/salt/TTL context
//! - Engine: Token issuance and verification
//! - Sanitize: URL and external id checks
//! - Policy: Stream authorization and resolution

pub mod clock;
pub mod engine;
pub mod error;
pub mod policy;
pub mod sanitize;
pub mod signing;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{Rejection, StatsSnapshot, TokenEngine, MAX_TOKEN_LEN};
pub use error::StreamError;
pub use policy::{resolve, StreamPolicy};
pub use signing::{SigningContext, DEFAULT_SALT, DEFAULT_TTL_SECONDS};
