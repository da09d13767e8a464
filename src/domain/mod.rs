//! Domain types for playgate.
//!
//! This module contains the core data structures:
//! - Token: Issued tokens and their signed claims
//! - Resource: Catalog records consumed read-only
//! - Stream: Playable URL outcomes

pub mod resource;
pub mod stream;
pub mod token;

// Re-export commonly used types
pub use resource::ResourceRecord;
pub use stream::PlayableUrl;
pub use token::{PlaybackToken, TokenClaims, VerifiedToken};
