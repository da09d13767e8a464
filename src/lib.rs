//! playgate - Short-lived playback capability tokens
//!
//! Grants scoped, time-bounded authorization to stream one media resource
//! without presenting a long-lived session credential on every request.
//!
//! # Architecture
//!
//! The system is built around stateless signed capabilities:
//! - A token binds one resource id to an expiry and is signed with HMAC-SHA256
//! - Verification is pure computation, so replicas share no state
//! - There is no revocation; tokens are short-lived instead
//!
//! # Modules
//!
//! - `adapters`: External collaborators (resource catalog, identity provider)
//! - `core`: Token engine, stream policy, sanitization
//! - `domain`: Data structures (tokens, resources, playable URLs)
//! - `api`: Endpoint contracts (status + JSON body)
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Mint a token for a resource
//! PLAYGATE_SECRET_KEY=... playgate token vid123
//!
//! # Resolve the stream URL with it
//! playgate stream vid123 --token <token>
//! ```

pub mod adapters;
pub mod api;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use crate::adapters::{
    CallerIdentity, IdentityProvider, InMemoryLookup, JsonCatalog, ResourceLookup,
};
pub use crate::core::{
    Clock, ManualClock, Rejection, SigningContext, StreamError, StreamPolicy, SystemClock,
    TokenEngine,
};
pub use crate::domain::{PlayableUrl, PlaybackToken, ResourceRecord};
