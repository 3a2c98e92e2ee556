//! Server internals for the Client Mapping Portal API.
//!
//! Exposed as a library so integration tests can mount the same route
//! table the binary serves.

pub mod app;
pub mod errors;
pub mod handlers;
pub mod publish;
