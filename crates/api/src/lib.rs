//! Fanray API server library.
//!
//! Exposes the core building blocks (config, state, error handling,
//! routes, the MetaWeblog XML-RPC shim, background listeners) so
//! integration tests and the binary entrypoint can both access them.

pub mod background;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metaweblog;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
