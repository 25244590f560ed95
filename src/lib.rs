//! pgprobe: an acceptance-test probe for provisioned PostgreSQL instances.
//!
//! Resolves bound service credentials by tag, runs a minimal smoke test
//! against the instance (connect, create schema, create table), and on
//! success serves a fixed body over HTTP so an external orchestrator can
//! observe the result. Any failure is terminal: it is logged and the
//! process exits without ever starting the server.

pub mod bindings;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod smoke;
pub mod state;
