//! # duokv
//!
//! A small in-memory key-value server reachable over both TCP and UDP.
//!
//! Every key holds an ordered list of string values. Clients speak a
//! one-line text protocol (`put`, `get`, `del`, `store`, `exit`) that is
//! identical on both transports; TCP sessions are served concurrently, UDP
//! packets by a single loop, and both share one locked store.

pub mod command;
pub mod config;
pub mod connection;
pub mod datagram;
pub mod error;
pub mod server;
pub mod store;
