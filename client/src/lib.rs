//! Parley client core: an in-memory cache of the chat state a session
//! sees, kept in sync with the server's gateway event stream.
//!
//! The gateway connection itself (transport, heartbeats, reconnect) lives
//! in a separate layer. This crate owns what happens after a frame
//! arrives: decoding dispatches into typed events, applying them to the
//! cached collections, and notifying observers of what changed.

pub mod config;
pub mod gateway;
pub mod model;
