//! Flowboard task server library.
//!
//! Exposes the board store and its REST interface for use in tests and
//! embedding. The server holds the canonical task set, computes positions
//! for drag-and-drop moves, and serves plain or paginated task listings.

pub mod config;
pub mod http;
pub mod store;
