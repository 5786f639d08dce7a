//! Shared task model and position allocator for `Flowboard`.
//!
//! Everything the client engine and the REST store must agree on lives
//! here: the task entity and its validation, the fractional position
//! allocator (one implementation, run on both sides), pagination shapes,
//! and the request bodies of the task interface.

pub mod api;
pub mod page;
pub mod position;
pub mod task;
