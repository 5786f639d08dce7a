//! Flowboard — Kanban board client library.
//!
//! Provides the optimistic board layer ([`board`]), the repository
//! abstraction over the task backend ([`repo`]), and layered configuration
//! ([`config`]).

pub mod board;
pub mod config;
pub mod repo;
