//! Scheduled database backup engine.
//!
//! A single-process service that periodically produces point-in-time backups
//! of an operational database (PostgreSQL via `pg_dump`, or a single-file
//! SQLite database) according to user-defined schedules, enforces a
//! per-schedule retention policy over the produced artifacts, and records
//! every attempt in an append-only history.

pub mod core;
pub mod interface;
pub mod model;
pub mod utils;
