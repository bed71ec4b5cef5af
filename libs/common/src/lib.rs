//! Shared infrastructure for the event check-in service
//!
//! This crate holds the pieces every service binary needs regardless of what
//! it does: PostgreSQL pool configuration and initialization, and the error
//! type those operations report with.

pub mod database;
pub mod error;
