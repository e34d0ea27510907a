//! Database module: row models and SQL repositories.
//!
//! This module is split into two submodules:
//! - `model`: insert payloads accepted by repositories.
//! - `repo`: SQL-only functions that map rows into entities.
//!
//! External modules should import from `lonergarden::db`; the repository API
//! and the insert models are re-exported here.

pub mod model;
pub mod repo;

pub use repo::*;

pub use model::{NewBooking, NewContactMessage, NewRoom};
