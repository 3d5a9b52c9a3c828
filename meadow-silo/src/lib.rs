//! # Meadow Silo
//!
//! Strategy layer over the farm workflow engine: assembles silo balances
//! from deposit crates, decides which crates satisfy a withdrawal or
//! conversion, and builds the matching farm workflows.

#![allow(clippy::missing_errors_doc)]

pub mod balance;
pub mod claim;
pub mod convert;
pub mod enroot;
pub mod prelude;
pub mod quote_guard;
pub mod withdraw;
