//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement the
//! bankroll manager's workflows.
//!
//! Use cases:
//! - `BankrollService`: plan stakes, apply results, policy controls,
//!   status/report projections — one read-modify-write cycle each

pub mod bankroll;
