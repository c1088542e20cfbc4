//! HTTP API Adapter - The Small Operator-facing Surface
//!
//! Exposes the core-facing contract over axum: status/report reads,
//! plan/result/confirm mutations, policy controls, liveness/readiness
//! probes, and Prometheus metrics. Requests are serialized through one
//! async mutex, matching the single-writer model of the ledger.

pub mod server;

pub use server::{serve, ApiState};
