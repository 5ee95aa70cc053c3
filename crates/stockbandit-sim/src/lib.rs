//! Simulation harness for stockbandit.
//!
//! Provides a synthetic market that implements the reward boundary, random
//! price histories for the portfolio optimizer, and end-to-end runners used
//! by the `stockbandit-sim` binary and the integration tests.

pub mod market;
pub mod scenario;
