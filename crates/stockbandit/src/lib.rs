//! Decision core for bandit-driven stock selection.
//!
//! This crate contains:
//! - **Policies**: epsilon-greedy, UCB1, Gaussian Thompson Sampling, LinUCB,
//!   a small neural bandit and hierarchical Thompson Sampling
//! - **Portfolio**: expected returns, covariance and a minimum-variance
//!   gradient-descent optimizer
//! - **Session**: the select → reward → update round loop over a
//!   [`reward::RewardSource`]
//! - **Config**: TOML configuration resolved into typed policy settings
//!
//! Randomness is always injected (`&mut impl rand::Rng`) so every stochastic
//! path is replayable with a seeded generator.

pub mod config;
pub mod error;
pub mod linalg;
pub mod policy;
pub mod portfolio;
pub mod reward;
pub mod sampling;
pub mod session;

pub use error::BanditError;
