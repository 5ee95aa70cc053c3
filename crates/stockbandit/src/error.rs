//! Error type shared by the construction and session layers.
//!
//! Policies themselves never fail on well-formed input; these errors are
//! raised where input is validated before it reaches a policy.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BanditError {
    #[error("a policy needs at least one arm")]
    NoArms,
    #[error("arm {arm} out of range for {arms} arms")]
    ArmOutOfRange { arm: usize, arms: usize },
    #[error("context has {got} features, policy expects {expected}")]
    ContextDimension { expected: usize, got: usize },
    #[error("{symbols} symbols supplied for a policy with {arms} arms")]
    SymbolCount { symbols: usize, arms: usize },
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
