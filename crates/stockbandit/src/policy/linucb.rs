//! # LinUCB: contextual linear bandit
//!
//! Each arm keeps a ridge-regression state: a design matrix `A` (starts at
//! the identity) and a response vector `b` (starts at zero). The score of an
//! arm for context `x` is
//!
//! ```text
//! θ   = A⁻¹ b
//! ucb = θ·x + α · sqrt(xᵀ A⁻¹ x)
//! ```
//!
//! Updates are pure rank-one accumulation with no forgetting, so `A` grows
//! without bound over a long session.

use crate::linalg::{self, Matrix};

use super::stats::argmax;

/// Ridge-regression state for one arm.
#[derive(Debug, Clone, PartialEq)]
pub struct LinUcbArm {
    pub a: Matrix,
    pub b: Vec<f64>,
}

impl LinUcbArm {
    fn new(dim: usize) -> Self {
        LinUcbArm {
            a: linalg::identity(dim),
            b: vec![0.0; dim],
        }
    }

    /// Upper confidence score for `context`.
    ///
    /// A singular `A` is used uninverted rather than failing the round.
    pub fn score(&self, context: &[f64], alpha: f64) -> f64 {
        let a_inv = linalg::inverse_or_self(&self.a);
        let theta = linalg::mat_vec(&a_inv, &self.b);
        let variance = linalg::quadratic_form(context, &a_inv);
        linalg::dot(&theta, context) + alpha * variance.sqrt()
    }
}

#[derive(Debug, Clone)]
pub struct LinUcb {
    dim: usize,
    alpha: f64,
    arms: Vec<LinUcbArm>,
}

impl LinUcb {
    pub const DEFAULT_ALPHA: f64 = 1.0;

    pub fn new(arms: usize, context_dimension: usize, alpha: f64) -> Self {
        LinUcb {
            dim: context_dimension,
            alpha,
            arms: (0..arms).map(|_| LinUcbArm::new(context_dimension)).collect(),
        }
    }

    pub fn context_dimension(&self) -> usize {
        self.dim
    }

    pub fn num_arms(&self) -> usize {
        self.arms.len()
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Highest-scoring arm for `context`; the first index wins ties.
    pub fn select_arm(&self, context: &[f64]) -> usize {
        argmax(self.arms.iter().map(|arm| arm.score(context, self.alpha)))
    }

    /// `A += x xᵀ`, `b += r x` for the chosen arm only.
    pub fn update(&mut self, arm: usize, context: &[f64], reward: f64) {
        let state = &mut self.arms[arm];
        linalg::add_outer(&mut state.a, context);
        linalg::add_scaled(&mut state.b, reward, context);
    }

    pub fn arm(&self, arm: usize) -> Option<&LinUcbArm> {
        self.arms.get(arm)
    }

    pub fn reset(&mut self) {
        for state in &mut self.arms {
            *state = LinUcbArm::new(self.dim);
        }
    }
}
