//! # Sampling primitives
//!
//! Small random-variate generators shared by the stochastic policies. Every
//! function takes the generator explicitly so a seeded `StdRng` replays the
//! same draws.
//!
//! The Gamma sampler is the sum-of-exponentials construction, which is only
//! exact for integer shapes. The Beta-Bernoulli counters that feed it only
//! ever hold integers, so that is all it has to support.

use rand::Rng;
use rand::RngExt;

/// Parameters for a Beta distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BetaParams {
    /// Success count (α).
    pub alpha: f64,
    /// Failure count (β).
    pub beta: f64,
}

impl BetaParams {
    /// Uninformative prior: Beta(1, 1) = uniform.
    pub fn uninformative() -> Self {
        BetaParams {
            alpha: 1.0,
            beta: 1.0,
        }
    }

    /// Expected value E[X] = α / (α + β).
    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    /// Draw from Beta(α, β) as Ga / (Ga + Gb).
    pub fn sample(&self, rng: &mut impl Rng) -> f64 {
        beta_sample(self.alpha, self.beta, rng)
    }
}

/// Box-Muller standard normal.
///
/// Both uniforms are redrawn while zero so `ln` never sees 0.
pub fn standard_normal(rng: &mut impl Rng) -> f64 {
    let u1 = nonzero_uniform(rng);
    let u2 = nonzero_uniform(rng);
    (-2.0_f64 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

fn nonzero_uniform(rng: &mut impl Rng) -> f64 {
    loop {
        let u: f64 = rng.random();
        if u != 0.0 {
            return u;
        }
    }
}

/// Gamma(shape, rate) approximated as the sum of `ceil(shape)` unit
/// exponentials divided by `rate`.
pub fn gamma_sample(shape: f64, rate: f64, rng: &mut impl Rng) -> f64 {
    let mut sum = 0.0;
    let mut i = 0.0;
    while i < shape {
        let u: f64 = rng.random();
        // 1 - u lies in (0, 1]
        sum -= (1.0 - u).ln();
        i += 1.0;
    }
    sum / rate
}

/// Beta(α, β) via two independent Gamma draws.
pub fn beta_sample(alpha: f64, beta: f64, rng: &mut impl Rng) -> f64 {
    let x = gamma_sample(alpha, 1.0, rng);
    let y = gamma_sample(beta, 1.0, rng);
    if x + y == 0.0 { 0.5 } else { x / (x + y) }
}

/// Inverse-CDF draw over `weights`.
///
/// A single `U[0, 1)` is compared against the running sum; the first index
/// whose cumulative weight reaches it wins, and the last index is returned
/// if the weights never reach it. The weights are used as given, so callers
/// that want a proper categorical draw must normalize first.
pub fn sample_from_distribution(weights: &[f64], rng: &mut impl Rng) -> usize {
    let u: f64 = rng.random();
    let mut cumsum = 0.0;
    for (i, w) in weights.iter().enumerate() {
        cumsum += w;
        if u <= cumsum {
            return i;
        }
    }
    weights.len().saturating_sub(1)
}

/// Normalize non-negative weights to a probability vector.
///
/// A zero or non-finite total yields the uniform distribution.
pub fn normalize(weights: &[f64]) -> Vec<f64> {
    let total: f64 = weights.iter().sum();
    if total > 0.0 && total.is_finite() {
        weights.iter().map(|w| w / total).collect()
    } else {
        let n = weights.len().max(1) as f64;
        vec![1.0 / n; weights.len()]
    }
}
