//! # Hierarchical Thompson Sampling
//!
//! Two levels of Beta-Bernoulli state: each cluster carries its own Beta
//! counters plus one pair per arm, and a multiplicative weight that drives
//! which cluster gets sampled.
//!
//! Selection draws a cluster from the normalized weights, draws one Beta
//! sample per arm inside it, then makes a second inverse-CDF draw over those
//! raw samples. The arm draw is stochastic, not an argmax.
//!
//! Every update touches every cluster. The failure branch of the per-arm
//! update increments `arms[cluster]` rather than `arms[arm]`; clusters whose
//! index has no matching arm record nothing on that branch.

use rand::Rng;
use rand::RngExt;

use crate::sampling::{BetaParams, normalize, sample_from_distribution};

/// Weights above this are scaled back down; only their ratios matter.
const WEIGHT_RESCALE_LIMIT: f64 = 1e150;

/// Reward threshold separating a success from a failure.
const SUCCESS_THRESHOLD: f64 = 0.5;

/// Upper bound of the uniform noise added to the cluster-level reward.
const CLUSTER_NOISE: f64 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub params: BetaParams,
    pub arms: Vec<BetaParams>,
}

impl Cluster {
    fn new(arms: usize) -> Self {
        Cluster {
            params: BetaParams::uninformative(),
            arms: vec![BetaParams::uninformative(); arms],
        }
    }
}

#[derive(Debug, Clone)]
pub struct HierarchicalThompson {
    arms: usize,
    clusters: Vec<Cluster>,
    weights: Vec<f64>,
}

impl HierarchicalThompson {
    pub const DEFAULT_CLUSTERS: usize = 3;

    pub fn new(arms: usize, clusters: usize) -> Self {
        HierarchicalThompson {
            arms,
            clusters: (0..clusters).map(|_| Cluster::new(arms)).collect(),
            weights: vec![1.0; clusters],
        }
    }

    pub fn num_arms(&self) -> usize {
        self.arms
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn cluster_weights(&self) -> &[f64] {
        &self.weights
    }

    /// Cluster index drawn from the normalized weights.
    pub fn sample_cluster(&self, rng: &mut impl Rng) -> usize {
        sample_from_distribution(&normalize(&self.weights), rng)
    }

    pub fn select_arm(&self, rng: &mut impl Rng) -> usize {
        let cluster = self.sample_cluster(rng);
        let samples: Vec<f64> = self.clusters[cluster]
            .arms
            .iter()
            .map(|p| p.sample(rng))
            .collect();
        sample_from_distribution(&samples, rng)
    }

    pub fn update(&mut self, arm: usize, reward: f64, rng: &mut impl Rng) {
        for c in 0..self.clusters.len() {
            let noisy = reward + rng.random::<f64>() * CLUSTER_NOISE;
            let cluster = &mut self.clusters[c];
            if noisy > SUCCESS_THRESHOLD {
                cluster.params.alpha += 1.0;
            } else {
                cluster.params.beta += 1.0;
            }

            if reward > SUCCESS_THRESHOLD {
                cluster.arms[arm].alpha += 1.0;
            } else if let Some(params) = cluster.arms.get_mut(c) {
                params.beta += 1.0;
            }
        }

        for (weight, cluster) in self.weights.iter_mut().zip(&self.clusters) {
            *weight *= 1.0 + cluster.params.mean();
        }

        let max_weight = self.weights.iter().cloned().fold(0.0, f64::max);
        if max_weight > WEIGHT_RESCALE_LIMIT {
            tracing::debug!(max_weight, "rescaling cluster weights");
            for weight in &mut self.weights {
                *weight /= max_weight;
            }
        }
    }

    pub fn reset(&mut self) {
        for cluster in &mut self.clusters {
            *cluster = Cluster::new(self.arms);
        }
        self.weights.fill(1.0);
    }
}
