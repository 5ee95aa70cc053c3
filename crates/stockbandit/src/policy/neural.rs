//! # Neural Bandit
//!
//! One small feed-forward network per arm maps the context to an expected
//! reward. Selection adds IID uniform noise scaled by `exploration_bonus` to
//! each prediction; that noise is an exploration heuristic, not a confidence
//! bound.
//!
//! Two training rules are available and never mixed within one bandit:
//!
//! - [`UpdateRule::InputScaled`] (default): every weight `w[l][o][i]` moves by
//!   `lr · error · context[i]`, on every layer. Hidden-layer inputs beyond the
//!   context width have no matching component and are left alone. Biases are
//!   not trained. This is a toy online learner, not a gradient.
//! - [`UpdateRule::Backprop`]: single-sample back-propagation of the squared
//!   error through the ReLU layers, biases included.

use rand::Rng;
use rand::RngExt;

use crate::linalg::{self, Matrix};

use super::stats::argmax;

/// How [`NeuralBandit::update`] adjusts a network after a reward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UpdateRule {
    #[default]
    InputScaled,
    Backprop,
}

impl std::fmt::Display for UpdateRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateRule::InputScaled => write!(f, "input_scaled"),
            UpdateRule::Backprop => write!(f, "backprop"),
        }
    }
}

impl std::str::FromStr for UpdateRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "input_scaled" => Ok(UpdateRule::InputScaled),
            "backprop" => Ok(UpdateRule::Backprop),
            other => Err(format!("unknown update rule: {other}")),
        }
    }
}

/// Fully connected layer: `weights` is `out × in`.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseLayer {
    pub weights: Matrix,
    pub biases: Vec<f64>,
}

impl DenseLayer {
    /// Weights uniform in ±0.05, biases uniform in [0, 0.1).
    fn random(inputs: usize, outputs: usize, rng: &mut impl Rng) -> Self {
        let weights = (0..outputs)
            .map(|_| {
                (0..inputs)
                    .map(|_| (rng.random::<f64>() - 0.5) * 0.1)
                    .collect()
            })
            .collect();
        let biases = (0..outputs).map(|_| rng.random::<f64>() * 0.1).collect();
        DenseLayer { weights, biases }
    }

    fn apply(&self, input: &[f64]) -> Vec<f64> {
        linalg::mat_vec(&self.weights, input)
            .into_iter()
            .zip(&self.biases)
            .map(|(z, b)| z + b)
            .collect()
    }
}

fn relu(values: &mut [f64]) {
    for v in values {
        *v = v.max(0.0);
    }
}

/// Feed-forward network with ReLU between layers and a linear output.
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    layers: Vec<DenseLayer>,
}

impl Network {
    /// Random network with layer widths `sizes` (input first, output last).
    pub fn random(sizes: &[usize], rng: &mut impl Rng) -> Self {
        let layers = sizes
            .windows(2)
            .map(|w| DenseLayer::random(w[0], w[1], rng))
            .collect();
        Network { layers }
    }

    pub fn from_layers(layers: Vec<DenseLayer>) -> Self {
        Network { layers }
    }

    pub fn layers(&self) -> &[DenseLayer] {
        &self.layers
    }

    /// Scalar output for `input`.
    pub fn forward(&self, input: &[f64]) -> f64 {
        self.activations(input)
            .last()
            .and_then(|out| out.first().copied())
            .unwrap_or(0.0)
    }

    /// Input followed by each layer's post-activation output.
    fn activations(&self, input: &[f64]) -> Vec<Vec<f64>> {
        let last = self.layers.len().saturating_sub(1);
        let mut acts = Vec::with_capacity(self.layers.len() + 1);
        acts.push(input.to_vec());
        for (i, layer) in self.layers.iter().enumerate() {
            let mut out = layer.apply(&acts[i]);
            if i < last {
                relu(&mut out);
            }
            acts.push(out);
        }
        acts
    }

    fn apply_input_scaled(&mut self, context: &[f64], error: f64, learning_rate: f64) {
        for layer in &mut self.layers {
            for row in &mut layer.weights {
                for (w, x) in row.iter_mut().zip(context) {
                    *w += learning_rate * error * x;
                }
            }
        }
    }

    fn apply_backprop(&mut self, context: &[f64], error: f64, learning_rate: f64) {
        let acts = self.activations(context);
        // Step along -dL/dz for L = ½(target - output)².
        let mut delta = vec![error];
        for l in (0..self.layers.len()).rev() {
            let input = &acts[l];
            let layer = &mut self.layers[l];

            let prev_delta: Vec<f64> = if l > 0 {
                (0..input.len())
                    .map(|i| {
                        if input[i] <= 0.0 {
                            return 0.0;
                        }
                        layer
                            .weights
                            .iter()
                            .zip(&delta)
                            .map(|(row, d)| row[i] * d)
                            .sum()
                    })
                    .collect()
            } else {
                Vec::new()
            };

            for ((row, bias), d) in layer.weights.iter_mut().zip(&mut layer.biases).zip(&delta) {
                for (w, x) in row.iter_mut().zip(input) {
                    *w += learning_rate * d * x;
                }
                *bias += learning_rate * d;
            }
            delta = prev_delta;
        }
    }
}

#[derive(Debug, Clone)]
pub struct NeuralBandit {
    dim: usize,
    hidden_layers: Vec<usize>,
    networks: Vec<Network>,
    exploration_bonus: f64,
    learning_rate: f64,
    rule: UpdateRule,
}

impl NeuralBandit {
    pub const DEFAULT_HIDDEN_LAYERS: [usize; 2] = [64, 32];
    pub const DEFAULT_EXPLORATION_BONUS: f64 = 0.1;
    pub const DEFAULT_LEARNING_RATE: f64 = 0.01;

    pub fn new(
        arms: usize,
        context_dimension: usize,
        hidden_layers: &[usize],
        rng: &mut impl Rng,
    ) -> Self {
        let mut bandit = NeuralBandit {
            dim: context_dimension,
            hidden_layers: hidden_layers.to_vec(),
            networks: Vec::with_capacity(arms),
            exploration_bonus: Self::DEFAULT_EXPLORATION_BONUS,
            learning_rate: Self::DEFAULT_LEARNING_RATE,
            rule: UpdateRule::default(),
        };
        bandit.networks = (0..arms).map(|_| bandit.fresh_network(rng)).collect();
        bandit
    }

    pub fn with_exploration_bonus(mut self, bonus: f64) -> Self {
        self.exploration_bonus = bonus;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_update_rule(mut self, rule: UpdateRule) -> Self {
        self.rule = rule;
        self
    }

    fn fresh_network(&self, rng: &mut impl Rng) -> Network {
        let mut sizes = Vec::with_capacity(self.hidden_layers.len() + 2);
        sizes.push(self.dim);
        sizes.extend_from_slice(&self.hidden_layers);
        sizes.push(1);
        Network::random(&sizes, rng)
    }

    pub fn context_dimension(&self) -> usize {
        self.dim
    }

    pub fn num_arms(&self) -> usize {
        self.networks.len()
    }

    pub fn update_rule(&self) -> UpdateRule {
        self.rule
    }

    pub fn network(&self, arm: usize) -> Option<&Network> {
        self.networks.get(arm)
    }

    pub fn predict(&self, arm: usize, context: &[f64]) -> f64 {
        self.networks[arm].forward(context)
    }

    pub fn select_arm(&self, context: &[f64], rng: &mut impl Rng) -> usize {
        argmax(self.networks.iter().map(|net| {
            let bonus = self.exploration_bonus * rng.random::<f64>();
            net.forward(context) + bonus
        }))
    }

    pub fn update(&mut self, arm: usize, context: &[f64], reward: f64) {
        let network = &mut self.networks[arm];
        let error = reward - network.forward(context);
        match self.rule {
            UpdateRule::InputScaled => {
                network.apply_input_scaled(context, error, self.learning_rate)
            }
            UpdateRule::Backprop => network.apply_backprop(context, error, self.learning_rate),
        }
    }

    /// Re-draw every network from scratch.
    pub fn reset(&mut self, rng: &mut impl Rng) {
        self.networks = (0..self.networks.len())
            .map(|_| self.fresh_network(rng))
            .collect();
    }
}
