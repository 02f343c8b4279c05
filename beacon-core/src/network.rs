//! The Network: a fixed-topology feed-forward net trained on-line.
//!
//! - ReLU on hidden layers, sigmoid on the output layer
//! - Flattened row-major weight matrices: `weights[l][i * fan_in + j]`
//! - Plain per-sample backpropagation, additive update toward the target
//! - Activation derivatives are taken on the activation, not the weighted sum,
//!   unless a layer is switched to `DerivativeConvention::PreActivation`

use log::{debug, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::TARGET_PAD;
use crate::error::NetworkError;
use crate::utils::{random_vec, relu, sigmoid};

/// Non-linearity applied by a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    Relu,
    Sigmoid,
}

impl Activation {
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Activation::Relu => relu(x),
            Activation::Sigmoid => sigmoid(x),
        }
    }
}

/// Which value the derivative formulas `x·(1−x)` (sigmoid) and `[x > 0]`
/// (ReLU) are evaluated on during backprop.
///
/// `PostActivation` plugs in the neuron's output, `PreActivation` its
/// weighted sum. Learned weights depend on this choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DerivativeConvention {
    #[default]
    PostActivation,
    PreActivation,
}

impl DerivativeConvention {
    /// Derivative of `activation` for a neuron with weighted sum `sum` and output `out`.
    pub fn derivative(self, activation: Activation, sum: f64, out: f64) -> f64 {
        let x = match self {
            DerivativeConvention::PostActivation => out,
            DerivativeConvention::PreActivation => sum,
        };
        match activation {
            Activation::Relu => {
                if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::Sigmoid => x * (1.0 - x),
        }
    }
}

/// Complete numeric state of a network, as exported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkState {
    pub layer_sizes: Vec<usize>,
    pub weights: Vec<Vec<f64>>,
    pub biases: Vec<Vec<f64>>,
    pub learning_rate: f64,
}

/// State offered for import. Either half may be missing in corrupted input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateImport {
    #[serde(default)]
    pub weights: Option<Vec<Vec<f64>>>,
    #[serde(default)]
    pub biases: Option<Vec<Vec<f64>>>,
}

impl From<NetworkState> for StateImport {
    fn from(state: NetworkState) -> Self {
        Self {
            weights: Some(state.weights),
            biases: Some(state.biases),
        }
    }
}

/// One supervised example.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSample {
    pub inputs: Vec<f64>,
    pub targets: Vec<f64>,
}

impl TrainingSample {
    pub fn new(inputs: Vec<f64>, targets: Vec<f64>) -> Self {
        Self { inputs, targets }
    }

    /// A sample whose only signal is `target`, placed in slot 0 of a
    /// `width`-wide target vector. Remaining slots hold `TARGET_PAD`.
    pub fn scalar(inputs: Vec<f64>, target: f64, width: usize) -> Self {
        let mut targets = vec![TARGET_PAD; width.max(1)];
        targets[0] = target;
        Self { inputs, targets }
    }
}

/// A feed-forward network with on-line backpropagation.
#[derive(Debug, Clone)]
pub struct Network {
    layer_sizes: Vec<usize>,
    weights: Vec<Vec<f64>>,
    biases: Vec<Vec<f64>>,
    learning_rate: f64,
    conventions: Vec<DerivativeConvention>,
}

impl Network {
    /// Create a network with weights and biases uniform in [-1, 1].
    ///
    /// # Arguments
    /// * `layer_sizes` - neuron count per layer, input first, output last
    /// * `learning_rate` - step size applied to every gradient update
    ///
    /// # Returns
    /// `NetworkError::TooFewLayers` if fewer than two sizes are given.
    pub fn new(layer_sizes: &[usize], learning_rate: f64) -> Result<Self, NetworkError> {
        Self::with_rng(layer_sizes, learning_rate, &mut rand::thread_rng())
    }

    /// Same as `new`, drawing initial values from `rng`.
    ///
    /// Weights for layer `l` are stored row-major as `[to][from]`, so the
    /// weight from neuron `j` below to neuron `i` above sits at
    /// `i * layer_sizes[l] + j`. Every layer uses the default derivative
    /// convention until changed.
    pub fn with_rng<R: Rng + ?Sized>(
        layer_sizes: &[usize],
        learning_rate: f64,
        rng: &mut R,
    ) -> Result<Self, NetworkError> {
        if layer_sizes.len() < 2 {
            return Err(NetworkError::TooFewLayers(layer_sizes.len()));
        }

        let mut weights = Vec::with_capacity(layer_sizes.len() - 1);
        let mut biases = Vec::with_capacity(layer_sizes.len() - 1);
        for pair in layer_sizes.windows(2) {
            weights.push(random_vec(rng, pair[1] * pair[0]));
            biases.push(random_vec(rng, pair[1]));
        }

        Ok(Self {
            layer_sizes: layer_sizes.to_vec(),
            conventions: vec![DerivativeConvention::default(); weights.len()],
            weights,
            biases,
            learning_rate,
        })
    }

    /// Rebuild a network from an exported state.
    pub fn from_state(state: NetworkState) -> Result<Self, NetworkError> {
        let mut network = Self::with_rng(
            &state.layer_sizes,
            state.learning_rate,
            &mut rand::thread_rng(),
        )?;
        network.import_state(state.into())?;
        Ok(network)
    }

    pub fn layer_sizes(&self) -> &[usize] {
        &self.layer_sizes
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn weights(&self) -> &[Vec<f64>] {
        &self.weights
    }

    pub fn biases(&self) -> &[Vec<f64>] {
        &self.biases
    }

    /// Number of weight layers (one less than the number of layer sizes).
    pub fn depth(&self) -> usize {
        self.weights.len()
    }

    pub fn input_size(&self) -> usize {
        self.layer_sizes[0]
    }

    pub fn output_size(&self) -> usize {
        self.layer_sizes[self.layer_sizes.len() - 1]
    }

    /// Activation used by weight layer `layer`.
    pub fn activation(&self, layer: usize) -> Activation {
        if layer + 1 == self.depth() {
            Activation::Sigmoid
        } else {
            Activation::Relu
        }
    }

    pub fn derivative_convention(&self, layer: usize) -> Option<DerivativeConvention> {
        self.conventions.get(layer).copied()
    }

    /// Swap the derivative convention for one layer. Returns false if `layer` does not exist.
    pub fn set_derivative_convention(&mut self, layer: usize, convention: DerivativeConvention) -> bool {
        match self.conventions.get_mut(layer) {
            Some(slot) => {
                *slot = convention;
                true
            }
            None => false,
        }
    }

    /// Forward pass. Pure function of (weights, biases, input).
    ///
    /// For each weight layer: `sum_i = bias_i + Σ_j w[i][j] · in_j`, then the
    /// layer's activation (ReLU on hidden layers, sigmoid on the output).
    ///
    /// # Arguments
    /// * `input` - exactly `input_size()` values
    ///
    /// # Returns
    /// The output layer's activations, each in (0, 1), or
    /// `NetworkError::InputSize` on a length mismatch.
    pub fn feed_forward(&self, input: &[f64]) -> Result<Vec<f64>, NetworkError> {
        self.check_input(input)?;

        let mut activations = input.to_vec();
        for layer in 0..self.depth() {
            let (_, next) = self.layer_forward(layer, &activations);
            activations = next;
        }
        Ok(activations)
    }

    /// Train on `samples` for `epochs` passes, in order, one update per sample.
    ///
    /// Every sample is validated before any weight moves, so a malformed
    /// batch leaves the network untouched.
    ///
    /// Per sample (plain on-line backprop, no momentum, no batching):
    /// 1. Forward pass, caching every layer's sums and outputs.
    /// 2. Output error `e = target - out`.
    /// 3. From the top layer down: `g_i = e_i · f'(…)` under the layer's
    ///    derivative convention; the error for the layer below is
    ///    `Σ_i g_i · w[i][j]` using the pre-update weights.
    /// 4. `w[i][j] += lr · g_i · in_j` and `b_i += lr · g_i`.
    ///
    /// # Arguments
    /// * `samples` - applied in order on every epoch
    /// * `epochs` - number of passes; zero only validates
    pub fn train(&mut self, samples: &[TrainingSample], epochs: usize) -> Result<(), NetworkError> {
        for sample in samples {
            self.check_input(&sample.inputs)?;
            if sample.targets.len() != self.output_size() {
                return Err(NetworkError::TargetSize {
                    expected: self.output_size(),
                    actual: sample.targets.len(),
                });
            }
        }

        for _ in 0..epochs {
            for sample in samples {
                self.backpropagate(&sample.inputs, &sample.targets);
            }
        }
        Ok(())
    }

    /// Export a copy of the full numeric state. `from_state` on the result
    /// yields a network with identical outputs.
    pub fn export_state(&self) -> NetworkState {
        NetworkState {
            layer_sizes: self.layer_sizes.clone(),
            weights: self.weights.clone(),
            biases: self.biases.clone(),
            learning_rate: self.learning_rate,
        }
    }

    /// Replace weights and biases wholesale.
    ///
    /// Rejects a state with a missing half or with shapes that do not match
    /// this network's layer sizes; the current state is kept in that case.
    /// Layer sizes, learning rate and derivative conventions never change on
    /// import.
    pub fn import_state(&mut self, state: StateImport) -> Result<(), NetworkError> {
        match self.validate_import(&state) {
            Ok(()) => {
                // validate_import guarantees both halves are present
                if let (Some(weights), Some(biases)) = (state.weights, state.biases) {
                    self.weights = weights;
                    self.biases = biases;
                    debug!("Imported network state for layers {:?}", self.layer_sizes);
                }
                Ok(())
            }
            Err(e) => {
                warn!("Rejected network import: {}", e);
                Err(e)
            }
        }
    }

    fn validate_import(&self, state: &StateImport) -> Result<(), NetworkError> {
        let weights = state.weights.as_ref().ok_or(NetworkError::MissingField("weights"))?;
        let biases = state.biases.as_ref().ok_or(NetworkError::MissingField("biases"))?;

        for (kind, actual) in [("weight", weights.len()), ("bias", biases.len())] {
            if actual != self.depth() {
                return Err(NetworkError::LayerCount {
                    kind,
                    expected: self.depth(),
                    actual,
                });
            }
        }

        for (layer, pair) in self.layer_sizes.windows(2).enumerate() {
            let (fan_in, fan_out) = (pair[0], pair[1]);
            if weights[layer].len() != fan_in * fan_out {
                return Err(NetworkError::ShapeMismatch {
                    kind: "weights",
                    layer,
                    expected: fan_in * fan_out,
                    actual: weights[layer].len(),
                });
            }
            if biases[layer].len() != fan_out {
                return Err(NetworkError::ShapeMismatch {
                    kind: "biases",
                    layer,
                    expected: fan_out,
                    actual: biases[layer].len(),
                });
            }
        }
        Ok(())
    }

    fn check_input(&self, input: &[f64]) -> Result<(), NetworkError> {
        if input.len() != self.input_size() {
            return Err(NetworkError::InputSize {
                expected: self.input_size(),
                actual: input.len(),
            });
        }
        Ok(())
    }

    /// Weighted sums and activations of one layer.
    fn layer_forward(&self, layer: usize, inputs: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let fan_in = self.layer_sizes[layer];
        let fan_out = self.layer_sizes[layer + 1];
        let activation = self.activation(layer);
        let weights = &self.weights[layer];

        let mut sums = vec![0.0; fan_out];
        for (i, sum) in sums.iter_mut().enumerate() {
            for j in 0..fan_in {
                *sum += weights[i * fan_in + j] * inputs[j];
            }
            *sum += self.biases[layer][i];
        }
        let outs = sums.iter().map(|&s| activation.apply(s)).collect();
        (sums, outs)
    }

    /// One forward + backward pass for a single sample.
    fn backpropagate(&mut self, inputs: &[f64], targets: &[f64]) {
        let depth = self.depth();

        // ====================================================================
        // FORWARD (cache sums and activations)
        // ====================================================================
        let mut activations = Vec::with_capacity(depth + 1);
        let mut sums = Vec::with_capacity(depth);
        activations.push(inputs.to_vec());
        for layer in 0..depth {
            let (s, a) = self.layer_forward(layer, &activations[layer]);
            sums.push(s);
            activations.push(a);
        }

        let mut errors: Vec<f64> = activations[depth]
            .iter()
            .zip(targets)
            .map(|(out, target)| target - out)
            .collect();

        // ====================================================================
        // BACKWARD
        // ====================================================================
        for layer in (0..depth).rev() {
            let fan_in = self.layer_sizes[layer];
            let fan_out = self.layer_sizes[layer + 1];
            let activation = self.activation(layer);
            let convention = self.conventions[layer];

            let gradients: Vec<f64> = errors
                .iter()
                .enumerate()
                .map(|(i, e)| {
                    e * convention.derivative(activation, sums[layer][i], activations[layer + 1][i])
                })
                .collect();

            // Error for the layer below, through the weights as they were
            // before this layer's update.
            let mut below = vec![0.0; fan_in];
            for (j, err) in below.iter_mut().enumerate() {
                for (i, g) in gradients.iter().enumerate() {
                    *err += g * self.weights[layer][i * fan_in + j];
                }
            }

            let lr = self.learning_rate;
            let weights = &mut self.weights[layer];
            for i in 0..fan_out {
                for j in 0..fan_in {
                    weights[i * fan_in + j] += gradients[i] * activations[layer][j] * lr;
                }
            }
            for (b, g) in self.biases[layer].iter_mut().zip(&gradients) {
                *b += g * lr;
            }

            errors = below;
        }
    }
}
