use std::collections::BTreeMap;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::{SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Uniform};

use crate::{
    LearnerError, Tensor,
    vocab::{FEATURES, WINDOW},
};

/// Number of hidden units. The final hidden state is the output layer, so it
/// matches the vocabulary width.
pub const UNITS: usize = FEATURES;

/// Parameter name of the input-to-hidden weight matrix.
pub const KERNEL: &str = "kernel";

/// Parameter name of the hidden-to-hidden weight matrix.
pub const RECURRENT_KERNEL: &str = "recurrent_kernel";

/// Parameter name of the hidden bias vector.
pub const BIAS: &str = "bias";

/// The outcome of a single parameter-update step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainStep {
    /// Squared error averaged over the output vector.
    pub loss: f32,
    /// Class index of the strongest output unit after the update's forward
    /// pass.
    pub output: usize,
}

/// The fixed-topology learner: a single-layer tanh RNN over character
/// windows.
///
/// The parameter name/shape set is fixed for the lifetime of an instance;
/// only the values change, and only through [`WordRnn::train`] and
/// [`WordRnn::import_tensors`]. Inference borrows the learner immutably, so
/// the borrow checker rules out an `infer` racing a mutating call.
#[derive(Debug)]
pub struct WordRnn {
    kernel: Array2<f32>,
    recurrent_kernel: Array2<f32>,
    bias: Array1<f32>,
    learning_rate: f32,
}

impl WordRnn {
    /// Creates a learner with Xavier-uniform initial weights and zero bias.
    ///
    /// # Args
    /// * `learning_rate` - Step size of the gradient update.
    /// * `seed` - Seeds the weight RNG when given; construction is then
    ///   fully deterministic.
    ///
    /// # Errors
    /// Returns `LearnerError::InvalidInput` if the learning rate is not a
    /// positive finite number.
    pub fn new(learning_rate: f32, seed: Option<u64>) -> Result<Self, LearnerError> {
        if !learning_rate.is_finite() || learning_rate <= 0.0 {
            return Err(LearnerError::InvalidInput(
                "learning rate must be a positive finite number",
            ));
        }

        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let range = (6.0 / (FEATURES + UNITS) as f32).sqrt();
        // SAFETY: the range bounds are constants with low < high.
        let dist = Uniform::new(-range, range).unwrap();

        Ok(Self {
            kernel: sample_matrix(&mut rng, &dist, FEATURES, UNITS),
            recurrent_kernel: sample_matrix(&mut rng, &dist, UNITS, UNITS),
            bias: Array1::zeros(UNITS),
            learning_rate,
        })
    }

    /// Returns the ordered `(name, shape)` registry of the learner's
    /// parameters.
    ///
    /// Save, restore and aggregation all address parameters through this
    /// set; it never changes for a given topology.
    pub fn registry() -> Vec<(&'static str, Vec<usize>)> {
        vec![
            (KERNEL, vec![FEATURES, UNITS]),
            (RECURRENT_KERNEL, vec![UNITS, UNITS]),
            (BIAS, vec![UNITS]),
        ]
    }

    /// Runs the forward pass and returns the predicted class index.
    ///
    /// Pure: two calls with the same input on an unmodified learner return
    /// the same index.
    ///
    /// # Errors
    /// Returns `LearnerError::ShapeMismatch` if `x` is not `[WINDOW,
    /// FEATURES]`.
    pub fn infer(&self, x: ArrayView2<f32>) -> Result<usize, LearnerError> {
        check_shape("x", x.shape(), &[WINDOW, FEATURES])?;
        let states = self.run(x);
        Ok(argmax(states[WINDOW].view()))
    }

    /// Performs exactly one gradient step on the given labeled example.
    ///
    /// The loss is the squared error between the final hidden state and the
    /// one-hot target, averaged over the output vector; gradients flow back
    /// through every window position.
    ///
    /// # Errors
    /// Returns `LearnerError::ShapeMismatch` if `x` is not `[WINDOW,
    /// FEATURES]` or `y` is not `[FEATURES]`. The parameters are untouched
    /// on failure.
    pub fn train(
        &mut self,
        x: ArrayView2<f32>,
        y: ArrayView1<f32>,
    ) -> Result<TrainStep, LearnerError> {
        check_shape("x", x.shape(), &[WINDOW, FEATURES])?;
        check_shape("y", y.shape(), &[UNITS])?;

        let states = self.run(x);
        let output = &states[WINDOW];
        let diff = output - &y;
        // SAFETY: the output vector is never empty.
        let loss = diff.pow2().mean().unwrap();
        let prediction = argmax(output.view());

        // Backpropagation through time. `delta` is dL/dz_t, starting from
        // the mean-squared-error gradient at the last step.
        let mut grad_kernel = Array2::<f32>::zeros((FEATURES, UNITS));
        let mut grad_recurrent = Array2::<f32>::zeros((UNITS, UNITS));
        let mut grad_bias = Array1::<f32>::zeros(UNITS);

        let mut delta = diff.mapv(|d| 2.0 * d / UNITS as f32) * output.mapv(tanh_prime);

        for t in (1..=WINDOW).rev() {
            grad_kernel += &outer_product(x.row(t - 1), delta.view());
            grad_recurrent += &outer_product(states[t - 1].view(), delta.view());
            grad_bias += &delta;

            if t > 1 {
                delta = self.recurrent_kernel.dot(&delta) * states[t - 1].mapv(tanh_prime);
            }
        }

        self.kernel.scaled_add(-self.learning_rate, &grad_kernel);
        self.recurrent_kernel
            .scaled_add(-self.learning_rate, &grad_recurrent);
        self.bias.scaled_add(-self.learning_rate, &grad_bias);

        Ok(TrainStep { loss, output: prediction })
    }

    /// Snapshots the current parameter values in registry order.
    pub fn export_tensors(&self) -> Vec<Tensor> {
        // SAFETY: shapes and element counts match by construction.
        vec![
            Tensor::new(
                KERNEL,
                vec![FEATURES, UNITS],
                self.kernel.iter().copied().collect(),
            )
            .unwrap(),
            Tensor::new(
                RECURRENT_KERNEL,
                vec![UNITS, UNITS],
                self.recurrent_kernel.iter().copied().collect(),
            )
            .unwrap(),
            Tensor::new(BIAS, vec![UNITS], self.bias.iter().copied().collect()).unwrap(),
        ]
    }

    /// Overwrites every parameter from the given name-addressed snapshot.
    ///
    /// The whole registry is validated before anything is applied: on error
    /// the learner's live parameters are unchanged.
    ///
    /// # Errors
    /// Returns `LearnerError::UnknownTensorName` if a registry name is
    /// absent from `tensors`, or `LearnerError::ShapeMismatch` if a value
    /// has the wrong shape.
    pub fn import_tensors(&mut self, tensors: &BTreeMap<String, Tensor>) -> Result<(), LearnerError> {
        let kernel = lookup(tensors, KERNEL, &[FEATURES, UNITS])?;
        let recurrent = lookup(tensors, RECURRENT_KERNEL, &[UNITS, UNITS])?;
        let bias = lookup(tensors, BIAS, &[UNITS])?;

        // SAFETY: element counts were validated against the registry shapes.
        self.kernel = Array2::from_shape_vec((FEATURES, UNITS), kernel).unwrap();
        self.recurrent_kernel = Array2::from_shape_vec((UNITS, UNITS), recurrent).unwrap();
        self.bias = Array1::from_vec(bias);
        Ok(())
    }

    /// Computes the hidden state sequence, including the initial zero state.
    fn run(&self, x: ArrayView2<f32>) -> Vec<Array1<f32>> {
        let mut states = Vec::with_capacity(WINDOW + 1);
        states.push(Array1::zeros(UNITS));

        for t in 0..WINDOW {
            let z = x.row(t).dot(&self.kernel)
                + states[t].dot(&self.recurrent_kernel)
                + &self.bias;
            states.push(z.mapv(f32::tanh));
        }

        states
    }
}

/// Derivative of tanh expressed through the activation value.
fn tanh_prime(h: f32) -> f32 {
    1.0 - h * h
}

fn sample_matrix(
    rng: &mut StdRng,
    dist: &Uniform<f32>,
    rows: usize,
    cols: usize,
) -> Array2<f32> {
    let data: Vec<f32> = (0..rows * cols).map(|_| dist.sample(rng)).collect();
    // SAFETY: the vector length is rows * cols by construction.
    Array2::from_shape_vec((rows, cols), data).unwrap()
}

fn argmax(v: ArrayView1<f32>) -> usize {
    let mut best = 0;
    for (i, &value) in v.iter().enumerate() {
        if value > v[best] {
            best = i;
        }
    }
    best
}

fn outer_product(v: ArrayView1<f32>, w: ArrayView1<f32>) -> Array2<f32> {
    // SAFETY: a length-n vector always reshapes to [n, 1] / [1, n].
    let v = v.to_shape((v.dim(), 1)).unwrap();
    let w = w.to_shape((1, w.dim())).unwrap();
    v.dot(&w)
}

fn check_shape(
    what: &'static str,
    got: &[usize],
    expected: &[usize],
) -> Result<(), LearnerError> {
    if got != expected {
        return Err(LearnerError::ShapeMismatch {
            what,
            got: got.to_vec(),
            expected: expected.to_vec(),
        });
    }
    Ok(())
}

fn lookup(
    tensors: &BTreeMap<String, Tensor>,
    name: &'static str,
    shape: &[usize],
) -> Result<Vec<f32>, LearnerError> {
    let tensor = tensors
        .get(name)
        .ok_or_else(|| LearnerError::UnknownTensorName(name.to_string()))?;

    if tensor.shape() != shape {
        return Err(LearnerError::ShapeMismatch {
            what: name,
            got: tensor.shape().to_vec(),
            expected: shape.to_vec(),
        });
    }

    Ok(tensor.data().to_vec())
}
