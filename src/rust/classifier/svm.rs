use log::{debug, warn};
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::utils::SparseVector;

/// Hyper-parameters for [`LinearSvc`].
///
/// The defaults match scikit-learn's
/// `LinearSVC(C=1.0, loss='squared_hinge', penalty='l2', multi_class='ovr')`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvmConfig {
    /// Inverse regularization strength
    pub c: f32,
    /// Stop once the projected gradient spread falls below this
    pub tolerance: f32,
    /// Maximum passes over the training set
    pub max_iter: usize,
    pub fit_intercept: bool,
    /// Value of the synthetic feature whose weight becomes the intercept
    pub intercept_scaling: f32,
    /// Seed for the per-epoch sample order
    pub seed: u64,
}

impl Default for SvmConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            tolerance: 1e-4,
            max_iter: 1000,
            fit_intercept: true,
            intercept_scaling: 1.0,
            seed: 42,
        }
    }
}

/// A fitted L2-regularized linear SVM with squared hinge loss.
///
/// With two classes there is a single decision function and `classes[1]` is
/// the positive side. With more, one function is fitted per class
/// (one-vs-rest) and the highest score wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearSvc {
    config: SvmConfig,
    classes: Vec<usize>,
    weights: Vec<Array1<f32>>,
    intercepts: Vec<f32>,
}

impl LinearSvc {
    /// Fits the model on sparse rows `x` with labels `y`.
    ///
    /// # Errors
    /// - `ValidationError` if `x` and `y` differ in length, are empty, or the
    ///   rows disagree on dimension
    /// - `TrainingError` if fewer than two distinct labels are present
    pub fn fit(config: &SvmConfig, x: &[SparseVector], y: &[usize]) -> Result<Self, ClassifierError> {
        if x.len() != y.len() {
            return Err(ClassifierError::ValidationError(format!(
                "Got {} samples but {} labels",
                x.len(),
                y.len()
            )));
        }
        if x.is_empty() {
            return Err(ClassifierError::ValidationError("Cannot fit with 0 samples".into()));
        }
        if !(config.c > 0.0) {
            return Err(ClassifierError::ValidationError(format!(
                "C must be positive, got {}",
                config.c
            )));
        }
        let dim = x[0].dim();
        if x.iter().any(|row| row.dim() != dim) {
            return Err(ClassifierError::ValidationError("Feature dimension mismatch".into()));
        }

        let mut classes: Vec<usize> = y.to_vec();
        classes.sort_unstable();
        classes.dedup();
        if classes.len() < 2 {
            return Err(ClassifierError::TrainingError(format!(
                "Need samples of at least 2 classes, got {:?}",
                classes
            )));
        }

        let positives: Vec<usize> = if classes.len() == 2 {
            vec![classes[1]]
        } else {
            classes.clone()
        };

        let mut weights = Vec::with_capacity(positives.len());
        let mut intercepts = Vec::with_capacity(positives.len());
        for positive in positives {
            let signs: Vec<f32> = y
                .iter()
                .map(|&label| if label == positive { 1.0 } else { -1.0 })
                .collect();
            let (w, b) = fit_binary(config, x, &signs, dim);
            weights.push(w);
            intercepts.push(b);
        }

        Ok(Self {
            config: config.clone(),
            classes,
            weights,
            intercepts,
        })
    }

    /// Hyper-parameters the model was fitted with.
    pub fn config(&self) -> &SvmConfig {
        &self.config
    }

    pub fn classes(&self) -> &[usize] {
        &self.classes
    }

    /// Number of input features.
    pub fn dim(&self) -> usize {
        self.weights.first().map_or(0, |w| w.len())
    }

    pub fn weights(&self) -> &[Array1<f32>] {
        &self.weights
    }

    pub fn intercepts(&self) -> &[f32] {
        &self.intercepts
    }

    /// Signed distance to each decision boundary, one entry per binary problem.
    pub fn decision_function(&self, x: &SparseVector) -> Result<Vec<f32>, ClassifierError> {
        if x.dim() != self.dim() {
            return Err(ClassifierError::PredictionError(format!(
                "Expected {} features, got {}",
                self.dim(),
                x.dim()
            )));
        }
        Ok(self
            .weights
            .iter()
            .zip(&self.intercepts)
            .map(|(w, b)| x.dot(w) + b)
            .collect())
    }

    /// Predicts a class and returns it with its decision score.
    pub fn predict(&self, x: &SparseVector) -> Result<(usize, f32), ClassifierError> {
        let scores = self.decision_function(x)?;
        if self.classes.len() == 2 {
            let score = scores[0];
            let class = if score > 0.0 { self.classes[1] } else { self.classes[0] };
            return Ok((class, score));
        }

        scores
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, &score)| (self.classes[i], score))
            .ok_or_else(|| ClassifierError::PredictionError("Model has no decision functions".into()))
    }

    pub(crate) fn validate(&self) -> Result<(), ClassifierError> {
        let expected = if self.classes.len() == 2 { 1 } else { self.classes.len() };
        if self.classes.len() < 2 || self.weights.len() != expected || self.intercepts.len() != expected {
            return Err(ClassifierError::ValidationError(format!(
                "Inconsistent model: {} classes, {} weight vectors, {} intercepts",
                self.classes.len(),
                self.weights.len(),
                self.intercepts.len()
            )));
        }
        let dim = self.dim();
        if self.weights.iter().any(|w| w.len() != dim) {
            return Err(ClassifierError::ValidationError("Weight vectors differ in length".into()));
        }
        Ok(())
    }
}

/// Dual coordinate descent for the L2-loss SVM (Hsieh et al., 2008).
///
/// Solves `min ½‖w‖² + C Σ max(0, 1 − yᵢ w·x̂ᵢ)²` where `x̂ᵢ` is `xᵢ` with the
/// intercept feature appended. Returns the weights and the intercept.
fn fit_binary(config: &SvmConfig, x: &[SparseVector], y: &[f32], dim: usize) -> (Array1<f32>, f32) {
    let diag = 0.5 / config.c;
    let bias_feature = if config.fit_intercept { config.intercept_scaling } else { 0.0 };

    let qd: Vec<f32> = x
        .iter()
        .map(|row| diag + row.squared_norm() + bias_feature * bias_feature)
        .collect();

    let mut w = Array1::<f32>::zeros(dim);
    let mut w_bias = 0.0f32;
    let mut alpha = vec![0.0f32; x.len()];
    let mut order: Vec<usize> = (0..x.len()).collect();
    let mut rng = StdRng::seed_from_u64(config.seed);

    let mut converged = false;
    let mut epochs = 0;
    while epochs < config.max_iter {
        epochs += 1;
        order.shuffle(&mut rng);

        let mut pg_max = f32::NEG_INFINITY;
        let mut pg_min = f32::INFINITY;
        for &i in &order {
            let g = y[i] * (x[i].dot(&w) + w_bias * bias_feature) - 1.0 + diag * alpha[i];
            let pg = if alpha[i] == 0.0 { g.min(0.0) } else { g };
            pg_max = pg_max.max(pg);
            pg_min = pg_min.min(pg);

            if pg.abs() > 1e-12 {
                let previous = alpha[i];
                alpha[i] = (alpha[i] - g / qd[i]).max(0.0);
                let delta = (alpha[i] - previous) * y[i];
                x[i].scaled_add_to(delta, &mut w);
                w_bias += delta * bias_feature;
            }
        }

        if pg_max - pg_min <= config.tolerance {
            converged = true;
            break;
        }
    }

    if converged {
        debug!("Linear SVM converged after {} epochs", epochs);
    } else {
        warn!(
            "Linear SVM did not converge within {} epochs; consider raising max_iter",
            config.max_iter
        );
    }

    (w, w_bias * bias_feature)
}
