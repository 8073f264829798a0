//! AdamW optimizer (Adam with decoupled weight decay)

use ndarray::{Array1, ArrayViewD, ArrayViewMutD};

use super::Optimizer;

/// AdamW optimizer
///
/// AdamW decouples weight decay from the gradient-based update. Instead of
/// adding weight decay to the gradient, it applies weight decay directly to
/// the parameters.
///
/// θ_t = (1 - lr * λ) * θ_{t-1} - lr_t * m_t / (√v_t + ε)
#[derive(Debug, Clone)]
pub struct AdamW {
    lr: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    weight_decay: f32,
    t: u64,
    m: Vec<Option<Array1<f32>>>, // First moment
    v: Vec<Option<Array1<f32>>>, // Second moment
}

impl AdamW {
    /// Create a new AdamW optimizer
    pub fn new(lr: f32, beta1: f32, beta2: f32, epsilon: f32, weight_decay: f32) -> Self {
        Self { lr, beta1, beta2, epsilon, weight_decay, t: 0, m: Vec::new(), v: Vec::new() }
    }

    /// AdamW with the usual betas and the given decay
    pub fn default_params(lr: f32, weight_decay: f32) -> Self {
        Self::new(lr, 0.9, 0.999, 1e-8, weight_decay)
    }

    /// Get optimizer step counter.
    #[must_use]
    pub fn step_count(&self) -> u64 {
        self.t
    }

    #[must_use]
    pub fn weight_decay(&self) -> f32 {
        self.weight_decay
    }

    fn ensure_slot(&mut self, slot: usize, len: usize) {
        if slot >= self.m.len() {
            self.m.resize(slot + 1, None);
            self.v.resize(slot + 1, None);
        }
        if self.m[slot].as_ref().is_none_or(|m| m.len() != len) {
            self.m[slot] = Some(Array1::zeros(len));
            self.v[slot] = Some(Array1::zeros(len));
        }
    }
}

impl Optimizer for AdamW {
    fn begin_step(&mut self) {
        self.t += 1;
    }

    fn update(&mut self, slot: usize, mut param: ArrayViewMutD<'_, f32>, grad: ArrayViewD<'_, f32>) {
        debug_assert_eq!(param.shape(), grad.shape());
        let t = self.t.max(1) as i32;
        self.ensure_slot(slot, grad.len());

        // Bias correction folded into the step size
        let lr_t =
            self.lr * ((1.0 - self.beta2.powi(t)).sqrt() / (1.0 - self.beta1.powi(t)));
        let decay = 1.0 - self.lr * self.weight_decay;
        let (beta1, beta2, eps) = (self.beta1, self.beta2, self.epsilon);

        let (Some(m), Some(v)) = (self.m[slot].as_mut(), self.v[slot].as_mut()) else {
            return;
        };
        for (((p, &g), m), v) in param.iter_mut().zip(grad.iter()).zip(m.iter_mut()).zip(v.iter_mut()) {
            *m = beta1 * *m + (1.0 - beta1) * g;
            *v = beta2 * *v + (1.0 - beta2) * g * g;
            *p = *p * decay - lr_t * *m / (v.sqrt() + eps);
        }
    }

    fn lr(&self) -> f32 {
        self.lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.lr = lr;
    }
}
