//! Sequence classification model
//!
//! A deliberately small architecture: masked mean-pooled token embeddings,
//! a `pre_classifier` projection with ReLU, and a `classifier` head. Both
//! projections sit in [`LayerModule`] slots so pruning can mask them and
//! quantization-aware training can wrap them.

use std::collections::HashMap;
use std::path::Path;

use ndarray::{Array1, Array2, Axis, Ix2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use safetensors::tensor::{Dtype, TensorView};
use safetensors::SafeTensors;
use serde::{Deserialize, Serialize};

use super::error::ModelError;
use super::layer::LayerModule;
use super::linear::{Linear, LinearCache, LinearGrad};
use crate::data::Batch;
use crate::optim::{clip_grad_norm, Optimizer};
use crate::quant::QuantizedLinear;

pub const CONFIG_FILE: &str = "config.json";
pub const WEIGHTS_FILE: &str = "model.safetensors";

pub const PRE_CLASSIFIER: &str = "pre_classifier";
pub const CLASSIFIER: &str = "classifier";
const LAYER_NAMES: [&str; 2] = [PRE_CLASSIFIER, CLASSIFIER];
const EMBEDDINGS: &str = "embeddings.weight";

/// Architecture hyperparameters, persisted as `config.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub vocab_size: usize,
    pub embed_dim: usize,
    pub hidden_size: usize,
    pub num_labels: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self { vocab_size: 4096, embed_dim: 32, hidden_size: 32, num_labels: 2 }
    }
}

impl ModelConfig {
    pub fn with_vocab_size(mut self, vocab_size: usize) -> Self {
        self.vocab_size = vocab_size;
        self
    }

    pub fn with_embed_dim(mut self, embed_dim: usize) -> Self {
        self.embed_dim = embed_dim;
        self
    }

    pub fn with_hidden_size(mut self, hidden_size: usize) -> Self {
        self.hidden_size = hidden_size;
        self
    }

    pub fn with_num_labels(mut self, num_labels: usize) -> Self {
        self.num_labels = num_labels;
        self
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        let dims = [
            ("vocab_size", self.vocab_size),
            ("embed_dim", self.embed_dim),
            ("hidden_size", self.hidden_size),
        ];
        for (name, value) in dims {
            if value == 0 {
                return Err(ModelError::InvalidConfig(format!("{name} must be > 0")));
            }
        }
        if self.num_labels < 2 {
            return Err(ModelError::InvalidConfig(format!(
                "num_labels must be at least 2 (got {})",
                self.num_labels
            )));
        }
        Ok(())
    }
}

/// Activations kept from [`SequenceClassifier::forward_train`]
#[derive(Debug, Clone)]
pub struct ForwardCache {
    token_counts: Array1<f32>,
    pre_classifier: LinearCache,
    hidden: Array2<f32>,
    classifier: LinearCache,
}

/// Parameter gradients for the whole model
#[derive(Debug, Clone)]
pub struct Gradients {
    pub embeddings: Array2<f32>,
    pub pre_classifier: LinearGrad,
    pub classifier: LinearGrad,
}

impl Gradients {
    /// Gradient of a named linear layer
    pub fn layer(&self, name: &str) -> Option<&LinearGrad> {
        match name {
            PRE_CLASSIFIER => Some(&self.pre_classifier),
            CLASSIFIER => Some(&self.classifier),
            _ => None,
        }
    }

    /// Clip all gradients to a global L2 norm; returns the norm before clipping.
    pub fn clip_norm(&mut self, max_norm: f32) -> f32 {
        let mut views = [
            self.embeddings.view_mut().into_dyn(),
            self.pre_classifier.weight.view_mut().into_dyn(),
            self.pre_classifier.bias.view_mut().into_dyn(),
            self.classifier.weight.view_mut().into_dyn(),
            self.classifier.bias.view_mut().into_dyn(),
        ];
        clip_grad_norm(&mut views, max_norm)
    }
}

/// Embedding-bag text classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceClassifier {
    config: ModelConfig,
    embeddings: Array2<f32>,
    pre_classifier: LayerModule,
    classifier: LayerModule,
}

impl SequenceClassifier {
    /// Randomly initialised model, deterministic in `seed`
    pub fn new(config: ModelConfig, seed: u64) -> Result<Self, ModelError> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(seed);
        let embeddings = Array2::from_shape_fn((config.vocab_size, config.embed_dim), |_| {
            rng.random_range(-0.5..0.5)
        });
        let pre_classifier = Linear::init(config.embed_dim, config.hidden_size, &mut rng);
        let classifier = Linear::init(config.hidden_size, config.num_labels, &mut rng);
        Ok(Self {
            config,
            embeddings,
            pre_classifier: LayerModule::Linear(pre_classifier),
            classifier: LayerModule::Linear(classifier),
        })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn num_labels(&self) -> usize {
        self.config.num_labels
    }

    pub fn embeddings(&self) -> &Array2<f32> {
        &self.embeddings
    }

    pub fn pre_classifier(&self) -> &LayerModule {
        &self.pre_classifier
    }

    pub fn classifier(&self) -> &LayerModule {
        &self.classifier
    }

    /// Names of the swappable linear layers, input to output
    pub fn layer_names(&self) -> &'static [&'static str] {
        &LAYER_NAMES
    }

    pub fn layer(&self, name: &str) -> Option<&LayerModule> {
        match name {
            PRE_CLASSIFIER => Some(&self.pre_classifier),
            CLASSIFIER => Some(&self.classifier),
            _ => None,
        }
    }

    pub fn layer_mut(&mut self, name: &str) -> Option<&mut LayerModule> {
        match name {
            PRE_CLASSIFIER => Some(&mut self.pre_classifier),
            CLASSIFIER => Some(&mut self.classifier),
            _ => None,
        }
    }

    pub fn num_params(&self) -> usize {
        self.embeddings.len()
            + self.pre_classifier.linear().num_params()
            + self.classifier.linear().num_params()
    }

    /// Masked mean of token embeddings, `[batch, embed_dim]`
    fn pool(&self, batch: &Batch) -> (Array2<f32>, Array1<f32>) {
        let mut pooled = Array2::zeros((batch.len(), self.config.embed_dim));
        let mut counts = Array1::zeros(batch.len());
        for (row, (ids, mask)) in batch
            .input_ids
            .axis_iter(Axis(0))
            .zip(batch.attention_mask.axis_iter(Axis(0)))
            .enumerate()
        {
            let mut out = pooled.row_mut(row);
            let mut count = 0.0f32;
            for (&id, &m) in ids.iter().zip(mask.iter()) {
                if m == 0 {
                    continue;
                }
                out += &self.embeddings.row(self.embedding_row(id));
                count += 1.0;
            }
            let count = count.max(1.0);
            out /= count;
            counts[row] = count;
        }
        (pooled, counts)
    }

    fn embedding_row(&self, id: u32) -> usize {
        (id as usize) % self.config.vocab_size
    }

    /// Inference forward pass, returns logits `[batch, num_labels]`
    pub fn forward(&self, batch: &Batch) -> Array2<f32> {
        let (pooled, _) = self.pool(batch);
        let hidden = self.pre_classifier.forward(&pooled).mapv(relu);
        self.classifier.forward(&hidden)
    }

    /// Training forward pass. Quantized layers update their observers.
    pub fn forward_train(&mut self, batch: &Batch) -> (Array2<f32>, ForwardCache) {
        let (pooled, token_counts) = self.pool(batch);
        let (pre_act, pre_cache) = self.pre_classifier.forward_train(&pooled);
        let hidden = pre_act.mapv(relu);
        let (logits, cls_cache) = self.classifier.forward_train(&hidden);
        let cache = ForwardCache {
            token_counts,
            pre_classifier: pre_cache,
            hidden,
            classifier: cls_cache,
        };
        (logits, cache)
    }

    /// Backpropagate `grad_logits` through the model
    pub fn backward(&self, batch: &Batch, cache: &ForwardCache, grad_logits: &Array2<f32>) -> Gradients {
        let (cls_grad, grad_hidden) = self.classifier.backward(&cache.classifier, grad_logits);
        let grad_pre_act = grad_hidden * cache.hidden.mapv(|h| if h > 0.0 { 1.0 } else { 0.0 });
        let (pre_grad, grad_pooled) = self.pre_classifier.backward(&cache.pre_classifier, &grad_pre_act);

        let mut grad_embeddings = Array2::zeros(self.embeddings.dim());
        for (row, (ids, mask)) in batch
            .input_ids
            .axis_iter(Axis(0))
            .zip(batch.attention_mask.axis_iter(Axis(0)))
            .enumerate()
        {
            let scale = 1.0 / cache.token_counts[row];
            let g = grad_pooled.row(row);
            for (&id, &m) in ids.iter().zip(mask.iter()) {
                if m != 0 {
                    grad_embeddings.row_mut(self.embedding_row(id)).scaled_add(scale, &g);
                }
            }
        }

        Gradients { embeddings: grad_embeddings, pre_classifier: pre_grad, classifier: cls_grad }
    }

    /// One optimizer update. Pruning masks are re-applied afterwards so
    /// pruned weights stay at exactly zero.
    pub fn apply_gradients(&mut self, grads: &Gradients, optimizer: &mut dyn Optimizer) {
        optimizer.update(0, self.embeddings.view_mut().into_dyn(), grads.embeddings.view().into_dyn());
        for (slot, (layer, grad)) in [
            (&mut self.pre_classifier, &grads.pre_classifier),
            (&mut self.classifier, &grads.classifier),
        ]
        .into_iter()
        .enumerate()
        {
            let linear = layer.linear_mut();
            let base = 1 + slot * 2;
            optimizer.update(base, linear.weight.view_mut().into_dyn(), grad.weight.view().into_dyn());
            optimizer.update(base + 1, linear.bias.view_mut().into_dyn(), grad.bias.view().into_dyn());
            linear.apply_mask();
        }
    }

    /// Predicted label per row
    pub fn predict(&self, batch: &Batch) -> Vec<usize> {
        crate::eval::argmax_rows(&self.forward(batch))
    }

    /// Per-layer fraction of zero weights
    pub fn sparsity_by_layer(&self) -> Vec<(String, f32)> {
        LAYER_NAMES
            .iter()
            .filter_map(|&name| self.layer(name).map(|l| (name.to_string(), l.linear().sparsity())))
            .collect()
    }

    /// Write `config.json` and `model.safetensors` into `dir`.
    ///
    /// Masks are stored as `<layer>.mask` tensors; quantizer state of wrapped
    /// layers goes into the safetensors metadata as `<layer>.quantization`.
    pub fn save_pretrained(&self, dir: impl AsRef<Path>) -> Result<(), ModelError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|source| ModelError::Io { path: dir.to_path_buf(), source })?;

        let config_path = dir.join(CONFIG_FILE);
        let config_json = serde_json::to_string_pretty(&self.config)
            .map_err(|e| ModelError::ConfigParse { path: config_path.clone(), message: e.to_string() })?;
        std::fs::write(&config_path, config_json)
            .map_err(|source| ModelError::Io { path: config_path.clone(), source })?;

        let mut tensor_data: Vec<(String, Vec<u8>, Vec<usize>)> = Vec::new();
        tensor_data.push(encode_tensor(EMBEDDINGS, self.embeddings.iter(), self.embeddings.shape()));

        let mut metadata = HashMap::new();
        metadata.insert("format".to_string(), "orquestar".to_string());
        for &name in &LAYER_NAMES {
            let Some(layer) = self.layer(name) else { continue };
            let linear = layer.linear();
            tensor_data.push(encode_tensor(&format!("{name}.weight"), linear.weight.iter(), linear.weight.shape()));
            tensor_data.push(encode_tensor(&format!("{name}.bias"), linear.bias.iter(), linear.bias.shape()));
            if let Some(mask) = linear.mask() {
                tensor_data.push(encode_tensor(&format!("{name}.mask"), mask.iter(), mask.shape()));
            }
            if let Some(quantized) = layer.as_quantized() {
                let mut state = quantized.clone();
                state.module = Linear::from_parts(Array2::zeros((0, 0)), Array1::zeros(0));
                let json = serde_json::to_string(&state).map_err(|e| ModelError::SafeTensors(e.to_string()))?;
                metadata.insert(format!("{name}.quantization"), json);
            }
        }

        let views = tensor_data
            .iter()
            .map(|(name, bytes, shape)| {
                TensorView::new(Dtype::F32, shape.clone(), bytes)
                    .map(|view| (name.as_str(), view))
                    .map_err(|e| ModelError::SafeTensors(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let bytes = safetensors::serialize(views, &Some(metadata))
            .map_err(|e| ModelError::SafeTensors(format!("serialization failed: {e}")))?;
        let weights_path = dir.join(WEIGHTS_FILE);
        std::fs::write(&weights_path, bytes).map_err(|source| ModelError::Io { path: weights_path, source })?;
        Ok(())
    }

    /// Load a model written by [`save_pretrained`](Self::save_pretrained)
    pub fn from_pretrained(dir: impl AsRef<Path>) -> Result<Self, ModelError> {
        let dir = dir.as_ref();
        let config_path = dir.join(CONFIG_FILE);
        let config_json = std::fs::read_to_string(&config_path)
            .map_err(|source| ModelError::Io { path: config_path.clone(), source })?;
        let config: ModelConfig = serde_json::from_str(&config_json)
            .map_err(|e| ModelError::ConfigParse { path: config_path, message: e.to_string() })?;
        config.validate()?;

        let weights_path = dir.join(WEIGHTS_FILE);
        let data = std::fs::read(&weights_path).map_err(|source| ModelError::Io { path: weights_path, source })?;
        let tensors = SafeTensors::deserialize(&data).map_err(|e| ModelError::SafeTensors(e.to_string()))?;
        let (_, header) = SafeTensors::read_metadata(&data).map_err(|e| ModelError::SafeTensors(e.to_string()))?;
        let metadata = header.metadata().clone().unwrap_or_default();

        let embeddings = read_matrix(&tensors, EMBEDDINGS, [config.vocab_size, config.embed_dim])?;
        let pre_classifier =
            read_layer(&tensors, &metadata, PRE_CLASSIFIER, [config.hidden_size, config.embed_dim])?;
        let classifier = read_layer(&tensors, &metadata, CLASSIFIER, [config.num_labels, config.hidden_size])?;

        Ok(Self { config, embeddings, pre_classifier, classifier })
    }
}

fn relu(x: f32) -> f32 {
    x.max(0.0)
}

fn encode_tensor<'a>(
    name: &str,
    values: impl Iterator<Item = &'a f32>,
    shape: &[usize],
) -> (String, Vec<u8>, Vec<usize>) {
    let flat: Vec<f32> = values.copied().collect();
    (name.to_string(), bytemuck::cast_slice(&flat).to_vec(), shape.to_vec())
}

fn read_values(tensors: &SafeTensors<'_>, name: &str, expected: &[usize]) -> Result<Vec<f32>, ModelError> {
    let view = tensors.tensor(name).map_err(|_| ModelError::MissingTensor(name.to_string()))?;
    if view.dtype() != Dtype::F32 {
        return Err(ModelError::SafeTensors(format!("{name}: expected F32, got {:?}", view.dtype())));
    }
    if view.shape() != expected {
        return Err(ModelError::ShapeMismatch {
            tensor: name.to_string(),
            expected: expected.to_vec(),
            actual: view.shape().to_vec(),
        });
    }
    Ok(view
        .data()
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

fn read_matrix(tensors: &SafeTensors<'_>, name: &str, shape: [usize; 2]) -> Result<Array2<f32>, ModelError> {
    let values = read_values(tensors, name, &shape)?;
    Array2::from_shape_vec(Ix2(shape[0], shape[1]), values)
        .map_err(|e| ModelError::SafeTensors(format!("{name}: {e}")))
}

fn read_layer(
    tensors: &SafeTensors<'_>,
    metadata: &HashMap<String, String>,
    name: &str,
    shape: [usize; 2],
) -> Result<LayerModule, ModelError> {
    let weight = read_matrix(tensors, &format!("{name}.weight"), shape)?;
    let bias = Array1::from(read_values(tensors, &format!("{name}.bias"), &shape[..1])?);
    let mut linear = Linear::from_parts(weight, bias);

    let mask_name = format!("{name}.mask");
    if tensors.names().iter().any(|n| **n == mask_name) {
        linear.set_mask(read_matrix(tensors, &mask_name, shape)?);
    }

    match metadata.get(&format!("{name}.quantization")) {
        Some(json) => {
            let mut quantized: QuantizedLinear =
                serde_json::from_str(json).map_err(|e| ModelError::SafeTensors(format!("{name}: {e}")))?;
            quantized.module = linear;
            Ok(LayerModule::Quantized(quantized))
        }
        None => Ok(LayerModule::Linear(linear)),
    }
}
