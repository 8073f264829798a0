//! Local model hub
//!
//! Resolves model identifiers such as `"distilbert-sst2"` or
//! `"acme/tiny-teacher"` to `<root>/<identifier>/` directories holding
//! `config.json` and `model.safetensors`.

use std::path::{Path, PathBuf};

use super::classifier::{SequenceClassifier, CONFIG_FILE};
use super::error::ModelError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelHub {
    root: PathBuf,
}

impl ModelHub {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory an identifier maps to
    pub fn resolve(&self, identifier: &str) -> PathBuf {
        self.root.join(identifier)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.resolve(identifier).join(CONFIG_FILE).is_file()
    }

    pub fn load(&self, identifier: &str) -> Result<SequenceClassifier, ModelError> {
        if !self.contains(identifier) {
            return Err(ModelError::NotFound {
                identifier: identifier.to_string(),
                path: self.resolve(identifier),
            });
        }
        SequenceClassifier::from_pretrained(self.resolve(identifier))
    }

    pub fn save(&self, identifier: &str, model: &SequenceClassifier) -> Result<PathBuf, ModelError> {
        let dir = self.resolve(identifier);
        model.save_pretrained(&dir)?;
        Ok(dir)
    }
}
