//! Loaded-model metadata.

use std::path::{Path, PathBuf};

use crate::memory::MemoryManager;

/// Metadata for a loaded model, owning the root memory scope that every
/// predictor built from it nests under.
pub struct Model {
    name: String,
    model_dir: PathBuf,
    manager: MemoryManager,
}

impl Model {
    /// Describe a model by name and artifact directory.
    pub fn new(name: impl Into<String>, model_dir: impl Into<PathBuf>) -> Self {
        let name = name.into();
        let manager = MemoryManager::new_root(&name);
        Self {
            name,
            model_dir: model_dir.into(),
            manager,
        }
    }

    /// The model's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The model's artifact directory.
    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    /// The root memory scope for this model.
    pub fn manager(&self) -> &MemoryManager {
        &self.manager
    }

    /// Close the root scope and, with it, every predictor scope derived from
    /// this model.
    pub fn close(&self) {
        self.manager.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_owns_root_scope() {
        let model = Model::new("resnet", "/opt/models/resnet");
        assert_eq!(model.name(), "resnet");
        assert_eq!(model.manager().path(), "resnet");
        assert!(model.manager().is_open());

        model.close();
        assert!(!model.manager().is_open());
    }
}
