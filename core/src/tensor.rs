//! Tensor values and named tensor batches.

use ndarray::{ArrayD, IxDyn};

use crate::error::{DlrError, Result};
use crate::memory::{Allocation, MemoryManager};

/// A tensor allocated under a memory scope.
///
/// The value owns its data as a dynamic-dimensional `f32` array; the attached
/// registration keeps the owning scope's live count accurate until the tensor
/// drops.
#[derive(Debug)]
pub struct Tensor {
    data: ArrayD<f32>,
    _registration: Allocation,
}

impl Tensor {
    /// Allocate a tensor from an existing array under the given scope.
    ///
    /// # Errors
    ///
    /// Returns a closed-resource error if the scope is already closed.
    pub fn new(scope: &MemoryManager, data: ArrayD<f32>) -> Result<Self> {
        let registration = scope.register()?;
        Ok(Self {
            data,
            _registration: registration,
        })
    }

    /// Allocate a tensor from a flat buffer and shape under the given scope.
    ///
    /// # Errors
    ///
    /// Returns a tensor error if the buffer length does not match the shape,
    /// or a closed-resource error if the scope is already closed.
    pub fn from_shape_vec(scope: &MemoryManager, shape: &[usize], data: Vec<f32>) -> Result<Self> {
        let array = ArrayD::from_shape_vec(IxDyn(shape), data)
            .map_err(|e| DlrError::tensor(format!("shape mismatch: {}", e)))?;
        Self::new(scope, array)
    }

    /// Borrow the underlying array.
    pub fn data(&self) -> &ArrayD<f32> {
        &self.data
    }

    /// Get the shape of the tensor.
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Get the number of dimensions.
    pub fn ndim(&self) -> usize {
        self.data.ndim()
    }

    /// Get the total number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the tensor is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Take the array out of the tensor, releasing its scope registration.
    pub fn into_array(self) -> ArrayD<f32> {
        self.data
    }
}

/// An ordered collection of named tensors.
///
/// The native runtime addresses inputs by name and outputs by index, so the
/// batch keeps insertion order and allows name lookup.
#[derive(Default)]
pub struct TensorBatch {
    entries: Vec<(String, Tensor)>,
}

impl TensorBatch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty batch with room for `capacity` tensors.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Append a named tensor.
    pub fn insert(&mut self, name: impl Into<String>, tensor: Tensor) {
        self.entries.push((name.into(), tensor));
    }

    /// Look up a tensor by name.
    pub fn get(&self, name: &str) -> Option<&Tensor> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, tensor)| tensor)
    }

    /// Remove a tensor by name, taking ownership of it.
    pub fn take(&mut self, name: &str) -> Option<Tensor> {
        let index = self.entries.iter().position(|(entry, _)| entry == name)?;
        Some(self.entries.remove(index).1)
    }

    /// Number of tensors in the batch.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the batch holds no tensors.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(name, tensor)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tensor)> {
        self.entries
            .iter()
            .map(|(name, tensor)| (name.as_str(), tensor))
    }

    /// Names in insertion order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }
}

impl IntoIterator for TensorBatch {
    type Item = (String, Tensor);
    type IntoIter = std::vec::IntoIter<(String, Tensor)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
