//! Callable wrapper around a native model handle.

use ndarray::{ArrayD, IxDyn};
use tracing::trace;

use crate::error::{DlrError, Result};
use crate::memory::MemoryManager;
use crate::runtime::NativeModel;
use crate::tensor::{Tensor, TensorBatch};

/// The executable computation graph of one loaded model.
///
/// A block exclusively owns its native handle. [`SymbolBlock::close`] (or
/// dropping the block) releases the handle; any call after that fails with a
/// closed-resource error.
pub struct SymbolBlock {
    native: Option<Box<dyn NativeModel>>,
}

impl SymbolBlock {
    pub(crate) fn new(native: Box<dyn NativeModel>) -> Self {
        Self {
            native: Some(native),
        }
    }

    fn native(&self) -> Result<&dyn NativeModel> {
        self.native
            .as_deref()
            .ok_or_else(|| DlrError::closed("symbol block is closed"))
    }

    fn native_mut(&mut self) -> Result<&mut Box<dyn NativeModel>> {
        self.native
            .as_mut()
            .ok_or_else(|| DlrError::closed("symbol block is closed"))
    }

    /// Run the graph over `inputs`, materializing outputs into `scope`.
    ///
    /// Inputs are bound by name; outputs come back under the names the model
    /// reports, or `output_<i>` for formats without names.
    pub fn forward(&mut self, inputs: &TensorBatch, scope: &MemoryManager) -> Result<TensorBatch> {
        let native = self
            .native
            .as_mut()
            .ok_or_else(|| DlrError::closed("symbol block is closed"))?;

        for (name, tensor) in inputs.iter() {
            let shape: Vec<i64> = tensor.shape().iter().map(|&d| d as i64).collect();
            let contiguous = tensor.data().as_standard_layout();
            let data = contiguous
                .as_slice()
                .ok_or_else(|| DlrError::tensor(format!("input '{}' is not contiguous", name)))?;
            native.set_input(name, &shape, data)?;
        }

        native.run()?;

        let num_outputs = native.num_outputs()?;
        trace!(num_outputs, "forward pass complete");

        let mut outputs = TensorBatch::with_capacity(num_outputs);
        for index in 0..num_outputs {
            let name = native.output_name(index)?;
            let shape = native.output_shape(index)?;
            let data = native.output(index)?;
            let array = ArrayD::from_shape_vec(IxDyn(&shape), data).map_err(|e| {
                DlrError::tensor(format!("output {} has inconsistent shape: {}", index, e))
            })?;
            outputs.insert(name, Tensor::new(scope, array)?);
        }
        Ok(outputs)
    }

    /// Number of graph inputs.
    pub fn num_inputs(&self) -> Result<usize> {
        self.native()?.num_inputs()
    }

    /// Name of the input at `index`.
    pub fn input_name(&self, index: usize) -> Result<String> {
        self.native()?.input_name(index)
    }

    /// Number of graph outputs.
    pub fn num_outputs(&self) -> Result<usize> {
        self.native()?.num_outputs()
    }

    /// Name of the compiled backend serving this model.
    pub fn backend(&self) -> Result<String> {
        self.native()?.backend()
    }

    /// Cap the number of native worker threads, where supported.
    pub fn set_num_threads(&mut self, threads: usize) -> Result<()> {
        self.native_mut()?.set_num_threads(threads)
    }

    /// Pin native workers to CPUs, where supported.
    pub fn use_cpu_affinity(&mut self, enabled: bool) -> Result<()> {
        self.native_mut()?.use_cpu_affinity(enabled)
    }

    /// Whether the native handle is still held.
    pub fn is_open(&self) -> bool {
        self.native.is_some()
    }

    /// Release the native handle. Idempotent.
    pub fn close(&mut self) {
        self.native = None;
    }
}
