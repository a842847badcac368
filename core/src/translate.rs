//! Conversion between typed values and tensor batches.

use ndarray::ArrayD;

use crate::error::Result;
use crate::memory::MemoryManager;
use crate::runtime::Device;
use crate::tensor::{Tensor, TensorBatch};

/// Per-call context handed to translators.
///
/// Tensors created through the context are registered under the call's
/// memory scope and released when the call completes.
pub struct TranslateContext<'a> {
    scope: &'a MemoryManager,
    device: &'a Device,
}

impl<'a> TranslateContext<'a> {
    pub(crate) fn new(scope: &'a MemoryManager, device: &'a Device) -> Self {
        Self { scope, device }
    }

    /// The memory scope for this call.
    pub fn scope(&self) -> &MemoryManager {
        self.scope
    }

    /// The device the predictor runs on.
    pub fn device(&self) -> &Device {
        self.device
    }

    /// Allocate a tensor from an array under the call scope.
    pub fn tensor(&self, data: ArrayD<f32>) -> Result<Tensor> {
        Tensor::new(self.scope, data)
    }

    /// Allocate a tensor from a flat buffer and shape under the call scope.
    pub fn tensor_from(&self, shape: &[usize], data: Vec<f32>) -> Result<Tensor> {
        Tensor::from_shape_vec(self.scope, shape, data)
    }
}

/// Converts application-level values into the tensors the native runtime
/// consumes, and tensor results back into application-level values.
///
/// Translators are shared read-only across predictors; failures should be
/// reported as translation errors and propagate unchanged to the caller of
/// [`crate::predictor::Predictor::predict`].
pub trait Translator {
    /// The application-level input type.
    type Input;
    /// The application-level output type.
    type Output;

    /// Convert an input value into a named tensor batch.
    fn encode(&self, ctx: &TranslateContext<'_>, input: &Self::Input) -> Result<TensorBatch>;

    /// Convert the model's output batch into an output value.
    fn decode(&self, ctx: &TranslateContext<'_>, outputs: TensorBatch) -> Result<Self::Output>;
}

/// Pass-through translator over named raw arrays.
///
/// Useful when the caller already works in tensor terms, e.g. the CLI.
pub struct RawTranslator;

impl Translator for RawTranslator {
    type Input = Vec<(String, ArrayD<f32>)>;
    type Output = Vec<(String, ArrayD<f32>)>;

    fn encode(&self, ctx: &TranslateContext<'_>, input: &Self::Input) -> Result<TensorBatch> {
        let mut batch = TensorBatch::with_capacity(input.len());
        for (name, array) in input {
            batch.insert(name.clone(), ctx.tensor(array.clone())?);
        }
        Ok(batch)
    }

    fn decode(&self, _ctx: &TranslateContext<'_>, outputs: TensorBatch) -> Result<Self::Output> {
        Ok(outputs
            .into_iter()
            .map(|(name, tensor)| (name, tensor.into_array()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::IxDyn;

    #[test]
    fn test_raw_translator_round_trip() {
        let scope = MemoryManager::new_root("test");
        let device = Device::Cpu;
        let ctx = TranslateContext::new(&scope, &device);

        let input = vec![(
            "x".to_string(),
            ArrayD::from_shape_vec(IxDyn(&[2]), vec![1.0, 2.0]).unwrap(),
        )];
        let batch = RawTranslator.encode(&ctx, &input).unwrap();
        assert_eq!(batch.names(), vec!["x"]);
        assert_eq!(scope.outstanding(), 1);

        let decoded = RawTranslator.decode(&ctx, batch).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].0, "x");
        assert_eq!(decoded[0].1.as_slice().unwrap(), &[1.0, 2.0]);
        assert_eq!(scope.outstanding(), 0);
    }
}
