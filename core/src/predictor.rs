//! Typed, translator-driven prediction.

use std::path::Path;

use tracing::debug;

use crate::error::{DlrError, Result};
use crate::memory::MemoryManager;
use crate::model::Model;
use crate::runtime::{self, Device, RuntimeId};
use crate::translate::{TranslateContext, Translator};
use crate::{block::SymbolBlock, tensor::TensorBatch};

/// Binds a loaded model, a device, and a translator into a single callable
/// unit that accepts typed input and returns typed output.
///
/// A predictor moves through three states: created, ready, closed. A failed
/// construction never reaches ready and leaves nothing allocated; once
/// closed, a predictor stays closed.
///
/// Calls on one predictor are serialized by the `&mut self` receivers; the
/// underlying native runtime makes no reentrancy promises, so share work
/// across predictors, not across threads on one predictor.
pub struct Predictor<T: Translator> {
    translator: T,
    block: SymbolBlock,
    manager: MemoryManager,
    device: Device,
}

impl<T: Translator> std::fmt::Debug for Predictor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predictor")
            .field("device", &self.device)
            .field("open", &self.is_open())
            .finish_non_exhaustive()
    }
}

impl<T: Translator> Predictor<T> {
    /// Load a model through the runtime instance `runtime_id` and bind it to
    /// `translator`.
    ///
    /// A sub-manager named "predictor" is created under the model's manager
    /// before the native handle is requested; if handle creation fails, the
    /// sub-manager is released before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns a runtime-load error when `model_dir` does not exist, when
    /// `runtime_id` is not registered, or when the native runtime cannot
    /// load the artifacts on the requested device.
    pub fn new(
        runtime_id: RuntimeId,
        model: &Model,
        model_dir: impl AsRef<Path>,
        device: Device,
        translator: T,
    ) -> Result<Self> {
        let model_dir = model_dir.as_ref();
        if !model_dir.exists() {
            return Err(DlrError::runtime_load(format!(
                "model directory not found: {}",
                model_dir.display()
            )));
        }

        let manager = model.manager().sub_manager("predictor")?;

        let native = match runtime::get(runtime_id).and_then(|rt| rt.create_model(model_dir, &device))
        {
            Ok(native) => native,
            Err(e) => {
                manager.close();
                // Whatever the runtime reports, the caller sees one kind.
                return Err(match e {
                    e @ DlrError::RuntimeLoad(_) => e,
                    other => DlrError::runtime_load(other.to_string()),
                });
            }
        };

        debug!(
            model = model.name(),
            device = %device,
            runtime = %runtime_id,
            "predictor ready"
        );
        Ok(Self {
            translator,
            block: SymbolBlock::new(native),
            manager,
            device,
        })
    }

    /// Run one prediction.
    ///
    /// The input is encoded into tensors under a per-call scope, the graph is
    /// executed, and the outputs are decoded back into the typed result. The
    /// call scope is released on every exit path, so intermediate tensors
    /// never outlive the call. Translation errors propagate unchanged.
    ///
    /// # Errors
    ///
    /// Returns a closed-resource error if the predictor has been closed.
    pub fn predict(&mut self, input: &T::Input) -> Result<T::Output> {
        if !self.is_open() {
            return Err(DlrError::closed("predictor is closed"));
        }
        let scope = self.manager.sub_manager("inference")?;
        let result = self.predict_scoped(&scope, input);
        scope.close();
        result
    }

    fn predict_scoped(&mut self, scope: &MemoryManager, input: &T::Input) -> Result<T::Output> {
        let device = self.device.clone();
        let ctx = TranslateContext::new(scope, &device);
        let inputs: TensorBatch = self.translator.encode(&ctx, input)?;
        let outputs = self.block.forward(&inputs, scope)?;
        self.translator.decode(&ctx, outputs)
    }

    /// The device this predictor runs on.
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// The executable graph, for introspection.
    pub fn block(&self) -> &SymbolBlock {
        &self.block
    }

    /// Cap the number of native worker threads, where supported.
    pub fn set_num_threads(&mut self, threads: usize) -> Result<()> {
        self.block.set_num_threads(threads)
    }

    /// Pin native workers to CPUs, where supported.
    pub fn use_cpu_affinity(&mut self, enabled: bool) -> Result<()> {
        self.block.use_cpu_affinity(enabled)
    }

    /// Whether the predictor can still serve predictions.
    pub fn is_open(&self) -> bool {
        self.block.is_open() && self.manager.is_open()
    }

    /// Release the native handle and every tensor scope owned by this
    /// predictor. Idempotent; a second close is a no-op.
    pub fn close(&mut self) {
        if self.block.is_open() || self.manager.is_open() {
            debug!(scope = %self.manager.path(), "closing predictor");
        }
        self.block.close();
        self.manager.close();
    }
}

impl<T: Translator> Drop for Predictor<T> {
    fn drop(&mut self) {
        self.close();
    }
}
