//! Native runtime boundary.
//!
//! The native runtime is an external library that performs the actual tensor
//! computation for a loaded model. This module specifies the boundary only:
//! a [`NativeRuntime`] can materialize model handles, a [`NativeModel`] is
//! one such handle expressed as an owned resource object, and a process-wide
//! registry maps numeric [`RuntimeId`]s to runtime instances so callers can
//! select a session without holding a reference to it.

pub mod device;
#[cfg(feature = "dlr")]
pub mod ffi;
#[cfg(feature = "dlr")]
pub mod native;

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, RwLock};

use tracing::debug;

use crate::error::{DlrError, Result};

pub use device::Device;

/// An owned handle to one loaded model inside a native runtime.
///
/// Dropping the handle releases the native model. Inputs are addressed by
/// name, outputs by index; implementations for model formats without output
/// names keep the positional `output_<i>` fallback.
pub trait NativeModel: Send {
    /// Bind one named input tensor for the next run.
    fn set_input(&mut self, name: &str, shape: &[i64], data: &[f32]) -> Result<()>;

    /// Execute the loaded graph over the bound inputs.
    fn run(&mut self) -> Result<()>;

    /// Number of graph inputs.
    fn num_inputs(&self) -> Result<usize>;

    /// Name of the input at `index`.
    fn input_name(&self, index: usize) -> Result<String>;

    /// Number of graph outputs.
    fn num_outputs(&self) -> Result<usize>;

    /// Shape of the output at `index`, valid after [`NativeModel::run`].
    fn output_shape(&self, index: usize) -> Result<Vec<usize>>;

    /// Data of the output at `index`, valid after [`NativeModel::run`].
    fn output(&self, index: usize) -> Result<Vec<f32>>;

    /// Name of the output at `index`.
    fn output_name(&self, index: usize) -> Result<String> {
        Ok(format!("output_{}", index))
    }

    /// Name of the compiled backend serving this model.
    fn backend(&self) -> Result<String>;

    /// Cap the number of native worker threads, where supported.
    fn set_num_threads(&mut self, threads: usize) -> Result<()> {
        let _ = threads;
        Ok(())
    }

    /// Pin native workers to CPUs, where supported.
    fn use_cpu_affinity(&mut self, enabled: bool) -> Result<()> {
        let _ = enabled;
        Ok(())
    }
}

/// One native runtime session capable of loading models.
pub trait NativeRuntime: Send + Sync {
    /// Short name for diagnostics.
    fn name(&self) -> &str;

    /// Load the model artifacts in `model_dir` onto `device`.
    ///
    /// # Errors
    ///
    /// Returns a runtime-load error for a missing or corrupt artifact, an
    /// unsupported device, or an incompatible runtime version.
    fn create_model(&self, model_dir: &Path, device: &Device) -> Result<Box<dyn NativeModel>>;
}

/// Identifier of a registered runtime instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuntimeId(u64);

impl fmt::Display for RuntimeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn registry() -> &'static RwLock<HashMap<u64, Arc<dyn NativeRuntime>>> {
    static REGISTRY: OnceLock<RwLock<HashMap<u64, Arc<dyn NativeRuntime>>>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Register a runtime instance and return its id.
pub fn register(runtime: Arc<dyn NativeRuntime>) -> RuntimeId {
    let id = RuntimeId(NEXT_ID.fetch_add(1, Ordering::Relaxed));
    debug!(runtime = runtime.name(), id = %id, "registered runtime instance");
    registry()
        .write()
        .unwrap_or_else(|e| e.into_inner())
        .insert(id.0, runtime);
    id
}

/// Resolve a runtime instance by id.
///
/// # Errors
///
/// Returns a runtime-load error for ids that were never registered or were
/// deregistered.
pub fn get(id: RuntimeId) -> Result<Arc<dyn NativeRuntime>> {
    registry()
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .get(&id.0)
        .cloned()
        .ok_or_else(|| DlrError::runtime_load(format!("unknown runtime instance {}", id)))
}

/// Remove a runtime instance from the registry.
///
/// Returns `true` if the id was registered. Models already loaded through
/// the instance stay valid; only new lookups fail.
pub fn deregister(id: RuntimeId) -> bool {
    registry()
        .write()
        .unwrap_or_else(|e| e.into_inner())
        .remove(&id.0)
        .is_some()
}
